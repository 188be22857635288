//! Request intake: single-slot mailboxes crossing from the asynchronous
//! receive context into the synchronous control loop.
//!
//! Each slot is one atomic word, so a submission can never be torn by
//! re-entrant delivery and the loop's clear cannot race a set for the other
//! request type. The adjustment slot packs the pending bit and the payload
//! byte together; check-then-latch is a single compare-and-swap.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Pending bit of the adjustment slot; the low byte holds the payload.
const ADJ_PENDING: u32 = 1 << 8;

#[derive(Debug, Default)]
struct Slots {
    adjustment: AtomicU32,
    calibration: AtomicBool,
}

/// Producer half, handed to the receive context. Cloneable; never blocks.
#[derive(Debug, Clone)]
pub struct RequestSender {
    slots: Arc<Slots>,
}

impl RequestSender {
    /// Latch an adjustment request. Returns false (dropping the payload)
    /// when one is already pending; the slot frees only when the adjustment
    /// commits.
    pub fn submit_adjustment(&self, percent: u8) -> bool {
        self.slots
            .adjustment
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                if cur & ADJ_PENDING != 0 {
                    None
                } else {
                    Some(ADJ_PENDING | u32::from(percent))
                }
            })
            .is_ok()
    }

    /// Latch a calibration request. Re-arms even if one is already pending.
    pub fn submit_calibration(&self) {
        self.slots.calibration.store(true, Ordering::Release);
    }
}

/// Consumer half, owned by the control loop.
#[derive(Debug, Default)]
pub struct RequestIntake {
    slots: Arc<Slots>,
}

impl RequestIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a producer handle for the receive context.
    pub fn sender(&self) -> RequestSender {
        RequestSender {
            slots: self.slots.clone(),
        }
    }

    /// Peek the pending adjustment payload without consuming it.
    pub fn adjustment(&self) -> Option<u8> {
        let v = self.slots.adjustment.load(Ordering::Acquire);
        (v & ADJ_PENDING != 0).then_some((v & 0xff) as u8)
    }

    pub fn calibration(&self) -> bool {
        self.slots.calibration.load(Ordering::Acquire)
    }

    pub(crate) fn clear_adjustment(&self) {
        self.slots.adjustment.store(0, Ordering::Release);
    }

    pub(crate) fn clear_calibration(&self) {
        self.slots.calibration.store(false, Ordering::Release);
    }
}
