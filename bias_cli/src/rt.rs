//! Real-time scheduling helpers (Linux SCHED_FIFO + mlockall).
//!
//! The control loop's step and settle delays are real-time deadlines;
//! locking the address space and raising the scheduling class keeps page
//! faults and preemption from stretching them. Failures are warnings, not
//! errors: the node still works, just with more jitter.

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>) {
    use libc::{
        MCL_CURRENT, SCHED_FIFO, mlockall, sched_get_priority_max, sched_get_priority_min,
        sched_param, sched_setscheduler,
    };
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    RT_ONCE.get_or_init(|| {
        let rc = unsafe { mlockall(MCL_CURRENT) };
        if rc != 0 {
            tracing::warn!(
                error = %std::io::Error::last_os_error(),
                "mlockall failed; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'"
            );
        }

        let (min, max) = unsafe {
            let min = sched_get_priority_min(SCHED_FIFO);
            let max = sched_get_priority_max(SCHED_FIFO);
            if min < 0 || max < 0 { (1, 99) } else { (min, max) }
        };
        let param = sched_param {
            sched_priority: prio.unwrap_or(max).clamp(min, max),
        };
        let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
        if rc != 0 {
            tracing::warn!(
                error = %std::io::Error::last_os_error(),
                "sched_setscheduler(SCHED_FIFO) failed; continuing without RT priority"
            );
        } else {
            tracing::info!(priority = param.sched_priority, "real-time scheduling enabled");
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>) {
    if rt {
        tracing::warn!("real-time mode is only supported on Linux");
    }
}
