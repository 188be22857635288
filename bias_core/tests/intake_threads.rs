//! Cross-context behavior of the request intake: submissions race from
//! real threads against the single-slot latch semantics.

use bias_core::RequestIntake;
use std::thread;

#[test]
fn exactly_one_concurrent_adjustment_wins() {
    for _ in 0..50 {
        let intake = RequestIntake::new();
        let handles: Vec<_> = [35u8, 45, 55, 65]
            .into_iter()
            .map(|pct| {
                let sender = intake.sender();
                thread::spawn(move || (pct, sender.submit_adjustment(pct)))
            })
            .collect();

        let results: Vec<(u8, bool)> = handles
            .into_iter()
            .map(|h| h.join().expect("join"))
            .collect();

        let winners: Vec<u8> = results
            .iter()
            .filter(|(_, accepted)| *accepted)
            .map(|(pct, _)| *pct)
            .collect();
        assert_eq!(winners.len(), 1, "single-slot latch admits exactly one");
        assert_eq!(intake.adjustment(), Some(winners[0]));
    }
}

#[test]
fn concurrent_calibration_rearm_is_harmless() {
    let intake = RequestIntake::new();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sender = intake.sender();
            thread::spawn(move || sender.submit_calibration())
        })
        .collect();
    for h in handles {
        h.join().expect("join");
    }
    assert!(intake.calibration());
}

#[test]
fn adjustment_latch_survives_a_racing_calibration_set() {
    // The two slots are independent words; a calibration set while the
    // adjustment latch is being taken must not tear either.
    let intake = RequestIntake::new();
    let adj = {
        let sender = intake.sender();
        thread::spawn(move || sender.submit_adjustment(42))
    };
    let cal = {
        let sender = intake.sender();
        thread::spawn(move || sender.submit_calibration())
    };
    assert!(adj.join().expect("join"));
    cal.join().expect("join");
    assert_eq!(intake.adjustment(), Some(42));
    assert!(intake.calibration());
}
