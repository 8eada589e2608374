//! Wall-clock checks for the call throttle.

mod common;

use fnkit::resilience::clock::ManualClock;
use fnkit::{throttle, Throttler};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn rate_bounds_calls_in_a_window() {
    common::init_tracing();
    let calls = AtomicU32::new(0);
    let throttled = throttle(
        |()| {
            calls.fetch_add(1, Ordering::SeqCst);
        },
        40.0,
    )
    .unwrap();

    let window = Duration::from_millis(500);
    let start = Instant::now();
    while start.elapsed() < window {
        throttled.call(());
    }

    // 0.5 s at 40/s is 20 calls, plus the unthrottled first one.
    let made = calls.load(Ordering::SeqCst);
    assert!((17..=21).contains(&made), "made {} calls", made);
}

#[test]
fn consecutive_calls_are_spaced() {
    let throttler = Throttler::new(50.0).unwrap();
    let mut stamps = Vec::new();
    for _ in 0..4 {
        throttler.call(|| stamps.push(Instant::now()));
    }
    // Slots are 20 ms apart measured from the first reservation.
    let span = stamps[3] - stamps[0];
    assert!(span >= Duration::from_millis(55), "span {:?}", span);
}

#[test]
fn concurrent_callers_share_one_schedule() {
    common::init_tracing();
    let throttler = Arc::new(Throttler::new(20.0).unwrap());
    let start = Instant::now();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let throttler = Arc::clone(&throttler);
            thread::spawn(move || throttler.wait())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    // Four reservations at 50 ms spacing: the last waits about 150 ms.
    assert!(start.elapsed() >= Duration::from_millis(140));
}

#[test]
fn manual_clock_makes_schedule_deterministic() {
    let clock = ManualClock::shared();
    let throttled = throttle(|x: u8| x, 10.0).unwrap().with_clock(clock.clone());
    assert_eq!(throttled.call(1), 1);
    clock.advance(Duration::from_millis(40));
    assert_eq!(throttled.call(2), 2);
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(60)]);
}

#[tokio::test]
async fn async_wait_spaces_calls() {
    common::init_tracing();
    let throttled = throttle(|x: u32| x * 2, 25.0).unwrap();
    let start = Instant::now();
    let mut total = 0;
    for i in 0..3 {
        total += throttled.call_async(i).await;
    }
    assert_eq!(total, 6);
    assert!(start.elapsed() >= Duration::from_millis(75));
}
