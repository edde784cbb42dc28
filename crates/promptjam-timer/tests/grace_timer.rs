//! Integration tests for the one-shot grace timer.
//!
//! All tests run under Tokio's paused clock so deadlines resolve
//! deterministically: when every task is blocked on time, the runtime
//! auto-advances to the next pending deadline.

use std::time::Duration;

use promptjam_timer::GraceTimer;

const GRACE: Duration = Duration::from_secs(5);

// =========================================================================
// Idle state
// =========================================================================

#[test]
fn test_idle_timer_is_not_armed() {
    let timer = GraceTimer::idle();
    assert!(!timer.is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_idle_timer_pends_forever() {
    let mut timer = GraceTimer::idle();

    let result =
        tokio::time::timeout(Duration::from_secs(60), timer.expired()).await;
    assert!(result.is_err(), "idle timer should never fire");
}

// =========================================================================
// Arming and expiry
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_armed_timer_fires_after_grace() {
    let mut timer = GraceTimer::idle();
    timer.arm(GRACE);
    assert!(timer.is_armed());

    timer.expired().await;
    assert!(!timer.is_armed(), "expiry should disarm the timer");
}

#[tokio::test(start_paused = true)]
async fn test_timer_fires_at_most_once_per_arming() {
    let mut timer = GraceTimer::idle();
    timer.arm(GRACE);
    timer.expired().await;

    let result =
        tokio::time::timeout(Duration::from_secs(60), timer.expired()).await;
    assert!(result.is_err(), "spent timer should pend until re-armed");
}

#[tokio::test(start_paused = true)]
async fn test_timer_does_not_fire_before_deadline() {
    let mut timer = GraceTimer::idle();
    timer.arm(GRACE);

    let result =
        tokio::time::timeout(Duration::from_secs(4), timer.expired()).await;
    assert!(result.is_err(), "timer fired before its deadline");
    assert!(timer.is_armed(), "early wakeup must leave the deadline set");
}

// =========================================================================
// Disarm
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_disarm_cancels_pending_expiry() {
    let mut timer = GraceTimer::idle();
    timer.arm(GRACE);
    timer.disarm();
    assert!(!timer.is_armed());

    let result =
        tokio::time::timeout(Duration::from_secs(60), timer.expired()).await;
    assert!(result.is_err(), "disarmed timer should never fire");
}

#[test]
fn test_disarm_is_idempotent() {
    let mut timer = GraceTimer::idle();
    timer.disarm();
    timer.disarm();
    assert!(!timer.is_armed());

    timer.arm(GRACE);
    timer.disarm();
    timer.disarm();
    assert!(!timer.is_armed());
}

// =========================================================================
// Re-arming
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_rearm_replaces_deadline() {
    let mut timer = GraceTimer::idle();
    timer.arm(GRACE);
    timer.arm(Duration::from_secs(30));

    // The original 5s deadline must no longer exist.
    let result =
        tokio::time::timeout(Duration::from_secs(10), timer.expired()).await;
    assert!(result.is_err(), "old deadline should have been replaced");

    // The replacement deadline still fires.
    let result =
        tokio::time::timeout(Duration::from_secs(60), timer.expired()).await;
    assert!(result.is_ok(), "replacement deadline should fire");
}

#[tokio::test(start_paused = true)]
async fn test_timer_is_reusable_after_expiry() {
    let mut timer = GraceTimer::idle();

    timer.arm(GRACE);
    timer.expired().await;

    timer.arm(GRACE);
    assert!(timer.is_armed());
    timer.expired().await;
    assert!(!timer.is_armed());
}

// =========================================================================
// Integration: select! loop pattern (mirrors real room usage)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut timer = GraceTimer::idle();
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(10);

    // Simulate a GM dropping, reconnecting in time, then dropping for good.
    tokio::spawn(async move {
        tx.send("gm-disconnect").await.ok();
        tokio::time::sleep(Duration::from_secs(2)).await;
        tx.send("gm-connect").await.ok();
        tokio::time::sleep(Duration::from_secs(2)).await;
        tx.send("gm-disconnect").await.ok();
    });

    let mut reconnects = 0;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => match cmd {
                "gm-disconnect" => timer.arm(GRACE),
                "gm-connect" => {
                    timer.disarm();
                    reconnects += 1;
                }
                _ => unreachable!(),
            },
            _ = timer.expired() => break,
        }
    }

    assert_eq!(reconnects, 1, "first disconnect should have been cancelled");
    assert!(!timer.is_armed());
}
