use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use bringup_core::error::ErrorKind;
use bringup_core::lifecycle::State;
use bringup_node::lifecycle::{ManagedResource, ReadyOutcome};
use bringup_node::sim::{SimBehavior, SimConfig, SimStats, SimulatedNode};

fn sim_resource() -> (ManagedResource<SimulatedNode>, Arc<SimStats>) {
    let node = SimulatedNode::new();
    let stats = node.stats();
    (ManagedResource::new("carrier_node", node), stats)
}

fn wait_for_reports(stats: &SimStats, expected: usize) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while stats.reports() < expected && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(stats.reports(), expected, "bring-up thread did not report");
}

#[test]
fn ready_within_deadline_then_stop_twice() {
    let (res, stats) = sim_resource();
    res.start(SimConfig::default().with_delay(Duration::from_millis(50)))
        .unwrap();

    assert_eq!(res.await_ready(Duration::from_secs(1)), ReadyOutcome::Ready);
    assert_eq!(res.state(), State::Ready);

    res.stop();
    assert_eq!(res.state(), State::Terminated);
    res.stop();
    assert_eq!(stats.kills(), 1);
}

#[test]
fn never_ready_times_out_and_still_stops() {
    let (res, stats) = sim_resource();
    res.start(SimConfig::default().with_behavior(SimBehavior::Never))
        .unwrap();

    assert_eq!(
        res.await_ready(Duration::from_millis(100)),
        ReadyOutcome::TimedOut
    );
    assert_eq!(res.state(), State::Starting, "timeout must not change state");

    res.stop();
    assert_eq!(res.state(), State::Terminated);
    assert_eq!(stats.kills(), 1);
}

#[test]
fn bring_up_failure_reports_cause() {
    let (res, _stats) = sim_resource();
    res.start(SimConfig::default().with_behavior(SimBehavior::Fail("network unreachable".into())))
        .unwrap();

    match res.await_ready(Duration::from_secs(1)) {
        ReadyOutcome::Failed(cause) => {
            assert_eq!(cause.kind, ErrorKind::BringUpFailure);
            assert_eq!(cause.message, "network unreachable");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(res.state(), State::Failed);
}

#[test]
fn stop_during_bring_up_wins_over_late_ready() {
    let (res, stats) = sim_resource();
    let res = Arc::new(res);
    res.start(SimConfig::default().with_delay(Duration::from_millis(50)))
        .unwrap();

    let waiter = {
        let res = Arc::clone(&res);
        thread::spawn(move || res.await_ready(Duration::from_secs(2)))
    };
    thread::sleep(Duration::from_millis(10));
    res.stop();

    assert_eq!(waiter.join().unwrap(), ReadyOutcome::TornDownDuringWait);

    // The bring-up thread still reports after teardown.
    wait_for_reports(&stats, 1);
    assert_eq!(res.state(), State::Terminated);
    assert_eq!(
        res.await_ready(Duration::from_millis(10)),
        ReadyOutcome::TornDownDuringWait
    );
    assert_eq!(stats.kills(), 1);
}

#[test]
fn second_start_while_starting_is_rejected() {
    let (res, stats) = sim_resource();
    res.start(SimConfig::default().with_delay(Duration::from_millis(50)))
        .unwrap();

    let err = res.start(SimConfig::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
    assert_eq!(stats.starts(), 1);
    assert!(!res.gate().is_fired(), "rejected start must not touch the gate");

    assert_eq!(res.await_ready(Duration::from_secs(1)), ReadyOutcome::Ready);
}

#[test]
fn double_fire_keeps_first_outcome() {
    let (res, stats) = sim_resource();
    res.start(SimConfig::default().with_behavior(SimBehavior::FailThenReady("dht bootstrap failed".into())))
        .unwrap();

    let first = res.await_ready(Duration::from_secs(1));
    wait_for_reports(&stats, 2);
    let second = res.await_ready(Duration::ZERO);

    assert!(matches!(first, ReadyOutcome::Failed(_)), "{first:?}");
    assert_eq!(first, second);
    assert_eq!(res.state(), State::Failed);
}

#[test]
fn duplicate_ready_is_harmless() {
    let (res, stats) = sim_resource();
    res.start(SimConfig::default().with_behavior(SimBehavior::ReadyTwice))
        .unwrap();

    assert_eq!(res.await_ready(Duration::from_secs(1)), ReadyOutcome::Ready);
    wait_for_reports(&stats, 2);
    assert_eq!(res.state(), State::Ready);
}

#[test]
fn wait_after_fire_matches_wait_before_fire() {
    let (res, _stats) = sim_resource();
    let res = Arc::new(res);
    res.start(SimConfig::default().with_delay(Duration::from_millis(30)))
        .unwrap();

    let early = {
        let res = Arc::clone(&res);
        thread::spawn(move || res.await_ready(Duration::from_secs(1)))
    };
    let early = early.join().unwrap();
    let late = res.await_ready(Duration::ZERO);
    assert_eq!(early, ReadyOutcome::Ready);
    assert_eq!(early, late);
}

#[test]
fn concurrent_stop_releases_exactly_once() {
    const CALLERS: usize = 16;

    for behavior in [SimBehavior::Ready, SimBehavior::Never] {
        let (res, stats) = sim_resource();
        let res = Arc::new(res);
        res.start(SimConfig::default().with_behavior(behavior)).unwrap();

        let barrier = Arc::new(Barrier::new(CALLERS));
        let stoppers: Vec<_> = (0..CALLERS)
            .map(|_| {
                let res = Arc::clone(&res);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    res.stop();
                })
            })
            .collect();
        for s in stoppers {
            s.join().unwrap();
        }

        assert_eq!(res.state(), State::Terminated);
        assert_eq!(stats.kills(), 1);
        drop(res);
        assert_eq!(stats.kills(), 1, "drop after stop must not release again");
    }
}

#[test]
fn drop_without_stop_releases() {
    let (res, stats) = sim_resource();
    res.start(SimConfig::default()).unwrap();
    drop(res);
    assert_eq!(stats.kills(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_waiter_observes_ready() {
    let (res, _stats) = sim_resource();
    res.start(SimConfig::default().with_delay(Duration::from_millis(20)))
        .unwrap();

    assert_eq!(
        res.await_ready_async(Duration::from_secs(1)).await,
        ReadyOutcome::Ready
    );
    res.stop();
}

#[test]
fn zero_delay_ready_node_is_usable_from_another_thread() {
    let (res, stats) = sim_resource();
    let res = Arc::new(res);

    let user = {
        let res = Arc::clone(&res);
        thread::spawn(move || {
            assert_eq!(res.await_ready(Duration::from_secs(1)), ReadyOutcome::Ready);
            res.with_handle(|node| node.user_id().map(str::to_owned))
        })
    };
    res.start(SimConfig::default().with_delay(Duration::ZERO))
        .unwrap();

    let user_id = user.join().unwrap().unwrap();
    assert_eq!(user_id.as_deref(), Some(bringup_node::sim::DEFAULT_USER_ID));

    res.stop();
    assert_eq!(stats.kills(), 1);
}
