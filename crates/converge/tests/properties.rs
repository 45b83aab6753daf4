//! Behavioural guarantees of the poller and tracker

mod common;

use common::{ScriptedResource, ScriptedTask};
use converge::status::{CLOUDSTACK_SERVER, CLOUDSTACK_TASK, NOVA_SERVER, RACKSPACE_LOAD_BALANCER};
use converge::{
    AwaitSpec, ConvergeError, ConvergenceOutcome, Fetched, LifecyclePredicate, LifecycleState,
    NativeStatus, Poller, ResourceAccessor, ResourceId, ResourceKind, ResourceSnapshot,
    StatusRegistry, TaskTracker,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;

fn spec(attempts: u32) -> AwaitSpec {
    AwaitSpec::active(Duration::from_secs(10)).max_attempts(attempts)
}

#[test]
fn test_every_builtin_table_is_total() {
    let samples = ["", "???", "active", "42", "-7", "DELETED (1%)"];
    let natives = samples
        .into_iter()
        .map(NativeStatus::from)
        .chain([-2, 0, 4, 99].map(NativeStatus::Code));

    for native in natives {
        for table in StatusRegistry::builtin().tables() {
            let state = table.translate(&native);
            assert!(
                LifecycleState::ALL.contains(&state),
                "{}/{} gave no state for {}",
                table.provider(),
                table.kind(),
                native
            );
            // pure: same input, same answer
            assert_eq!(table.translate(&native), state);
        }
    }

    // values no table lists fall back instead of guessing
    for table in StatusRegistry::builtin().tables() {
        assert_eq!(table.translate(&NativeStatus::from("???")), LifecycleState::Unrecognized);
        assert_eq!(table.translate(&NativeStatus::Code(99)), LifecycleState::Unrecognized);
    }
}

#[test]
fn test_unknown_status_falls_back_to_unrecognized() {
    for table in StatusRegistry::builtin().tables() {
        assert_eq!(
            table.translate(&NativeStatus::from("NOT_A_REAL_STATUS_VALUE")),
            LifecycleState::Unrecognized,
            "{} {}",
            table.provider(),
            table.kind()
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_first_fetch_convergence_does_not_sleep() {
    let server = ScriptedResource::statuses(ResourceKind::Server, &["ACTIVE"]);
    let started = Instant::now();

    let outcome = Poller::new(&NOVA_SERVER)
        .wait_for_resource(&server, &"srv-1".into(), &spec(5))
        .await
        .unwrap();

    assert!(outcome.is_converged());
    assert_eq!(server.calls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_state_short_circuits() {
    let server = ScriptedResource::statuses(ResourceKind::Server, &["ERROR", "ACTIVE"]);

    let outcome = Poller::new(&NOVA_SERVER)
        .wait_for_resource(&server, &"srv-1".into(), &spec(100))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        ConvergenceOutcome::Failed {
            state: LifecycleState::Error,
            ..
        }
    ));
    assert_eq!(server.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_budget_is_exact() {
    let server = ScriptedResource::statuses(ResourceKind::Server, &["BUILD"]);

    let outcome = Poller::new(&NOVA_SERVER)
        .wait_for_resource(&server, &"srv-1".into(), &spec(3))
        .await
        .unwrap();

    match outcome {
        ConvergenceOutcome::TimedOut {
            last,
            last_state,
            attempts,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_state, Some(LifecycleState::Pending));
            assert_eq!(last.unwrap().status, NativeStatus::from("BUILD"));
        }
        other => panic!("expected TimedOut, got {:?}", other),
    }
    assert_eq!(server.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_unrecognized_keeps_polling() {
    let server = ScriptedResource::statuses(ResourceKind::Server, &["SHELVED_OFFLOADED", "ACTIVE"]);

    let outcome = Poller::new(&NOVA_SERVER)
        .wait_for_resource(&server, &"srv-1".into(), &spec(5))
        .await
        .unwrap();

    assert!(outcome.is_converged());
    assert_eq!(server.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_deleted_status_also_counts_for_delete() {
    let server = ScriptedResource::statuses(ResourceKind::Server, &["ACTIVE", "DELETED"]);
    let id = ResourceId::from("srv-1");

    let outcome = Poller::new(&NOVA_SERVER)
        .wait_for_deleted(|| server.fetch_resource(&id), &spec(5))
        .await
        .unwrap();

    match outcome {
        ConvergenceOutcome::Converged(Some(snapshot)) => {
            assert_eq!(snapshot.status, NativeStatus::from("DELETED"));
        }
        other => panic!("expected Converged with snapshot, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_into_result_timeout_error() {
    let server = ScriptedResource::statuses(ResourceKind::Server, &["REBOOT"]);

    let err = Poller::new(&NOVA_SERVER)
        .wait_for_resource(&server, &"srv-1".into(), &spec(2))
        .await
        .unwrap()
        .into_result("srv-1")
        .unwrap_err();

    match err {
        ConvergeError::Timeout {
            resource,
            last_state,
            attempts,
            ..
        } => {
            assert_eq!(resource, "srv-1");
            assert_eq!(last_state, Some(LifecycleState::Pending));
            assert_eq!(attempts, 2);
        }
        other => panic!("expected Timeout, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_task_success_but_resource_mismatch() {
    let tasks = ScriptedTask::new("vm-4", "startVirtualMachine", &["0", "1"]);
    let vm = ScriptedResource::statuses(ResourceKind::Server, &["Stopped"]);
    let submitted = tasks.submitted("job-9", "0");

    let tracker = TaskTracker::new(&CLOUDSTACK_TASK, &CLOUDSTACK_SERVER);
    let err = tracker
        .track(&tasks, &vm, &submitted, LifecycleState::Active, &spec(5))
        .await
        .unwrap_err();

    match err {
        ConvergeError::UnexpectedState {
            resource,
            actual,
            expected,
            operation,
        } => {
            assert_eq!(resource, "vm-4");
            assert_eq!(actual, LifecycleState::Suspended);
            assert_eq!(expected, LifecycleState::Active);
            assert_eq!(operation, "startVirtualMachine");
        }
        other => panic!("expected UnexpectedState, got {:?}", other),
    }
    assert_eq!(vm.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_required_attribute_delays_acceptance() {
    let calls = AtomicU32::new(0);
    let predicate =
        LifecyclePredicate.and_require(|lb: &ResourceSnapshot| lb.has_attribute("virtual_ips"));

    let outcome = Poller::new(&RACKSPACE_LOAD_BALANCER)
        .wait_with(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let lb = ResourceSnapshot::new("lb-1", ResourceKind::LoadBalancer, "ACTIVE");
                    let lb = if n >= 2 {
                        lb.with_attribute("virtual_ips", serde_json::json!(["203.0.113.9"]))
                    } else {
                        lb
                    };
                    Ok(Fetched::Found(lb))
                }
            },
            &spec(10),
            &predicate,
        )
        .await
        .unwrap();

    assert!(outcome.is_converged());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_all_keeps_input_order() {
    let servers = ScriptedResource::statuses(ResourceKind::Server, &["ACTIVE"]);
    let ids: Vec<ResourceId> = vec!["b".into(), "a".into(), "c".into()];

    let results = Poller::new(&NOVA_SERVER)
        .wait_for_all(&servers, &ids, &spec(3))
        .await;

    let order: Vec<String> = results
        .into_iter()
        .map(|r| match r.unwrap() {
            ConvergenceOutcome::Converged(Some(s)) => s.id.to_string(),
            other => panic!("expected Converged, got {:?}", other),
        })
        .collect();
    assert_eq!(order, vec!["b", "a", "c"]);
}
