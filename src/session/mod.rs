//! Sessions: complete runs of checked operations against one instance.
//!
//! A session starts in an explicit state, advances only through
//! [`ResourceInstance::invoke`](crate::checker::ResourceInstance::invoke),
//! and is reported as completed only when it ends in one of its kind's
//! terminal states. Ending anywhere else yields
//! [`AbortReason::ProtocolNotCompleted`]; this is how "every opened handle
//! gets closed" is enforced.

mod result;
mod runner;

pub use result::{AbortReason, SessionReport, SessionResult};
pub use runner::{run_session, with_resource, Observed, Step};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{BoxError, ProtocolError};
    use crate::kind::{ResourceKind, StateSpace};
    use crate::registry::{Operation, Registry};
    use crate::state_enum;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    state_enum! {
        enum Conn {
            Idle,
            Busy,
        }
    }

    fn registry(with_cleanup: bool) -> Registry<Conn, bool> {
        registry_counting(with_cleanup).0
    }

    fn registry_counting(with_cleanup: bool) -> (Registry<Conn, bool>, Arc<AtomicUsize>) {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let mut kind = ResourceKind::builder("conn")
            .initial(Conn::Idle)
            .terminal([Conn::Idle])
            .space(StateSpace::finite(Conn::all()));
        if with_cleanup {
            let counter = Arc::clone(&cleanups);
            kind = kind.cleanup_with("release", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            });
        }

        let mut registry = Registry::new();
        registry.declare_kind(kind.build().unwrap()).unwrap();
        registry
            .register_operation(
                "conn",
                Operation::builder("acquire")
                    .when(|c| *c == Conn::Idle)
                    .outcomes([true, false])
                    .next(|_, ok| Some(if *ok { Conn::Busy } else { Conn::Idle }))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register_operation(
                "conn",
                Operation::builder("release")
                    .when(|c| *c == Conn::Busy)
                    .outcome(true)
                    .moves_to(Conn::Idle)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        (registry, cleanups)
    }

    #[derive(Debug, thiserror::Error)]
    enum AppError {
        #[error(transparent)]
        Protocol(#[from] ProtocolError),
        #[error("business rule: {0}")]
        Business(&'static str),
    }

    #[test]
    fn session_completes_in_terminal_state() {
        let registry = registry(false);
        let report = run_session(&registry, "conn", Conn::Idle, |state, _| match state {
            Conn::Idle => None,
            Conn::Busy => Some(Step::returning("release", true)),
        })
        .unwrap();

        assert_eq!(report.result, SessionResult::Completed(Conn::Idle));
        assert!(report.log.is_empty());
    }

    #[test]
    fn session_ending_busy_is_not_completed() {
        let registry = registry(false);
        let report = run_session(&registry, "conn", Conn::Idle, |_, observed| match observed {
            Observed::Start => Some(Step::returning("acquire", true)),
            _ => None,
        })
        .unwrap();

        assert_eq!(
            report.result,
            SessionResult::Aborted(AbortReason::ProtocolNotCompleted { state: Conn::Busy })
        );
    }

    #[test]
    fn script_branches_on_outcome() {
        let registry = registry(false);
        let mut attempts = 0;
        let report = run_session(&registry, "conn", Conn::Idle, |state, observed| {
            match (state, observed) {
                (Conn::Idle, Observed::Start) | (Conn::Idle, Observed::Outcome(false)) => {
                    attempts += 1;
                    Some(Step::returning("acquire", attempts >= 3))
                }
                (Conn::Busy, Observed::Outcome(true)) => Some(Step::returning("release", true)),
                _ => None,
            }
        })
        .unwrap();

        assert!(report.is_completed());
        assert_eq!(attempts, 3);
        assert_eq!(
            report.log.operations(),
            vec!["acquire", "acquire", "acquire", "release"]
        );
    }

    #[test]
    fn action_failures_reach_the_script() {
        let registry = registry(false);
        let mut failures = 0;
        let report = run_session(&registry, "conn", Conn::Idle, |state, observed| {
            match (state, observed) {
                (Conn::Idle, Observed::Start) => {
                    Some(Step::new("acquire", || Err::<bool, BoxError>("refused".into())))
                }
                (Conn::Idle, Observed::Failed(err)) => {
                    assert!(err.is_action_failure());
                    failures += 1;
                    None
                }
                _ => None,
            }
        })
        .unwrap();

        assert_eq!(failures, 1);
        assert!(report.is_completed());
        assert!(report.log.is_empty());
    }

    #[test]
    fn protocol_errors_propagate_out_of_session() {
        let registry = registry(false);
        let result = run_session(&registry, "conn", Conn::Idle, |_, observed| match observed {
            Observed::Start => Some(Step::returning("release", true)),
            _ => None,
        });

        assert!(matches!(
            result,
            Err(ProtocolError::PreconditionViolation { .. })
        ));
    }

    #[test]
    fn with_resource_cleans_up_on_failure() {
        let (registry, cleanups) = registry_counting(true);
        let result: Result<((), _), AppError> =
            with_resource(&registry, "conn", Conn::Idle, |conn| {
                conn.perform("acquire", true)?;
                assert_eq!(conn.state(), Conn::Busy);
                Err(AppError::Business("quota exceeded"))
            });

        assert!(matches!(result, Err(AppError::Business("quota exceeded"))));
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cleanup_is_skipped_when_precondition_fails() {
        let (registry, cleanups) = registry_counting(true);
        let result: Result<((), _), AppError> =
            with_resource(&registry, "conn", Conn::Idle, |_| Err(AppError::Business("early")));

        assert!(result.is_err());
        assert_eq!(cleanups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn with_resource_cleans_up_on_panic() {
        let (registry, cleanups) = registry_counting(true);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: Result<((), _), AppError> =
                with_resource(&registry, "conn", Conn::Idle, |conn| {
                    conn.perform("acquire", true)?;
                    panic!("handler bug");
                });
        }));

        assert!(outcome.is_err());
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn with_resource_without_cleanup_propagates() {
        let registry = registry(false);
        let result: Result<((), _), AppError> =
            with_resource(&registry, "conn", Conn::Idle, |conn| {
                conn.perform("acquire", true)?;
                Err(AppError::Business("no cleanup"))
            });

        assert!(matches!(result, Err(AppError::Business("no cleanup"))));
    }

    #[test]
    fn with_resource_reports_success() {
        let registry = registry(true);
        let (value, report) = with_resource(&registry, "conn", Conn::Idle, |conn| {
            conn.perform("acquire", true)?;
            conn.perform("release", true)?;
            Ok::<_, AppError>(42)
        })
        .unwrap();

        assert_eq!(value, 42);
        assert!(report.is_completed());
        assert_eq!(report.log.len(), 2);
    }

    #[test]
    fn with_resource_reports_unfinished_protocol() {
        let registry = registry(true);
        let (_, report) = with_resource(&registry, "conn", Conn::Idle, |conn| {
            conn.perform("acquire", true)?;
            Ok::<_, AppError>(())
        })
        .unwrap();

        assert!(!report.is_completed());
        assert_eq!(report.result.final_state(), &Conn::Busy);
    }

    #[test]
    fn with_resource_propagates_unknown_kind() {
        let registry = registry(true);
        let result = with_resource(&registry, "socket", Conn::Idle, |_| Ok::<_, AppError>(()));

        assert!(matches!(
            result,
            Err(AppError::Protocol(ProtocolError::UnknownKind { .. }))
        ));
    }
}
