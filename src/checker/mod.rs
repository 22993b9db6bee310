//! Protocol checker.
//!
//! Every operation on a resource instance goes through
//! [`ResourceInstance::invoke`], which
//!
//! 1. refuses retired instances and unknown operations,
//! 2. checks the operation's precondition against the current state,
//! 3. runs the caller's action to obtain an outcome,
//! 4. computes the next state from that outcome, and
//! 5. commits it atomically with respect to the instance.
//!
//! A failed action is reported as [`ProtocolError::ActionFailed`] and leaves
//! the state untouched, so hosts can tell a protocol breach from a
//! real-world failure.

mod error;
mod instance;

pub use error::{BoxError, ProtocolError};
pub use instance::{HandoffRefused, ResourceInstance};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{ResourceKind, StateSpace};
    use crate::registry::{Operation, Registry};
    use crate::session::{AbortReason, SessionResult};
    use crate::state_enum;
    use std::cell::Cell;
    use std::sync::Arc;

    state_enum! {
        enum Handle {
            Closed,
            ReadOpen,
            WriteOpen,
        }
    }

    fn registry() -> Registry<Handle, bool> {
        let mut registry = Registry::new();
        registry
            .declare_kind(
                ResourceKind::builder("file")
                    .initial(Handle::Closed)
                    .terminal([Handle::Closed])
                    .space(StateSpace::finite(Handle::all()))
                    .hand_off_when(|h| *h == Handle::Closed)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register_operation(
                "file",
                Operation::builder("open_read")
                    .when(|h| *h == Handle::Closed)
                    .outcomes([true, false])
                    .next(|_, ok| Some(if *ok { Handle::ReadOpen } else { Handle::Closed }))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register_operation(
                "file",
                Operation::builder("close")
                    .when(|h| *h != Handle::Closed)
                    .outcome(true)
                    .moves_to(Handle::Closed)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn invoke_commits_outcome_dependent_state() {
        let registry = registry();
        let file = registry.instantiate("file").unwrap();

        assert!(!file.perform("open_read", false).unwrap());
        assert_eq!(file.state(), Handle::Closed);

        assert!(file.perform("open_read", true).unwrap());
        assert_eq!(file.state(), Handle::ReadOpen);

        let path = file.history();
        assert_eq!(
            path.get_path(),
            vec![&Handle::Closed, &Handle::Closed, &Handle::ReadOpen]
        );
    }

    #[test]
    fn precondition_violation_never_runs_action() {
        let registry = registry();
        let file = registry.instantiate("file").unwrap();
        let ran = Cell::new(false);

        let result = file.invoke("close", || {
            ran.set(true);
            Ok::<_, BoxError>(true)
        });

        assert!(matches!(
            result,
            Err(ProtocolError::PreconditionViolation { ref operation, ref state })
                if operation == "close" && state == "Closed"
        ));
        assert!(!ran.get());
        assert_eq!(file.state(), Handle::Closed);
    }

    #[test]
    fn failed_action_leaves_state_unchanged() {
        let registry = registry();
        let file = registry.instantiate("file").unwrap();
        file.perform("open_read", true).unwrap();

        let result = file.invoke("close", || Err::<bool, _>("device busy"));

        let err = result.unwrap_err();
        assert!(err.is_action_failure());
        assert_eq!(file.state(), Handle::ReadOpen);
        assert_eq!(file.history().len(), 1);
    }

    #[test]
    fn panicking_action_leaves_state_unchanged() {
        let registry = registry();
        let file = Arc::new(registry.instantiate("file").unwrap());

        let shared = Arc::clone(&file);
        let joined = std::thread::spawn(move || {
            let _ = shared.invoke("open_read", || -> Result<bool, BoxError> {
                panic!("driver crashed")
            });
        })
        .join();

        assert!(joined.is_err());
        assert_eq!(file.state(), Handle::Closed);
        assert!(file.perform("open_read", true).is_ok());
    }

    #[test]
    fn undeclared_outcome_is_rejected() {
        let registry = registry();
        let file = registry.instantiate("file").unwrap();
        file.perform("open_read", true).unwrap();

        let result = file.perform("close", false);

        assert!(matches!(result, Err(ProtocolError::UndeclaredOutcome { .. })));
        assert_eq!(file.state(), Handle::ReadOpen);
    }

    #[test]
    fn unknown_operation_is_recoverable() {
        let registry = registry();
        let file = registry.instantiate("file").unwrap();

        let err = file.perform("seek", true).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownOperation { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn undefined_transition_beyond_validation_is_reported() {
        let mut registry: Registry<Handle, bool> = Registry::new();
        registry
            .declare_kind(
                ResourceKind::builder("file")
                    .initial(Handle::Closed)
                    .terminal([Handle::Closed])
                    .space(StateSpace::indexed(|_| true))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        // WriteOpen is not reachable from Closed, so the gap is invisible
        // at registration.
        registry
            .register_operation(
                "file",
                Operation::builder("close")
                    .when(|h| *h != Handle::Closed)
                    .outcome(true)
                    .next(|h, _| (*h == Handle::ReadOpen).then_some(Handle::Closed))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let file = registry.instantiate_at("file", Handle::WriteOpen).unwrap();
        let err = file.perform("close", true).unwrap_err();

        assert!(matches!(err, ProtocolError::TransitionUndefined { .. }));
        assert!(!err.is_recoverable());
        assert_eq!(file.state(), Handle::WriteOpen);
    }

    #[test]
    fn finish_reports_terminal_state() {
        let registry = registry();
        let file = registry.instantiate("file").unwrap();
        file.perform("open_read", true).unwrap();
        file.perform("close", true).unwrap();

        assert_eq!(file.finish(), SessionResult::Completed(Handle::Closed));
    }

    #[test]
    fn finish_outside_terminal_state_aborts() {
        let registry = registry();
        let file = registry.instantiate("file").unwrap();
        file.perform("open_read", true).unwrap();

        assert_eq!(
            file.finish(),
            SessionResult::Aborted(AbortReason::ProtocolNotCompleted {
                state: Handle::ReadOpen
            })
        );
    }

    #[test]
    fn retired_instance_refuses_operations() {
        let registry = registry();
        let file = registry.instantiate("file").unwrap();
        file.retire();

        assert!(file.is_retired());
        assert!(matches!(
            file.perform("open_read", true),
            Err(ProtocolError::InstanceRetired { .. })
        ));
    }

    #[test]
    fn handoff_is_checked_against_kind() {
        let registry = registry();
        let file = registry.instantiate("file").unwrap();
        file.perform("open_read", true).unwrap();

        let refused = file.hand_off("worker-2").unwrap_err();
        assert!(matches!(
            refused.reason,
            ProtocolError::PreconditionViolation { .. }
        ));

        let file = refused.instance;
        assert_eq!(file.owner(), "");
        file.perform("close", true).unwrap();

        let file = file.hand_off("worker-2").unwrap();
        assert_eq!(file.owner(), "worker-2");
        assert_eq!(file.state(), Handle::Closed);
    }

    #[test]
    fn refused_handoff_reports_its_reason() {
        use std::error::Error;

        let registry = registry();
        let file = registry.instantiate("file").unwrap();
        file.perform("open_read", true).unwrap();

        let refused = file.hand_off("worker-2").unwrap_err();
        assert!(refused.to_string().starts_with("handoff refused: "));
        assert!(refused.to_string().ends_with(&refused.reason.to_string()));
        let source = refused.source().unwrap();
        assert_eq!(source.to_string(), refused.reason.to_string());
    }

    #[test]
    fn terminal_state_does_not_retire() {
        let registry = registry();
        let file = registry.instantiate("file").unwrap();
        file.perform("open_read", true).unwrap();
        file.perform("close", true).unwrap();

        assert!(!file.is_retired());
        file.perform("open_read", false).unwrap();
        assert_eq!(file.state(), Handle::Closed);
    }

    #[test]
    fn disabled_history_records_nothing() {
        let full = registry();
        let mut quiet = Registry::with_config(
            crate::registry::RegistryConfig::default().record_history(false),
        );
        quiet
            .declare_kind(full.kind("file").unwrap().clone())
            .unwrap();
        quiet
            .register_operation(
                "file",
                Operation::builder("open_read")
                    .when(|h| *h == Handle::Closed)
                    .outcome(true)
                    .moves_to(Handle::ReadOpen)
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let file = quiet.instantiate("file").unwrap();
        file.perform("open_read", true).unwrap();

        assert_eq!(file.state(), Handle::ReadOpen);
        assert!(file.history().is_empty());
    }
}
