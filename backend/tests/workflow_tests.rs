//! Application workflow state machine tests
//!
//! Tests for the certification pipeline including:
//! - Transition legality and role enforcement
//! - Terminal state behavior
//! - Reachability of every status from DRAFT

use proptest::prelude::*;

use shared::workflow::{
    allowed_actions, apply, ActorRole, ApplicationStatus, TransitionError, WorkflowAction,
    MAX_REVISION_REQUESTS,
};

const ALL_ACTIONS: [WorkflowAction; 14] = [
    WorkflowAction::ConfirmReview,
    WorkflowAction::Phase1Paid,
    WorkflowAction::StartReview,
    WorkflowAction::ApproveDocuments,
    WorkflowAction::RequestRevision,
    WorkflowAction::RejectDocuments,
    WorkflowAction::Resubmit,
    WorkflowAction::Phase2Paid,
    WorkflowAction::ScheduleAudit,
    WorkflowAction::StartAudit,
    WorkflowAction::AuditPass,
    WorkflowAction::AuditFail,
    WorkflowAction::AuditConditional,
    WorkflowAction::IssueCertificate,
];

const ALL_ROLES: [ActorRole; 5] = [
    ActorRole::Farmer,
    ActorRole::Reviewer,
    ActorRole::Auditor,
    ActorRole::Admin,
    ActorRole::System,
];

fn status_strategy() -> impl Strategy<Value = ApplicationStatus> {
    proptest::sample::select(ApplicationStatus::ALL.to_vec())
}

fn action_strategy() -> impl Strategy<Value = WorkflowAction> {
    proptest::sample::select(ALL_ACTIONS.to_vec())
}

fn role_strategy() -> impl Strategy<Value = ActorRole> {
    proptest::sample::select(ALL_ROLES.to_vec())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Every status must be reachable from DRAFT by some action sequence
    #[test]
    fn test_every_status_reachable_from_draft() {
        let mut reached = vec![ApplicationStatus::Draft];
        let mut frontier = vec![ApplicationStatus::Draft];

        while let Some(status) = frontier.pop() {
            for action in allowed_actions(status) {
                let target = action.target();
                if !reached.contains(&target) {
                    reached.push(target);
                    frontier.push(target);
                }
            }
        }

        for status in ApplicationStatus::ALL {
            assert!(reached.contains(&status), "{} unreachable", status);
        }
    }

    /// Terminal states accept no actions at all
    #[test]
    fn test_terminal_states_are_dead_ends() {
        for status in [ApplicationStatus::Certified, ApplicationStatus::Rejected] {
            assert!(status.is_terminal());
            assert!(allowed_actions(status).is_empty());
        }
    }

    /// The revision loop escalates to rejection after the third request
    #[test]
    fn test_revision_escalation_threshold() {
        assert_eq!(MAX_REVISION_REQUESTS, 3);

        // Counts below the threshold keep the revision loop open
        for count in 1..MAX_REVISION_REQUESTS {
            assert!(count < MAX_REVISION_REQUESTS);
        }

        // The escalating action lands in the terminal REJECTED state
        let rejected = apply(
            ApplicationStatus::PendingReview,
            WorkflowAction::RejectDocuments,
            ActorRole::Reviewer,
        )
        .unwrap();
        assert_eq!(rejected, ApplicationStatus::Rejected);
        assert!(rejected.is_terminal());
    }

    /// A paid phase-2 invoice moves the application into the audit track
    #[test]
    fn test_payment_gates() {
        let submitted = apply(
            ApplicationStatus::Payment1Pending,
            WorkflowAction::Phase1Paid,
            ActorRole::System,
        )
        .unwrap();
        assert_eq!(submitted, ApplicationStatus::Submitted);

        let pending_audit = apply(
            ApplicationStatus::Payment2Pending,
            WorkflowAction::Phase2Paid,
            ActorRole::System,
        )
        .unwrap();
        assert_eq!(pending_audit, ApplicationStatus::PendingAudit);
    }

    /// The webhook actor may settle payments but cannot review documents
    #[test]
    fn test_system_actor_scope() {
        assert!(apply(
            ApplicationStatus::Payment1Pending,
            WorkflowAction::Phase1Paid,
            ActorRole::System
        )
        .is_ok());

        let err = apply(
            ApplicationStatus::PendingReview,
            WorkflowAction::ApproveDocuments,
            ActorRole::System,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::NotPermitted { .. }));
    }

    /// Only the two farmer-editable states accept form updates
    #[test]
    fn test_editable_states() {
        for status in ApplicationStatus::ALL {
            let expected = matches!(
                status,
                ApplicationStatus::Draft | ApplicationStatus::RevisionRequired
            );
            assert_eq!(status.is_editable(), expected, "{}", status);
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// apply() succeeds exactly when the source status and role are both listed
    #[test]
    fn test_apply_matches_transition_table(
        status in status_strategy(),
        action in action_strategy(),
        role in role_strategy(),
    ) {
        let result = apply(status, action, role);
        let legal_source = action.sources().contains(&status);
        let legal_role = action.permitted_roles().contains(&role);

        match result {
            Ok(target) => {
                prop_assert!(legal_source && legal_role);
                prop_assert_eq!(target, action.target());
            }
            Err(TransitionError::InvalidTransition { .. }) => prop_assert!(!legal_source),
            Err(TransitionError::NotPermitted { .. }) => {
                prop_assert!(legal_source && !legal_role);
            }
        }
    }

    /// No action ever re-enters DRAFT; the draft state only exists at creation
    #[test]
    fn test_draft_is_never_a_target(action in action_strategy()) {
        prop_assert_ne!(action.target(), ApplicationStatus::Draft);
    }

    /// allowed_actions agrees with each action's own source list
    #[test]
    fn test_allowed_actions_consistency(status in status_strategy()) {
        let allowed = allowed_actions(status);
        for action in ALL_ACTIONS {
            prop_assert_eq!(
                allowed.contains(&action),
                action.sources().contains(&status)
            );
        }
    }

    /// Random action sequences starting at DRAFT can never leave the status set
    /// or continue past a terminal state
    #[test]
    fn test_random_walk_stays_in_pipeline(
        actions in proptest::collection::vec(action_strategy(), 1..30),
        roles in proptest::collection::vec(role_strategy(), 30),
    ) {
        let mut status = ApplicationStatus::Draft;
        for (action, role) in actions.iter().zip(roles.iter()) {
            if status.is_terminal() {
                prop_assert!(apply(status, *action, *role).is_err());
                break;
            }
            if let Ok(next) = apply(status, *action, *role) {
                prop_assert!(ApplicationStatus::ALL.contains(&next));
                status = next;
            }
        }
    }

    /// Status strings survive serde round trips in SCREAMING_SNAKE_CASE
    #[test]
    fn test_status_serde_round_trip(status in status_strategy()) {
        let json = serde_json::to_string(&status).unwrap();
        prop_assert_eq!(json, format!("\"{}\"", status.as_str()));

        let back: ApplicationStatus = serde_json::from_str(&format!("\"{}\"", status.as_str())).unwrap();
        prop_assert_eq!(back, status);
    }
}
