//! Application workflow state machine
//!
//! Single source of truth for every status transition an application can make,
//! who is allowed to trigger it, and what the target status is. Services never
//! write status strings directly; they ask this module to apply an action.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of a certification application
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    // serde's SCREAMING_SNAKE_CASE doesn't break words at digits, so the
    // numbered variants need explicit renames to match the wire format.
    #[serde(rename = "PAYMENT_1_PENDING")]
    Payment1Pending,
    Submitted,
    PendingReview,
    RevisionRequired,
    #[serde(rename = "PAYMENT_2_PENDING")]
    Payment2Pending,
    PendingAudit,
    AuditScheduled,
    AuditInProgress,
    Approved,
    Certified,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 12] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Payment1Pending,
        ApplicationStatus::Submitted,
        ApplicationStatus::PendingReview,
        ApplicationStatus::RevisionRequired,
        ApplicationStatus::Payment2Pending,
        ApplicationStatus::PendingAudit,
        ApplicationStatus::AuditScheduled,
        ApplicationStatus::AuditInProgress,
        ApplicationStatus::Approved,
        ApplicationStatus::Certified,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "DRAFT",
            ApplicationStatus::Payment1Pending => "PAYMENT_1_PENDING",
            ApplicationStatus::Submitted => "SUBMITTED",
            ApplicationStatus::PendingReview => "PENDING_REVIEW",
            ApplicationStatus::RevisionRequired => "REVISION_REQUIRED",
            ApplicationStatus::Payment2Pending => "PAYMENT_2_PENDING",
            ApplicationStatus::PendingAudit => "PENDING_AUDIT",
            ApplicationStatus::AuditScheduled => "AUDIT_SCHEDULED",
            ApplicationStatus::AuditInProgress => "AUDIT_IN_PROGRESS",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Certified => "CERTIFIED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Certified | ApplicationStatus::Rejected
        )
    }

    /// States in which the farmer may edit the form payload
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Draft | ApplicationStatus::RevisionRequired
        )
    }

    /// States gated on a fee payment
    pub fn payment_phase(&self) -> Option<u8> {
        match self {
            ApplicationStatus::Payment1Pending => Some(1),
            ApplicationStatus::Payment2Pending => Some(2),
            _ => None,
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a status string not present in the enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown application status: {0}")]
pub struct UnknownStatus(pub String);

/// Everything that can move an application through the pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    /// Farmer confirms the draft, unlocking the phase-1 fee
    ConfirmReview,
    /// Phase-1 invoice settled (webhook or manual staff action)
    Phase1Paid,
    /// Reviewer picks the application up for document review
    StartReview,
    /// Reviewer approves the documents, unlocking the phase-2 fee
    ApproveDocuments,
    /// Reviewer sends the application back for changes
    RequestRevision,
    /// Reviewer rejects outright (third revision request escalates here)
    RejectDocuments,
    /// Farmer resubmits after a revision request
    Resubmit,
    /// Phase-2 invoice settled
    Phase2Paid,
    /// Staff assigns an auditor and a date
    ScheduleAudit,
    /// Auditor begins the on-site audit
    StartAudit,
    /// Audit result PASS
    AuditPass,
    /// Audit result FAIL
    AuditFail,
    /// Audit result CONDITIONAL, corrections required
    AuditConditional,
    /// Certificate and traceability assets generated
    IssueCertificate,
}

impl WorkflowAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::ConfirmReview => "confirm_review",
            WorkflowAction::Phase1Paid => "phase1_paid",
            WorkflowAction::StartReview => "start_review",
            WorkflowAction::ApproveDocuments => "approve_documents",
            WorkflowAction::RequestRevision => "request_revision",
            WorkflowAction::RejectDocuments => "reject_documents",
            WorkflowAction::Resubmit => "resubmit",
            WorkflowAction::Phase2Paid => "phase2_paid",
            WorkflowAction::ScheduleAudit => "schedule_audit",
            WorkflowAction::StartAudit => "start_audit",
            WorkflowAction::AuditPass => "audit_pass",
            WorkflowAction::AuditFail => "audit_fail",
            WorkflowAction::AuditConditional => "audit_conditional",
            WorkflowAction::IssueCertificate => "issue_certificate",
        }
    }

    /// States this action may be applied from
    pub fn sources(&self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            WorkflowAction::ConfirmReview => &[Draft],
            WorkflowAction::Phase1Paid => &[Payment1Pending],
            WorkflowAction::StartReview => &[Submitted],
            WorkflowAction::ApproveDocuments => &[PendingReview],
            WorkflowAction::RequestRevision => &[PendingReview],
            WorkflowAction::RejectDocuments => &[PendingReview],
            WorkflowAction::Resubmit => &[RevisionRequired],
            WorkflowAction::Phase2Paid => &[Payment2Pending],
            WorkflowAction::ScheduleAudit => &[PendingAudit],
            WorkflowAction::StartAudit => &[AuditScheduled],
            WorkflowAction::AuditPass => &[AuditInProgress],
            WorkflowAction::AuditFail => &[AuditInProgress],
            WorkflowAction::AuditConditional => &[AuditInProgress],
            WorkflowAction::IssueCertificate => &[Approved],
        }
    }

    /// Status the application moves to when this action succeeds
    pub fn target(&self) -> ApplicationStatus {
        use ApplicationStatus::*;
        match self {
            WorkflowAction::ConfirmReview => Payment1Pending,
            WorkflowAction::Phase1Paid => Submitted,
            WorkflowAction::StartReview => PendingReview,
            WorkflowAction::ApproveDocuments => Payment2Pending,
            WorkflowAction::RequestRevision => RevisionRequired,
            WorkflowAction::RejectDocuments => Rejected,
            WorkflowAction::Resubmit => Submitted,
            WorkflowAction::Phase2Paid => PendingAudit,
            WorkflowAction::ScheduleAudit => AuditScheduled,
            WorkflowAction::StartAudit => AuditInProgress,
            WorkflowAction::AuditPass => Approved,
            WorkflowAction::AuditFail => Rejected,
            WorkflowAction::AuditConditional => RevisionRequired,
            WorkflowAction::IssueCertificate => Certified,
        }
    }

    /// Roles allowed to trigger this action
    pub fn permitted_roles(&self) -> &'static [ActorRole] {
        use ActorRole::*;
        match self {
            WorkflowAction::ConfirmReview => &[Farmer],
            WorkflowAction::Phase1Paid => &[System, Reviewer, Admin],
            WorkflowAction::StartReview => &[Reviewer, Admin],
            WorkflowAction::ApproveDocuments => &[Reviewer, Admin],
            WorkflowAction::RequestRevision => &[Reviewer, Admin],
            WorkflowAction::RejectDocuments => &[Reviewer, Admin],
            WorkflowAction::Resubmit => &[Farmer],
            WorkflowAction::Phase2Paid => &[System, Reviewer, Admin],
            WorkflowAction::ScheduleAudit => &[Reviewer, Admin],
            WorkflowAction::StartAudit => &[Auditor],
            WorkflowAction::AuditPass => &[Auditor],
            WorkflowAction::AuditFail => &[Auditor],
            WorkflowAction::AuditConditional => &[Auditor],
            WorkflowAction::IssueCertificate => &[System, Admin],
        }
    }
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is performing a transition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Farmer,
    Reviewer,
    Auditor,
    Admin,
    /// Internal callers such as the payment webhook
    System,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Farmer => "farmer",
            ActorRole::Reviewer => "reviewer",
            ActorRole::Auditor => "auditor",
            ActorRole::Admin => "admin",
            ActorRole::System => "system",
        }
    }
}

/// A transition rejected by the state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The action cannot be applied from the current status
    #[error("cannot apply {action} from status {from}")]
    InvalidTransition {
        from: ApplicationStatus,
        action: WorkflowAction,
    },
    /// The actor role is not allowed to perform the action
    #[error("role {} may not perform {action}", role.as_str())]
    NotPermitted {
        role: ActorRole,
        action: WorkflowAction,
    },
}

/// Validate and resolve a transition. Returns the target status.
///
/// This is the only place transition legality is decided; callers persist the
/// result with a status-guarded UPDATE and a workflow event in one transaction.
pub fn apply(
    current: ApplicationStatus,
    action: WorkflowAction,
    role: ActorRole,
) -> Result<ApplicationStatus, TransitionError> {
    if !action.sources().contains(&current) {
        return Err(TransitionError::InvalidTransition {
            from: current,
            action,
        });
    }
    if !action.permitted_roles().contains(&role) {
        return Err(TransitionError::NotPermitted { role, action });
    }
    Ok(action.target())
}

/// Actions available from a given status, regardless of role
pub fn allowed_actions(status: ApplicationStatus) -> Vec<WorkflowAction> {
    const ACTIONS: [WorkflowAction; 14] = [
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

    ACTIONS
        .into_iter()
        .filter(|a| a.sources().contains(&status))
        .collect()
}

/// Revision requests escalate to outright rejection at this count
pub const MAX_REVISION_REQUESTS: i32 = 3;

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn test_status_round_trip() {
        for status in ApplicationStatus::ALL {
            let parsed: ApplicationStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_unknown_status() {
        assert!("NOT_A_STATUS".parse::<ApplicationStatus>().is_err());
        // Status strings are case sensitive
        assert!("draft".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_happy_path() {
        // The full pipeline from draft to certificate
        let steps = [
            (Draft, WorkflowAction::ConfirmReview, ActorRole::Farmer),
            (Payment1Pending, WorkflowAction::Phase1Paid, ActorRole::System),
            (Submitted, WorkflowAction::StartReview, ActorRole::Reviewer),
            (PendingReview, WorkflowAction::ApproveDocuments, ActorRole::Reviewer),
            (Payment2Pending, WorkflowAction::Phase2Paid, ActorRole::System),
            (PendingAudit, WorkflowAction::ScheduleAudit, ActorRole::Reviewer),
            (AuditScheduled, WorkflowAction::StartAudit, ActorRole::Auditor),
            (AuditInProgress, WorkflowAction::AuditPass, ActorRole::Auditor),
            (Approved, WorkflowAction::IssueCertificate, ActorRole::Admin),
        ];

        let mut status = Draft;
        for (expected_from, action, role) in steps {
            assert_eq!(status, expected_from);
            status = apply(status, action, role).unwrap();
        }
        assert_eq!(status, Certified);
        assert!(status.is_terminal());
    }

    #[test]
    fn test_revision_loop() {
        let status = apply(
            PendingReview,
            WorkflowAction::RequestRevision,
            ActorRole::Reviewer,
        )
        .unwrap();
        assert_eq!(status, RevisionRequired);
        assert!(status.is_editable());

        let status = apply(status, WorkflowAction::Resubmit, ActorRole::Farmer).unwrap();
        assert_eq!(status, Submitted);
    }

    #[test]
    fn test_audit_outcomes() {
        assert_eq!(
            apply(AuditInProgress, WorkflowAction::AuditPass, ActorRole::Auditor).unwrap(),
            Approved
        );
        assert_eq!(
            apply(AuditInProgress, WorkflowAction::AuditFail, ActorRole::Auditor).unwrap(),
            Rejected
        );
        assert_eq!(
            apply(
                AuditInProgress,
                WorkflowAction::AuditConditional,
                ActorRole::Auditor
            )
            .unwrap(),
            RevisionRequired
        );
    }

    #[test]
    fn test_invalid_transition() {
        let err = apply(Draft, WorkflowAction::AuditPass, ActorRole::Auditor).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn test_role_enforcement() {
        // A farmer cannot approve their own documents
        let err = apply(
            PendingReview,
            WorkflowAction::ApproveDocuments,
            ActorRole::Farmer,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::NotPermitted { .. }));

        // An auditor cannot schedule themselves
        let err = apply(PendingAudit, WorkflowAction::ScheduleAudit, ActorRole::Auditor)
            .unwrap_err();
        assert!(matches!(err, TransitionError::NotPermitted { .. }));
    }

    #[test]
    fn test_terminal_states_have_no_actions() {
        assert!(allowed_actions(Certified).is_empty());
        assert!(allowed_actions(Rejected).is_empty());
    }

    #[test]
    fn test_every_non_terminal_state_has_an_exit() {
        for status in ApplicationStatus::ALL {
            if !status.is_terminal() {
                assert!(
                    !allowed_actions(status).is_empty(),
                    "{} has no exit",
                    status
                );
            }
        }
    }

    #[test]
    fn test_payment_phases() {
        assert_eq!(Payment1Pending.payment_phase(), Some(1));
        assert_eq!(Payment2Pending.payment_phase(), Some(2));
        assert_eq!(Draft.payment_phase(), None);
        assert_eq!(PendingAudit.payment_phase(), None);
    }
}
