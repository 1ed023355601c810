use crate::entities::document::DocumentStatus;
use crate::error::{AppError, AppResult};

/// A review moves a pending document to approved or rejected, once.
pub fn review(current: DocumentStatus, decision: DocumentStatus) -> AppResult<DocumentStatus> {
    if decision == DocumentStatus::Pending {
        return Err(AppError::validation(
            "status",
            "status must be approved or rejected",
        ));
    }

    if current != DocumentStatus::Pending {
        return Err(AppError::Conflict(
            "Document has already been reviewed".to_string(),
        ));
    }

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_can_be_decided() {
        assert_eq!(
            review(DocumentStatus::Pending, DocumentStatus::Approved).unwrap(),
            DocumentStatus::Approved
        );
        assert_eq!(
            review(DocumentStatus::Pending, DocumentStatus::Rejected).unwrap(),
            DocumentStatus::Rejected
        );
    }

    #[test]
    fn test_decisions_are_terminal() {
        for current in [DocumentStatus::Approved, DocumentStatus::Rejected] {
            for decision in [DocumentStatus::Approved, DocumentStatus::Rejected] {
                assert!(matches!(review(current, decision), Err(AppError::Conflict(_))));
            }
        }
    }

    #[test]
    fn test_pending_is_not_a_decision() {
        assert!(matches!(
            review(DocumentStatus::Pending, DocumentStatus::Pending),
            Err(AppError::Validation(_))
        ));
    }
}
