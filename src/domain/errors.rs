use super::rows::RowKey;
use super::validation::FieldErrors;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("'{action}' is not available on the {step} step")]
    InvalidTransition {
        step: &'static str,
        action: &'static str,
    },
    #[error("form is incomplete: {0}")]
    Validation(FieldErrors),
    #[error("no row with key {0}")]
    UnknownRow(RowKey),
    #[error("at least {min} row(s) must remain")]
    RowMinimum { min: usize },
    #[error("row {0} cannot be removed")]
    PinnedRow(RowKey),
}

pub type DomainResult<T> = Result<T, DomainError>;
