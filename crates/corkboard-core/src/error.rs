use thiserror::Error;

/// Structured failure kinds for board operations.
///
/// `Option` is reserved for "not applicable" (a reminder that cannot be
/// computed yet); anything that went wrong comes back as one of these, with
/// enough detail for a front end to render a message.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("task not found: {id}")]
    TaskNotFound { id: u64 },

    #[error("column not found: {name}")]
    ColumnNotFound { name: String },

    #[error("validation failed for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("persistence failed during {op} for task {id}: {detail}")]
    Persistence {
        op: &'static str,
        id: u64,
        detail: String,
    },
}

impl BoardError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn persistence(op: &'static str, id: u64, err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            op,
            id,
            detail: format!("{err:#}"),
        }
    }
}

pub type BoardResult<T> = Result<T, BoardError>;
