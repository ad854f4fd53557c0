//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::DocumentNotFound(_) => crate::exitcode::NOINPUT,
                InfraError::InvalidDocumentId(_) => crate::exitcode::USAGE,
                InfraError::Application(app) => match app {
                    ApplicationError::Validation(_) => crate::exitcode::DATAERR,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::PathNotFound(_)
                    | ApplicationError::FrameworkNotFound(_) => crate::exitcode::NOINPUT,
                    ApplicationError::Store { source, .. } => {
                        match source.downcast_ref::<InfraError>() {
                            Some(InfraError::DocumentNotFound(_)) => crate::exitcode::NOINPUT,
                            _ => crate::exitcode::IOERR,
                        }
                    }
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                    ApplicationError::Domain(_) => crate::exitcode::SOFTWARE,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldError, ValidationErrors};

    #[test]
    fn given_validation_error_when_mapping_exit_code_then_dataerr() {
        let err: CliError = ApplicationError::Validation(ValidationErrors(vec![FieldError {
            path: "/name".to_string(),
            message: "name is required".to_string(),
        }]))
        .into();

        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);
    }

    #[test]
    fn given_missing_document_when_mapping_exit_code_then_noinput() {
        let err: CliError = ApplicationError::Store {
            context: "load x".to_string(),
            source: Box::new(InfraError::DocumentNotFound("x".to_string())),
        }
        .into();

        assert_eq!(err.exit_code(), crate::exitcode::NOINPUT);
    }
}
