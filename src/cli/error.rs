//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::ErrorKind;
use crate::exitcode;
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
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } | InfraError::Store(_) => exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(d) => match d.kind() {
                        ErrorKind::NotFound => exitcode::NOINPUT,
                        ErrorKind::NameConflict
                        | ErrorKind::InvalidMove
                        | ErrorKind::MissingModule => exitcode::DATAERR,
                        ErrorKind::SystemImmutable | ErrorKind::ImmutableConfig => {
                            exitcode::NOPERM
                        }
                        ErrorKind::LimitExceeded | ErrorKind::PreconditionFailed => {
                            exitcode::UNAVAILABLE
                        }
                    },
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => exitcode::SOFTWARE,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use rstest::rstest;

    #[rstest]
    #[case(DomainError::CategoryNotFound("x".into()), exitcode::NOINPUT)]
    #[case(DomainError::CategoryNameConflict("x".into()), exitcode::DATAERR)]
    #[case(DomainError::SystemImmutable("x".into()), exitcode::NOPERM)]
    #[case(DomainError::DepthExceeded { max_depth: 5 }, exitcode::UNAVAILABLE)]
    fn given_domain_error_when_exit_code_then_maps_by_kind(
        #[case] error: DomainError,
        #[case] expected: i32,
    ) {
        let err = CliError::from(ApplicationError::from(error));
        assert_eq!(err.exit_code(), expected);
    }

    #[test]
    fn given_usage_error_when_exit_code_then_usage() {
        assert_eq!(CliError::Usage("x".into()).exit_code(), exitcode::USAGE);
    }
}
