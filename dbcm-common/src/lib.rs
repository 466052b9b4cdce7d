//! Common types and utilities shared between dbcm-core and dbcm-cli

pub mod topology;

pub use topology::{AddressRole, ClusterTopology, DataNodeInstance, DbNode, RoleAddress};

/// Tooling error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid action: {0} (expected 'add' or 'edit')")]
    InvalidAction(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Node not found in cluster topology: {0}")]
    NodeNotFound(String),

    #[error("Probe could not be executed: {0}")]
    ProbeExecution(String),

    #[error("Failed to spawn {program}: {reason}")]
    CommandSpawn { program: String, reason: String },

    #[error("{program} exited with {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidAction("delete".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid action: delete (expected 'add' or 'edit')"
        );

        let err = Error::CommandFailed {
            program: "cm_ctl".to_string(),
            code: Some(1),
            stderr: "resource exists".to_string(),
        };
        assert_eq!(err.to_string(), "cm_ctl exited with Some(1): resource exists");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<ClusterTopology>("{not json").unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(err, Error::Parse(_)));
    }
}
