//! Error taxonomy shared by every manager operation.

use thiserror::Error;

/// Which side of a PRESCREVE link could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingEndpoint {
    Medico,
    Paciente,
    Both,
}

impl std::fmt::Display for MissingEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Medico => write!(f, "Medico"),
            Self::Paciente => write!(f, "Paciente"),
            Self::Both => write!(f, "Medico and Paciente"),
        }
    }
}

/// Top-level error type for Clinica operations.
///
/// `NotFound`, `Conflict`, `Unauthorized`, `Unresolved` and `Ambiguous` are
/// decided from result-row counts. `Store` wraps any connectivity, timeout,
/// or query failure from the graph store as a plain message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClinicaError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Cannot link prescription: {missing} not found")]
    Unresolved { missing: MissingEndpoint },

    #[error("Invariant violated: {count} {entity} records match {key}")]
    Ambiguous {
        entity: &'static str,
        key: String,
        count: usize,
    },

    #[error("Store error: {0}")]
    Store(String),
}

impl ClinicaError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn conflict(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            key: key.into(),
        }
    }

    /// Status code a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::Unauthorized => 401,
            Self::Unresolved { .. } | Self::Ambiguous { .. } | Self::Store(_) => 400,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClinicaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_transport_mapping() {
        assert_eq!(ClinicaError::not_found("Medico", "Ana").status_code(), 404);
        assert_eq!(ClinicaError::conflict("Medico", "Ana").status_code(), 409);
        assert_eq!(ClinicaError::Unauthorized.status_code(), 401);
        assert_eq!(
            ClinicaError::Unresolved {
                missing: MissingEndpoint::Paciente
            }
            .status_code(),
            400
        );
        assert_eq!(ClinicaError::Store("boom".into()).status_code(), 400);
    }

    #[test]
    fn messages_are_human_readable() {
        let err = ClinicaError::Unresolved {
            missing: MissingEndpoint::Both,
        };
        assert_eq!(
            err.to_string(),
            "Cannot link prescription: Medico and Paciente not found"
        );
        assert_eq!(
            ClinicaError::conflict("Medico", "Ana").to_string(),
            "Medico already exists: Ana"
        );
    }
}
