//! Server errors.

use thiserror::Error;

/// Failures starting or assembling the broker server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {reason}")]
    Bind {
        /// Configured address.
        addr: String,
        /// Underlying failure.
        reason: String,
    },

    /// An I/O error on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required broker component was not supplied to the builder.
    #[error("broker is missing its {0}")]
    MissingComponent(&'static str),
}

impl ServerError {
    /// Creates a bind error.
    #[must_use]
    pub fn bind(addr: impl Into<String>, reason: impl ToString) -> Self {
        Self::Bind {
            addr: addr.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ServerError::bind("0.0.0.0:80", "permission denied");
        assert_eq!(err.to_string(), "failed to bind 0.0.0.0:80: permission denied");

        let err = ServerError::MissingComponent("catalog service");
        assert_eq!(err.to_string(), "broker is missing its catalog service");
    }

    #[test]
    fn test_from_io() {
        let err: ServerError = std::io::Error::new(std::io::ErrorKind::Other, "reset").into();
        assert!(matches!(err, ServerError::Io(_)));
    }
}
