use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoothError {
    /// Hardware or collaborator could not be brought up. Always fatal.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// Camera collaborator failure. Aborts the session and the control loop.
    #[error("Capture error: {0}")]
    Capture(String),
    /// Print spooler could not be reached or refused a request.
    #[error("Spooler error: {0}")]
    Spooler(String),
    #[error("Configuration error: {0}")]
    Config(String),
    /// Capture sequencer driven out of order.
    #[error("Session state error: {0}")]
    SessionState(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let err = BoothError::Capture("camera gone".to_string());
        assert_eq!(err.to_string(), "Capture error: camera gone");

        let err = BoothError::Spooler("connection refused".to_string());
        assert!(err.to_string().starts_with("Spooler error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BoothError = io.into();
        assert!(matches!(err, BoothError::Io(_)));
    }
}
