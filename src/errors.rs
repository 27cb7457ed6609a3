use std::fmt;

/// Custom error type that includes exit codes
#[derive(Debug)]
pub enum FieldpilotError {
    /// Field not found or no longer attached (exit code 2)
    FieldNotFound(String),
    /// Chat backend call failed (exit code 3)
    BackendFailed(String),
    /// WebDriver connection failed (exit code 4)
    WebDriverFailed(String),
    /// Operation timeout (exit code 5)
    Timeout(String),
    /// Generic error (exit code 1)
    Other(anyhow::Error),
}

impl FieldpilotError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FieldpilotError::FieldNotFound(_) => 2,
            FieldpilotError::BackendFailed(_) => 3,
            FieldpilotError::WebDriverFailed(_) => 4,
            FieldpilotError::Timeout(_) => 5,
            FieldpilotError::Other(_) => 1,
        }
    }
}

impl fmt::Display for FieldpilotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldpilotError::FieldNotFound(msg) => write!(f, "{}", msg),
            FieldpilotError::BackendFailed(msg) => write!(f, "{}", msg),
            FieldpilotError::WebDriverFailed(msg) => {
                write!(f, "WebDriver connection failed: {}", msg)
            }
            FieldpilotError::Timeout(msg) => write!(f, "Operation timed out: {}", msg),
            FieldpilotError::Other(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for FieldpilotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FieldpilotError::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for FieldpilotError {
    fn from(err: anyhow::Error) -> Self {
        // Try to detect specific error types from the error message
        let msg = err.to_string();

        if msg.contains("No field found") || msg.contains("no longer attached") {
            FieldpilotError::FieldNotFound(msg)
        } else if msg.contains("chat backend") {
            FieldpilotError::BackendFailed(msg)
        } else if msg.contains("Failed to connect to WebDriver")
            || msg.contains("WebDriver")
            || msg.contains("geckodriver")
            || msg.contains("chromedriver")
        {
            FieldpilotError::WebDriverFailed(msg)
        } else if msg.contains("timeout") || msg.contains("timed out") || msg.contains("no answer")
        {
            FieldpilotError::Timeout(msg)
        } else {
            FieldpilotError::Other(err)
        }
    }
}
