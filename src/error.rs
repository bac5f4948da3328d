use thiserror::Error;

/// Failures raised by step definitions and the browser session.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Undefined step: {0}")]
    Undefined(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Browser session is {0}")]
    Session(&'static str),
}

/// Fail with an assertion error unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), StepError> {
    if condition {
        Ok(())
    } else {
        Err(StepError::Assertion(message.into()))
    }
}
