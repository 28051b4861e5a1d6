use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Assertion(String),

    #[error("{0}")]
    Precondition(String),

    #[error("Unexpected org state: {0}")]
    StateAssumption(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Locator not found: {0}")]
    LocatorNotFound(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Keyword not found: {0}")]
    KeywordNotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, PageError>;

// Convert anyhow::Error to PageError
impl From<anyhow::Error> for PageError {
    fn from(err: anyhow::Error) -> Self {
        PageError::AnyhowError(err.to_string())
    }
}

impl PageError {
    /// Failures a test may reasonably retry: a wait ran out of budget or a
    /// bounded assertion did not hold in time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PageError::Timeout(_) | PageError::Assertion(_))
    }

    /// The org is not in the state the scenario assumes.
    pub fn is_state_drift(&self) -> bool {
        matches!(self, PageError::StateAssumption(_))
    }
}
