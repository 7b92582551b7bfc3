use core_srt::LookupError;
use data_model_srt::StoreError;

#[derive(Debug)]
pub enum Error {
    StoreError(StoreError),
    LookupError(LookupError),
    ConfigError(String),
    AlreadyRunning,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreError(e) => write!(f, "Keyword store error: {}", e),
            Self::LookupError(e) => write!(f, "{}", e),
            Self::ConfigError(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::AlreadyRunning => write!(f, "A ranking check is already running"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        Self::StoreError(error)
    }
}

impl From<LookupError> for Error {
    fn from(error: LookupError) -> Self {
        Self::LookupError(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::AlreadyRunning.to_string(), "A ranking check is already running");
        assert_eq!(
            Error::ConfigError("WORKER_REQUESTS_PER_MINUTE must be positive".to_string()).to_string(),
            "Invalid configuration: WORKER_REQUESTS_PER_MINUTE must be positive"
        );
        assert_eq!(
            Error::from(StoreError::NotFound(3)).to_string(),
            "Keyword store error: Keyword 3 not found"
        );
    }

    #[test]
    fn test_error_from_lookup() {
        let error: Error = LookupError::MissingApiKey.into();
        assert!(matches!(error, Error::LookupError(LookupError::MissingApiKey)));
    }
}
