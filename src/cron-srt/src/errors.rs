#[derive(Debug)]
pub enum Error {
    InvalidUrl(url::ParseError),
    HttpError(reqwest::Error),
    /// The API answered with a status the trigger does not understand
    UnexpectedStatus { status: u16, body: String },
    /// Ranking checks are disabled on the API server (no SERP API key)
    Unavailable(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl(e) => write!(f, "Invalid URL: {}", e),
            Self::HttpError(e) => write!(f, "HTTP error: {}", e),
            Self::UnexpectedStatus { status, body } => write!(f, "Unexpected status {}: {}", status, body),
            Self::Unavailable(s) => write!(f, "Ranking checks unavailable: {}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl(error)
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::HttpError(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::Unavailable("VALUESERP_API_KEY is not set".to_string());
        assert_eq!(
            error.to_string(),
            "Ranking checks unavailable: VALUESERP_API_KEY is not set"
        );

        let error = Error::UnexpectedStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "Unexpected status 500: boom");
    }

    #[test]
    fn test_error_from_url_parse_error() {
        let url_error = url::Url::parse("not a valid url").unwrap_err();
        let error: Error = url_error.into();
        assert!(matches!(error, Error::InvalidUrl(_)));
    }
}
