/// Errors that can occur while requesting the next agent turn.
///
/// Level and placement errors live next to the level loader; everything
/// that can go wrong between the session and a language-model backend is
/// collected here. None of these touch run state: a failed turn leaves the
/// maps and the drone exactly where they were.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The API key environment variable is not set.
    #[error("API key not found: set {0}")]
    MissingApiKey(String),

    /// The HTTP client could not be built or the request never completed.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl DriverError {
    /// Overload / rate limiting, as opposed to a request the backend will
    /// never accept.
    pub fn is_overloaded(&self) -> bool {
        matches!(self, DriverError::Status { status: 429 | 500..=599, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overload_statuses() {
        let busy = DriverError::Status { status: 503, body: "overloaded".into() };
        assert!(busy.is_overloaded());
        let limited = DriverError::Status { status: 429, body: String::new() };
        assert!(limited.is_overloaded());
        let bad = DriverError::Status { status: 400, body: "bad request".into() };
        assert!(!bad.is_overloaded());
        assert!(!DriverError::Malformed("x".into()).is_overloaded());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = DriverError::MissingApiKey("GEMINI_API_KEY".into());
        assert_eq!(err.to_string(), "API key not found: set GEMINI_API_KEY");
    }
}
