use domain::value_objects::collaborator_errors::CollaboratorError;
use reqwest::StatusCode;

/// Maps an HTTP status to the executor's retry classification: throttling
/// and server-side failures are worth another attempt, the rest of 4xx means
/// the request itself is wrong.
pub fn error_for_status(status: StatusCode, context: &str) -> anyhow::Error {
    let message = format!("{context} returned status {status}");
    if matches!(status.as_u16(), 408 | 429) || status.is_server_error() {
        CollaboratorError::retryable(message)
    } else {
        CollaboratorError::permanent(message)
    }
}

/// Transport-level failures (DNS, connect, timeout) are always retryable;
/// anything reqwest reports before the request leaves the process is not.
pub fn map_transport_error(err: reqwest::Error, context: &str) -> anyhow::Error {
    let message = format!("{context} request failed: {err}");
    if err.is_builder() {
        CollaboratorError::permanent_with_source(message, err.into())
    } else {
        CollaboratorError::retryable_with_source(message, err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::value_objects::collaborator_errors::is_retryable;

    #[test]
    fn server_errors_and_throttling_are_retryable() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::REQUEST_TIMEOUT,
            StatusCode::TOO_MANY_REQUESTS,
        ] {
            assert!(is_retryable(&error_for_status(status, "router api")));
        }
    }

    #[test]
    fn client_errors_are_permanent() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
        ] {
            assert!(!is_retryable(&error_for_status(status, "router api")));
        }
    }
}
