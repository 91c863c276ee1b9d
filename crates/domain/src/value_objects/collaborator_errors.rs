use std::error::Error as StdError;

/// Error reported by an external collaborator (router API, notification
/// gateway), tagged with whether a retry can help. Carried through
/// `anyhow::Error` so repository and client signatures stay uniform; the
/// executor downcasts to decide between backoff and immediate failure.
#[derive(Debug)]
pub struct CollaboratorError {
    retryable: bool,
    message: String,
    source: Option<anyhow::Error>,
}

impl CollaboratorError {
    pub fn retryable(message: impl Into<String>) -> anyhow::Error {
        anyhow::Error::new(Self {
            retryable: true,
            message: message.into(),
            source: None,
        })
    }

    pub fn retryable_with_source(
        message: impl Into<String>,
        source: anyhow::Error,
    ) -> anyhow::Error {
        anyhow::Error::new(Self {
            retryable: true,
            message: message.into(),
            source: Some(source),
        })
    }

    pub fn permanent(message: impl Into<String>) -> anyhow::Error {
        anyhow::Error::new(Self {
            retryable: false,
            message: message.into(),
            source: None,
        })
    }

    pub fn permanent_with_source(
        message: impl Into<String>,
        source: anyhow::Error,
    ) -> anyhow::Error {
        anyhow::Error::new(Self {
            retryable: false,
            message: message.into(),
            source: Some(source),
        })
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl std::fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for CollaboratorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|err| err.as_ref())
    }
}

/// Unknown errors count as transient so a flaky collaborator gets its retry
/// budget rather than an instant permanent failure.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<CollaboratorError>()
        .map(CollaboratorError::is_retryable)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_survives_the_anyhow_boundary() {
        let transient = CollaboratorError::retryable("router unreachable");
        let permanent = CollaboratorError::permanent("invalid credentials");

        assert!(is_retryable(&transient));
        assert!(!is_retryable(&permanent));
    }

    #[test]
    fn untagged_errors_default_to_retryable() {
        let plain = anyhow::anyhow!("connection reset by peer");
        assert!(is_retryable(&plain));
    }
}
