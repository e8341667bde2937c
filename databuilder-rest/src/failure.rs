//! Predicates deciding whether a failed request only drops its inbound record.

use std::collections::HashSet;

use crate::error::RestApiError;

pub trait FailureHandler: Send + Sync {
    /// `true` when the failure may be skipped instead of aborting the chain.
    fn can_skip(&self, error: &RestApiError) -> bool;
}

/// Skips HTTP failures with one of the given status codes, e.g. 404 on an
/// optional sub-resource.
#[derive(Debug, Clone, Default)]
pub struct HttpFailureSkipOnStatus {
    statuses: HashSet<u16>,
}

impl HttpFailureSkipOnStatus {
    pub fn new(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }
}

impl FailureHandler for HttpFailureSkipOnStatus {
    fn can_skip(&self, error: &RestApiError) -> bool {
        error
            .status()
            .is_some_and(|status| self.statuses.contains(&status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_on_status() {
        let handler = HttpFailureSkipOnStatus::new([404, 410]);
        let not_found = RestApiError::Http {
            url: "http://localhost/reports/1".into(),
            status: 404,
        };
        let server_error = RestApiError::Http {
            url: "http://localhost/reports/1".into(),
            status: 500,
        };
        let transport = RestApiError::Transport {
            url: "http://localhost".into(),
            message: "reset".into(),
            timeout: true,
        };
        assert!(handler.can_skip(&not_found));
        assert!(!handler.can_skip(&server_error));
        assert!(!handler.can_skip(&transport));
    }
}
