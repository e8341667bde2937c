//! Authentication hook run once before a query issues its first request.

use async_trait::async_trait;

use crate::error::RestApiError;
use crate::request::RequestParams;

/// Prepares request parameters (tokens, cookies) before the first request.
///
/// Implementations may call the API themselves, e.g. to exchange credentials
/// for a session token, and store the result in `params`.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(
        &self,
        client: &reqwest::Client,
        params: &mut RequestParams,
    ) -> Result<(), RestApiError>;
}

/// Leaves the parameters untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    async fn authenticate(
        &self,
        _client: &reqwest::Client,
        _params: &mut RequestParams,
    ) -> Result<(), RestApiError> {
        Ok(())
    }
}
