//! # Databuilder REST
//!
//! Declarative joins over paginated REST endpoints.
//! A chain starts at a [`QuerySeed`] and every [`RestApiQuery`] joins the
//! records of the previous link with one endpoint, binding JSONPath matches
//! to new fields. [`RestApiExtractor`] plugs a chain into a pipeline task.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractor;
pub mod failure;
pub mod json_path;
pub mod pagination;
pub mod query;
pub mod request;
pub mod rest_api_query;
pub mod retry;

pub use auth::{Authenticator, NoAuth};
pub use config::{PaginationConfig, RestApiChainConfig, RestApiQueryConfig};
pub use error::RestApiError;
pub use extractor::{RestApiExtractor, RestApiExtractorConfig};
pub use failure::{FailureHandler, HttpFailureSkipOnStatus};
pub use json_path::JsonPathExpr;
pub use pagination::{FullPagePagination, NoPagination, PageNumberPagination, Paginator};
pub use query::{QuerySeed, RestQuery};
pub use request::{BasicAuth, RequestParams};
pub use rest_api_query::{EmptyResultPolicy, RestApiQuery, RestApiQueryBuilder};
pub use retry::{RetryConfig, with_retry};
