//! Declarative description of a query chain.
//!
//! ```toml
//! [extractor.restapi.chain]
//! seed = [{ organization = "acme" }]
//!
//! [[extractor.restapi.chain.steps]]
//! url = "https://app.example.com/api/{organization}/spaces"
//! json_path = "_embedded.spaces[*].token"
//! field_names = ["dashboard_group_id"]
//!
//! [[extractor.restapi.chain.steps]]
//! url = "https://app.example.com/api/{organization}/spaces/{dashboard_group_id}/reports"
//! json_path = "(_embedded.reports[*].token) | (_embedded.reports[*].name)"
//! field_names = ["dashboard_id", "dashboard_name"]
//! json_path_contains_or = true
//! on_empty = "skip"
//! skip_on_status = [404]
//! ```

use databuilder_core::Record;
use serde::{Deserialize, Serialize};

use crate::error::RestApiError;
use crate::failure::HttpFailureSkipOnStatus;
use crate::json_path::JsonPathExpr;
use crate::pagination::{
    DEFAULT_PAGE_SIZE, DEFAULT_TOTAL_AVAILABLE_PATH, FullPagePagination, PageNumberPagination,
};
use crate::query::{QuerySeed, RestQuery};
use crate::request::RequestParams;
use crate::rest_api_query::{EmptyResultPolicy, RestApiQuery};
use crate::retry::RetryConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationConfig {
    #[default]
    None,
    PageNumber {
        #[serde(default = "default_page_size")]
        page_size: usize,
        #[serde(default = "default_total_available_path")]
        total_available_path: String,
        /// Count matches of this path, not of the step's `json_path`, when
        /// deciding whether a page was empty.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pagination_json_path: Option<String>,
    },
    FullPage {
        #[serde(default = "default_page_size")]
        page_size: usize,
        #[serde(default = "default_page_param")]
        page_param: String,
    },
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_total_available_path() -> String {
    DEFAULT_TOTAL_AVAILABLE_PATH.to_string()
}

fn default_page_param() -> String {
    "page".to_string()
}

/// One join step of a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestApiQueryConfig {
    /// URL template with `{field}` placeholders.
    pub url: String,
    pub json_path: String,
    pub field_names: Vec<String>,
    #[serde(default)]
    pub params: RequestParams,
    #[serde(default)]
    pub coalesce: bool,
    #[serde(default)]
    pub json_path_contains_or: bool,
    #[serde(default)]
    pub on_empty: EmptyResultPolicy,
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// HTTP statuses that drop the inbound record instead of failing.
    #[serde(default)]
    pub skip_on_status: Vec<u16>,
}

/// Seed records plus ordered join steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestApiChainConfig {
    pub seed: Vec<Record>,
    pub steps: Vec<RestApiQueryConfig>,
    pub retry: RetryConfig,
    /// Applied to every step before its own `params`.
    pub params: RequestParams,
}

impl RestApiChainConfig {
    /// Build the chain; the returned query is the last step.
    pub fn build(&self, client: &reqwest::Client) -> Result<Box<dyn RestQuery>, RestApiError> {
        if self.steps.is_empty() {
            return Err(RestApiError::Config {
                message: "query chain has no steps".to_string(),
            });
        }
        let seed = if self.seed.is_empty() {
            QuerySeed::empty_record()
        } else {
            QuerySeed::new(self.seed.clone())
        };

        let mut query: Box<dyn RestQuery> = Box::new(seed);
        for step in &self.steps {
            query = Box::new(step.build(query, self, client)?);
        }
        Ok(query)
    }
}

impl RestApiQueryConfig {
    fn build(
        &self,
        inner: Box<dyn RestQuery>,
        chain: &RestApiChainConfig,
        client: &reqwest::Client,
    ) -> Result<RestApiQuery, RestApiError> {
        let mut builder =
            RestApiQuery::builder(inner, &self.url, &self.json_path, self.field_names.clone())
                .params(merge_params(&chain.params, &self.params))
                .coalesce(self.coalesce)
                .json_path_contains_or(self.json_path_contains_or)
                .on_empty(self.on_empty)
                .retry(chain.retry.clone())
                .client(client.clone());

        builder = match &self.pagination {
            PaginationConfig::None => builder,
            PaginationConfig::PageNumber {
                page_size,
                total_available_path,
                pagination_json_path,
            } => {
                let mut paginator = PageNumberPagination::new(
                    *page_size,
                    JsonPathExpr::parse(total_available_path)?,
                );
                if let Some(path) = pagination_json_path {
                    paginator = paginator.with_pagination_path(JsonPathExpr::parse(path)?);
                }
                builder.paginator(paginator)
            }
            PaginationConfig::FullPage {
                page_size,
                page_param,
            } => builder.paginator(FullPagePagination::new(*page_size, page_param)),
        };

        if !self.skip_on_status.is_empty() {
            builder = builder.failure_handler(HttpFailureSkipOnStatus::new(
                self.skip_on_status.iter().copied(),
            ));
        }
        builder.build()
    }
}

/// Step params override chain-wide params field by field.
fn merge_params(chain: &RequestParams, step: &RequestParams) -> RequestParams {
    let mut merged = chain.clone();
    merged.headers.extend(step.headers.clone());
    merged.query.extend(step.query.iter().cloned());
    if step.basic_auth.is_some() {
        merged.basic_auth = step.basic_auth.clone();
    }
    if step.bearer_token.is_some() {
        merged.bearer_token = step.bearer_token.clone();
    }
    if step.timeout_ms.is_some() {
        merged.timeout_ms = step.timeout_ms;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: &str = r#"
        seed = [{ organization = "acme" }]

        [params.headers]
        Accept = "application/json"

        [retry]
        max_attempts = 2

        [[steps]]
        url = "http://localhost/api/{organization}/spaces"
        json_path = "_embedded.spaces[*].token"
        field_names = ["dashboard_group_id"]

        [[steps]]
        url = "http://localhost/api/{organization}/spaces/{dashboard_group_id}/reports"
        json_path = "(reports[*].token) | (reports[*].name)"
        field_names = ["dashboard_id", "dashboard_name"]
        json_path_contains_or = true
        on_empty = "skip"
        skip_on_status = [404]
        pagination = { type = "page_number", page_size = 5, pagination_json_path = "projects.project[*]" }

        [steps.params]
        bearer_token = "abc"
    "#;

    #[test]
    fn test_parse_chain() {
        let chain: RestApiChainConfig = toml::from_str(CHAIN).unwrap();
        assert_eq!(chain.seed.len(), 1);
        assert_eq!(chain.retry.max_attempts, 2);
        assert_eq!(chain.retry.initial_backoff_ms, 1000);
        assert_eq!(chain.steps.len(), 2);
        assert_eq!(chain.steps[0].on_empty, EmptyResultPolicy::PassThrough);
        assert_eq!(chain.steps[0].pagination, PaginationConfig::None);
        assert_eq!(chain.steps[1].on_empty, EmptyResultPolicy::Skip);
        assert_eq!(
            chain.steps[1].pagination,
            PaginationConfig::PageNumber {
                page_size: 5,
                total_available_path: "pagination.totalAvailable".into(),
                pagination_json_path: Some("projects.project[*]".into()),
            }
        );

        assert!(chain.build(&reqwest::Client::new()).is_ok());
    }

    #[test]
    fn test_merge_params() {
        let chain: RestApiChainConfig = toml::from_str(CHAIN).unwrap();
        let merged = merge_params(&chain.params, &chain.steps[1].params);
        assert_eq!(merged.headers["Accept"], "application/json");
        assert_eq!(merged.bearer_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_empty_chain_rejected() {
        let chain = RestApiChainConfig::default();
        assert!(matches!(
            chain.build(&reqwest::Client::new()),
            Err(RestApiError::Config { .. })
        ));
    }

    #[test]
    fn test_invalid_step_rejected() {
        let mut chain: RestApiChainConfig = toml::from_str(CHAIN).unwrap();
        chain.steps[0].json_path = "$.[[[".into();
        assert!(matches!(
            chain.build(&reqwest::Client::new()),
            Err(RestApiError::InvalidJsonPath { .. })
        ));
    }
}
