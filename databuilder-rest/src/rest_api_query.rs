//! A query that joins each inbound record with a REST endpoint.
//!
//! For every record of the inner query the URL template is rendered with the
//! record's fields, the endpoint is called (with retries) and the JSONPath is
//! evaluated against the response. Each match (or group of matches, one per
//! output field) produces a copy of the inbound record carrying the new
//! fields. All pages of an inbound record are drained before the inner query
//! is pulled again, so the join is depth-first.

use async_trait::async_trait;
use databuilder_core::Record;
use databuilder_core::template::render_template;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{Authenticator, NoAuth};
use crate::error::RestApiError;
use crate::failure::FailureHandler;
use crate::json_path::JsonPathExpr;
use crate::pagination::{NoPagination, Paginator};
use crate::query::RestQuery;
use crate::request::RequestParams;
use crate::retry::{RetryConfig, with_retry};

/// What to do with an inbound record when the JSONPath matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyResultPolicy {
    /// Emit a copy of the inbound record without new fields.
    #[default]
    PassThrough,
    /// Drop the inbound record.
    Skip,
    /// Abort the chain.
    Fail,
}

pub struct RestApiQuery {
    inner: Box<dyn RestQuery>,
    url_template: String,
    params: RequestParams,
    json_path: JsonPathExpr,
    field_names: Vec<String>,
    coalesce: bool,
    json_path_contains_or: bool,
    on_empty: EmptyResultPolicy,
    paginator: Box<dyn Paginator>,
    failure_handler: Option<Box<dyn FailureHandler>>,
    authenticator: Box<dyn Authenticator>,
    retry: RetryConfig,
    client: reqwest::Client,
    authenticated: bool,
    /// Inbound record with more pages to fetch.
    current: Option<Record>,
    pending: VecDeque<Record>,
}

impl RestApiQuery {
    pub fn builder(
        inner: Box<dyn RestQuery>,
        url_template: impl Into<String>,
        json_path: impl Into<String>,
        field_names: Vec<String>,
    ) -> RestApiQueryBuilder {
        RestApiQueryBuilder {
            inner,
            url_template: url_template.into(),
            json_path: json_path.into(),
            field_names,
            params: RequestParams::default(),
            coalesce: false,
            json_path_contains_or: false,
            on_empty: EmptyResultPolicy::default(),
            paginator: Box::new(NoPagination),
            failure_handler: None,
            authenticator: Box::new(NoAuth),
            retry: RetryConfig::default(),
            client: None,
        }
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Fetch the current page for `record` and queue its output records.
    /// Returns whether another page must be fetched for the same record.
    async fn fetch_page(&mut self, record: &Record) -> Result<bool, RestApiError> {
        let rendered = render_template(&self.url_template, record)?;
        let mut url = Url::parse(&rendered).map_err(|e| RestApiError::InvalidUrl {
            url: rendered.clone(),
            message: e.to_string(),
        })?;
        self.paginator.page_url(&mut url);
        let url = url.to_string();

        let (client, params) = (&self.client, &self.params);
        let response = match with_retry(&self.retry, || send(client, params, &url)).await {
            Ok(response) => response,
            Err(e) => {
                if self.failure_handler.as_ref().is_some_and(|h| h.can_skip(&e)) {
                    warn!(url = %url, error = %e, "Skipping record after request failure");
                    self.paginator.reset();
                    return Ok(false);
                }
                return Err(e);
            }
        };

        let results = self.json_path.find(&response);
        let rows = if results.is_empty() {
            warn!(
                url = %url,
                json_path = %self.json_path,
                response = %response,
                "No result from URL"
            );
            match self.on_empty {
                EmptyResultPolicy::Fail => {
                    return Err(RestApiError::NoResult {
                        url,
                        json_path: self.json_path.to_string(),
                    });
                }
                EmptyResultPolicy::Skip => {}
                EmptyResultPolicy::PassThrough => self.pending.push_back(record.clone()),
            }
            0
        } else if self.coalesce {
            let mut joined = record.clone();
            joined.insert(self.field_names[0].clone(), Value::Array(results));
            self.pending.push_back(joined);
            1
        } else {
            let sub_records =
                compute_sub_records(results, self.field_names.len(), self.json_path_contains_or)
                    .map_err(|message| RestApiError::InvalidResponse {
                        url: url.clone(),
                        message,
                    })?;
            let rows = sub_records.len();
            for values in sub_records {
                let mut joined = record.clone();
                for (name, value) in self.field_names.iter().zip(values) {
                    joined.insert(name.clone(), value);
                }
                self.pending.push_back(joined);
            }
            rows
        };

        Ok(self.paginator.advance(&response, rows))
    }
}

#[async_trait]
impl RestQuery for RestApiQuery {
    async fn next_record(&mut self) -> Result<Option<Record>, RestApiError> {
        if !self.authenticated {
            self.authenticator
                .authenticate(&self.client, &mut self.params)
                .await?;
            self.authenticated = true;
        }

        loop {
            if let Some(record) = self.pending.pop_front() {
                return Ok(Some(record));
            }

            let record = match self.current.take() {
                Some(record) => record,
                None => match self.inner.next_record().await? {
                    Some(record) => {
                        self.paginator.reset();
                        record
                    }
                    None => return Ok(None),
                },
            };

            if self.fetch_page(&record).await? {
                self.current = Some(record);
            }
        }
    }
}

async fn send(
    client: &reqwest::Client,
    params: &RequestParams,
    url: &str,
) -> Result<Value, RestApiError> {
    debug!(url, "Calling URL");
    let response = params
        .apply(client.get(url))
        .send()
        .await
        .map_err(|e| RestApiError::transport(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RestApiError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| RestApiError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        })
}

/// Group matched values into one value list per output record.
///
/// Without `contains_or`, consecutive chunks of `field_count` values form a
/// record (`[a1, b1, a2, b2]`). With it, the values come from a union of one
/// path per field and are grouped by stride (`[a1, a2, b1, b2]`).
pub fn compute_sub_records(
    results: Vec<Value>,
    field_count: usize,
    contains_or: bool,
) -> Result<Vec<Vec<Value>>, String> {
    if field_count == 0 {
        return Err("no output field names".to_string());
    }
    if results.len() % field_count != 0 {
        return Err(format!(
            "{} matched values cannot be split across {field_count} fields",
            results.len()
        ));
    }

    if !contains_or {
        let mut records = Vec::with_capacity(results.len() / field_count);
        let mut values = results.into_iter();
        loop {
            let chunk: Vec<Value> = values.by_ref().take(field_count).collect();
            if chunk.is_empty() {
                return Ok(records);
            }
            records.push(chunk);
        }
    }

    let stride = results.len() / field_count;
    Ok((0..stride)
        .map(|i| {
            (0..field_count)
                .map(|j| results[i + j * stride].clone())
                .collect()
        })
        .collect())
}

pub struct RestApiQueryBuilder {
    inner: Box<dyn RestQuery>,
    url_template: String,
    json_path: String,
    field_names: Vec<String>,
    params: RequestParams,
    coalesce: bool,
    json_path_contains_or: bool,
    on_empty: EmptyResultPolicy,
    paginator: Box<dyn Paginator>,
    failure_handler: Option<Box<dyn FailureHandler>>,
    authenticator: Box<dyn Authenticator>,
    retry: RetryConfig,
    client: Option<reqwest::Client>,
}

impl RestApiQueryBuilder {
    pub fn params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }

    /// Bind the whole match list to the single output field.
    pub fn coalesce(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }

    pub fn json_path_contains_or(mut self, contains_or: bool) -> Self {
        self.json_path_contains_or = contains_or;
        self
    }

    pub fn on_empty(mut self, policy: EmptyResultPolicy) -> Self {
        self.on_empty = policy;
        self
    }

    pub fn paginator(mut self, paginator: impl Paginator + 'static) -> Self {
        self.paginator = Box::new(paginator);
        self
    }

    pub fn failure_handler(mut self, handler: impl FailureHandler + 'static) -> Self {
        self.failure_handler = Some(Box::new(handler));
        self
    }

    pub fn authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Box::new(authenticator);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Share a client across the queries of a chain.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<RestApiQuery, RestApiError> {
        if self.field_names.is_empty() {
            return Err(RestApiError::Config {
                message: format!("query {:?} has no field names", self.url_template),
            });
        }
        if self.coalesce && self.field_names.len() > 1 {
            return Err(RestApiError::Config {
                message: "cannot have multiple fields performing coalesce".to_string(),
            });
        }
        let json_path = JsonPathExpr::parse(&self.json_path)?;

        Ok(RestApiQuery {
            inner: self.inner,
            url_template: self.url_template,
            params: self.params,
            json_path,
            field_names: self.field_names,
            coalesce: self.coalesce,
            json_path_contains_or: self.json_path_contains_or,
            on_empty: self.on_empty,
            paginator: self.paginator,
            failure_handler: self.failure_handler,
            authenticator: self.authenticator,
            retry: self.retry,
            client: self.client.unwrap_or_default(),
            authenticated: false,
            current: None,
            pending: VecDeque::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QuerySeed;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_sub_records_consecutive() {
        let results = vec![json!("q1"), json!("n1"), json!("q2"), json!("n2")];
        assert_eq!(
            compute_sub_records(results, 2, false).unwrap(),
            vec![vec![json!("q1"), json!("n1")], vec![json!("q2"), json!("n2")]]
        );
    }

    #[test]
    fn test_sub_records_stride() {
        let results = vec![
            json!("c1"),
            json!("c2"),
            json!("c3"),
            json!("u1"),
            json!("u2"),
            json!("u3"),
        ];
        assert_eq!(
            compute_sub_records(results, 2, true).unwrap(),
            vec![
                vec![json!("c1"), json!("u1")],
                vec![json!("c2"), json!("u2")],
                vec![json!("c3"), json!("u3")],
            ]
        );
    }

    #[test]
    fn test_sub_records_uneven() {
        assert!(compute_sub_records(vec![json!(1), json!(2), json!(3)], 2, false).is_err());
        assert!(compute_sub_records(vec![json!(1)], 0, false).is_err());
    }

    #[test]
    fn test_builder_validation() {
        let seed = || Box::new(QuerySeed::empty_record()) as Box<dyn RestQuery>;

        let coalesce_many = RestApiQuery::builder(
            seed(),
            "http://localhost/a",
            "items[*]",
            vec!["a".into(), "b".into()],
        )
        .coalesce(true)
        .build();
        assert!(matches!(coalesce_many, Err(RestApiError::Config { .. })));

        let no_fields =
            RestApiQuery::builder(seed(), "http://localhost/a", "items[*]", vec![]).build();
        assert!(matches!(no_fields, Err(RestApiError::Config { .. })));

        let bad_path =
            RestApiQuery::builder(seed(), "http://localhost/a", "$.[[[", vec!["a".into()]).build();
        assert!(matches!(bad_path, Err(RestApiError::InvalidJsonPath { .. })));
    }

    #[tokio::test]
    async fn test_missing_template_field_aborts() {
        let mut query = RestApiQuery::builder(
            Box::new(QuerySeed::empty_record()),
            "http://localhost/spaces/{space_id}",
            "items[*]",
            vec!["item".into()],
        )
        .build()
        .unwrap();
        assert!(matches!(
            query.next_record().await,
            Err(RestApiError::Template(_))
        ));
    }
}
