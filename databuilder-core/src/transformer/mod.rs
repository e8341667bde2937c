//! Record and model transformers.

pub mod chained;
pub mod dict_to_model;
pub mod template_variable;
pub mod timestamp;

pub use chained::ChainedTransformer;
pub use dict_to_model::{DictToModel, DictToModelConfig};
pub use template_variable::{TemplateVariableConfig, TemplateVariableSubstitution};
pub use timestamp::{TimestampStringToEpoch, TimestampStringToEpochConfig};

use crate::error::TransformError;
use crate::types::{Payload, Record};

/// Unwrap a record payload or report that `scope` only handles records.
pub(crate) fn expect_record(scope: &str, payload: Payload) -> Result<Record, TransformError> {
    match payload {
        Payload::Record(record) => Ok(record),
        other => Err(TransformError::UnsupportedPayload {
            scope: scope.to_string(),
            payload: other.kind().to_string(),
        }),
    }
}
