//! Core type definitions for the databuilder pipeline.
//!
//! Defines what crosses the extractor / transformer / loader boundary: plain
//! field maps before model binding, domain models after.

use serde_json::Value;

use crate::models::Model;

/// A plain field-keyed record.
pub type Record = serde_json::Map<String, Value>;

/// One unit of work flowing through a task.
#[derive(Debug, Clone)]
pub enum Payload {
    Record(Record),
    Model(Model),
}

impl Payload {
    /// Short description used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Record(_) => "record",
            Payload::Model(model) => model.name(),
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Payload::Record(record) => Some(record),
            Payload::Model(_) => None,
        }
    }

    pub fn into_model(self) -> Option<Model> {
        match self {
            Payload::Model(model) => Some(model),
            Payload::Record(_) => None,
        }
    }
}

impl From<Record> for Payload {
    fn from(record: Record) -> Self {
        Payload::Record(record)
    }
}

impl From<Model> for Payload {
    fn from(model: Model) -> Self {
        Payload::Model(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Badge, BadgeMetadata};
    use serde_json::json;

    #[test]
    fn test_payload_kind() {
        let record: Payload = json!({"a": 1}).as_object().unwrap().clone().into();
        assert_eq!(record.kind(), "record");
        assert!(record.as_record().is_some());
        assert!(record.into_model().is_none());

        let model: Payload = Model::from(BadgeMetadata::new(
            "Table",
            "k",
            vec![Badge::new("pk", "column")],
        ))
        .into();
        assert_eq!(model.kind(), "badge");
        assert!(model.into_model().is_some());
    }
}
