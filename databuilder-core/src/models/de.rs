//! Lenient field decoding shared by every model.
//!
//! Records arrive from CSV files (everything is a string) and from JSON APIs
//! (ids are often numbers), so scalar fields accept either representation.

use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ModelError;
use crate::types::Record;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Str(s) => s,
        }
    }

    fn into_i64<E: Error>(self) -> Result<i64, E> {
        match self {
            Scalar::Int(i) => Ok(i),
            Scalar::Float(f) if f.fract() == 0.0 => Ok(f as i64),
            Scalar::Str(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| E::custom(format!("expected an integer, got {s:?}: {e}"))),
            Scalar::Float(f) => Err(E::custom(format!("expected an integer, got {f}"))),
            Scalar::Bool(b) => Err(E::custom(format!("expected an integer, got {b}"))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrString {
    List(Vec<Scalar>),
    Str(String),
}

/// Bind a record to a model's field struct.
pub fn from_record<T: DeserializeOwned>(model: &str, record: &Record) -> Result<T, ModelError> {
    serde_json::from_value(Value::Object(record.clone())).map_err(|e| ModelError::InvalidRecord {
        model: model.to_string(),
        message: e.to_string(),
    })
}

pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Scalar::deserialize(d).map(Scalar::into_string)
}

pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?
        .map(Scalar::into_string)
        .filter(|s| !s.is_empty()))
}

pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Scalar::deserialize(d)?.into_i64()
}

pub fn opt_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        None => Ok(None),
        Some(Scalar::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(scalar) => scalar.into_i64().map(Some),
    }
}

/// A JSON array, or a comma separated string. Empty items are dropped.
pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let items = match Option::<ListOrString>::deserialize(d)? {
        None => Vec::new(),
        Some(ListOrString::List(items)) => items.into_iter().map(Scalar::into_string).collect(),
        Some(ListOrString::Str(s)) => s.split(',').map(|item| item.trim().to_string()).collect(),
    };
    Ok(items.into_iter().filter(|item| !item.is_empty()).collect())
}
