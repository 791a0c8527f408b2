//! Positional or named call arguments.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::{Page, DEFAULT_PAGE_LIMIT};

/// Arguments of one call, either by position or by name.
#[derive(Debug, Clone)]
pub enum Params {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Params {
    /// Wrap the raw `params` member. A missing member means no arguments.
    pub fn new(raw: Option<Value>) -> Result<Self, AppError> {
        match raw {
            None | Some(Value::Null) => Ok(Params::Positional(Vec::new())),
            Some(Value::Array(values)) => Ok(Params::Positional(values)),
            Some(Value::Object(map)) => Ok(Params::Named(map)),
            Some(other) => Err(AppError::InvalidParams(format!(
                "Invalid params: expected array or object, got {}",
                other
            ))),
        }
    }

    /// Reject arguments beyond the ones a method declares.
    pub fn check(&self, names: &[&str]) -> Result<(), AppError> {
        match self {
            Params::Positional(values) if values.len() > names.len() => {
                Err(AppError::InvalidParams(format!(
                    "Invalid params: expected at most {} arguments, got {}",
                    names.len(),
                    values.len()
                )))
            }
            Params::Named(map) => match map.keys().find(|k| !names.contains(&k.as_str())) {
                Some(unknown) => Err(AppError::InvalidParams(format!(
                    "Invalid params: unexpected argument {:?}",
                    unknown
                ))),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    fn raw(&self, index: usize, name: &str) -> Option<&Value> {
        match self {
            Params::Positional(values) => values.get(index),
            Params::Named(map) => map.get(name),
        }
    }

    /// Get a required argument.
    pub fn required<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, AppError> {
        let value = self
            .raw(index, name)
            .ok_or_else(|| AppError::InvalidParams(format!("Invalid params: missing {:?}", name)))?;
        decode(value, name)
    }

    /// Get an optional argument; missing and `null` both yield `None`.
    pub fn optional<T: DeserializeOwned>(
        &self,
        index: usize,
        name: &str,
    ) -> Result<Option<T>, AppError> {
        match self.raw(index, name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(value, name).map(Some),
        }
    }

    /// Read trailing `offset`/`limit` arguments starting at `index`.
    pub fn page(&self, index: usize) -> Result<Page, AppError> {
        let offset = self.optional::<u32>(index, "offset")?.unwrap_or(0);
        let limit = self
            .optional::<u32>(index + 1, "limit")?
            .unwrap_or(DEFAULT_PAGE_LIMIT);
        Ok(Page::new(offset, limit))
    }
}

fn decode<T: DeserializeOwned>(value: &Value, name: &str) -> Result<T, AppError> {
    T::deserialize(value).map_err(|e| {
        tracing::debug!(param = name, "Invalid params: {:?}", e);
        AppError::InvalidParams(format!("Invalid params: {}: {}", name, e))
    })
}
