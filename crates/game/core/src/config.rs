//! Per-session settings and typed accessors.
//!
//! Settings arrive from the session catalog as an untyped JSON object. Games
//! read the keys they understand through the typed accessors below, which
//! report a [`RulesError::InvalidSetting`] for values of the wrong shape and
//! fall back to defaults for missing or `null` keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RulesError;

/// Settings map attached to a session record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly useful for tests and seed files.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns the first key of `keys` that is present, with its value.
    ///
    /// Earlier keys win, so callers list the canonical name first and legacy
    /// aliases after it.
    fn lookup<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, &Value)> {
        keys.iter()
            .find_map(|key| self.get(key).map(|value| (*key, value)))
    }

    /// Reads a number under any of `keys`.
    pub fn number(&self, keys: &[&str]) -> Result<Option<f64>, RulesError> {
        match self.lookup(keys) {
            None => Ok(None),
            Some((key, value)) => value
                .as_f64()
                .filter(|number| number.is_finite())
                .map(Some)
                .ok_or_else(|| RulesError::invalid_setting(key, format!("expected a number, got {value}"))),
        }
    }

    /// Reads a whole number under any of `keys`.
    ///
    /// Floats with no fractional part are accepted since JSON producers are
    /// not always careful to emit integers.
    pub fn integer(&self, keys: &[&str]) -> Result<Option<i64>, RulesError> {
        match self.lookup(keys) {
            None => Ok(None),
            Some((key, value)) => {
                if let Some(int) = value.as_i64() {
                    return Ok(Some(int));
                }
                match value.as_f64() {
                    Some(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => {
                        Ok(Some(float as i64))
                    }
                    _ => Err(RulesError::invalid_setting(
                        key,
                        format!("expected an integer, got {value}"),
                    )),
                }
            }
        }
    }

    pub fn f64_or(&self, keys: &[&str], default: f64) -> Result<f64, RulesError> {
        Ok(self.number(keys)?.unwrap_or(default))
    }

    pub fn i64_or(&self, keys: &[&str], default: i64) -> Result<i64, RulesError> {
        Ok(self.integer(keys)?.unwrap_or(default))
    }

    pub fn u32_or(&self, keys: &[&str], default: u32) -> Result<u32, RulesError> {
        match self.integer(keys)? {
            None => Ok(default),
            Some(value) => u32::try_from(value).map_err(|_| {
                RulesError::invalid_setting(keys[0], format!("{value} is out of range"))
            }),
        }
    }

    pub fn u64_opt(&self, keys: &[&str]) -> Result<Option<u64>, RulesError> {
        match self.integer(keys)? {
            None => Ok(None),
            Some(value) => u64::try_from(value).map(Some).map_err(|_| {
                RulesError::invalid_setting(keys[0], format!("{value} must not be negative"))
            }),
        }
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
