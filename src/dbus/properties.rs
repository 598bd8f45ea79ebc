//! Normalized property bags returned by Properties.GetAll

use std::collections::HashMap;

use super::BusError;

/// A property value reduced to the shapes systemd actually returns for the
/// properties we read
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Str(String),
    Bool(bool),
    I32(i32),
    U32(u32),
    U64(u64),
    StrList(Vec<String>),
    /// Anything else (structs, dicts, object paths)
    Other,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: HashMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    fn require(&self, key: &str) -> Result<&PropertyValue, BusError> {
        self.values
            .get(key)
            .ok_or_else(|| BusError::PropertyMissing(key.to_string()))
    }

    fn mismatch(key: &str, expected: &str) -> BusError {
        BusError::PropertyMissing(format!("{} (expected {})", key, expected))
    }

    pub fn string(&self, key: &str) -> Result<&str, BusError> {
        match self.require(key)? {
            PropertyValue::Str(s) => Ok(s),
            _ => Err(Self::mismatch(key, "string")),
        }
    }

    /// Signed integer; accepts u32 values that fit
    pub fn i32(&self, key: &str) -> Result<i32, BusError> {
        match self.require(key)? {
            PropertyValue::I32(n) => Ok(*n),
            PropertyValue::U32(n) => i32::try_from(*n).map_err(|_| Self::mismatch(key, "i32")),
            _ => Err(Self::mismatch(key, "i32")),
        }
    }

    pub fn u64(&self, key: &str) -> Result<u64, BusError> {
        match self.require(key)? {
            PropertyValue::U64(n) => Ok(*n),
            PropertyValue::U32(n) => Ok(u64::from(*n)),
            _ => Err(Self::mismatch(key, "u64")),
        }
    }

    pub fn string_list(&self, key: &str) -> Result<&[String], BusError> {
        match self.require(key)? {
            PropertyValue::StrList(items) => Ok(items),
            _ => Err(Self::mismatch(key, "string array")),
        }
    }
}

impl FromIterator<(String, PropertyValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
