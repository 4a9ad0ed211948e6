//! Application configuration.
//!
//! [`Parameters`] is a flat key/value store with typed getters. Keys are plain strings, usually
//! dotted (`screen.width`), and values are JSON values so a whole configuration can be loaded
//! from a JSON object on disk.

use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, ErrorKind, Result};

/// Key holding the window title.
pub const WINDOW_TITLE: &str = "windowTitle";
/// Key holding the render width in pixels.
pub const SCREEN_WIDTH: &str = "screen.width";
/// Key holding the render height in pixels.
pub const SCREEN_HEIGHT: &str = "screen.height";
/// Key holding the fullscreen flag.
pub const SCREEN_FULLSCREEN: &str = "screen.isFullScreen";
/// Key holding the frame rate cap, `0` for unlimited.
pub const SCREEN_FPS_LIMIT: &str = "screen.fpsLimit";

/// A name to value mapping with typed accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: IndexMap<String, Value>,
}

impl Parameters {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a flat JSON object into a parameter list.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s)
            .map_err(|e| Error::new(ErrorKind::ConfigParse, e.to_string()))?;
        match value {
            Value::Object(map) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            other => Err(Error::new(
                ErrorKind::ConfigParse,
                format!("expected a JSON object of parameters, found {other}"),
            )),
        }
    }

    /// Reads and parses a JSON parameter file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::new(
                ErrorKind::FileLoad,
                format!("parameter file {} could not be read: {e}", path.display()),
            )
        })?;
        Self::from_json_str(&text)
    }

    /// Copies every entry of `other` over this list.
    pub fn merge(&mut self, other: Parameters) {
        self.values.extend(other.values);
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Sets a value only when the key is absent.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn raw(&self, key: &str) -> Result<&Value> {
        self.values.get(key).ok_or_else(|| {
            Error::new(
                ErrorKind::MissingParameter,
                format!("parameter `{key}` is not set"),
            )
        })
    }

    /// Deserializes the value stored under `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.raw(key)?;
        T::deserialize(value).map_err(|e| {
            Error::new(
                ErrorKind::InvalidParameter,
                format!("parameter `{key}` has an unexpected type: {e}"),
            )
        })
    }

    /// Like [`Parameters::get`], falling back to `default` when the key is absent.
    ///
    /// A present value of the wrong type is still an error.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        if self.contains(key) {
            self.get(key)
        } else {
            Ok(default)
        }
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.raw(key)?.as_str().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidParameter,
                format!("parameter `{key}` is not a string"),
            )
        })
    }

    pub fn get_i32(&self, key: &str) -> Result<i32> {
        self.get(key)
    }

    pub fn get_u32(&self, key: &str) -> Result<u32> {
        self.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.raw(key)?.as_bool().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidParameter,
                format!("parameter `{key}` is not a boolean"),
            )
        })
    }
}
