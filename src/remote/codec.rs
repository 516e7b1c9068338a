//! Value marshalling for remote tiers that store strings

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Turns values into the string form a remote tier stores, and back
pub trait ValueCodec<V>: Send + Sync {
    fn encode(&self, value: &V) -> Result<String>;
    fn decode(&self, raw: &str) -> Result<V>;
}

/// JSON via `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<V> ValueCodec<V> for JsonCodec
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(&self, raw: &str) -> Result<V> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Strings stored as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl ValueCodec<String> for StringCodec {
    fn encode(&self, value: &String) -> Result<String> {
        Ok(value.clone())
    }

    fn decode(&self, raw: &str) -> Result<String> {
        Ok(raw.to_string())
    }
}
