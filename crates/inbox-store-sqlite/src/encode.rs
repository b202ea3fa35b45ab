//! Encoding helpers between stored records and the JSON text column.

use inbox_core::store::Keyed;

use crate::Result;

pub fn encode_value<V: Keyed>(value: &V) -> Result<String> { Ok(serde_json::to_string(value)?) }

pub fn decode_value<V: Keyed>(s: &str) -> Result<V> { Ok(serde_json::from_str(s)?) }

/// Raw strings read directly from a partition row.
pub struct RawRow {
  pub key:        String,
  pub value_json: String,
}

impl RawRow {
  pub fn decode<V: Keyed>(self) -> Result<V> {
    decode_value(&self.value_json).inspect_err(|e| {
      tracing::warn!(key = %self.key, error = %e, "skipping undecodable row");
    })
  }
}
