//! Measure item serialization
//!
//! JSON is the only wire format: charting clients import the item list as a
//! JSON array.

use std::io::{Read, Write};

use crate::model::MeasureItem;

/// Errors that can occur during serialization
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON serializer for measure items
#[derive(Debug, Default, Clone)]
pub struct JsonSerializer {
    /// Whether to produce pretty-printed output
    pub pretty: bool,
}

impl JsonSerializer {
    /// Create a new JSON serializer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new JSON serializer with pretty-printing enabled
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Serialize a list of items to a JSON array
    pub fn serialize(&self, items: &[MeasureItem]) -> Result<String, SerializeError> {
        let out = if self.pretty {
            serde_json::to_string_pretty(items)?
        } else {
            serde_json::to_string(items)?
        };
        Ok(out)
    }

    /// Serialize a list of items to a writer
    pub fn serialize_to_writer<W: Write>(
        &self,
        items: &[MeasureItem],
        mut writer: W,
    ) -> Result<(), SerializeError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, items)?;
        } else {
            serde_json::to_writer(&mut writer, items)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Deserialize a JSON array of items
    pub fn deserialize(&self, input: &str) -> Result<Vec<MeasureItem>, SerializeError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Deserialize a JSON array of items from a reader
    pub fn deserialize_from_reader<R: Read>(&self, reader: R) -> Result<Vec<MeasureItem>, SerializeError> {
        Ok(serde_json::from_reader(reader)?)
    }
}
