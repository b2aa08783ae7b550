//! The sandbox's stdio wire shape (§4.2, §6): line-delimited, UTF-8 JSON,
//! one request envelope per line in, one bare response object per line out.

use serde::{Deserialize, Serialize};

/// A request envelope: `{ "type": T, "payload": P }`. The enum's
/// `#[serde(tag, content)]` representation produces exactly that shape, and
/// each variant's field names are already camelCase (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum Request {
    #[serde(rename = "compile")]
    Compile { code: String },
    #[serde(rename = "state")]
    State { state: String },
    #[serde(rename = "execute")]
    Execute { inputs: Vec<String>, state: String },
    #[serde(rename = "shutdown")]
    Shutdown {},
}

/// A bare response object. One struct models all four response shapes in
/// §4.2's table; fields left `None` are omitted from the serialized JSON
/// rather than written as `null` (§4.2: "omits null-valued writes").
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl Response {
    #[must_use]
    pub fn compiled(session_id: impl Into<String>) -> Self {
        Self {
            success: true,
            session_id: Some(session_id.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn state_ok(state: impl Into<String>) -> Self {
        Self {
            success: true,
            state: Some(state.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn executed(result: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            state: Some(state.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Decodes a line received over the wire. Per §4.2, CR is ignored — callers
/// read with `read_line` (which keeps the trailing LF, and on Windows-style
/// input a preceding CR) and pass the raw line here.
pub fn decode_line<T: for<'de> Deserialize<'de>>(line: &str) -> serde_json::Result<T> {
    serde_json::from_str(line.trim_end_matches(['\n', '\r']))
}

/// Encodes `value` as a single LF-terminated JSON line ready to write to a
/// pipe.
pub fn encode_line<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    Ok(line)
}
