//! Interpretation of the server's accumulated stdout.

use serde_json::Value;
use tracing::debug;

/// What the bridge writes to stdout after a successful exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayResponse {
    /// The output parsed as a single JSON value.
    Structured(Value),
    /// The output did not parse; it is relayed byte for byte.
    Raw(Vec<u8>),
}

impl RelayResponse {
    /// Classify the server's stdout.
    ///
    /// Unparseable output is not an error: it falls back to [`Self::Raw`].
    pub fn from_output(output: Vec<u8>) -> Self {
        match serde_json::from_slice(&output) {
            Ok(value) => Self::Structured(value),
            Err(e) => {
                debug!(error = %e, len = output.len(), "Server output is not JSON, relaying raw");
                Self::Raw(output)
            }
        }
    }

    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Bytes to write to stdout: compact JSON plus newline, or the raw
    /// output unchanged.
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        match self {
            Self::Structured(value) => {
                let mut bytes = serde_json::to_vec(value)?;
                bytes.push(b'\n');
                Ok(bytes)
            }
            Self::Raw(raw) => Ok(raw.clone()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_output_is_reserialized_compactly() {
        let resp = RelayResponse::from_output(b"{ \"id\": 1,\n  \"result\": [] }\n".to_vec());
        assert_eq!(resp, RelayResponse::Structured(json!({"id": 1, "result": []})));
        assert_eq!(resp.to_bytes().unwrap(), b"{\"id\":1,\"result\":[]}\n");
    }

    #[test]
    fn plain_text_falls_back_to_raw() {
        let resp = RelayResponse::from_output(b"hello".to_vec());
        assert!(!resp.is_structured());
        assert_eq!(resp.to_bytes().unwrap(), b"hello");
    }

    #[test]
    fn multiple_json_lines_are_not_one_value() {
        let output = b"{\"a\":1}\n{\"b\":2}\n".to_vec();
        let resp = RelayResponse::from_output(output.clone());
        assert_eq!(resp, RelayResponse::Raw(output));
    }

    #[test]
    fn empty_output_is_raw() {
        let resp = RelayResponse::from_output(Vec::new());
        assert_eq!(resp.to_bytes().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn non_utf8_output_is_kept_verbatim() {
        let output = vec![0xff, 0xfe, b'x'];
        let resp = RelayResponse::from_output(output.clone());
        assert_eq!(resp.to_bytes().unwrap(), output);
    }
}
