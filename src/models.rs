use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Client request body for POST /download
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: Option<String>,
    // forwarded as written, only a missing flag means true
    #[serde(default = "default_stream")]
    pub stream: Value,
}

fn default_stream() -> Value {
    Value::Bool(true)
}

impl DownloadRequest {
    /// Text of the `stream` query parameter sent upstream.
    pub fn stream_param(&self) -> String {
        match &self.stream {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

// Whatever the extraction API sends back
pub type UpstreamResult = Map<String, Value>;

// Success envelope
#[derive(Serialize, Debug)]
pub struct DownloadResponse {
    pub success: bool,
    pub data: Value,
}

// Failure envelope
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_defaults_to_true() {
        let req: DownloadRequest =
            serde_json::from_str(r#"{"url":"https://youtu.be/x"}"#).unwrap();
        assert_eq!(req.stream_param(), "true");
        assert_eq!(req.url.as_deref(), Some("https://youtu.be/x"));

        let req: DownloadRequest = serde_json::from_str(r#"{"stream":false}"#).unwrap();
        assert_eq!(req.stream_param(), "false");
        assert!(req.url.is_none());
    }

    #[test]
    fn non_boolean_stream_is_forwarded_as_text() {
        let cases = [
            (r#"{"url":"u","stream":"false"}"#, "false"),
            (r#"{"url":"u","stream":null}"#, "null"),
            (r#"{"url":"u","stream":1}"#, "1"),
        ];
        for (body, expected) in cases {
            let req: DownloadRequest = serde_json::from_str(body).unwrap();
            assert_eq!(req.stream_param(), expected, "{body}");
        }
    }
}
