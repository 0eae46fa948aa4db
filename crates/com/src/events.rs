use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

pub const IMAGE_EVENT: &str = "image";
pub const TEST_CONNECTION_EVENT: &str = "test_connection";
pub const PROCESSED_IMAGE_EVENT: &str = "processed_image";
pub const ERROR_EVENT: &str = "error";
pub const PROBE_RESPONSE_EVENT: &str = "python_test_response";

/// One encoded camera frame, sent as the `image` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePayload {
    pub image: String,
}

impl FramePayload {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }
}

/// Body measurements as reported by the processor.
///
/// Values are display strings (`"95.0 cm"`, `"Not detected"`) and are never
/// parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(default)]
    pub chest: String,
    #[serde(default)]
    pub waist: String,
    #[serde(default)]
    pub hip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedResult {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub measurements: Measurements,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Everything the channel reports.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Connected { sid: String },
    Disconnected { reason: String },
    ProcessedImage(ProcessedResult),
    Error(RemoteError),
    ProbeResponse(ProbeResponse),
}

impl ServerEvent {
    /// Map a Socket.IO event onto a [`ServerEvent`].
    ///
    /// Returns `None` for events the client does not know. A `processed_image`
    /// that cannot be read still produces an event (an `Error`), so whoever is
    /// waiting on a result is released either way.
    pub fn from_event(name: &str, args: &[Value]) -> Option<Self> {
        let data = args.first().cloned().unwrap_or(Value::Null);
        match name {
            PROCESSED_IMAGE_EVENT => Some(
                match serde_json::from_value::<ProcessedResult>(data) {
                    Ok(result) => ServerEvent::ProcessedImage(result),
                    Err(error) => ServerEvent::Error(RemoteError {
                        message: format!("malformed {PROCESSED_IMAGE_EVENT}: {error}"),
                    }),
                },
            ),
            ERROR_EVENT => Some(ServerEvent::Error(
                serde_json::from_value(data.clone()).unwrap_or_else(|_| RemoteError {
                    message: data.to_string(),
                }),
            )),
            PROBE_RESPONSE_EVENT => serde_json::from_value(data)
                .ok()
                .map(ServerEvent::ProbeResponse),
            _ => None,
        }
    }
}
