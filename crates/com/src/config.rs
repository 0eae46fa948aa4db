use {crate::ComError, std::time::Duration};

pub const DEFAULT_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PATH: &str = "/socket.io/";
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub url: String,
    pub path: String,
    pub handshake_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: DEFAULT_PATH.to_string(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_handshake_timeout(mut self, handshake_timeout: Duration) -> Self {
        self.handshake_timeout = handshake_timeout;
        self
    }

    /// The Engine.IO WebSocket endpoint for this server.
    ///
    /// `http://` and `ws://` both map onto plain `ws://`; TLS is not built in.
    pub fn endpoint_uri(&self) -> Result<http::Uri, ComError> {
        let uri: http::Uri = self
            .url
            .parse()
            .map_err(|e| ComError::InvalidUrl(format!("{}: {e}", self.url)))?;
        match uri.scheme_str() {
            Some("http") | Some("ws") => {}
            Some(scheme @ ("https" | "wss")) => {
                return Err(ComError::InvalidUrl(format!(
                    "{scheme}:// needs TLS, which this client does not support"
                )));
            }
            Some(scheme) => {
                return Err(ComError::InvalidUrl(format!("unsupported scheme {scheme}")));
            }
            None => return Err(ComError::InvalidUrl(format!("{}: missing scheme", self.url))),
        }
        let authority = uri
            .authority()
            .ok_or_else(|| ComError::InvalidUrl(format!("{}: missing host", self.url)))?;
        // a path would name a namespace; only the default one is spoken
        if !matches!(uri.path(), "" | "/") {
            return Err(ComError::InvalidUrl(format!(
                "{}: unexpected path {}, set the endpoint path with with_path",
                self.url,
                uri.path()
            )));
        }

        let mut path = self.path.clone();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        if !path.ends_with('/') {
            path.push('/');
        }
        format!("ws://{authority}{path}?EIO=4&transport=websocket")
            .parse()
            .map_err(|e| ComError::InvalidUrl(format!("{}: {e}", self.url)))
    }
}
