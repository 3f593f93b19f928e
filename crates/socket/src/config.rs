use std::fmt::Debug;

/// Builder for [`SocketConfig`].
#[derive(Clone, PartialEq, Eq)]
pub struct SocketConfigBuilder {
    url: String,
    token: Option<String>,
}

impl SocketConfigBuilder {
    /// Creates a builder with the channel endpoint URL
    /// (`ws://` or `wss://`).
    #[inline]
    pub fn with_url<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            token: None,
        }
    }

    /// Sets the bearer token presented during the handshake.
    #[inline]
    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> SocketConfig {
        SocketConfig {
            url: self.url,
            token: self.token,
        }
    }
}

impl Debug for SocketConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketConfigBuilder")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Configuration for the WebSocket event channel.
#[derive(Clone, PartialEq, Eq)]
pub struct SocketConfig {
    url: String,
    token: Option<String>,
}

impl SocketConfig {
    #[inline]
    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl Debug for SocketConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}
