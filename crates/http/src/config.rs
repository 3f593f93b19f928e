use std::fmt::Debug;

/// Builder for [`HttpConfig`].
#[derive(Clone, PartialEq, Eq)]
pub struct HttpConfigBuilder {
    base_url: String,
    token: Option<String>,
}

impl HttpConfigBuilder {
    /// Creates a builder with the service base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Sets the bearer token sent with every request.
    #[inline]
    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HttpConfig {
        HttpConfig {
            base_url: self.base_url.trim_end_matches('/').to_owned(),
            token: self.token,
        }
    }
}

impl Debug for HttpConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfigBuilder")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Configuration for the chat service endpoints.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}
