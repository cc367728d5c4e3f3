//! Pipeline configuration types.

/// Header scanned for a cookie on successful responses.
pub const DEFAULT_COOKIE_HEADER: &str = "Set-Cookie";

/// Message fragments that turn a failed exchange into a `400` HTTP error.
///
/// The first two match a body cut short: `Error::Truncated` from the bundled
/// transport, and `std::io::ErrorKind::UnexpectedEof` from any other one. The
/// last matches the status line of a rejected request.
pub const DEFAULT_BAD_REQUEST_MARKERS: [&str; 3] =
    ["truncated response", "unexpected end of file", "400 Bad Request"];

/// Configuration for the completion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Name of the response header republished to the cookie store.
    pub cookie_header: String,
    /// Whether cookie extraction runs at all.
    pub extract_cookies: bool,
    /// Failure-message fragments classified as a `400` HTTP error.
    pub bad_request_markers: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cookie_header: DEFAULT_COOKIE_HEADER.to_string(),
            extract_cookies: true,
            bad_request_markers: DEFAULT_BAD_REQUEST_MARKERS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    cookie_header: Option<String>,
    extract_cookies: Option<bool>,
    bad_request_markers: Option<Vec<String>>,
}

impl PipelineConfigBuilder {
    /// Set the cookie header name (matched exactly, case-sensitive).
    #[must_use]
    pub fn cookie_header(mut self, name: impl Into<String>) -> Self {
        self.cookie_header = Some(name.into());
        self
    }

    /// Enable or disable cookie extraction.
    #[must_use]
    pub const fn extract_cookies(mut self, enabled: bool) -> Self {
        self.extract_cookies = Some(enabled);
        self
    }

    /// Replace the bad-request markers.
    #[must_use]
    pub fn bad_request_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bad_request_markers = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            cookie_header: self.cookie_header.unwrap_or(defaults.cookie_header),
            extract_cookies: self.extract_cookies.unwrap_or(defaults.extract_cookies),
            bad_request_markers: self
                .bad_request_markers
                .unwrap_or(defaults.bad_request_markers),
        }
    }
}
