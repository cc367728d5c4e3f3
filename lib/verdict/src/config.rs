//! Transport settings.

use std::time::Duration;

/// Settings of the bundled hyper transport.
///
/// Set through [`crate::HyperClientBuilder`] or build one directly and pass it
/// to [`crate::HyperClient::with_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Upper bound for one exchange, from sending the request to the last body byte.
    pub timeout: Duration,
    /// Upper bound for establishing a connection.
    pub connect_timeout: Duration,
    /// How long an idle pooled connection is kept.
    pub pool_idle_timeout: Duration,
    /// Idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Present response header names as `Set-Cookie` rather than `set-cookie`.
    pub canonical_header_names: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            canonical_header_names: true,
        }
    }
}
