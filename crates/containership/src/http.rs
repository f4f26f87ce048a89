// crates/containership/src/http.rs
// Shared HTTP client for all analysis service calls

use std::time::Duration;

/// Default request timeout (5 minutes; analysis streams are slow)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the shared HTTP client.
///
/// Created once per process and handed to the transport. No retry layer:
/// each request is attempted once and failures propagate.
pub fn create_shared_client(request_timeout: Duration, connect_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .pool_max_idle_per_host(4)
        .user_agent(concat!("containership/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_shared_client() {
        let client = create_shared_client(DEFAULT_TIMEOUT, CONNECT_TIMEOUT);
        drop(client);
    }

    #[test]
    fn test_timeout_values() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(300));
        assert_eq!(CONNECT_TIMEOUT, Duration::from_secs(30));
    }
}
