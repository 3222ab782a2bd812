// HTTP client utilities
use crate::domain::error::DishqError;
use reqwest::Client;

/// Create the shared HTTP client. Used for Places lookups, oracle calls and
/// PDF downloads. The client-wide timeout is the hard deadline for every
/// request; the oracle overrides it per request for large PDF payloads, and
/// navigations carry their own configured deadline on top.
pub fn create_client() -> Result<Client, DishqError> {
    Ok(Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(std::time::Duration::from_secs(60))
        .user_agent("dishq/0.1.0")
        .build()?)
}
