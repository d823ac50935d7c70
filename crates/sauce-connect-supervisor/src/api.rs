//! Seam between the supervisor and the remote tunnel API

use async_trait::async_trait;
use sauce_connect_rest::{RestError, SauceRestClient, TunnelId};

/// Remote tunnel operations the supervisor depends on.
///
/// `SauceRestClient` is the production implementation; tests drive the
/// supervisor with in-process fakes.
#[async_trait]
pub trait TunnelApi: Send + Sync {
    /// Snapshot of the tunnel ids currently live for the account, in the
    /// order the API reported them.
    async fn list_tunnels(&self) -> Result<Vec<TunnelId>, RestError>;

    /// Delete a tunnel.
    async fn delete_tunnel(&self, tunnel: &TunnelId) -> Result<(), RestError>;
}

#[async_trait]
impl TunnelApi for SauceRestClient {
    async fn list_tunnels(&self) -> Result<Vec<TunnelId>, RestError> {
        SauceRestClient::list_tunnels(self).await
    }

    async fn delete_tunnel(&self, tunnel: &TunnelId) -> Result<(), RestError> {
        SauceRestClient::delete_tunnel(self, tunnel).await
    }
}
