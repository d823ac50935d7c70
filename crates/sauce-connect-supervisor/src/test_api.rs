//! In-process fake of the tunnel API for unit tests

use crate::api::TunnelApi;
use async_trait::async_trait;
use sauce_connect_rest::{RestError, TunnelId};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Fake `TunnelApi` fed with scripted listing responses.
///
/// Scripted responses are consumed front-to-back; once exhausted, every
/// further listing returns `fallback`. Deletions always succeed.
pub(crate) struct FakeApi {
    responses: Mutex<VecDeque<Result<Vec<TunnelId>, RestError>>>,
    fallback: Vec<TunnelId>,
}

impl FakeApi {
    pub(crate) fn with_fallback(fallback: &[&str]) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: ids(fallback),
        }
    }

    pub(crate) fn script_listing(self, tunnels: &[&str]) -> Self {
        self.responses.lock().unwrap().push_back(Ok(ids(tunnels)));
        self
    }

    pub(crate) fn script_failure(self, error: RestError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }
}

#[async_trait]
impl TunnelApi for FakeApi {
    async fn list_tunnels(&self) -> Result<Vec<TunnelId>, RestError> {
        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(self.fallback.clone()),
        }
    }

    async fn delete_tunnel(&self, _tunnel: &TunnelId) -> Result<(), RestError> {
        Ok(())
    }
}

pub(crate) fn ids(raw: &[&str]) -> Vec<TunnelId> {
    raw.iter().map(|id| TunnelId::from(*id)).collect()
}
