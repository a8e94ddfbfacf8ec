use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError};
use tokio::sync::RwLock;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    /// Opens the shared connection and checks it answers before keeping it.
    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let mut manager = ConnectionManager::new(client).await?;
        cmd("PING").query_async::<_, String>(&mut manager).await?;
        *self.manager.write().await = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        self.manager.write().await.take();
    }

    /// Clone of the live connection, if connected. `ConnectionManager`
    /// multiplexes, so clones are cheap and share one socket.
    pub(crate) async fn manager(&self) -> Option<ConnectionManager> {
        self.manager.read().await.clone()
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let Some(mut manager) = self.manager().await else {
            return RedisHealth::Disconnected;
        };

        let mut ping_cmd = cmd("PING");
        let ping = ping_cmd.query_async::<_, String>(&mut manager);
        match tokio::time::timeout(HEALTH_TIMEOUT, ping).await {
            Ok(Ok(_)) => RedisHealth::Healthy,
            Ok(Err(err)) => RedisHealth::Unhealthy(err.to_string()),
            Err(_) => RedisHealth::Unhealthy(format!("no PING reply within {HEALTH_TIMEOUT:?}")),
        }
    }
}
