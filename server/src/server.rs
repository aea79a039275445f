//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Top-level OSCAR server assembly

use crate::handler::OscarHandler;
use crate::services::ServiceContext;
use crate::store::{MemorySessionStore, MemoryUserDirectory, SessionStore, UserDirectory};
use crate::{OscarConfig, Result, SessionRegistry};
use oscarix_service::{Server, ServerConfig};
use std::net::SocketAddr;
use std::sync::Arc;

/// The assembled OSCAR server: substrate, protocol handler, and stores
///
/// # Example
///
/// ```no_run
/// use oscarix_server::{OscarConfig, OscarServer};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = OscarConfig::new("0.0.0.0:5190".parse()?).with_password("hunter2");
///     let server = OscarServer::new(config).await?;
///     server.start().await?;
///     // ... wait for a shutdown signal ...
///     server.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct OscarServer {
    inner: Server,
    handler: Arc<OscarHandler>,
    registry: Arc<SessionRegistry>,
}

impl OscarServer {
    /// Create a server with in-memory session and user stores
    pub async fn new(config: OscarConfig) -> Result<Self> {
        Self::with_stores(
            config,
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryUserDirectory::new()),
        )
        .await
    }

    /// Create a server over externally provided stores
    pub async fn with_stores(
        config: OscarConfig,
        session_store: Arc<dyn SessionStore>,
        user_directory: Arc<dyn UserDirectory>,
    ) -> Result<Self> {
        let server_config = ServerConfig::new(config.bind_address)
            .with_max_connections(config.max_connections)
            .with_idle_timeout(config.idle_timeout);
        let inner = Server::new(server_config).await?;

        let registry = Arc::new(SessionRegistry::new());
        let ctx = ServiceContext {
            registry: registry.clone(),
            session_store,
            user_directory,
            config,
        };
        let handler = Arc::new(OscarHandler::new(ctx));

        Ok(Self {
            inner,
            handler,
            registry,
        })
    }

    /// Start accepting connections
    pub async fn start(&self) -> Result<()> {
        self.inner.start(self.handler.clone()).await?;
        tracing::info!("OSCAR server listening on {}", self.inner.bind_address());
        Ok(())
    }

    /// Stop accepting connections and close every session
    pub async fn shutdown(&self) -> Result<()> {
        self.inner.shutdown().await?;
        Ok(())
    }

    /// Actual bound address (useful when binding port 0)
    pub fn bind_address(&self) -> SocketAddr {
        self.inner.bind_address()
    }

    /// The live session registry
    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }

    /// Number of open connections, signed on or not
    pub fn connection_count(&self) -> usize {
        self.inner.connection_count()
    }
}

impl std::fmt::Debug for OscarServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OscarServer")
            .field("bind_address", &self.bind_address())
            .field("sessions", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_lifecycle() {
        let config = OscarConfig::new("127.0.0.1:0".parse().unwrap());
        let server = OscarServer::new(config).await.unwrap();
        server.start().await.unwrap();
        assert_ne!(server.bind_address().port(), 0);
        assert!(server.registry().is_empty());
        server.shutdown().await.unwrap();
    }
}
