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

//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration
///
/// # Example
///
/// ```
/// use oscarix_service::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::new("127.0.0.1:5190".parse().unwrap())
///     .with_max_connections(500)
///     .with_idle_timeout(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections
    pub max_connections: usize,

    /// Timeout for idle connections (no activity in either direction)
    pub idle_timeout: Duration,

    /// Timeout for read operations
    pub read_timeout: Duration,

    /// Timeout for write operations
    pub write_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5190".parse().expect("valid default address"),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(600),
            read_timeout: Duration::from_secs(300),
            write_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Create a configuration bound to the given address
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Self::default()
        }
    }

    /// Set the maximum number of concurrent connections
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.port(), 5190);
        assert_eq!(config.max_connections, 1000);
    }

    #[test]
    fn test_builder_methods() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap())
            .with_max_connections(10)
            .with_idle_timeout(Duration::from_secs(5))
            .with_read_timeout(Duration::from_secs(1))
            .with_write_timeout(Duration::from_secs(2));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.idle_timeout, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(1));
        assert_eq!(config.write_timeout, Duration::from_secs(2));
    }
}
