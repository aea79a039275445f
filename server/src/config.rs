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

//! OSCAR server configuration

use oscarix_flapcodec::consts::DEFAULT_PORT;
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the OSCAR server
///
/// # Example
///
/// ```
/// use oscarix_server::OscarConfig;
///
/// let config = OscarConfig::new("0.0.0.0:5190".parse().unwrap())
///     .with_password("hunter2")
///     .with_bos_address("aim.example.net:5190");
/// ```
#[derive(Debug, Clone)]
pub struct OscarConfig {
    /// Address the listener binds to
    pub bind_address: SocketAddr,
    /// Address handed to authenticated clients in the BOS TLV
    ///
    /// For a single-host deployment this is the same host and port the
    /// server itself listens on; clients reconnect here with their cookie.
    pub bos_address: String,
    /// Shared password every screen name authenticates with
    pub password: String,
    /// URL placed in the error TLV on failed logins
    pub error_url: String,
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Idle timeout before a connection is dropped
    pub idle_timeout: Duration,
}

impl OscarConfig {
    /// Create a configuration with defaults for everything but the bind address
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            bos_address: format!("127.0.0.1:{DEFAULT_PORT}"),
            password: "welcome1".to_string(),
            error_url: "https://aim.example.net/login-help".to_string(),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(600),
        }
    }

    /// Set the BOS address handed out after authentication
    pub fn with_bos_address(mut self, bos_address: impl Into<String>) -> Self {
        self.bos_address = bos_address.into();
        self
    }

    /// Set the shared authentication password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the login failure help URL
    pub fn with_error_url(mut self, error_url: impl Into<String>) -> Self {
        self.error_url = error_url.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}

impl Default for OscarConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OscarConfig::default();
        assert_eq!(config.bind_address.port(), 5190);
        assert_eq!(config.max_connections, 1000);
    }

    #[test]
    fn test_builder_methods() {
        let config = OscarConfig::new("127.0.0.1:0".parse().unwrap())
            .with_password("secret")
            .with_bos_address("bos.example.net:5190")
            .with_max_connections(10);

        assert_eq!(config.password, "secret");
        assert_eq!(config.bos_address, "bos.example.net:5190");
        assert_eq!(config.max_connections, 10);
    }
}
