//! Connection builder
//!
//! [`Client`] bundles a host with dial options, for callers that open more
//! than one connection with the same settings.

use crate::config::DialConfig;
use crate::conn::{dial_with_config, Conn};
use std::time::Duration;
use wsconn_core::{Host, Result};

/// Opens connections through a host with a fixed configuration
#[derive(Debug, Clone)]
pub struct Client<H> {
    /// Host used to create transports
    host: H,
    /// Dial configuration
    config: DialConfig,
}

impl<H: Host> Client<H> {
    /// Create a new client with the default configuration
    pub fn new(host: H) -> Self {
        Self {
            host,
            config: DialConfig::default(),
        }
    }

    /// Set the dial configuration
    pub fn with_config(mut self, config: DialConfig) -> Self {
        self.config = config;
        self
    }

    /// Offer a subprotocol
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.config = self.config.add_protocol(protocol);
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Current configuration
    pub fn config(&self) -> &DialConfig {
        &self.config
    }

    /// The host connections are created through
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Open a connection and wait for it to be established
    pub fn connect(&self, url: &str) -> Result<Conn<H::Socket>> {
        dial_with_config(&self.host, url, &self.config)
    }
}
