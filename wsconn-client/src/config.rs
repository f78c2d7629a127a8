//! Dial configuration
//!
//! This module provides the options accepted when opening a connection.

use std::time::Duration;
use wsconn_core::error::ConfigError;
use wsconn_core::Error;

/// Options for opening a connection
#[derive(Debug, Clone, Default)]
pub struct DialConfig {
    /// Subprotocols offered to the server, in order of preference
    pub protocols: Vec<String>,
    /// Give up if the connection has not opened within this duration.
    /// `None` waits for as long as the host takes to decide.
    pub connect_timeout: Option<Duration>,
}

impl DialConfig {
    /// Validate the configuration
    pub fn validate(&self) -> wsconn_core::Result<()> {
        if let Some(timeout) = self.connect_timeout {
            if timeout.is_zero() {
                return Err(Error::Config(ConfigError::Validation(
                    "connect_timeout must be greater than 0".to_string(),
                )));
            }
        }

        for (i, protocol) in self.protocols.iter().enumerate() {
            if protocol.is_empty() {
                return Err(Error::Config(ConfigError::InvalidValue {
                    field: "protocols".to_string(),
                    value: "\"\"".to_string(),
                }));
            }
            if self.protocols[..i].contains(protocol) {
                return Err(Error::Config(ConfigError::InvalidValue {
                    field: "protocols".to_string(),
                    value: format!("{protocol} (duplicate)"),
                }));
            }
        }

        Ok(())
    }

    /// Offer a subprotocol
    pub fn add_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocols.push(protocol.into());
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_config_default() {
        let config = DialConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.protocols.is_empty());
        assert_eq!(config.connect_timeout, None);
    }

    #[test]
    fn test_dial_config_validation() {
        let config = DialConfig::default().connect_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = DialConfig::default().add_protocol("");
        assert!(config.validate().is_err());

        let config = DialConfig::default().add_protocol("chat").add_protocol("chat");
        assert!(matches!(
            config.validate(),
            Err(Error::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_dial_config_builder() {
        let config = DialConfig::default()
            .add_protocol("chat")
            .add_protocol("superchat")
            .connect_timeout(Duration::from_secs(3));

        assert!(config.validate().is_ok());
        assert_eq!(config.protocols, vec!["chat".to_string(), "superchat".to_string()]);
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(3)));
    }
}
