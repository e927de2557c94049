// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Protocol layer settings.

use crate::port::OFPP_MAX;
use crate::rule::FlowFormat;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of packet bytes sent to the controller on a table miss.
pub const DEFAULT_MISS_SEND_LEN: u16 = 128;
/// Default idle timeout of flows set up by the switch itself, in seconds.
pub const DEFAULT_IDLE_TIMEOUT: u16 = 60;

/// Errors in a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No port could ever be an output port.
    #[error("max_ports must be at least 1")]
    NoPorts,
    /// Physical ports would collide with the reserved port numbers.
    #[error("max_ports {0:#x} exceeds {OFPP_MAX:#x}")]
    TooManyPorts(u16),
    /// The document does not describe a configuration.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Settings of the protocol layer.
#[derive(Builder, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::check"))]
#[serde(default, deny_unknown_fields)]
pub struct OfpConfig {
    /// How flows are expressed on the wire.
    #[builder(default)]
    pub flow_format: FlowFormat,
    /// Physical ports are numbered below this.
    #[builder(default = OFPP_MAX)]
    pub max_ports: u16,
    /// Packet bytes sent to the controller on a table miss.
    #[builder(default = DEFAULT_MISS_SEND_LEN)]
    pub miss_send_len: u16,
    /// Idle timeout of flows set up by the switch, seconds.
    #[builder(default = DEFAULT_IDLE_TIMEOUT)]
    pub idle_timeout: u16,
}

impl Default for OfpConfig {
    fn default() -> Self {
        OfpConfig {
            flow_format: FlowFormat::default(),
            max_ports: OFPP_MAX,
            miss_send_len: DEFAULT_MISS_SEND_LEN,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl OfpConfigBuilder {
    fn check(&self) -> Result<(), String> {
        match self.max_ports {
            Some(0) => Err(ConfigError::NoPorts.to_string()),
            Some(n) if n > OFPP_MAX => Err(ConfigError::TooManyPorts(n).to_string()),
            _ => Ok(()),
        }
    }
}

impl OfpConfig {
    /// Check the settings for consistency.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_ports == 0 {
            return Err(ConfigError::NoPorts);
        }
        if self.max_ports > OFPP_MAX {
            return Err(ConfigError::TooManyPorts(self.max_ports));
        }
        Ok(())
    }

    /// Read settings from a YAML document; missing settings keep their default.
    ///
    /// # Errors
    ///
    /// Fails if the document is malformed or describes inconsistent settings.
    pub fn from_yaml(yaml: &str) -> Result<OfpConfig, ConfigError> {
        let config: OfpConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        debug!("loaded configuration {config:?}");
        Ok(config)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in test code
#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_defaults() {
        let config = OfpConfigBuilder::default().build().unwrap();
        assert_eq!(config, OfpConfig::default());
        assert_eq!(config.max_ports, 0xff00);
        assert_eq!(config.miss_send_len, 128);
        assert_eq!(config.flow_format, FlowFormat::OpenFlow10);
    }

    #[test]
    fn builder_rejects_bad_port_counts() {
        assert!(OfpConfigBuilder::default().max_ports(0).build().is_err());
        assert!(OfpConfigBuilder::default().max_ports(0xff01).build().is_err());
        let config = OfpConfigBuilder::default().max_ports(48).build().unwrap();
        assert_eq!(config.max_ports, 48);
    }

    #[test]
    fn yaml() {
        let config = OfpConfig::from_yaml(
            "flow_format: tun_id_from_cookie\nmax_ports: 16\nidle_timeout: 5\n",
        )
        .unwrap();
        assert_eq!(
            config,
            OfpConfig {
                flow_format: FlowFormat::TunIdFromCookie,
                max_ports: 16,
                miss_send_len: DEFAULT_MISS_SEND_LEN,
                idle_timeout: 5,
            }
        );
    }

    #[test]
    fn yaml_round_trip() {
        let config = OfpConfigBuilder::default()
            .flow_format(FlowFormat::TunIdFromCookie)
            .miss_send_len(256)
            .build()
            .unwrap();
        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        assert_eq!(OfpConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn yaml_errors() {
        assert!(matches!(
            OfpConfig::from_yaml("max_ports: 0"),
            Err(ConfigError::NoPorts)
        ));
        assert!(matches!(
            OfpConfig::from_yaml("flow_format: nxm"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            OfpConfig::from_yaml("max_port: 3"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
