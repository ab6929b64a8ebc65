use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::cache::load_from_file;
use crate::dex::ProtocolParams;
use crate::models::ContractVersion;
use crate::utils::Network;

pub const KUPO_URL_ENV: &str = "SUNDAE_KUPO_URL";
pub const NETWORK_ENV: &str = "SUNDAE_NETWORK";

const DEFAULT_KUPO_URL: &str = "http://localhost:1442";
const V3_ORDER_SCRIPT_HASH: &str = "fa6a58bbe2d0ff05534431c8e2f0ef2cbdc1602a8456e4b13c8f3077";
const V1_ORDER_SCRIPT_HASH: &str = "ba158766c1bae60e2117ee8987621441fac66a5e0fb9c7aca58cf20a";
const ORDER_DEPOSIT: u64 = 2_000_000;
const V1_SCOOPER_FEE: u64 = 2_500_000;
const V3_SCOOPER_FEE: u64 = 1_000_000;

/// Runtime settings: where Kupo lives, which network, and the order-script
/// deployments orders are sent to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SdkConfig {
    pub kupo_url: String,
    pub network: Network,
    pub deployments: Vec<ProtocolParams>,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            kupo_url: DEFAULT_KUPO_URL.to_string(),
            network: Network::Mainnet,
            deployments: default_deployments(Network::Mainnet),
            log_filter: "info".to_string(),
        }
    }
}

/// Mainnet order-script deployments of SundaeSwap V1 and V3.
pub fn default_deployments(network: Network) -> Vec<ProtocolParams> {
    vec![
        ProtocolParams {
            version: ContractVersion::V1,
            order_script_hash: V1_ORDER_SCRIPT_HASH.to_string(),
            network,
            scooper_fee: V1_SCOOPER_FEE,
            deposit: ORDER_DEPOSIT,
        },
        ProtocolParams {
            version: ContractVersion::V3,
            order_script_hash: V3_ORDER_SCRIPT_HASH.to_string(),
            network,
            scooper_fee: V3_SCOOPER_FEE,
            deposit: ORDER_DEPOSIT,
        },
    ]
}

impl SdkConfig {
    /// Load from a JSON file, or defaults without one, then apply
    /// environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => load_from_file::<SdkConfig>(path)?,
            None => SdkConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        tracing::debug!(kupo_url = %config.kupo_url, network = %config.network, "loaded config");
        Ok(config)
    }

    /// Override `kupo_url` and `network` from `lookup`. A network override
    /// also moves every deployment onto that network.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(KUPO_URL_ENV) {
            self.kupo_url = url;
        }
        if let Some(network) = lookup(NETWORK_ENV) {
            let network: Network = network
                .parse()
                .map_err(|e: String| anyhow!("{}: {}", NETWORK_ENV, e))?;
            self.network = network;
            self.deployments = self
                .deployments
                .iter()
                .map(|d| ProtocolParams {
                    network,
                    ..d.clone()
                })
                .collect();
        }
        Ok(())
    }

    pub fn deployment(&self, version: ContractVersion) -> Option<&ProtocolParams> {
        self.deployments.iter().find(|d| d.version == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = SdkConfig::default();
        let v3 = config.deployment(ContractVersion::V3).unwrap();
        assert_eq!(v3.scooper_fee, 1_000_000);
        assert_eq!(v3.deposit, 2_000_000);
        assert_eq!(config.deployment(ContractVersion::V1).unwrap().scooper_fee, 2_500_000);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(KUPO_URL_ENV, "http://kupo:1442"), (NETWORK_ENV, "preview")]);
        let mut config = SdkConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.kupo_url, "http://kupo:1442");
        assert_eq!(config.network, Network::Testnet);
        assert!(config.deployments.iter().all(|d| d.network == Network::Testnet));

        let mut bad = SdkConfig::default();
        assert!(bad.apply_overrides(|_| Some("moon".to_string())).is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: SdkConfig = serde_json::from_str(r#"{"kupo_url":"http://x"}"#).unwrap();
        assert_eq!(config.kupo_url, "http://x");
        assert_eq!(config.deployments.len(), 2);
    }
}
