use anyhow::{anyhow, Result};
use async_trait::async_trait;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::kupo::KupoApi;
use crate::models::{AssetMetadata, ContractVersion, Pool, Utxo};
use crate::utils::{script_hash_to_address, Network};

pub mod cbor;
pub mod datum;
pub mod sundaeswap_v1;
pub mod sundaeswap_v3;

pub use datum::{DatumBuilder, OrderDatum, PlutusDatumBuilder};
pub use sundaeswap_v1::SundaeSwapV1;
pub use sundaeswap_v3::SundaeSwapV3;

/// Reads one contract version's pools out of Kupo.
#[async_trait]
pub trait PoolReader: Send + Sync {
    fn version(&self) -> ContractVersion;
    fn kupo(&self) -> &KupoApi;

    /// Every unspent output sitting at the version's pool addresses.
    async fn pool_utxos(&self) -> Result<Vec<Utxo>>;

    /// Kupo match pattern selecting the output that holds pool `ident`.
    fn pool_pattern(&self, ident: &str) -> String;

    /// Build a pool from an output and its datum. `Ok(None)` when the
    /// output is not a pool of this version.
    fn pool_from_datum(&self, utxo: &Utxo, datum_cbor: &str) -> Result<Option<Pool>>;

    async fn pool_from_utxo(&self, utxo: &Utxo) -> Result<Option<Pool>> {
        let data_hash = match &utxo.data_hash {
            Some(h) => h,
            None => return Ok(None),
        };
        let datum = self.kupo().datum(data_hash).await?;
        self.pool_from_datum(utxo, &datum)
    }

    async fn find_pool(&self, ident: &str) -> Result<Option<Pool>> {
        let utxos = self.kupo().get(&self.pool_pattern(ident), true).await?;
        for utxo in &utxos {
            if let Some(pool) = self.pool_from_utxo(utxo).await? {
                if pool.ident == ident {
                    return Ok(Some(pool));
                }
            }
        }
        Ok(None)
    }

    /// Pools trading `first` against `second`, in either order.
    async fn pools_for_pair(&self, first: &str, second: &str) -> Result<Vec<Pool>> {
        let first = AssetMetadata::from_identifier(first, 0)?;
        let second = AssetMetadata::from_identifier(second, 0)?;
        let mut pools = Vec::new();
        for utxo in &self.pool_utxos().await? {
            match self.pool_from_utxo(utxo).await {
                Ok(Some(pool)) if pool.trades_pair(&first.asset_id, &second.asset_id) => pools.push(pool),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(version = %self.version(), utxo = %utxo.out_ref(), error = %e, "skipping pool output")
                }
            }
        }
        Ok(pools)
    }
}

/// Order-script deployment of one contract version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProtocolParams {
    pub version: ContractVersion,
    pub order_script_hash: String,
    pub network: Network,
    /// Lovelace paid to the scooper per order.
    pub scooper_fee: u64,
    /// Lovelace locked with an order and returned on execution.
    pub deposit: u64,
}

impl ProtocolParams {
    /// Enterprise address of the order script.
    pub fn order_address(&self) -> Result<String> {
        script_hash_to_address(&self.order_script_hash, self.network)
    }
}

/// Pool and protocol lookups needed to compose orders.
#[async_trait]
pub trait QueryProvider: Send + Sync {
    async fn find_pool(&self, ident: &str, version: ContractVersion) -> Result<Pool>;
    async fn protocol_params(&self, version: ContractVersion) -> Result<ProtocolParams>;
}

/// Pools from Kupo, protocol parameters from the configured deployments.
pub struct KupoQueryProvider {
    v1: SundaeSwapV1,
    v3: SundaeSwapV3,
    deployments: Vec<ProtocolParams>,
}

impl KupoQueryProvider {
    pub fn new(kupo: KupoApi, deployments: Vec<ProtocolParams>) -> Self {
        Self {
            v1: SundaeSwapV1::new(kupo.clone()),
            v3: SundaeSwapV3::new(kupo),
            deployments,
        }
    }

    pub fn reader(&self, version: ContractVersion) -> &dyn PoolReader {
        match version {
            ContractVersion::V1 => &self.v1,
            ContractVersion::V3 => &self.v3,
        }
    }
}

#[async_trait]
impl QueryProvider for KupoQueryProvider {
    async fn find_pool(&self, ident: &str, version: ContractVersion) -> Result<Pool> {
        self.reader(version)
            .find_pool(ident)
            .await?
            .ok_or_else(|| anyhow!("{} pool {} not found", version, ident))
    }

    async fn protocol_params(&self, version: ContractVersion) -> Result<ProtocolParams> {
        self.deployments
            .iter()
            .find(|p| p.version == version)
            .cloned()
            .ok_or_else(|| anyhow!("no {} deployment configured", version))
    }
}

/// Asset named by a datum's `(policy, name)` pair; an empty policy is ADA.
pub(crate) fn asset_from_pair(policy: &str, name: &str) -> AssetMetadata {
    if policy.is_empty() {
        AssetMetadata::ada()
    } else {
        AssetMetadata::new(&format!("{}.{}", policy, name), 0)
    }
}

pub(crate) fn reserve_of(utxo: &Utxo, asset: &AssetMetadata) -> BigUint {
    utxo.quantity_of(&asset.unit()).unwrap_or_default()
}
