//! Order datums: the Plutus data a swap order locks at the order script.

use async_trait::async_trait;
use ciborium::value::Value;
use serde::{Deserialize, Serialize};

use super::cbor::{bytes_from_hex, constr, decode_cbor, encode_cbor, option};
use super::{sundaeswap_v1, sundaeswap_v3};
use crate::error::DatumError;
use crate::models::{ContractVersion, SwapDatumArgs};
use crate::utils::{datum_hash_hex, decode_address, Credential};

/// Encoded datum and its blake2b-256 hash, both hex.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderDatum {
    pub cbor: String,
    pub hash: String,
}

impl OrderDatum {
    pub fn from_value(value: &Value) -> Result<Self, DatumError> {
        let cbor = encode_cbor(value)?;
        let hash = datum_hash_hex(&cbor)?;
        Ok(Self { cbor, hash })
    }

    /// Datum hash this order commits its payout to, if any.
    pub fn destination_hash(&self, version: ContractVersion) -> Option<String> {
        let value = decode_cbor(&self.cbor).ok()?;
        match version {
            ContractVersion::V1 => sundaeswap_v1::destination_datum_hash(&value),
            ContractVersion::V3 => sundaeswap_v3::destination_datum_hash(&value),
        }
    }
}

#[async_trait]
pub trait DatumBuilder: Send + Sync {
    async fn build_swap_datum(&self, args: &SwapDatumArgs) -> Result<OrderDatum, DatumError>;
}

/// Builds V1 and V3 swap datums locally, picking the layout from the pool's
/// contract version.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlutusDatumBuilder;

#[async_trait]
impl DatumBuilder for PlutusDatumBuilder {
    async fn build_swap_datum(&self, args: &SwapDatumArgs) -> Result<OrderDatum, DatumError> {
        for asset in [&args.offered, &args.min_received] {
            if !args.pool.has_asset(asset.asset_id()) {
                return Err(DatumError::AssetNotInPool {
                    asset: asset.asset_id().to_string(),
                    ident: args.pool.ident.clone(),
                });
            }
        }
        let value = match args.pool.version {
            ContractVersion::V1 => sundaeswap_v1::swap_datum(args)?,
            ContractVersion::V3 => sundaeswap_v3::swap_datum(args)?,
        };
        let datum = OrderDatum::from_value(&value)?;
        tracing::debug!(
            version = %args.pool.version,
            pool = %args.pool.ident,
            hash = %datum.hash,
            "built swap datum"
        );
        Ok(datum)
    }
}

/// Plutus `Address`: `Constr0[payment, Option<StakingCredential>]`.
pub fn plutus_address(address: &str) -> Result<Value, DatumError> {
    let decoded = decode_address(address)?;
    let staking = match &decoded.stake {
        Some(stake) => option(Some(constr(0, vec![credential(stake)?]))),
        None => option(None),
    };
    Ok(constr(0, vec![credential(&decoded.payment)?, staking]))
}

fn credential(credential: &Credential) -> Result<Value, DatumError> {
    match credential {
        Credential::Key(hash) => Ok(constr(0, vec![bytes_from_hex("key hash", hash)?])),
        Credential::Script(hash) => Ok(constr(1, vec![bytes_from_hex("script hash", hash)?])),
    }
}

/// Verification key hash of the owner's payment credential.
pub fn owner_key_hash(owner_address: &str) -> Result<String, DatumError> {
    match decode_address(owner_address)?.payment {
        Credential::Key(hash) => Ok(hash),
        Credential::Script(_) => Err(DatumError::UnsupportedOwner(owner_address.to_string())),
    }
}
