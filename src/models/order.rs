use serde::{Deserialize, Serialize};

use crate::models::{AssetAmount, AssetRatio, Fraction, Pool};

/// How the minimum receivable amount of an order is fixed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderMode {
    /// Accept the pool's spot price less fees, within `slippage`.
    Market { slippage: Fraction },
    /// Accept no less than `supplied.exchange_at(ratio)`.
    Limit { ratio: AssetRatio },
}

/// Datum attached to the output an executed order pays out to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value")]
pub enum DestinationDatum {
    None,
    /// Commitment to a datum held off-chain (blake2b-256 hash, hex).
    Hash(String),
    /// Datum carried inline (cbor hex).
    Inline(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Destination {
    pub address: String,
    pub datum: DestinationDatum,
}

impl Destination {
    pub fn to_owner(address: &str) -> Self {
        Self {
            address: address.to_string(),
            datum: DestinationDatum::None,
        }
    }
}

/// Commitment to an off-chain datum, pre-committing a not-yet-existing order
/// into the output of another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatumHashReference {
    pub hash: String,
    pub destination_address: String,
}

impl From<DatumHashReference> for Destination {
    fn from(reference: DatumHashReference) -> Self {
        Destination {
            address: reference.destination_address,
            datum: DestinationDatum::Hash(reference.hash),
        }
    }
}

/// Payment to a frontend operator, paid as a separate output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralFee {
    pub destination: String,
    pub payment: AssetAmount,
}

/// Business values of one swap order, handed to a datum builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwapDatumArgs {
    pub pool: Pool,
    /// Address holding cancel rights over the order.
    pub owner_address: String,
    pub destination: Destination,
    pub offered: AssetAmount,
    pub min_received: AssetAmount,
    /// Lovelace the scooper may take for executing the order.
    pub scooper_fee: u64,
}
