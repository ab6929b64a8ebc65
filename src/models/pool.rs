use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::models::{AssetMetadata, Fraction};
use crate::utils::serde_biguint;

/// Order/pool contract generation a pool belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ContractVersion {
    V1,
    V3,
}

impl fmt::Display for ContractVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractVersion::V1 => write!(f, "V1"),
            ContractVersion::V3 => write!(f, "V3"),
        }
    }
}

impl std::str::FromStr for ContractVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v1" => Ok(ContractVersion::V1),
            "v3" => Ok(ContractVersion::V3),
            other => Err(format!("unknown contract version '{}'", other)),
        }
    }
}

/// A constant-product liquidity pool.
///
/// Assets carry no canonical ordering: callers resolve a swap's direction by
/// comparing asset ids against `asset_a` / `asset_b`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pool {
    pub ident: String,
    pub asset_a: AssetMetadata,
    pub asset_b: AssetMetadata,
    pub asset_lp: AssetMetadata,
    #[serde(with = "serde_biguint")]
    pub quantity_a: BigUint,
    #[serde(with = "serde_biguint")]
    pub quantity_b: BigUint,
    pub fee: Fraction,
    pub version: ContractVersion,
}

impl Pool {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ident: &str,
        asset_a: AssetMetadata,
        asset_b: AssetMetadata,
        asset_lp: AssetMetadata,
        quantity_a: impl Into<BigUint>,
        quantity_b: impl Into<BigUint>,
        fee: Fraction,
        version: ContractVersion,
    ) -> Self {
        Self {
            ident: ident.to_string(),
            asset_a,
            asset_b,
            asset_lp,
            quantity_a: quantity_a.into(),
            quantity_b: quantity_b.into(),
            fee,
            version,
        }
    }

    pub fn has_asset(&self, asset_id: &str) -> bool {
        self.asset_a.asset_id == asset_id || self.asset_b.asset_id == asset_id
    }

    /// The pool asset that is not `asset_id`; `asset_b` when `asset_id` is in neither slot.
    pub fn other_asset(&self, asset_id: &str) -> &AssetMetadata {
        if self.asset_b.asset_id == asset_id {
            &self.asset_a
        } else {
            &self.asset_b
        }
    }

    /// Reserve held for `asset_id`, if the pool trades it.
    pub fn reserve_of(&self, asset_id: &str) -> Option<&BigUint> {
        if self.asset_a.asset_id == asset_id {
            Some(&self.quantity_a)
        } else if self.asset_b.asset_id == asset_id {
            Some(&self.quantity_b)
        } else {
            None
        }
    }

    /// Unordered pair equality of asset ids.
    pub fn trades_pair(&self, first: &str, second: &str) -> bool {
        (self.asset_a.asset_id == first && self.asset_b.asset_id == second)
            || (self.asset_a.asset_id == second && self.asset_b.asset_id == first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Pool {
        Pool::new(
            "01",
            AssetMetadata::ada(),
            AssetMetadata::new("aa.bb", 0),
            AssetMetadata::new("cc.dd", 0),
            500_000_000u64,
            250_000_000u64,
            Fraction::new(1, 100).unwrap(),
            ContractVersion::V3,
        )
    }

    #[test]
    fn test_reserve_lookup_by_id() {
        let p = pool();
        assert_eq!(p.reserve_of("ada.lovelace"), Some(&BigUint::from(500_000_000u64)));
        assert_eq!(p.reserve_of("aa.bb"), Some(&BigUint::from(250_000_000u64)));
        assert_eq!(p.reserve_of("ee.ff"), None);
        assert_eq!(p.other_asset("aa.bb").asset_id, "ada.lovelace");
        assert!(p.trades_pair("aa.bb", "ada.lovelace"));
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!("v3".parse::<ContractVersion>(), Ok(ContractVersion::V3));
        assert!("v2".parse::<ContractVersion>().is_err());
    }
}
