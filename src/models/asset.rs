use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::utils::serde_biguint;

pub const ADA_ASSET_ID: &str = "ada.lovelace";
pub const ADA_DECIMALS: u8 = 6;

/// Identity of an asset plus the number of decimals it is displayed with.
///
/// Ids are normalized to `ada.lovelace` for ADA and `<policy>.<namehex>` for
/// native assets, so two metadata values compare equal by id regardless of
/// which spelling a caller used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AssetMetadata {
    pub asset_id: String,
    pub decimals: u8,
}

impl AssetMetadata {
    pub fn new(asset_id: &str, decimals: u8) -> Self {
        Self {
            asset_id: normalize_asset_id(asset_id),
            decimals,
        }
    }

    pub fn ada() -> Self {
        Self::new(ADA_ASSET_ID, ADA_DECIMALS)
    }

    /// Strict variant of [`AssetMetadata::new`] for untrusted input: the
    /// policy must be 28 bytes of hex and the name valid hex.
    pub fn from_identifier(id: &str, decimals: u8) -> Result<Self, AssetError> {
        if !id.is_ascii() {
            return Err(AssetError::InvalidIdentifier(id.to_string()));
        }
        let metadata = Self::new(id, decimals);
        if metadata.is_ada() {
            return Ok(metadata);
        }
        let policy = metadata.policy_id();
        let name = metadata.name_hex();
        if policy.len() != 56 || hex::decode(policy).is_err() || hex::decode(name).is_err() {
            return Err(AssetError::InvalidIdentifier(id.to_string()));
        }
        Ok(metadata)
    }

    pub fn is_ada(&self) -> bool {
        self.asset_id == ADA_ASSET_ID
    }

    /// Minting policy in hex, empty for ADA.
    pub fn policy_id(&self) -> &str {
        if self.is_ada() {
            return "";
        }
        self.asset_id
            .split_once('.')
            .map(|(policy, _)| policy)
            .unwrap_or(&self.asset_id)
    }

    /// Asset name in hex, empty for ADA.
    pub fn name_hex(&self) -> &str {
        if self.is_ada() {
            return "";
        }
        self.asset_id
            .split_once('.')
            .map(|(_, name)| name)
            .unwrap_or("")
    }

    /// Kupo / Blockfrost style unit: `lovelace` or `<policy><name>`.
    pub fn unit(&self) -> String {
        if self.is_ada() {
            "lovelace".to_string()
        } else {
            format!("{}{}", self.policy_id(), self.name_hex())
        }
    }
}

pub fn normalize_asset_id(id: &str) -> String {
    let id = id.trim().to_lowercase();
    if id.is_empty() || id == "lovelace" || id == ADA_ASSET_ID || id == "." {
        return ADA_ASSET_ID.to_string();
    }
    if id.contains('.') {
        return id;
    }
    match (id.get(..56), id.get(56..)) {
        (Some(policy), Some(name)) => format!("{}.{}", policy, name),
        _ => id,
    }
}

/// An immutable quantity of one asset, in its smallest unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetAmount {
    #[serde(with = "serde_biguint")]
    pub amount: BigUint,
    pub metadata: AssetMetadata,
}

impl AssetAmount {
    pub fn new(amount: impl Into<BigUint>, metadata: AssetMetadata) -> Self {
        Self {
            amount: amount.into(),
            metadata,
        }
    }

    pub fn zero(metadata: AssetMetadata) -> Self {
        Self::new(0u64, metadata)
    }

    pub fn lovelace(amount: impl Into<BigUint>) -> Self {
        Self::new(amount, AssetMetadata::ada())
    }

    pub fn asset_id(&self) -> &str {
        &self.metadata.asset_id
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn same_asset(&self, other: &AssetAmount) -> bool {
        self.metadata.asset_id == other.metadata.asset_id
    }

    pub fn with_amount(&self, amount: impl Into<BigUint>) -> Self {
        Self::new(amount, self.metadata.clone())
    }

    /// Same raw amount, different asset.
    pub fn retyped(&self, metadata: AssetMetadata) -> Self {
        Self::new(self.amount.clone(), metadata)
    }

    /// Sum of two amounts of the same asset; `None` when the assets differ.
    pub fn checked_add(&self, other: &AssetAmount) -> Option<AssetAmount> {
        self.same_asset(other)
            .then(|| self.with_amount(&self.amount + &other.amount))
    }

    /// Re-denominates this amount at a fixed rate.
    ///
    /// Amounts in the ratio's denominator asset convert to the numerator
    /// asset and vice versa, rounding down. An amount in neither asset, or a
    /// ratio with a zero divisor, is returned degenerate rather than failing.
    pub fn exchange_at(&self, ratio: &AssetRatio) -> AssetAmount {
        let (multiplier, divisor, target) = if self.same_asset(&ratio.denominator) {
            (&ratio.numerator.amount, &ratio.denominator.amount, &ratio.numerator.metadata)
        } else if self.same_asset(&ratio.numerator) {
            (&ratio.denominator.amount, &ratio.numerator.amount, &ratio.denominator.metadata)
        } else {
            return self.clone();
        };
        if divisor.is_zero() {
            return AssetAmount::zero(target.clone());
        }
        AssetAmount::new(&self.amount * multiplier / divisor, target.clone())
    }
}

impl fmt::Display for AssetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.metadata.asset_id)
    }
}

/// Fixed exchange rate: `numerator` units are worth `denominator` units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetRatio {
    pub numerator: AssetAmount,
    pub denominator: AssetAmount,
}

impl AssetRatio {
    pub fn new(numerator: AssetAmount, denominator: AssetAmount) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

/// A proper fraction in `[0, 1)`, used for pool fees and slippage tolerance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawFraction")]
pub struct Fraction {
    numerator: u64,
    denominator: u64,
}

#[derive(Deserialize)]
struct RawFraction {
    numerator: u64,
    denominator: u64,
}

impl TryFrom<RawFraction> for Fraction {
    type Error = AssetError;

    fn try_from(raw: RawFraction) -> Result<Self, Self::Error> {
        Fraction::new(raw.numerator, raw.denominator)
    }
}

impl Fraction {
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, AssetError> {
        if denominator == 0 || numerator >= denominator {
            return Err(AssetError::InvalidFraction {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Basis points out of 10_000; values of 10_000 or more are rejected.
    pub fn from_bps(bps: u64) -> Result<Self, AssetError> {
        Self::new(bps, 10_000)
    }

    pub fn zero() -> Self {
        Self {
            numerator: 0,
            denominator: 1,
        }
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// `denominator - numerator`, the share that remains after applying the fraction.
    pub fn complement(&self) -> u64 {
        self.denominator - self.numerator
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
