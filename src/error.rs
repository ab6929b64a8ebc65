//! Typed errors for the pricing, datum and composition layers.
//!
//! Degenerate user input is never an error here: incomplete order forms
//! resolve to zero or unchanged values. What remains are the curve's reserve
//! saturation (caught and clamped by the quote engine) and protocol-integrity
//! failures, which must abort transaction construction.

use num_bigint::BigUint;
use thiserror::Error;

use crate::models::ContractVersion;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurveError {
    #[error("requested output {requested} is not below the output reserve {reserve}")]
    InsufficientReserve { requested: BigUint, reserve: BigUint },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("fraction {numerator}/{denominator} must satisfy numerator < denominator")]
    InvalidFraction { numerator: u64, denominator: u64 },
    #[error("invalid asset identifier: {0}")]
    InvalidIdentifier(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("an order route needs one or two pools, got {0}")]
    InvalidLength(usize),
    #[error("pools {first} and {second} share no asset")]
    Discontinuous { first: String, second: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatumError {
    #[error("invalid pool ident {ident:?} for {version} orders")]
    InvalidIdent { ident: String, version: ContractVersion },
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("owner address {0} has no verification-key payment credential")]
    UnsupportedOwner(String),
    #[error("asset {asset} is not traded by pool {ident}")]
    AssetNotInPool { asset: String, ident: String },
    #[error("{version} orders cannot carry an inline destination datum")]
    UnsupportedDestination { version: ContractVersion },
    #[error("invalid hex in {field}: {value}")]
    InvalidHex { field: &'static str, value: String },
    #[error("cbor encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Datum(#[from] DatumError),
    #[error("no order script resolved for {0} orders")]
    UnresolvedScript(ContractVersion),
    #[error("second leg pool {pool} does not trade {asset}, the first leg's output")]
    RouteDiscontinuity { pool: String, asset: String },
    #[error("datum hash mismatch: builder returned {reported}, cbor hashes to {computed}")]
    DatumHashMismatch { reported: String, computed: String },
    #[error("first leg commits to {embedded:?} instead of second leg datum {expected}")]
    CommitmentMismatch { expected: String, embedded: Option<String> },
    #[error("referral fees target different payouts: {first} and {second}")]
    ReferralConflict { first: String, second: String },
}
