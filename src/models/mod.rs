pub mod asset;
pub mod order;
pub mod pool;
pub mod route;
pub mod utxo;

pub use asset::{
    normalize_asset_id, AssetAmount, AssetMetadata, AssetRatio, Fraction, ADA_ASSET_ID,
    ADA_DECIMALS,
};
pub use order::{
    DatumHashReference, Destination, DestinationDatum, OrderMode, ReferralFee, SwapDatumArgs,
};
pub use pool::{ContractVersion, Pool};
pub use route::{OrderRoute, SwapOutcome};
pub use utxo::{KupoDatumResponse, KupoMatch, KupoValue, Unit, Utxo};
