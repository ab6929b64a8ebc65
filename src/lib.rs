//! # sundae-route-core
//!
//! Pricing and order-composition core for SundaeSwap constant-product pools
//! on Cardano.
//!
//! ## Components
//!
//! | Component | Module | Role |
//! |-----------|--------|------|
//! | QuoteEngine | `pricing` | taken-from-given / given-from-taken quotes over 1-2 pools |
//! | OrderFlow | `flow` | immutable order-form snapshots driven by typed actions |
//! | RouteComposer | `compose` | two chained orders committed to each other by datum hash |
//! | PoolReader | `dex` | V1 / V3 pools read from a Kupo indexer |
//!
//! ## Quick Start
//!
//! ```rust
//! use sundae_route_core::flow::{OrderAction, OrderFlow};
//! use sundae_route_core::models::{
//!     AssetAmount, AssetMetadata, ContractVersion, Fraction, OrderRoute, Pool,
//! };
//!
//! let pool = Pool::new(
//!     "64f35d26b237ad58e099041bc14c687ea7fdc58969d7d5b66e2540ef",
//!     AssetMetadata::ada(),
//!     AssetMetadata::new("f13ac4d66b3ee19a6aa0f2a22298737bd907cc95121662fc971b5275.535452494b45", 0),
//!     AssetMetadata::new("e0302560ced2fdcbfcb2602697df970cd0d6a38f94b32703f51c312b.0014df10", 0),
//!     500_000_000u64,
//!     250_000_000u64,
//!     Fraction::new(1, 100).unwrap(),
//!     ContractVersion::V3,
//! );
//!
//! let mut flow = OrderFlow::<sundae_route_core::pricing::ConstantProductCurve>::default();
//! flow.dispatch(OrderAction::SetOrderRoute(OrderRoute::single(pool)));
//! let state = flow.dispatch(OrderAction::SetGiven(AssetAmount::lovelace(20_000_000u64)));
//!
//! assert_eq!(state.taken().unwrap().amount, 9_522_893u64.into());
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Pools trading a pair
//! cargo run --release -- pool --version v3 lovelace f13ac4d66b3ee19a6aa0f2a22298737bd907cc95121662fc971b5275535452494b45
//!
//! # Quote a single pool by ident
//! cargo run --release -- quote --version v3 --pool <ident> --give 20000000 --asset lovelace
//!
//! # Compose a two-leg routed order
//! cargo run --release -- compose --owner <addr> --pool-a <ident> --pool-b <ident> --give 20000000 --asset lovelace
//! ```

pub mod cache;
pub mod compose;
pub mod config;
pub mod dex;
pub mod error;
pub mod flow;
pub mod kupo;
pub mod models;
pub mod pricing;
pub mod utils;

pub use cache::{load_from_file, save_to_file};
pub use compose::{ComposedOrders, LegA, LegB, RouteComposer};
pub use config::SdkConfig;
pub use dex::{DatumBuilder, KupoQueryProvider, PlutusDatumBuilder, PoolReader, QueryProvider};
pub use error::{AssetError, ComposeError, CurveError, DatumError, RouteError};
pub use flow::{reduce, OrderAction, OrderFlow, OrderFormState};
pub use kupo::KupoApi;
pub use models::{AssetAmount, AssetMetadata, AssetRatio, Fraction, OrderRoute, Pool};
pub use pricing::{AmmCurve, ConstantProductCurve, QuoteEngine};
