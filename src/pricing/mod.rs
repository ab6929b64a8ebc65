pub mod curve;
pub mod quote;

pub use curve::{AmmCurve, ConstantProductCurve, CurveQuote};
pub use quote::{resolve_hop, resolve_hop_towards, Hop, QuoteEngine};
