//! Bidirectional quoting over one- and two-pool routes.
//!
//! Every entry point tolerates incomplete input: a missing side, a zero
//! amount or a missing route resolves to a zero or unchanged value, because
//! that is the normal state of an order form while the user types. The only
//! curve failure, requesting at least the whole output reserve, is clamped to
//! draining the input-side reserve.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::CurveError;
use crate::models::{AssetAmount, AssetMetadata, AssetRatio, Fraction, OrderRoute, Pool, SwapOutcome};
use crate::pricing::curve::{AmmCurve, ConstantProductCurve, CurveQuote};

/// One pool with its swap direction resolved.
#[derive(Debug, Clone, Copy)]
pub struct Hop<'a> {
    pub pool: &'a Pool,
    pub input_asset: &'a AssetMetadata,
    pub output_asset: &'a AssetMetadata,
    pub reserve_in: &'a BigUint,
    pub reserve_out: &'a BigUint,
}

/// Resolve a hop's direction from the id of the asset going in.
///
/// `asset_a` going in trades towards `asset_b`; any other id is treated as
/// `asset_b` going in. Every pricing path in the crate resolves reserves
/// through this function.
pub fn resolve_hop<'a>(pool: &'a Pool, input_asset_id: &str) -> Hop<'a> {
    if pool.asset_a.asset_id == input_asset_id {
        Hop {
            pool,
            input_asset: &pool.asset_a,
            output_asset: &pool.asset_b,
            reserve_in: &pool.quantity_a,
            reserve_out: &pool.quantity_b,
        }
    } else {
        Hop {
            pool,
            input_asset: &pool.asset_b,
            output_asset: &pool.asset_a,
            reserve_in: &pool.quantity_b,
            reserve_out: &pool.quantity_a,
        }
    }
}

/// Resolve a hop's direction from the id of the asset coming out.
pub fn resolve_hop_towards<'a>(pool: &'a Pool, output_asset_id: &str) -> Hop<'a> {
    let input_id = pool.other_asset(output_asset_id).asset_id.clone();
    resolve_hop(pool, &input_id)
}

#[derive(Debug, Clone, Default)]
pub struct QuoteEngine<C = ConstantProductCurve> {
    curve: C,
}

impl<C: AmmCurve> QuoteEngine<C> {
    pub fn new(curve: C) -> Self {
        Self { curve }
    }

    /// Amount received for `given` along `route`.
    ///
    /// Without a route `taken` is returned unchanged. Single hops honour
    /// limit mode (`given.exchange_at(ratio)`, reserves ignored); two hops are
    /// always priced at market, hop 1's output feeding hop 2 as is.
    pub fn quote_taken_from_given(
        &self,
        given: Option<&AssetAmount>,
        route: Option<&OrderRoute>,
        ratio: Option<&AssetRatio>,
        is_limit: bool,
        taken: Option<&AssetAmount>,
    ) -> Option<AssetAmount> {
        let Some(route) = route else {
            return taken.cloned();
        };
        let target = taken
            .map(|t| t.metadata.clone())
            .unwrap_or_else(|| counterpart(route, given.map(|g| g.asset_id())).clone());

        let given = match given {
            Some(g) if !g.is_zero() => g,
            _ => return Some(AssetAmount::zero(target)),
        };

        if route.is_two_hop() {
            let outcome = self.route_outcome(given, route);
            let output = outcome.last().map(|o| o.output.amount.clone()).unwrap_or_default();
            return Some(AssetAmount::new(output, target));
        }

        if is_limit {
            return match ratio {
                Some(ratio) => Some(given.exchange_at(ratio)),
                None => taken.cloned(),
            };
        }

        let hop = resolve_hop(route.first(), given.asset_id());
        let quote = self.output_for(&hop, &given.amount);
        Some(AssetAmount::new(quote.output, target))
    }

    /// Amount that must be given to receive `taken` along `route`.
    ///
    /// When `taken` meets or exceeds a hop's output reserve the requirement
    /// is clamped to that hop's entire input-side reserve.
    pub fn quote_given_from_taken(
        &self,
        given: Option<&AssetAmount>,
        taken: Option<&AssetAmount>,
        route: Option<&OrderRoute>,
        ratio: Option<&AssetRatio>,
        is_limit: bool,
    ) -> Option<AssetAmount> {
        let (Some(route), Some(taken)) = (route, taken) else {
            return given.cloned();
        };

        if taken.is_zero() {
            let pool = route.first();
            let metadata = given
                .and_then(|g| {
                    [&pool.asset_a, &pool.asset_b]
                        .into_iter()
                        .find(|a| a.asset_id == g.asset_id())
                })
                .unwrap_or(&pool.asset_a);
            return Some(AssetAmount::zero(metadata.clone()));
        }

        let target = match given {
            Some(g) if route.has_endpoint(g.asset_id()) && !g.same_asset(taken) => g.metadata.clone(),
            _ => counterpart(route, Some(taken.asset_id())).clone(),
        };

        if !route.is_two_hop() && is_limit {
            return match ratio {
                Some(ratio) => Some(taken.exchange_at(ratio)),
                None => given.cloned(),
            };
        }

        let required = route
            .hops_towards(taken.asset_id())
            .into_iter()
            .rev()
            .fold(
                (taken.amount.clone(), taken.asset_id().to_string()),
                |(amount, output_id), pool| {
                    let hop = resolve_hop_towards(pool, &output_id);
                    let needed = self.input_for(&hop, &amount);
                    (needed, hop.input_asset.asset_id.clone())
                },
            )
            .0;
        Some(AssetAmount::new(required, target))
    }

    /// Market-mode outcome of every hop for `given`, used as a safety
    /// estimate independent of the order's own mode.
    pub fn route_outcome(&self, given: &AssetAmount, route: &OrderRoute) -> Vec<SwapOutcome> {
        route
            .hops_from(given.asset_id())
            .into_iter()
            .fold(Vec::with_capacity(route.len()), |mut outcome, pool| {
                let input = outcome
                    .last()
                    .map(|prev: &SwapOutcome| prev.output.clone())
                    .unwrap_or_else(|| given.clone());
                let hop = resolve_hop(pool, input.asset_id());
                let quote = self.output_for(&hop, &input.amount);
                outcome.push(SwapOutcome {
                    input: AssetAmount::new(input.amount, hop.input_asset.clone()),
                    output: AssetAmount::new(quote.output, hop.output_asset.clone()),
                });
                outcome
            })
    }

    /// Whether any hop of `outcome`, or the chosen `taken`, would take at
    /// least the whole output reserve of its pool.
    pub fn exceeds_reserves(
        &self,
        outcome: &[SwapOutcome],
        route: &OrderRoute,
        taken: Option<&AssetAmount>,
    ) -> bool {
        let Some(first) = outcome.first() else {
            return false;
        };
        let hops = route.hops_from(first.input.asset_id());
        let hops_exceed = outcome.iter().zip(&hops).any(|(hop_outcome, pool)| {
            let hop = resolve_hop(pool, hop_outcome.input.asset_id());
            &hop_outcome.output.amount >= hop.reserve_out
        });
        let taken_exceeds = match (taken, outcome.last(), hops.last()) {
            (Some(taken), Some(last), Some(pool)) => {
                let hop = resolve_hop(pool, last.input.asset_id());
                hop.output_asset.asset_id == taken.asset_id() && &taken.amount >= hop.reserve_out
            }
            _ => false,
        };
        hops_exceed || taken_exceeds
    }

    /// Guaranteed worst-case amount received for `supplied` at `pool`:
    /// `floor(supplied * (1 - fee) * reserve_out / reserve_in * (1 - slippage))`.
    pub fn min_receivable(&self, pool: &Pool, supplied: &AssetAmount, slippage: &Fraction) -> AssetAmount {
        let hop = resolve_hop(pool, supplied.asset_id());
        if hop.reserve_in.is_zero() {
            return AssetAmount::zero(hop.output_asset.clone());
        }
        let numerator = &supplied.amount
            * pool.fee.complement()
            * hop.reserve_out
            * slippage.complement();
        let denominator = hop.reserve_in * pool.fee.denominator() * slippage.denominator();
        AssetAmount::new(numerator / denominator, hop.output_asset.clone())
    }

    /// Implied spot price of `route` for an order giving `given_asset_id`,
    /// as a ratio of output units per input units.
    pub fn spot_ratio(&self, route: &OrderRoute, given_asset_id: &str) -> AssetRatio {
        let hops = route.hops_from(given_asset_id);
        let first = resolve_hop(hops[0], given_asset_id);
        let mut numerator = first.reserve_out.clone();
        let mut denominator = first.reserve_in.clone();
        let mut output_asset = first.output_asset;
        if let Some(pool) = hops.get(1) {
            let second = resolve_hop(pool, &first.output_asset.asset_id);
            numerator *= second.reserve_out;
            denominator *= second.reserve_in;
            output_asset = second.output_asset;
        }
        AssetRatio::new(
            AssetAmount::new(numerator, output_asset.clone()),
            AssetAmount::new(denominator, first.input_asset.clone()),
        )
    }

    fn output_for(&self, hop: &Hop<'_>, input: &BigUint) -> CurveQuote {
        match self
            .curve
            .quote_output(input, hop.reserve_in, hop.reserve_out, &hop.pool.fee)
        {
            Ok(quote) => quote,
            Err(CurveError::InsufficientReserve { .. }) => CurveQuote {
                input: input.clone(),
                output: hop.reserve_out.clone(),
            },
        }
    }

    fn input_for(&self, hop: &Hop<'_>, output: &BigUint) -> BigUint {
        match self
            .curve
            .quote_input(output, hop.reserve_in, hop.reserve_out, &hop.pool.fee)
        {
            Ok(quote) => quote.input,
            Err(CurveError::InsufficientReserve { requested, reserve }) => {
                tracing::debug!(
                    pool = %hop.pool.ident,
                    %requested,
                    %reserve,
                    "requested output saturates pool, clamping to input reserve"
                );
                hop.reserve_in.clone()
            }
        }
    }
}

/// The route endpoint opposite to `asset_id`; the exit asset when `asset_id`
/// is unknown or missing.
fn counterpart<'a>(route: &'a OrderRoute, asset_id: Option<&str>) -> &'a AssetMetadata {
    let (entry, exit) = route.endpoints();
    match asset_id {
        Some(id) if id == exit.asset_id => entry,
        _ => exit,
    }
}
