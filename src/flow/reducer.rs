//! Pure transitions of the order form.
//!
//! `reduce` never mutates its input: it returns a fresh snapshot whose
//! derived safety estimate has been recomputed from the new inputs.

use std::sync::Arc;

use crate::flow::action::{ActionKind, OrderAction};
use crate::flow::state::{DerivedState, FlowState, OrderAssets, OrderFormState, OrderType};
use crate::models::{AssetAmount, AssetMetadata, AssetRatio, OrderRoute};
use crate::pricing::{AmmCurve, ConstantProductCurve, QuoteEngine};

pub fn reduce<C: AmmCurve>(
    engine: &QuoteEngine<C>,
    state: &OrderFormState,
    action: OrderAction,
) -> OrderFormState {
    let next = match action {
        OrderAction::SetGiven(given) => set_given(engine, state, given),
        OrderAction::SetTaken(taken) => set_taken(engine, state, taken),
        OrderAction::SetRatio(ratio) => set_ratio(engine, state, ratio),
        OrderAction::SetOrderRoute(route) => set_order_route(engine, state, route),
        OrderAction::UnsetOrderRoute => OrderFormState {
            order_route: None,
            ratio: state.ratio().map(|r| Arc::new(r.clone())),
            ..state.clone()
        },
        OrderAction::SwapOrderDirection => swap_order_direction(engine, state),
        OrderAction::ResetOrderFlow => reset(state),
        OrderAction::SetOrderType(order_type) => set_order_type(engine, state, order_type),
        OrderAction::SetOrderConsent(consent) => {
            let mut next = state.clone();
            next.flow_data.order_consent = consent;
            next
        }
        OrderAction::SetFlowState(flow_state) => {
            let mut next = state.clone();
            next.flow_data.flow_state = flow_state;
            next
        }
        OrderAction::SetContractVersion(version) => {
            let mut next = state.clone();
            next.flow_data.contract_version = version;
            next
        }
        OrderAction::SetAdaAfterSwap(ada) => {
            let mut next = state.clone();
            next.derived.ada_after_swap = ada;
            next
        }
        OrderAction::SetTransaction(transaction) => {
            let mut next = state.clone();
            next.derived.transaction = transaction;
            next
        }
    };
    with_derived(engine, next)
}

fn set_given<C: AmmCurve>(
    engine: &QuoteEngine<C>,
    state: &OrderFormState,
    given: AssetAmount,
) -> OrderFormState {
    let taken = match state.route() {
        None => state.assets.taken.clone(),
        Some(route) if pair_matches(route, Some(&given), state.taken()) => engine
            .quote_taken_from_given(
                Some(&given),
                Some(route),
                state.ratio(),
                state.is_limit(),
                state.taken(),
            ),
        Some(_) => state.taken().map(|t| AssetAmount::zero(t.metadata.clone())),
    };
    OrderFormState {
        assets: OrderAssets {
            given: Some(given),
            taken,
        },
        ..state.clone()
    }
}

fn set_taken<C: AmmCurve>(
    engine: &QuoteEngine<C>,
    state: &OrderFormState,
    taken: AssetAmount,
) -> OrderFormState {
    let given = match state.route() {
        None => state.assets.given.clone(),
        Some(route) if pair_matches(route, Some(&taken), state.given()) => engine
            .quote_given_from_taken(
                state.given(),
                Some(&taken),
                Some(route),
                state.ratio(),
                state.is_limit(),
            ),
        Some(_) => state.given().map(|g| AssetAmount::zero(g.metadata.clone())),
    };
    OrderFormState {
        assets: OrderAssets {
            given,
            taken: Some(taken),
        },
        ..state.clone()
    }
}

fn set_ratio<C: AmmCurve>(
    engine: &QuoteEngine<C>,
    state: &OrderFormState,
    ratio: AssetRatio,
) -> OrderFormState {
    let taken =
        engine.quote_taken_from_given(state.given(), state.route(), Some(&ratio), true, state.taken());
    OrderFormState {
        assets: OrderAssets {
            given: state.assets.given.clone(),
            taken,
        },
        ratio: Some(Arc::new(ratio)),
        ..state.clone()
    }
}

fn set_order_route<C: AmmCurve>(
    engine: &QuoteEngine<C>,
    state: &OrderFormState,
    route: OrderRoute,
) -> OrderFormState {
    let (entry, exit) = route.endpoints();

    let (given, taken) = match (state.given(), state.taken()) {
        (None, None) => (
            AssetAmount::zero(entry.clone()),
            AssetAmount::zero(exit.clone()),
        ),
        (given, taken) => {
            let taken_in_route = taken.filter(|t| route.has_endpoint(t.asset_id()));
            let given = match given {
                Some(g) if route.has_endpoint(g.asset_id()) => g.clone(),
                Some(g) => g.retyped(other_endpoint(&route, taken_in_route.map(|t| t.asset_id())).clone()),
                None => AssetAmount::zero(other_endpoint(&route, taken_in_route.map(|t| t.asset_id())).clone()),
            };
            let taken = match taken {
                Some(t) if route.has_endpoint(t.asset_id()) && !t.same_asset(&given) => t.clone(),
                Some(t) => t.retyped(other_endpoint(&route, Some(given.asset_id())).clone()),
                None => AssetAmount::zero(other_endpoint(&route, Some(given.asset_id())).clone()),
            };
            (given, taken)
        }
    };

    let taken = engine.quote_taken_from_given(
        Some(&given),
        Some(&route),
        state.ratio(),
        state.is_limit(),
        Some(&taken),
    );
    OrderFormState {
        assets: OrderAssets {
            given: Some(given),
            taken,
        },
        order_route: Some(Arc::new(route)),
        ..state.clone()
    }
}

fn swap_order_direction<C: AmmCurve>(
    engine: &QuoteEngine<C>,
    state: &OrderFormState,
) -> OrderFormState {
    let given = state.assets.taken.clone();
    let taken = state.assets.given.clone();
    let taken = requote_taken(engine, state, given.as_ref(), taken.as_ref(), state.is_limit());
    OrderFormState {
        assets: OrderAssets { given, taken },
        ..state.clone()
    }
}

fn reset(state: &OrderFormState) -> OrderFormState {
    let mut next = OrderFormState::with_numeraire(AssetMetadata::ada());
    next.flow_data = state.flow_data.clone();
    next.flow_data.flow_state = FlowState::Reset;
    next
}

fn set_order_type<C: AmmCurve>(
    engine: &QuoteEngine<C>,
    state: &OrderFormState,
    order_type: OrderType,
) -> OrderFormState {
    let taken = requote_taken(
        engine,
        state,
        state.given(),
        state.taken(),
        order_type.is_limit(),
    );
    let mut next = OrderFormState {
        assets: OrderAssets {
            given: state.assets.given.clone(),
            taken,
        },
        ..state.clone()
    };
    next.flow_data.order_type = order_type;
    next
}

/// Requote `taken` from `given` under the current route and ratio, leaving
/// it untouched when `given` is not one of the route's outer assets.
fn requote_taken<C: AmmCurve>(
    engine: &QuoteEngine<C>,
    state: &OrderFormState,
    given: Option<&AssetAmount>,
    taken: Option<&AssetAmount>,
    is_limit: bool,
) -> Option<AssetAmount> {
    match (state.route(), given) {
        (Some(route), Some(g)) if route.has_endpoint(g.asset_id()) => {
            engine.quote_taken_from_given(given, Some(route), state.ratio(), is_limit, taken)
        }
        _ => taken.cloned(),
    }
}

/// Whether `changed` together with the other side forms the route's pair.
/// With the other side missing, `changed` only has to be a route endpoint.
fn pair_matches(route: &OrderRoute, changed: Option<&AssetAmount>, other: Option<&AssetAmount>) -> bool {
    match (changed, other) {
        (Some(changed), Some(other)) => route.matches_pair(changed.asset_id(), other.asset_id()),
        (Some(changed), None) => route.has_endpoint(changed.asset_id()),
        _ => false,
    }
}

fn other_endpoint<'a>(route: &'a OrderRoute, used: Option<&str>) -> &'a AssetMetadata {
    let (entry, exit) = route.endpoints();
    match used {
        Some(id) if id == entry.asset_id => exit,
        Some(id) if id == exit.asset_id => entry,
        _ => entry,
    }
}

/// Recompute the market-mode safety estimate and spot ratio from
/// `{given, order_route}` and the chosen `taken`.
fn with_derived<C: AmmCurve>(engine: &QuoteEngine<C>, mut state: OrderFormState) -> OrderFormState {
    let (swap_outcome, taken_exceeds_reserves, spot_ratio) = match (state.route(), state.given()) {
        (Some(route), Some(given)) if route.has_endpoint(given.asset_id()) => {
            let spot = Some(engine.spot_ratio(route, given.asset_id()));
            if given.is_zero() {
                (None, false, spot)
            } else {
                let outcome = engine.route_outcome(given, route);
                let exceeds = engine.exceeds_reserves(&outcome, route, state.taken());
                (Some(outcome), exceeds, spot)
            }
        }
        _ => (None, false, None),
    };
    state.derived = DerivedState {
        swap_outcome,
        taken_exceeds_reserves,
        spot_ratio,
        ..state.derived
    };
    state
}

/// Event handed to an injected trace callback after each dispatch.
#[derive(Debug)]
pub struct TraceEvent<'a> {
    pub action_kind: ActionKind,
    pub payload: &'a OrderAction,
    pub new_state: &'a OrderFormState,
}

pub type TraceCallback = Box<dyn Fn(&TraceEvent<'_>) + Send + Sync>;

/// Serialized dispatcher owning the current snapshot.
pub struct OrderFlow<C = ConstantProductCurve> {
    engine: QuoteEngine<C>,
    state: OrderFormState,
    tracer: Option<TraceCallback>,
}

impl Default for OrderFlow<ConstantProductCurve> {
    fn default() -> Self {
        Self::new(QuoteEngine::default(), OrderFormState::default())
    }
}

impl<C: AmmCurve> OrderFlow<C> {
    pub fn new(engine: QuoteEngine<C>, state: OrderFormState) -> Self {
        Self {
            engine,
            state,
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: impl Fn(&TraceEvent<'_>) + Send + Sync + 'static) -> Self {
        self.tracer = Some(Box::new(tracer));
        self
    }

    pub fn state(&self) -> &OrderFormState {
        &self.state
    }

    pub fn engine(&self) -> &QuoteEngine<C> {
        &self.engine
    }

    pub fn dispatch(&mut self, action: OrderAction) -> &OrderFormState {
        let action_kind = action.kind();
        let payload = self.tracer.as_ref().map(|_| action.clone());
        self.state = reduce(&self.engine, &self.state, action);
        tracing::trace!(
            action = %action_kind,
            flow_state = ?self.state.flow_data.flow_state,
            exceeds_reserves = self.state.derived.taken_exceeds_reserves,
            "order flow transition"
        );
        if let (Some(tracer), Some(payload)) = (&self.tracer, &payload) {
            tracer(&TraceEvent {
                action_kind,
                payload,
                new_state: &self.state,
            });
        }
        &self.state
    }
}
