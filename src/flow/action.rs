use std::fmt;

use serde::{Deserialize, Serialize};

use crate::flow::state::{FlowState, OrderType, TransactionPreview};
use crate::models::{AssetAmount, AssetRatio, ContractVersion, OrderRoute};

/// Every transition the order form accepts, each with its own payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum OrderAction {
    SetGiven(AssetAmount),
    SetTaken(AssetAmount),
    SetRatio(AssetRatio),
    SetOrderRoute(OrderRoute),
    UnsetOrderRoute,
    /// Under market requotes each swap re-prices, so amounts drift rather than round-trip.
    SwapOrderDirection,
    ResetOrderFlow,
    SetOrderType(OrderType),
    SetOrderConsent(bool),
    SetFlowState(FlowState),
    SetContractVersion(ContractVersion),
    SetAdaAfterSwap(Option<AssetAmount>),
    SetTransaction(Option<TransactionPreview>),
}

/// Payload-free discriminant of [`OrderAction`], for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    SetGiven,
    SetTaken,
    SetRatio,
    SetOrderRoute,
    UnsetOrderRoute,
    SwapOrderDirection,
    ResetOrderFlow,
    SetOrderType,
    SetOrderConsent,
    SetFlowState,
    SetContractVersion,
    SetAdaAfterSwap,
    SetTransaction,
}

impl OrderAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            OrderAction::SetGiven(_) => ActionKind::SetGiven,
            OrderAction::SetTaken(_) => ActionKind::SetTaken,
            OrderAction::SetRatio(_) => ActionKind::SetRatio,
            OrderAction::SetOrderRoute(_) => ActionKind::SetOrderRoute,
            OrderAction::UnsetOrderRoute => ActionKind::UnsetOrderRoute,
            OrderAction::SwapOrderDirection => ActionKind::SwapOrderDirection,
            OrderAction::ResetOrderFlow => ActionKind::ResetOrderFlow,
            OrderAction::SetOrderType(_) => ActionKind::SetOrderType,
            OrderAction::SetOrderConsent(_) => ActionKind::SetOrderConsent,
            OrderAction::SetFlowState(_) => ActionKind::SetFlowState,
            OrderAction::SetContractVersion(_) => ActionKind::SetContractVersion,
            OrderAction::SetAdaAfterSwap(_) => ActionKind::SetAdaAfterSwap,
            OrderAction::SetTransaction(_) => ActionKind::SetTransaction,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
