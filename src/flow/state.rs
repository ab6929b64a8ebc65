use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{AssetAmount, AssetMetadata, AssetRatio, ContractVersion, OrderRoute, SwapOutcome};

/// Phase of the order flow. Set only by explicit dispatch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum FlowState {
    #[default]
    Initial,
    Preview,
    PreviewCancelled,
    Submitting,
    SubmittingCancelled,
    Success,
    Error,
    Reset,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Market,
    Limit,
}

impl OrderType {
    pub fn is_limit(&self) -> bool {
        matches!(self, OrderType::Limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OrderAssets {
    pub given: Option<AssetAmount>,
    pub taken: Option<AssetAmount>,
}

/// Fee summary of a built, not yet submitted, transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionPreview {
    pub cbor: Option<String>,
    pub network_fee: AssetAmount,
    pub scooper_fee: AssetAmount,
    pub deposit: AssetAmount,
}

/// Values computed from the inputs; never set directly by a caller except
/// the plain `ada_after_swap` / `transaction` merges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DerivedState {
    pub swap_outcome: Option<Vec<SwapOutcome>>,
    pub taken_exceeds_reserves: bool,
    pub spot_ratio: Option<AssetRatio>,
    pub ada_after_swap: Option<AssetAmount>,
    pub transaction: Option<TransactionPreview>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowData {
    pub flow_state: FlowState,
    pub order_type: OrderType,
    pub order_consent: bool,
    pub contract_version: ContractVersion,
}

impl Default for FlowData {
    fn default() -> Self {
        Self {
            flow_state: FlowState::Initial,
            order_type: OrderType::Market,
            order_consent: false,
            contract_version: ContractVersion::V3,
        }
    }
}

/// Immutable snapshot of the order form. Every dispatch produces a new one.
///
/// `ratio` and `order_route` sit behind `Arc`, so a snapshot shares them
/// with its predecessor until a transition replaces them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderFormState {
    pub assets: OrderAssets,
    pub ratio: Option<Arc<AssetRatio>>,
    pub order_route: Option<Arc<OrderRoute>>,
    pub derived: DerivedState,
    pub flow_data: FlowData,
}

impl Default for OrderFormState {
    fn default() -> Self {
        Self::with_numeraire(AssetMetadata::ada())
    }
}

impl OrderFormState {
    /// Fresh form giving zero of `numeraire`.
    pub fn with_numeraire(numeraire: AssetMetadata) -> Self {
        Self {
            assets: OrderAssets {
                given: Some(AssetAmount::zero(numeraire)),
                taken: None,
            },
            ratio: None,
            order_route: None,
            derived: DerivedState::default(),
            flow_data: FlowData::default(),
        }
    }

    pub fn given(&self) -> Option<&AssetAmount> {
        self.assets.given.as_ref()
    }

    pub fn taken(&self) -> Option<&AssetAmount> {
        self.assets.taken.as_ref()
    }

    pub fn route(&self) -> Option<&OrderRoute> {
        self.order_route.as_deref()
    }

    pub fn ratio(&self) -> Option<&AssetRatio> {
        self.ratio.as_deref()
    }

    pub fn is_limit(&self) -> bool {
        self.flow_data.order_type.is_limit()
    }
}
