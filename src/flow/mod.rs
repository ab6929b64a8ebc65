//! Order-form state machine: immutable snapshots, typed actions and the
//! reducer that moves between them.

pub mod action;
pub mod reducer;
pub mod state;

pub use action::{ActionKind, OrderAction};
pub use reducer::{reduce, OrderFlow, TraceCallback, TraceEvent};
pub use state::{
    DerivedState, FlowData, FlowState, OrderAssets, OrderFormState, OrderType, TransactionPreview,
};
