//! State store for the media kit builder.
//!
//! The store is the single source of truth for the component/section tree.
//! Every mutation goes through [`StateStore::dispatch`] with a typed
//! [`Action`]; readers take cheap `Arc` snapshots.
//!
//! # Notifications
//!
//! State changes are announced on a typed broadcast bus as
//! [`StoreEvent`]s. Dispatches inside a batch are coalesced: however many
//! actions run between [`StateStore::begin_batch`] and the guard's drop,
//! subscribers see exactly one `Changed` event.
//!
//! # Missing ids
//!
//! Actions that reference a component or section that does not exist are
//! ignored and reported as [`DispatchOutcome::Ignored`]; they never fail.

mod action;
mod reducer;
mod store;

pub use action::{Action, ActionKind, MoveTarget};
pub use store::{
    BatchGuard, DispatchOutcome, HistoryDirection, StateStore, StoreConfig, StoreEvent,
};
