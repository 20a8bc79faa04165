//! The consumer contract.

use fusion_protocols::FusionEvent;

/// A view that folds live events into its own state.
///
/// Reducers must be idempotent: seeing the same event twice leaves the
/// state as if it was seen once. Events a reducer does not own are ignored.
pub trait EventReducer: Send {
    fn name(&self) -> &'static str;

    /// Apply one event. Returns whether the state changed.
    fn reduce(&mut self, event: &FusionEvent) -> bool;
}
