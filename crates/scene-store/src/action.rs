//! # Actions
//!
//! Every state change flows through a single action enum per scene. An
//! action is plain data: the reducer interprets it, listeners react to it,
//! and the store logs it. Stringly-typed action names never appear at call
//! sites; the only string a variant carries is its [`kind`] label, used for
//! tracing output and for declaring listener edges.
//!
//! [`kind`]: StoreAction::kind

use std::fmt;

/// Marker trait for a scene's action enum.
///
/// Implementations are cheap data enums. Derive `Debug` (and usually
/// `Clone`) on them; the store logs the `Debug` form at debug level.
///
/// ```
/// use scene_store::StoreAction;
///
/// #[derive(Debug, Clone)]
/// enum CounterAction {
///     Incremented,
///     SetTo(i64),
/// }
///
/// impl StoreAction for CounterAction {
///     fn kind(&self) -> &'static str {
///         match self {
///             CounterAction::Incremented => "incremented",
///             CounterAction::SetTo(_) => "set_to",
///         }
///     }
/// }
///
/// assert_eq!(CounterAction::SetTo(3).kind(), "set_to");
/// ```
pub trait StoreAction: fmt::Debug + Send + 'static {
    /// Stable per-variant label.
    ///
    /// Used as the node name in the listener graph and as the `action`
    /// field in store traces. Keep it snake_case and unique per variant.
    fn kind(&self) -> &'static str;
}
