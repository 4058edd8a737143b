//! # Scene Logic
//!
//! A scene is one screen's worth of behavior: its state shape, the actions
//! that can change it, a pure reducer, and the listeners that carry out
//! side effects. [`SceneLogic`] bundles those into a single type that a
//! [`SceneStore`](crate::SceneStore) can run.
//!
//! The split mirrors the classic unidirectional loop:
//!
//! ```text
//! dispatch(action)
//!     -> reduce(&mut state, &action)      pure, synchronous
//!     -> snapshot published                subscribers wake
//!     -> react(&action, &state, effects)   side effects, may chain
//! ```
//!
//! `reduce` must stay deterministic and free of I/O so that the same
//! action sequence always produces the same state. Everything with a clock,
//! a network or a dialog in it belongs in `react`, which runs after the
//! reducer pass and sees the post-reduce state.
//!
//! Collaborators (API client, storage, notifications, navigation) are not
//! reached through globals. They arrive as a `Deps` value when the store is
//! spawned and are handed to listeners via
//! [`Effects::deps`](crate::Effects::deps), so tests can substitute every
//! boundary.

use async_trait::async_trait;

use crate::action::StoreAction;
use crate::effects::Effects;

/// The behavior of one scene, run by a [`SceneStore`](crate::SceneStore).
///
/// Implementors are zero-sized marker types; all methods are associated
/// functions. State lives in the store task, never in the logic type.
#[async_trait]
pub trait SceneLogic: Send + Sync + Sized + 'static {
    /// Snapshot type published to subscribers. Value equality gates
    /// publication: a reducer pass that leaves the state equal to the
    /// previous snapshot wakes nobody.
    type State: Clone + PartialEq + Send + Sync + 'static;

    /// The scene's action enum.
    type Action: StoreAction;

    /// Injected collaborators, supplied at spawn time.
    type Deps: Send + Sync + 'static;

    /// Label used in traces. Defaults to the logic type's bare name.
    fn name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// The state a fresh store starts from. May read `deps` (for example
    /// to rehydrate persisted fields) but must not block.
    fn initial(deps: &Self::Deps) -> Self::State;

    /// Applies `action` to `state`. Pure and synchronous: no I/O, no
    /// clocks, no dispatching. Runs exactly once per action, before any
    /// listener sees it.
    fn reduce(state: &mut Self::State, action: &Self::Action);

    /// Reacts to a reduced action. Runs after the snapshot for `action`
    /// was published, with read access to the post-reduce state. Chained
    /// dispatches queued here are drained before the store picks up the
    /// next mailbox envelope.
    async fn react(
        _action: &Self::Action,
        _state: &Self::State,
        _effects: &mut Effects<'_, Self>,
    ) {
    }

    /// One-time setup pass, run before the first envelope. Typically used
    /// to kick off initial loads.
    async fn on_mount(_state: &Self::State, _effects: &mut Effects<'_, Self>) {}

    /// The listener graph: every `from -> to` pair this scene's `react`
    /// may chain via [`Effects::dispatch`](crate::Effects::dispatch).
    /// Checked for cycles when the store is built.
    fn effect_edges() -> &'static [(&'static str, &'static str)] {
        &[]
    }
}
