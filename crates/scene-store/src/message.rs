//! # Store Messages
//!
//! The envelope type carried by a store's mailbox. External callers only
//! ever construct these through [`StoreHandle`](crate::StoreHandle).

use tokio::sync::oneshot;

use crate::logic::SceneLogic;

/// One message in a store's mailbox.
pub enum StoreMsg<L: SceneLogic> {
    /// Run an action through the reducer and its listeners.
    Dispatch(L::Action),
    /// Reply once every envelope queued before this one has fully
    /// settled, listener chains included. The deterministic test barrier.
    Settled(oneshot::Sender<()>),
}
