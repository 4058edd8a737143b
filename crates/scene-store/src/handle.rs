//! # Store Handle
//!
//! The cheap, cloneable reference to a running [`SceneStore`]. A handle
//! can dispatch actions, read the latest published snapshot, subscribe to
//! snapshot changes, and wait for the store to settle. Handles are the
//! only way in; the state itself never leaves the store task except as a
//! cloned snapshot.
//!
//! [`SceneStore`]: crate::SceneStore

use tokio::sync::{mpsc, oneshot, watch};

use crate::error::StoreError;
use crate::logic::SceneLogic;
use crate::message::StoreMsg;

/// Handle to a running store.
pub struct StoreHandle<L: SceneLogic> {
    sender: mpsc::Sender<StoreMsg<L>>,
    snapshots: watch::Receiver<L::State>,
}

// Manual impl: a derived Clone would demand `L: Clone`, which scene logic
// types never are.
impl<L: SceneLogic> Clone for StoreHandle<L> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<L: SceneLogic> StoreHandle<L> {
    pub(crate) fn new(
        sender: mpsc::Sender<StoreMsg<L>>,
        snapshots: watch::Receiver<L::State>,
    ) -> Self {
        Self { sender, snapshots }
    }

    /// Queues an action for the store.
    ///
    /// Resolves once the action is in the mailbox, not once it has been
    /// reduced. Follow with [`settled`](Self::settled) when the caller
    /// needs to observe its outcome.
    pub async fn dispatch(&self, action: L::Action) -> Result<(), StoreError> {
        self.sender
            .send(StoreMsg::Dispatch(action))
            .await
            .map_err(|_| StoreError::StoreClosed)
    }

    /// Waits until everything dispatched before this call has been fully
    /// processed: reducers run, listener chains drained, snapshots
    /// published. Work that re-enters asynchronously (loads in flight,
    /// pending debounces) is not waited for.
    pub async fn settled(&self) -> Result<(), StoreError> {
        let (reply, done) = oneshot::channel();
        self.sender
            .send(StoreMsg::Settled(reply))
            .await
            .map_err(|_| StoreError::StoreClosed)?;
        done.await.map_err(|_| StoreError::StoreDropped)
    }

    /// The most recently published state snapshot.
    pub fn state(&self) -> L::State {
        self.snapshots.borrow().clone()
    }

    /// A fresh subscription to state snapshots.
    ///
    /// Snapshots are published after every reducer pass that changed the
    /// state by value. `watch` semantics apply: a slow subscriber sees the
    /// latest snapshot, not every intermediate one.
    pub fn subscribe(&self) -> watch::Receiver<L::State> {
        self.snapshots.clone()
    }
}

/// The store's reference to its own mailbox, held weakly so that a store
/// whose last external handle is gone can stop instead of keeping itself
/// alive through its own effects.
pub(crate) struct SelfDispatcher<L: SceneLogic> {
    weak: mpsc::WeakSender<StoreMsg<L>>,
}

impl<L: SceneLogic> Clone for SelfDispatcher<L> {
    fn clone(&self) -> Self {
        Self { weak: self.weak.clone() }
    }
}

impl<L: SceneLogic> SelfDispatcher<L> {
    pub(crate) fn new(weak: mpsc::WeakSender<StoreMsg<L>>) -> Self {
        Self { weak }
    }

    /// Feeds an effect outcome back into the mailbox. Silently a no-op
    /// when the store has already stopped: with no handles left, nobody
    /// could observe the result anyway.
    pub(crate) async fn dispatch(&self, action: L::Action) {
        if let Some(sender) = self.weak.upgrade() {
            let _ = sender.send(StoreMsg::Dispatch(action)).await;
        }
    }
}
