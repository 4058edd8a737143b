//! # Scene Store
//!
//! The runtime for one scene. A [`SceneStore`] owns the scene's state and
//! processes mailbox envelopes strictly one at a time on its own task,
//! which is the whole concurrency model: reducers never race, listeners
//! always see a settled post-reduce state, and two envelopes are never in
//! flight through the reducer at once. Anything slow runs off-task and
//! re-enters through the mailbox as a fresh action.
//!
//! Per envelope the store runs the dispatch loop:
//!
//! 1. Reduce the action into the state.
//! 2. Publish a snapshot if the state changed by value.
//! 3. Run the scene's listener for the action. Chained dispatches are
//!    appended to the current chain and processed the same way, in order,
//!    before the next mailbox envelope is picked up.
//!
//! A [`settled`](crate::StoreHandle::settled) barrier rides the same
//! mailbox, so "everything dispatched so far is done" is an ordering fact,
//! not a sleep in a test.

use std::collections::VecDeque;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::action::StoreAction;
use crate::effects::{DebounceMap, EffectGraph, Effects, Origin};
use crate::error::StoreError;
use crate::handle::{SelfDispatcher, StoreHandle};
use crate::logic::SceneLogic;
use crate::message::StoreMsg;

/// Mailbox capacity used by [`SceneStore::spawn`].
pub const DEFAULT_MAILBOX: usize = 32;

/// A running scene's state container. Create with [`new`](Self::new) (or
/// [`spawn`](Self::spawn)) and drive with the returned
/// [`StoreHandle`].
pub struct SceneStore<L: SceneLogic> {
    receiver: mpsc::Receiver<StoreMsg<L>>,
    state: L::State,
    deps: L::Deps,
    publisher: watch::Sender<L::State>,
    dispatcher: SelfDispatcher<L>,
    graph: EffectGraph,
}

impl<L: SceneLogic> SceneStore<L> {
    /// Builds a store and its first handle without starting it. Fails if
    /// the scene's declared listener graph contains a cycle.
    ///
    /// The store does not process anything until [`run`](Self::run) is
    /// awaited, usually on its own task.
    pub fn new(deps: L::Deps, mailbox: usize) -> Result<(Self, StoreHandle<L>), StoreError> {
        let graph = EffectGraph::from_edges(L::effect_edges());
        graph.check_acyclic()?;

        let state = L::initial(&deps);
        let (sender, receiver) = mpsc::channel(mailbox);
        let (publisher, snapshots) = watch::channel(state.clone());
        let dispatcher = SelfDispatcher::new(sender.downgrade());
        let handle = StoreHandle::new(sender, snapshots);

        let store = Self { receiver, state, deps, publisher, dispatcher, graph };
        Ok((store, handle))
    }

    /// Builds the store and runs it on a fresh task. The store stops on
    /// its own once every handle is dropped.
    pub fn spawn(deps: L::Deps) -> Result<StoreHandle<L>, StoreError> {
        let (store, handle) = Self::new(deps, DEFAULT_MAILBOX)?;
        tokio::spawn(store.run());
        Ok(handle)
    }

    /// Processes envelopes until the last handle is dropped.
    pub async fn run(mut self) {
        let scene = L::name();
        info!(scene, "Scene store started");

        let mut debounce = DebounceMap::default();
        let mut chain = VecDeque::new();

        // Mount pass: runs before the first envelope, so anything it
        // chains is settled by the time a caller's first dispatch lands.
        {
            let mut effects = Effects::new(
                &self.deps,
                &self.dispatcher,
                &mut chain,
                &mut debounce,
                Origin::Mount,
                &self.graph,
            );
            L::on_mount(&self.state, &mut effects).await;
        }
        self.drain(&mut chain, &mut debounce).await;

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreMsg::Dispatch(action) => {
                    chain.push_back(action);
                    self.drain(&mut chain, &mut debounce).await;
                }
                StoreMsg::Settled(reply) => {
                    let _ = reply.send(());
                }
            }
        }

        debounce.abort_all();
        info!(scene, "Scene store stopped");
    }

    /// Runs the dispatch loop until the chain is empty.
    async fn drain(&mut self, chain: &mut VecDeque<L::Action>, debounce: &mut DebounceMap) {
        let scene = L::name();
        while let Some(action) = chain.pop_front() {
            let kind = action.kind();
            debug!(scene, action = kind, "Dispatch");

            L::reduce(&mut self.state, &action);
            self.publish();

            let mut effects = Effects::new(
                &self.deps,
                &self.dispatcher,
                chain,
                debounce,
                Origin::Action(kind),
                &self.graph,
            );
            L::react(&action, &self.state, &mut effects).await;
        }
    }

    /// Publishes the current state, waking subscribers only when it
    /// differs by value from the previous snapshot.
    fn publish(&self) {
        self.publisher.send_if_modified(|snapshot| {
            if *snapshot == self.state {
                false
            } else {
                *snapshot = self.state.clone();
                true
            }
        });
    }
}
