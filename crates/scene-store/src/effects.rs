//! # Effects
//!
//! Listeners receive an [`Effects`] value scoped to the action being
//! handled. It is the only doorway out of a reducer pass: chained
//! dispatches, remote loads, debounced follow-ups and free-form async work
//! all go through it, which is what keeps reducers pure and the store's
//! sequencing guarantees intact.
//!
//! ## The listener graph
//!
//! Synchronous re-dispatch is the one effect that can loop forever, so it
//! is gated by a declared graph. Each scene lists its `from -> to` action
//! edges in [`SceneLogic::effect_edges`]; the store rejects a cyclic graph
//! at construction, and [`Effects::dispatch`] refuses to enqueue along an
//! undeclared edge. Together those two checks turn "listener chains
//! terminate" from a convention into a property: every chained action
//! walks a declared edge, and the declared edges form a DAG.
//!
//! Work that re-enters the store asynchronously ([`Effects::load`],
//! [`Effects::debounce`], [`Effects::spawn`]) arrives later as an ordinary
//! mailbox envelope and is not part of the graph.
//!
//! [`SceneLogic::effect_edges`]: crate::SceneLogic::effect_edges

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::action::StoreAction;
use crate::error::StoreError;
use crate::handle::SelfDispatcher;
use crate::loader::LoadTicket;
use crate::logic::SceneLogic;

/// Declared action-to-action listener edges for one scene.
#[derive(Debug, Clone)]
pub struct EffectGraph {
    edges: Vec<(&'static str, &'static str)>,
}

impl EffectGraph {
    pub fn from_edges(edges: &'static [(&'static str, &'static str)]) -> Self {
        Self { edges: edges.to_vec() }
    }

    /// Whether a chained dispatch from `from` to `to` is declared.
    pub fn allows(&self, from: &str, to: &str) -> bool {
        self.edges.iter().any(|(f, t)| *f == from && *t == to)
    }

    /// Rejects graphs in which some action could, transitively, re-enqueue
    /// itself. Reports one action on the offending cycle.
    pub fn check_acyclic(&self) -> Result<(), StoreError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Open,
            Done,
        }

        fn visit(
            node: &'static str,
            edges: &[(&'static str, &'static str)],
            marks: &mut HashMap<&'static str, Mark>,
        ) -> Result<(), &'static str> {
            match marks.get(node).copied().unwrap_or(Mark::New) {
                Mark::Open => return Err(node),
                Mark::Done => return Ok(()),
                Mark::New => {}
            }
            marks.insert(node, Mark::Open);
            for &(from, to) in edges {
                if from == node {
                    visit(to, edges, marks)?;
                }
            }
            marks.insert(node, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for &(from, _) in &self.edges {
            visit(from, &self.edges, &mut marks)
                .map_err(|node| StoreError::CyclicEffects(node.to_string()))?;
        }
        Ok(())
    }
}

/// Where the current listener pass was entered from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Origin {
    /// One-time mount pass. Runs once, so chained dispatches from it
    /// cannot loop and need no declared edges.
    Mount,
    /// A reduced action, identified by its kind label.
    Action(&'static str),
}

/// Named, single-slot debounce timers owned by the store task.
#[derive(Default)]
pub(crate) struct DebounceMap {
    pending: HashMap<&'static str, JoinHandle<()>>,
}

impl DebounceMap {
    /// Arms `key`, aborting any timer already pending under it. This is
    /// what collapses a burst of triggers into one trailing-edge fire.
    pub(crate) fn replace(&mut self, key: &'static str, task: JoinHandle<()>) {
        if let Some(old) = self.pending.insert(key, task) {
            old.abort();
        }
    }

    pub(crate) fn cancel(&mut self, key: &'static str) {
        if let Some(old) = self.pending.remove(key) {
            old.abort();
        }
    }

    pub(crate) fn abort_all(&mut self) {
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }
}

/// Capability handed to listeners for the duration of one action.
pub struct Effects<'a, L: SceneLogic> {
    deps: &'a L::Deps,
    dispatcher: &'a SelfDispatcher<L>,
    chain: &'a mut VecDeque<L::Action>,
    debounce: &'a mut DebounceMap,
    origin: Origin,
    graph: &'a EffectGraph,
}

impl<'a, L: SceneLogic> Effects<'a, L> {
    pub(crate) fn new(
        deps: &'a L::Deps,
        dispatcher: &'a SelfDispatcher<L>,
        chain: &'a mut VecDeque<L::Action>,
        debounce: &'a mut DebounceMap,
        origin: Origin,
        graph: &'a EffectGraph,
    ) -> Self {
        Self { deps, dispatcher, chain, debounce, origin, graph }
    }

    /// The injected collaborators this scene was spawned with.
    pub fn deps(&self) -> &L::Deps {
        self.deps
    }

    /// Chains `action` onto the current dispatch: it is reduced, published
    /// and reacted to before the store picks up the next mailbox envelope.
    ///
    /// The edge from the current action to `action` must be declared in
    /// [`SceneLogic::effect_edges`](crate::SceneLogic::effect_edges);
    /// undeclared edges are dropped with a warning (and panic under
    /// `debug_assertions`), preserving the termination guarantee.
    pub fn dispatch(&mut self, action: L::Action) {
        if let Origin::Action(from) = self.origin {
            let to = action.kind();
            if !self.graph.allows(from, to) {
                warn!(from, to, "Dropping chained dispatch along undeclared listener edge");
                debug_assert!(false, "undeclared listener edge {from} -> {to}");
                return;
            }
        }
        self.chain.push_back(action);
    }

    /// Runs `request` off the store task and feeds its outcome back in as
    /// the action built by `into`, carrying `ticket` so the reducer can
    /// route it through [`LoaderCell::resolve`](crate::LoaderCell::resolve).
    ///
    /// A tuple-variant constructor is the usual `into`:
    ///
    /// ```rust,ignore
    /// let api = effects.deps().api.clone();
    /// effects.load(
    ///     ticket,
    ///     async move { api.get("/api/projects").await.and_then(decode) },
    ///     CliAuthAction::ProjectsLoaded,
    /// );
    /// ```
    pub fn load<T, E, F, Into>(&mut self, ticket: LoadTicket, request: F, into: Into)
    where
        T: Send + 'static,
        E: Send + 'static,
        F: Future<Output = Result<T, E>> + Send + 'static,
        Into: FnOnce(LoadTicket, Result<T, E>) -> L::Action + Send + 'static,
    {
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            let outcome = request.await;
            dispatcher.dispatch(into(ticket, outcome)).await;
        });
    }

    /// Arms (or re-arms) the debounce timer named `key`. When `delay`
    /// elapses without another call for the same key, `action` is
    /// dispatched as a fresh envelope. Re-arming replaces the pending
    /// action, so only the final one in a burst ever fires.
    pub fn debounce(&mut self, key: &'static str, delay: Duration, action: L::Action) {
        debug!(key, delay_ms = delay.as_millis() as u64, "Debounce armed");
        let dispatcher = self.dispatcher.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            dispatcher.dispatch(action).await;
        });
        self.debounce.replace(key, task);
    }

    /// Disarms a pending debounce, if any.
    pub fn cancel_debounce(&mut self, key: &'static str) {
        self.debounce.cancel(key);
    }

    /// Runs free-form async work off the store task. If the future yields
    /// an action it is dispatched as a fresh envelope; `None` ends the
    /// effect silently. Confirmation dialogs are the typical caller.
    pub fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = Option<L::Action>> + Send + 'static,
    {
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            if let Some(action) = work.await {
                dispatcher.dispatch(action).await;
            }
        });
    }
}
