//! # Scene Store
//!
//! A state container pattern for screen-sized units of an interactive
//! application, built on Tokio. Each screen ("scene") gets one store: a
//! task that owns the scene's state and processes dispatched actions
//! strictly in order through a pure reducer and an async listener layer.
//!
//! ## Architecture
//!
//! ```text
//!   StoreHandle ─── dispatch(action) ───▶ ┌─────────────────────────┐
//!   (cloneable)                           │  SceneStore (one task)  │
//!        ▲                                │                         │
//!        │ subscribe() / state()          │  reduce → publish →     │
//!        └──── watch snapshots ◀───────── │  react → drain chain    │
//!                                         └───────────┬─────────────┘
//!                                                     │ Effects
//!                                 loads, debounces, dialogs, navigation
//! ```
//!
//! One task per scene is the entire concurrency story: reducers never
//! race, listener chains finish before the next envelope, and anything
//! slow leaves the task and re-enters through the mailbox as a fresh
//! action. Stale-response safety is data, not scheduling:
//! [`LoaderCell`] tickets make superseded completions inert wherever
//! they land in the order.
//!
//! ## Key components
//!
//! - [`SceneLogic`]: one scene's state shape, actions, pure reducer and
//!   listeners, as a single implementable trait.
//! - [`SceneStore`] / [`StoreHandle`]: the per-scene task and its
//!   cloneable front door, with a [`settled`](StoreHandle::settled)
//!   barrier for deterministic tests.
//! - [`Effects`]: what listeners are allowed to do, including chained
//!   dispatch gated by a declared acyclic listener graph.
//! - [`LoaderCell`] and [`Memo`]: remote state with discard-by-recency,
//!   and input-keyed derivation caching.
//! - [`Form`] plus [`form_model!`]: one submission lifecycle for every
//!   screen that edits anything, with generated typed field setters.
//! - [`RouteTable`] / [`Navigator`]: URL-to-state and state-to-URL
//!   binding.
//! - Boundary traits ([`HttpClient`], [`Storage`], [`Toasts`],
//!   [`Dialogs`]) so every scene collaborator is injected and
//!   substitutable, with [`MockApi`] as the scripted HTTP double.

pub mod action;
pub mod effects;
pub mod error;
pub mod facade;
pub mod form;
pub mod handle;
pub mod http;
pub mod loader;
pub mod logic;
pub mod message;
pub mod mock;
pub mod notify;
pub mod router;
pub mod selector;
pub mod storage;
pub mod store;

// Re-export the working set so scenes can import from the crate root.
pub use action::StoreAction;
pub use effects::{EffectGraph, Effects};
pub use error::StoreError;
pub use facade::SceneFacade;
pub use form::{FieldErrors, Form, FormModel};
pub use handle::StoreHandle;
pub use http::{decode, ApiError, HttpClient};
pub use loader::{LoadTicket, LoaderCell, Resolution};
pub use logic::SceneLogic;
pub use message::StoreMsg;
pub use mock::{DeferredReply, Method, MockApi, RecordedRequest};
pub use notify::{AcceptAll, Choice, Dialogs, RecordingToasts, ScriptedDialogs, Severity, Toasts, TracingToasts};
pub use router::{bind_routes, Location, MemoryNavigator, Navigator, PathParams, QueryParams, RoutePattern, RouteTable};
pub use selector::Memo;
pub use storage::{MemoryStorage, ScopedStorage, Storage};
pub use store::{SceneStore, DEFAULT_MAILBOX};

// The form_model! expansion refers to paste through this path.
#[doc(hidden)]
pub use paste;
