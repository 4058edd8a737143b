//! # Scene Facade
//!
//! Optional trait for wrapping a [`StoreHandle`] in a domain-flavored
//! client type. A wrapper implements [`facade`](SceneFacade::facade) and
//! inherits forwarding methods, then adds its own named operations on top
//! so call sites read as intent ("invite this member") rather than store
//! mechanics ("dispatch this variant").

use async_trait::async_trait;
use tokio::sync::watch;

use crate::action::StoreAction;
use crate::error::StoreError;
use crate::handle::StoreHandle;
use crate::logic::SceneLogic;

/// Domain wrapper around one scene's [`StoreHandle`].
///
/// ```rust,ignore
/// pub struct MembersClient {
///     handle: StoreHandle<MembersLogic>,
/// }
///
/// impl SceneFacade<MembersLogic> for MembersClient {
///     fn facade(&self) -> &StoreHandle<MembersLogic> {
///         &self.handle
///     }
/// }
///
/// impl MembersClient {
///     pub async fn invite(&self, email: &str) -> Result<(), StoreError> {
///         self.send(MembersAction::InviteSubmitted { email: email.into() }).await
///     }
/// }
/// ```
#[async_trait]
pub trait SceneFacade<L: SceneLogic>: Send + Sync {
    /// The wrapped handle.
    fn facade(&self) -> &StoreHandle<L>;

    /// Dispatches an action through the wrapped handle.
    #[tracing::instrument(skip_all, fields(action = action.kind()))]
    async fn send(&self, action: L::Action) -> Result<(), StoreError> {
        self.facade().dispatch(action).await
    }

    /// Waits for previously dispatched work to settle.
    async fn settled(&self) -> Result<(), StoreError> {
        self.facade().settled().await
    }

    /// Latest published snapshot.
    fn state(&self) -> L::State {
        self.facade().state()
    }

    /// Fresh snapshot subscription.
    fn subscribe(&self) -> watch::Receiver<L::State> {
        self.facade().subscribe()
    }
}
