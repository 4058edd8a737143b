//! # Console Orchestration
//!
//! Individual scenes are simple; wiring them together is where the
//! complexity lives. This module is the conductor:
//!
//! - [`ConsoleDeps`] is the bundle of injected capabilities (HTTP,
//!   storage, toasts, dialogs, navigator, config) every scene receives.
//!   Nothing in the sample reaches for a global.
//! - [`ConsoleSystem`] spawns every scene store, binds the routed scenes
//!   to the navigator, and coordinates graceful shutdown.
//! - [`ScopesClient`] and [`MembersClient`] wrap raw handles in
//!   domain-flavored facades, so call sites read as intent.
//!
//! Shutdown follows the store lifecycle: the route-binding watcher tasks
//! are aborted first (they hold store handles of their own), then the
//! system's handles are dropped, each mailbox closes, and the store tasks
//! drain and exit.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use scene_store::{
    bind_routes, Dialogs, HttpClient, MemoryNavigator, MemoryStorage, Memo, MockApi, Navigator,
    RecordingToasts, RouteTable, SceneFacade, SceneStore, ScopedStorage, ScriptedDialogs, Storage,
    StoreError, StoreHandle, Toasts, DEFAULT_MAILBOX,
};

use crate::api::{Member, MemberLevel};
use crate::config::ConsoleConfig;
use crate::scenes::api_scopes::{self, access_map, missing_required_scopes, AccessLevel, ApiScopesLogic};
use crate::scenes::cli_auth::CliAuthLogic;
use crate::scenes::members::{MembersAction, MembersLogic};
use crate::scenes::onboarding::OnboardingLogic;
use crate::scenes::pipeline::{PipelineAction, PipelineLogic, PipelineTab};
use crate::scenes::replay_settings::ReplaySettingsLogic;
use crate::scenes::signup::SignupLogic;

/// Everything a scene can touch outside its own state.
pub struct ConsoleDeps {
    pub api: Arc<dyn HttpClient>,
    pub storage: Arc<dyn Storage>,
    pub toasts: Arc<dyn Toasts>,
    pub dialogs: Arc<dyn Dialogs>,
    pub navigator: Arc<dyn Navigator>,
    pub config: ConsoleConfig,
}

impl ConsoleDeps {
    pub fn new(
        api: Arc<dyn HttpClient>,
        storage: Arc<dyn Storage>,
        toasts: Arc<dyn Toasts>,
        dialogs: Arc<dyn Dialogs>,
        navigator: Arc<dyn Navigator>,
        config: ConsoleConfig,
    ) -> Self {
        Self { api, storage, toasts, dialogs, navigator, config }
    }

    /// Storage scoped under the console namespace and one feature, so two
    /// features can both call their key `"step"` without colliding.
    pub fn feature_storage(&self, feature: &str) -> ScopedStorage {
        let namespace = format!("{}/{feature}", self.config.storage_namespace);
        ScopedStorage::new(self.storage.clone(), namespace)
    }

    /// A fully mocked dependency bundle, plus the [`MockedConsole`] rig
    /// for scripting and asserting against it.
    pub fn mocked() -> (Arc<ConsoleDeps>, MockedConsole) {
        let api = MockApi::new();
        let storage = MemoryStorage::new();
        let toasts = RecordingToasts::new();
        let dialogs = ScriptedDialogs::default();
        let navigator = Arc::new(MemoryNavigator::at("/"));

        let deps = Arc::new(ConsoleDeps::new(
            Arc::new(api.clone()),
            Arc::new(storage.clone()),
            Arc::new(toasts.clone()),
            Arc::new(dialogs.clone()),
            navigator.clone(),
            ConsoleConfig::default(),
        ));
        let rig = MockedConsole { api, storage, toasts, dialogs, navigator };
        (deps, rig)
    }
}

/// Test-side handles to every mocked capability inside a
/// [`ConsoleDeps::mocked`] bundle. Each field shares state with the
/// dependency the scenes see.
pub struct MockedConsole {
    pub api: MockApi,
    pub storage: MemoryStorage,
    pub toasts: RecordingToasts,
    pub dialogs: ScriptedDialogs,
    pub navigator: Arc<MemoryNavigator>,
}

/// Facade over the scopes scene, carrying the memoized access-map
/// selector.
pub struct ScopesClient {
    handle: StoreHandle<ApiScopesLogic>,
    access: Mutex<Memo<Vec<String>, BTreeMap<String, AccessLevel>>>,
}

#[async_trait]
impl SceneFacade<ApiScopesLogic> for ScopesClient {
    fn facade(&self) -> &StoreHandle<ApiScopesLogic> {
        &self.handle
    }
}

impl ScopesClient {
    pub fn new(handle: StoreHandle<ApiScopesLogic>) -> Self {
        Self { handle, access: Mutex::new(Memo::new()) }
    }

    /// Resource access levels derived from the current draft scopes,
    /// recomputed only when the scope list changes by value.
    pub fn access_map(&self) -> BTreeMap<String, AccessLevel> {
        let scopes = self.state().scopes;
        self.access
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .project(scopes, |scopes| access_map(scopes))
    }

    /// Scopes a preset needs that the current draft does not grant.
    pub fn missing_for_preset(&self, key: &str) -> Vec<String> {
        match api_scopes::preset(key) {
            Some(preset) => missing_required_scopes(&self.state().scopes, preset.scopes),
            None => Vec::new(),
        }
    }
}

impl Clone for ScopesClient {
    // Each clone gets its own selector cache.
    fn clone(&self) -> Self {
        Self::new(self.handle.clone())
    }
}

/// Facade over the members scene.
#[derive(Clone)]
pub struct MembersClient {
    handle: StoreHandle<MembersLogic>,
}

#[async_trait]
impl SceneFacade<MembersLogic> for MembersClient {
    fn facade(&self) -> &StoreHandle<MembersLogic> {
        &self.handle
    }
}

impl MembersClient {
    pub fn new(handle: StoreHandle<MembersLogic>) -> Self {
        Self { handle }
    }

    /// The roster as last committed.
    pub fn roster(&self) -> Vec<Member> {
        self.state().members.value().clone()
    }

    pub async fn refresh(&self) -> Result<(), StoreError> {
        self.send(MembersAction::MembersRequested).await
    }

    /// Scripts the whole invite flow: open the form, enter the email,
    /// pick the level, submit.
    #[instrument(skip(self))]
    pub async fn invite(&self, email: &str, level: MemberLevel) -> Result<(), StoreError> {
        debug!("Sending invite flow");
        self.send(MembersAction::InviteOpened(true)).await?;
        self.send(MembersAction::EmailChanged(email.to_string())).await?;
        self.send(MembersAction::LevelPicked(level)).await?;
        self.send(MembersAction::InviteSubmitted).await
    }

    /// Asks for removal; the scene raises the confirmation dialog.
    pub async fn remove(&self, id: u64) -> Result<(), StoreError> {
        self.send(MembersAction::RemoveRequested(id)).await
    }
}

/// The running console: one store per scene, plus the navigator bindings.
pub struct ConsoleSystem {
    pub cli_auth: StoreHandle<CliAuthLogic>,
    pub signup: StoreHandle<SignupLogic>,
    pub scopes: ScopesClient,
    pub pipeline: StoreHandle<PipelineLogic>,
    pub onboarding: StoreHandle<OnboardingLogic>,
    pub members: MembersClient,
    pub replay: StoreHandle<ReplaySettingsLogic>,
    stores: Vec<JoinHandle<()>>,
    bindings: Vec<JoinHandle<()>>,
}

impl ConsoleSystem {
    /// Spawns every scene store and connects the routed scenes to the
    /// navigator. Fails if any scene declares a cyclic listener graph.
    pub fn start(deps: Arc<ConsoleDeps>) -> Result<Self, StoreError> {
        let mut stores = Vec::new();

        let (store, cli_auth) = SceneStore::<CliAuthLogic>::new(deps.clone(), DEFAULT_MAILBOX)?;
        stores.push(tokio::spawn(store.run()));
        let (store, signup) = SceneStore::<SignupLogic>::new(deps.clone(), DEFAULT_MAILBOX)?;
        stores.push(tokio::spawn(store.run()));
        let (store, scopes) = SceneStore::<ApiScopesLogic>::new(deps.clone(), DEFAULT_MAILBOX)?;
        stores.push(tokio::spawn(store.run()));
        let (store, pipeline) = SceneStore::<PipelineLogic>::new(deps.clone(), DEFAULT_MAILBOX)?;
        stores.push(tokio::spawn(store.run()));
        let (store, onboarding) = SceneStore::<OnboardingLogic>::new(deps.clone(), DEFAULT_MAILBOX)?;
        stores.push(tokio::spawn(store.run()));
        let (store, members) = SceneStore::<MembersLogic>::new(deps.clone(), DEFAULT_MAILBOX)?;
        stores.push(tokio::spawn(store.run()));
        let (store, replay) = SceneStore::<ReplaySettingsLogic>::new(deps.clone(), DEFAULT_MAILBOX)?;
        stores.push(tokio::spawn(store.run()));

        let bindings = vec![
            bind_routes(pipeline.clone(), deps.navigator.clone(), pipeline_routes()),
            bind_routes(members.clone(), deps.navigator.clone(), member_routes()),
        ];

        info!(scenes = stores.len(), "Console started");

        Ok(Self {
            cli_auth,
            signup,
            scopes: ScopesClient::new(scopes),
            pipeline,
            onboarding,
            members: MembersClient::new(members),
            replay,
            stores,
            bindings,
        })
    }

    /// Stops route watching, closes every store mailbox and waits for the
    /// store tasks to finish.
    pub async fn shutdown(self) {
        info!("Shutting down console");

        for binding in self.bindings {
            binding.abort();
        }

        drop(self.cli_auth);
        drop(self.signup);
        drop(self.scopes);
        drop(self.pipeline);
        drop(self.onboarding);
        drop(self.members);
        drop(self.replay);

        for store in self.stores {
            if let Err(error) = store.await {
                error!(%error, "Scene store task failed");
            }
        }
        info!("Console shutdown complete");
    }
}

/// `/pipelines/:id`, with the active tab carried in `?tab=`.
pub fn pipeline_routes() -> RouteTable<PipelineAction> {
    RouteTable::new().on("/pipelines/:id", |params, query| {
        let id = params.get("id")?.clone();
        let tab = PipelineTab::from_query(query.get("tab").map(String::as_str));
        Some(PipelineAction::Opened { id, tab })
    })
}

/// Landing on the members page refreshes the roster.
pub fn member_routes() -> RouteTable<MembersAction> {
    RouteTable::new().on("/settings/members", |_, _| Some(MembersAction::MembersRequested))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn console_starts_settles_and_shuts_down() {
        let (deps, _rig) = ConsoleDeps::mocked();
        let system = ConsoleSystem::start(deps).unwrap();

        system.cli_auth.settled().await.unwrap();
        system.members.settled().await.unwrap();
        system.scopes.settled().await.unwrap();

        system.shutdown().await;
    }

    #[test]
    fn feature_storage_is_namespaced_per_feature() {
        let (deps, rig) = ConsoleDeps::mocked();
        deps.feature_storage("alpha").set("step", "1");
        deps.feature_storage("beta").set("step", "2");

        assert_eq!(deps.feature_storage("alpha").get("step").as_deref(), Some("1"));
        assert_eq!(rig.storage.get("console/alpha/step").as_deref(), Some("1"));
        assert_eq!(rig.storage.get("console/beta/step").as_deref(), Some("2"));
    }
}
