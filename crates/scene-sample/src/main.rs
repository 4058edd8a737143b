//! Demo walkthrough: starts the full console against the in-memory
//! [`DemoBackend`] and drives a handful of scenes end to end, so `cargo
//! run` shows the action flow, the toasts and the navigation in the log.
//!
//! ```bash
//! RUST_LOG=info cargo run      # lifecycle, toasts, navigation
//! RUST_LOG=debug cargo run     # every action through every store
//! ```

use std::sync::Arc;

use scene_sample::api::MemberLevel;
use scene_sample::backend::{DemoBackend, DEMO_AUTH_CODE};
use scene_sample::config::ConsoleConfig;
use scene_sample::console::{ConsoleDeps, ConsoleSystem};
use scene_sample::lifecycle::setup_tracing;
use scene_sample::scenes::api_scopes::ApiScopesAction;
use scene_sample::scenes::cli_auth::CliAuthAction;
use scene_sample::scenes::onboarding::OnboardingAction;
use scene_sample::scenes::replay_settings::{DURATION_OPTIONS, ReplaySettingsAction};
use scene_store::{AcceptAll, Location, MemoryNavigator, MemoryStorage, SceneFacade, TracingToasts};
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    info!("Starting console demo");

    let config = ConsoleConfig::from_env().map_err(|e| e.to_string())?;
    let deps = Arc::new(ConsoleDeps::new(
        Arc::new(DemoBackend::new(config.api_base.clone())),
        Arc::new(MemoryStorage::new()),
        Arc::new(TracingToasts),
        Arc::new(AcceptAll),
        Arc::new(MemoryNavigator::at("/")),
        config,
    ));
    let system = ConsoleSystem::start(deps.clone()).map_err(|e| e.to_string())?;

    // Pair a CLI session: enter the code the terminal printed, pick the
    // project, submit.
    let span = tracing::info_span!("cli_authorization");
    async {
        info!("Pairing the CLI against the demo project");
        let auth = &system.cli_auth;
        auth.dispatch(CliAuthAction::CodeChanged(DEMO_AUTH_CODE.to_string()))
            .await
            .map_err(|e| e.to_string())?;
        auth.dispatch(CliAuthAction::ProjectPicked(Some(1))).await.map_err(|e| e.to_string())?;
        auth.dispatch(CliAuthAction::Submitted).await.map_err(|e| e.to_string())?;
        auth.subscribe()
            .wait_for(|state| state.authorized)
            .await
            .map_err(|e| e.to_string())?;
        info!("CLI session authorized");
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    // Deep-link into a pipeline. The URL is the source of truth: pushing
    // the location is what opens the scene and starts the loads.
    info!("Navigating to the webhooks pipeline");
    deps.navigator.push(Location::parse("/pipelines/webhooks?tab=metrics"));
    let state = system
        .pipeline
        .subscribe()
        .wait_for(|state| !state.metrics.value().is_empty())
        .await
        .map_err(|e| e.to_string())?
        .clone();
    info!(
        pipeline = state.pipeline_id.as_deref().unwrap_or("?"),
        tab = state.tab.as_str(),
        buckets = state.metrics.value().len(),
        "Pipeline metrics loaded"
    );

    // Grow and shrink the organization.
    let span = tracing::info_span!("member_management");
    async {
        let members = &system.members;
        members.refresh().await.map_err(|e| e.to_string())?;
        members
            .subscribe()
            .wait_for(|state| !state.members.value().is_empty())
            .await
            .map_err(|e| e.to_string())?;

        info!("Inviting a new admin");
        members.invite("carol@example.com", MemberLevel::Admin).await.map_err(|e| e.to_string())?;
        members
            .subscribe()
            .wait_for(|state| state.members.value().iter().any(|m| m.email == "carol@example.com"))
            .await
            .map_err(|e| e.to_string())?;
        info!(roster = members.roster().len(), "Invite accepted");

        info!("Removing a member, dialog auto-accepts");
        members.remove(2).await.map_err(|e| e.to_string())?;
        members
            .subscribe()
            .wait_for(|state| state.members.value().iter().all(|m| m.id != 2))
            .await
            .map_err(|e| e.to_string())?;
        info!(roster = members.roster().len(), "Member removed");
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    // Trim the API key down to a preset and persist it.
    let scopes = &system.scopes;
    scopes.settled().await.map_err(|e| e.to_string())?;
    scopes.subscribe().wait_for(|state| !state.key.loading()).await.map_err(|e| e.to_string())?;
    scopes
        .send(ApiScopesAction::PresetApplied("read_only".to_string()))
        .await
        .map_err(|e| e.to_string())?;
    scopes.settled().await.map_err(|e| e.to_string())?;
    info!(access = ?scopes.access_map(), "Draft access after preset");
    scopes.send(ApiScopesAction::SaveRequested).await.map_err(|e| e.to_string())?;
    scopes
        .subscribe()
        .wait_for(|state| !state.saving && !state.dirty)
        .await
        .map_err(|e| e.to_string())?;
    info!("Scopes saved");

    // Lower the replay sampling threshold and pick the shortest non-zero
    // duration floor the picker offers.
    let replay = &system.replay;
    replay.settled().await.map_err(|e| e.to_string())?;
    replay.subscribe().wait_for(|state| !state.config.loading()).await.map_err(|e| e.to_string())?;
    replay
        .dispatch(ReplaySettingsAction::SampleRateChanged("25".to_string()))
        .await
        .map_err(|e| e.to_string())?;
    let floor = DURATION_OPTIONS.iter().find_map(|option| *option);
    replay
        .dispatch(ReplaySettingsAction::MinDurationPicked(floor))
        .await
        .map_err(|e| e.to_string())?;
    replay.dispatch(ReplaySettingsAction::Submitted).await.map_err(|e| e.to_string())?;
    replay.settled().await.map_err(|e| e.to_string())?;
    replay
        .subscribe()
        .wait_for(|state| !state.form.is_submitting())
        .await
        .map_err(|e| e.to_string())?;
    info!(floor_ms = ?floor, "Recording settings saved");

    // Walk the onboarding wizard forward; progress lands in storage.
    system.onboarding.dispatch(OnboardingAction::Advanced).await.map_err(|e| e.to_string())?;
    system.onboarding.dispatch(OnboardingAction::Advanced).await.map_err(|e| e.to_string())?;
    system.onboarding.settled().await.map_err(|e| e.to_string())?;
    let onboarding = system.onboarding.state();
    info!(step = onboarding.step.as_str(), completed = onboarding.completed, "Onboarding progressed");

    system.shutdown().await;

    info!("Demo complete");
    Ok(())
}
