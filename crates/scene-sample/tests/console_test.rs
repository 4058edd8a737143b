//! Cross-cutting console behavior: URL binding, roster management with
//! confirmation dialogs, scope editing, and load supersession at the
//! scene level.

use std::time::Duration;

use serde_json::json;

use scene_sample::api::{self, MemberLevel};
use scene_sample::console::{pipeline_routes, ConsoleDeps, MembersClient};
use scene_sample::scenes::api_scopes::{AccessLevel, ApiScopesAction, ApiScopesLogic};
use scene_sample::scenes::members::{MembersAction, MembersLogic};
use scene_sample::scenes::pipeline::{PipelineAction, PipelineLogic, PipelineTab};
use scene_store::{
    bind_routes, Choice, Location, Navigator, SceneFacade, SceneStore, Severity,
};

/// Runs queued tasks for a fixed number of scheduler turns, used where
/// the assertion is that nothing further happens.
async fn drain_turns() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

/// Polls `condition` across scheduler turns, for side effects that are
/// not state changes.
async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn url_opens_the_pipeline_with_tab_and_falls_back_on_garbage() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api
        .expect_get("/api/pipelines/p-1/metrics?window=24h")
        .return_json(json!([{"bucket": "08:00", "succeeded": 10, "failed": 0}]));

    let handle = SceneStore::<PipelineLogic>::spawn(deps.clone()).expect("spawn pipeline");
    let binding = bind_routes(handle.clone(), deps.navigator.clone(), pipeline_routes());

    rig.navigator.push(Location::parse("/pipelines/p-1?tab=metrics&env=prod"));
    let mut snapshots = handle.subscribe();
    snapshots
        .wait_for(|s| !s.metrics.value().is_empty())
        .await
        .expect("metrics");

    let state = handle.state();
    assert_eq!(state.pipeline_id.as_deref(), Some("p-1"));
    assert_eq!(state.tab, PipelineTab::Metrics);

    // An unknown tab value opens the default tab rather than erroring.
    rig.navigator.push(Location::parse("/pipelines/p-2?tab=bogus"));
    snapshots
        .wait_for(|s| s.pipeline_id.as_deref() == Some("p-2"))
        .await
        .expect("reopen");
    assert_eq!(handle.state().tab, PipelineTab::Configuration);

    binding.abort();
    rig.api.verify();
}

#[tokio::test]
async fn tab_selection_rewrites_the_url_and_echoes_back() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api.expect_get("/api/pipelines/p-1/metrics?window=24h").return_json(json!([]));
    rig.api.expect_get("/api/pipelines/p-1/logs").return_json(json!([]));

    let handle = SceneStore::<PipelineLogic>::spawn(deps.clone()).expect("spawn pipeline");
    let binding = bind_routes(handle.clone(), deps.navigator.clone(), pipeline_routes());

    rig.navigator.push(Location::parse("/pipelines/p-1?tab=metrics&env=prod"));
    let mut snapshots = handle.subscribe();
    snapshots
        .wait_for(|s| s.pipeline_id.as_deref() == Some("p-1"))
        .await
        .expect("open");

    // The click only rewrites the URL; the tab itself changes when the
    // route binding echoes the new location back as an open.
    handle.dispatch(PipelineAction::TabSelected(PipelineTab::Logs)).await.expect("dispatch");
    snapshots
        .wait_for(|s| s.tab == PipelineTab::Logs)
        .await
        .expect("echo");

    let current = rig.navigator.current();
    assert_eq!(current.path, "/pipelines/p-1");
    assert_eq!(current.query.get("tab").map(String::as_str), Some("logs"));
    assert_eq!(
        current.query.get("env").map(String::as_str),
        Some("prod"),
        "sibling query parameters must survive a tab switch"
    );

    // Selecting the default tab removes the parameter instead of writing
    // the default value out.
    handle
        .dispatch(PipelineAction::TabSelected(PipelineTab::Configuration))
        .await
        .expect("dispatch");
    snapshots
        .wait_for(|s| s.tab == PipelineTab::Configuration)
        .await
        .expect("echo");

    let current = rig.navigator.current();
    assert_eq!(current.query.get("tab"), None);
    assert_eq!(current.query.get("env").map(String::as_str), Some("prod"));

    binding.abort();
    rig.api.verify();
}

#[tokio::test]
async fn superseded_metrics_load_cannot_overwrite_the_newer_result() {
    let (deps, rig) = ConsoleDeps::mocked();
    let stale = rig.api.expect_get("/api/pipelines/p-1/metrics?window=24h").defer();
    let current = rig.api.expect_get("/api/pipelines/p-1/metrics?window=24h").defer();

    let handle = SceneStore::<PipelineLogic>::spawn(deps).expect("spawn pipeline");
    handle
        .dispatch(PipelineAction::Opened { id: "p-1".into(), tab: PipelineTab::Metrics })
        .await
        .expect("dispatch");
    handle.settled().await.expect("settle");

    // Let the first request reach the mock before superseding it, so the
    // deferred replies pair up with the intended tickets.
    let api = rig.api.clone();
    eventually(move || api.requests().len() == 1).await;

    handle.dispatch(PipelineAction::MetricsRequested).await.expect("dispatch");
    handle.settled().await.expect("settle");
    let api = rig.api.clone();
    eventually(move || api.requests().len() == 2).await;

    // The superseded request fails late; the current one commits. However
    // the completions interleave, the stale outcome must neither replace
    // the value nor raise a toast.
    stale.respond_err(scene_store::ApiError::new(500, "server_error", "boom"));
    current.respond_json(json!([{"bucket": "09:00", "succeeded": 7, "failed": 1}]));

    let mut snapshots = handle.subscribe();
    snapshots
        .wait_for(|s| !s.metrics.loading() && !s.metrics.value().is_empty())
        .await
        .expect("commit");
    drain_turns().await;

    let state = handle.state();
    assert_eq!(state.metrics.value().len(), 1);
    assert_eq!(state.metrics.value()[0].bucket, "09:00");
    assert!(rig.toasts.shown().is_empty(), "a superseded failure must stay silent");
    rig.api.verify();
}

#[tokio::test(start_paused = true)]
async fn window_scrubbing_refetches_once_with_the_settled_value() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api
        .expect_get("/api/pipelines/p-1/metrics?window=24h")
        .return_json(json!([{"bucket": "08:00", "succeeded": 10, "failed": 0}]));
    rig.api
        .expect_get("/api/pipelines/p-1/metrics?window=30d")
        .return_json(json!([{"bucket": "W1", "succeeded": 70, "failed": 2}]));

    let handle = SceneStore::<PipelineLogic>::spawn(deps).expect("spawn pipeline");
    handle
        .dispatch(PipelineAction::Opened { id: "p-1".into(), tab: PipelineTab::Metrics })
        .await
        .expect("dispatch");
    let mut snapshots = handle.subscribe();
    snapshots.wait_for(|s| !s.metrics.value().is_empty()).await.expect("initial fetch");

    // Dragging the picker through an intermediate value re-arms the timer.
    handle.dispatch(PipelineAction::WindowChanged("7d".into())).await.expect("dispatch");
    handle.settled().await.expect("settle");
    tokio::time::advance(Duration::from_millis(150)).await;
    handle.dispatch(PipelineAction::WindowChanged("30d".into())).await.expect("dispatch");
    handle.settled().await.expect("settle");

    // The first deadline passes without a fetch.
    tokio::time::advance(Duration::from_millis(200)).await;
    handle.settled().await.expect("settle");
    assert_eq!(rig.api.requests().len(), 1);

    tokio::time::advance(Duration::from_millis(150)).await;
    snapshots
        .wait_for(|s| !s.metrics.loading() && s.metrics.value()[0].bucket == "W1")
        .await
        .expect("refetched");

    let request = rig.api.requests().pop().expect("refetch request");
    assert_eq!(request.path, "/api/pipelines/p-1/metrics?window=30d");
    rig.api.verify();
}

#[tokio::test(start_paused = true)]
async fn window_changes_off_the_metrics_tab_do_not_fetch() {
    let (deps, rig) = ConsoleDeps::mocked();

    let handle = SceneStore::<PipelineLogic>::spawn(deps).expect("spawn pipeline");
    handle
        .dispatch(PipelineAction::Opened { id: "p-1".into(), tab: PipelineTab::Configuration })
        .await
        .expect("dispatch");
    handle.settled().await.expect("settle");

    handle.dispatch(PipelineAction::WindowChanged("7d".into())).await.expect("dispatch");
    handle.settled().await.expect("settle");
    tokio::time::advance(Duration::from_millis(350)).await;
    handle.settled().await.expect("settle");
    drain_turns().await;

    // The selection itself sticks; only the refetch is gated on the tab.
    assert_eq!(handle.state().window, "7d");
    assert!(rig.api.requests().is_empty(), "the configuration tab must not fetch metrics");
    rig.api.verify();
}

#[tokio::test]
async fn invite_flow_appends_the_member_and_resets_the_form() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api
        .expect_get(&api::members_path("/api"))
        .return_json(json!([{"id": 1, "email": "alice@example.com", "level": "owner"}]));
    rig.api
        .expect_create(&api::invite_path("/api"))
        .return_json(json!({"id": 2, "email": "carol@example.com", "level": "admin"}));

    let handle = SceneStore::<MembersLogic>::spawn(deps).expect("spawn members");
    let members = MembersClient::new(handle);
    members.settled().await.expect("settle");
    members.subscribe().wait_for(|s| !s.members.loading()).await.expect("roster");

    members.invite("carol@example.com", MemberLevel::Admin).await.expect("invite");
    members
        .subscribe()
        .wait_for(|s| s.members.value().len() == 2)
        .await
        .expect("appended");

    let state = members.state();
    assert!(!state.invite_open);
    assert!(!state.invite.is_changed());
    assert_eq!(state.members.value()[1].email, "carol@example.com");
    assert_eq!(state.members.value()[1].level, MemberLevel::Admin);

    let request = rig.api.requests().pop().expect("invite request");
    assert_eq!(request.body, Some(json!({"email": "carol@example.com", "level": "admin"})));
    assert_eq!(rig.toasts.last(), Some((Severity::Success, "Invited carol@example.com".to_string())));
    rig.api.verify();
}

#[tokio::test]
async fn removal_asks_first_then_deletes_and_reloads() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api.expect_get(&api::members_path("/api")).return_json(json!([
        {"id": 1, "email": "alice@example.com", "level": "owner"},
        {"id": 2, "email": "bob@example.com", "level": "member"}
    ]));
    rig.api.expect_create(&api::remove_member_path("/api", 2)).return_json(json!({}));
    rig.api
        .expect_get(&api::members_path("/api"))
        .return_json(json!([{"id": 1, "email": "alice@example.com", "level": "owner"}]));
    rig.dialogs.push_answer(Choice::Accepted);

    let handle = SceneStore::<MembersLogic>::spawn(deps).expect("spawn members");
    let members = MembersClient::new(handle);
    members.settled().await.expect("settle");
    members.subscribe().wait_for(|s| s.members.value().len() == 2).await.expect("roster");

    members.remove(2).await.expect("remove");
    members
        .subscribe()
        .wait_for(|s| s.members.value().len() == 1)
        .await
        .expect("reloaded");

    let state = members.state();
    assert_eq!(state.removing, None);
    assert_eq!(state.members.value()[0].email, "alice@example.com");
    assert_eq!(rig.toasts.last(), Some((Severity::Success, "Member removed".to_string())));
    rig.api.verify();
}

#[tokio::test]
async fn canceled_dialog_leaves_the_roster_alone() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api.expect_get(&api::members_path("/api")).return_json(json!([
        {"id": 1, "email": "alice@example.com", "level": "owner"},
        {"id": 2, "email": "bob@example.com", "level": "member"}
    ]));
    // ScriptedDialogs with no queued answers declines every prompt.

    let handle = SceneStore::<MembersLogic>::spawn(deps).expect("spawn members");
    let members = MembersClient::new(handle);
    members.settled().await.expect("settle");
    members.subscribe().wait_for(|s| s.members.value().len() == 2).await.expect("roster");

    members.remove(2).await.expect("remove");
    members.settled().await.expect("settle");
    drain_turns().await;

    let state = members.state();
    assert_eq!(state.removing, None);
    assert_eq!(state.members.value().len(), 2);
    assert_eq!(rig.api.requests().len(), 1, "a declined removal must not hit the API");
    rig.api.verify();
}

#[tokio::test(start_paused = true)]
async fn email_normalization_fires_once_with_the_final_value() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api.expect_get(&api::members_path("/api")).return_json(json!([]));

    let handle = SceneStore::<MembersLogic>::spawn(deps).expect("spawn members");
    handle.dispatch(MembersAction::InviteOpened(true)).await.expect("dispatch");
    handle.dispatch(MembersAction::EmailChanged("  Ada@".into())).await.expect("dispatch");
    handle.settled().await.expect("settle");

    // Retyping inside the window replaces the pending normalization.
    tokio::time::advance(Duration::from_millis(150)).await;
    handle
        .dispatch(MembersAction::EmailChanged(" ADA@Example.COM ".into()))
        .await
        .expect("dispatch");
    handle.settled().await.expect("settle");

    // The first deadline passes without applying anything.
    tokio::time::advance(Duration::from_millis(200)).await;
    handle.settled().await.expect("settle");
    assert_eq!(handle.state().invite.values().email, " ADA@Example.COM ");

    tokio::time::advance(Duration::from_millis(150)).await;
    let mut snapshots = handle.subscribe();
    snapshots
        .wait_for(|s| s.invite.values().email == "ada@example.com")
        .await
        .expect("normalized");
}

#[tokio::test]
async fn wildcard_key_narrows_one_resource_without_losing_the_rest() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api
        .expect_get(&api::current_key_path("/api"))
        .return_json(json!({"label": "ci", "scopes": ["*"]}));
    rig.api.expect_create(&api::update_key_path("/api")).return_json(json!({
        "label": "ci",
        "scopes": [
            "action:write",
            "dashboard:write",
            "insight:write",
            "session_recording:write",
            "survey:write",
            "person:read"
        ]
    }));

    let handle = SceneStore::<ApiScopesLogic>::spawn(deps).expect("spawn scopes");
    handle.settled().await.expect("settle");
    let mut snapshots = handle.subscribe();
    snapshots.wait_for(|s| !s.key.loading()).await.expect("key");
    assert!(!handle.state().dirty);

    handle
        .dispatch(ApiScopesAction::LevelSet {
            resource: "person".into(),
            level: AccessLevel::Read,
        })
        .await
        .expect("dispatch");
    handle.settled().await.expect("settle");
    assert!(handle.state().dirty);

    handle.dispatch(ApiScopesAction::SaveRequested).await.expect("dispatch");
    snapshots.wait_for(|s| !s.saving && !s.dirty).await.expect("saved");

    let request = rig.api.requests().pop().expect("save request");
    assert_eq!(
        request.body,
        Some(json!({
            "scopes": [
                "action:write",
                "dashboard:write",
                "insight:write",
                "session_recording:write",
                "survey:write",
                "person:read"
            ]
        }))
    );
    assert_eq!(rig.toasts.last(), Some((Severity::Success, "Scopes updated".to_string())));
    rig.api.verify();
}
