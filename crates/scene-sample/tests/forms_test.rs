//! Scene-level form behavior: client validation blocking the submit,
//! server rejections landing on fields, and successful submits going out
//! with the right payloads.

use serde_json::json;

use scene_sample::api;
use scene_sample::console::ConsoleDeps;
use scene_sample::scenes::cli_auth::{AuthorizeValues, CliAuthAction, CliAuthLogic};
use scene_sample::scenes::replay_settings::{
    DURATION_OPTIONS, RecordingValues, ReplaySettingsAction, ReplaySettingsLogic,
};
use scene_sample::scenes::signup::{SignupAction, SignupLogic, SignupValues};
use scene_store::{ApiError, SceneLogic, SceneStore, Severity};

#[tokio::test]
async fn empty_signup_reports_every_field_and_sends_nothing() {
    let (deps, rig) = ConsoleDeps::mocked();
    let handle = SceneStore::<SignupLogic>::spawn(deps).expect("spawn signup");

    handle.dispatch(SignupAction::Submitted).await.expect("dispatch");
    handle.settled().await.expect("settle");

    let form = handle.state().form;
    assert!(!form.is_submitting());
    assert_eq!(form.errors().len(), 3, "all failing fields must be reported at once");
    assert_eq!(form.field_error(SignupValues::FIELD_EMAIL), Some("Enter a valid email address"));
    assert_eq!(
        form.field_error(SignupValues::FIELD_PASSWORD),
        Some("Password must be at least 8 characters")
    );
    assert_eq!(form.field_error(SignupValues::FIELD_NAME), Some("Enter your name"));
    assert!(rig.api.requests().is_empty(), "a rejected submit must not hit the API");
}

#[tokio::test]
async fn taken_email_rejection_lands_on_the_email_field() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api
        .expect_create(&api::signup_path("/api"))
        .return_err(ApiError::new(409, "email_taken", "account already exists"));

    let handle = SceneStore::<SignupLogic>::spawn(deps).expect("spawn signup");
    handle.dispatch(SignupAction::EmailChanged("ada@example.com".into())).await.expect("dispatch");
    handle.dispatch(SignupAction::PasswordChanged("correct horse".into())).await.expect("dispatch");
    handle.dispatch(SignupAction::NameChanged("Ada".into())).await.expect("dispatch");
    handle.dispatch(SignupAction::Submitted).await.expect("dispatch");

    let mut snapshots = handle.subscribe();
    snapshots
        .wait_for(|s| s.form.field_error(SignupValues::FIELD_EMAIL).is_some())
        .await
        .expect("rejection");

    let state = handle.state();
    assert!(!state.form.is_submitting());
    assert!(!state.completed);
    assert_eq!(
        state.form.field_error(SignupValues::FIELD_EMAIL),
        Some("There is already an account with this email")
    );
    rig.api.verify();
}

#[tokio::test]
async fn short_code_or_missing_project_blocks_authorization() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api
        .expect_get(&api::projects_path("/api"))
        .return_json(json!([{"id": 1, "name": "Demo Corp"}]));

    let handle = SceneStore::<CliAuthLogic>::spawn(deps).expect("spawn cli auth");
    handle.settled().await.expect("settle");
    let mut snapshots = handle.subscribe();
    snapshots.wait_for(|s| !s.projects.loading()).await.expect("projects");

    handle.dispatch(CliAuthAction::CodeChanged("abc".into())).await.expect("dispatch");
    handle.dispatch(CliAuthAction::Submitted).await.expect("dispatch");
    handle.settled().await.expect("settle");

    let form = handle.state().form;
    assert_eq!(
        form.field_error(AuthorizeValues::FIELD_CODE),
        Some("Code must be 9 characters (XXXX-XXXX)")
    );
    assert_eq!(
        form.field_error(AuthorizeValues::FIELD_PROJECT),
        Some("Choose a project to authorize")
    );
    assert_eq!(rig.api.requests().len(), 1, "only the projects load may hit the API");

    // A code of the right length with no project still fails, on the
    // project field alone.
    handle.dispatch(CliAuthAction::CodeChanged("demo-1234".into())).await.expect("dispatch");
    handle.dispatch(CliAuthAction::Submitted).await.expect("dispatch");
    handle.settled().await.expect("settle");

    let form = handle.state().form;
    assert_eq!(form.field_error(AuthorizeValues::FIELD_CODE), None);
    assert!(form.field_error(AuthorizeValues::FIELD_PROJECT).is_some());
    assert_eq!(rig.api.requests().len(), 1);
    rig.api.verify();
}

#[tokio::test]
async fn valid_authorization_submits_notifies_and_navigates_home() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api
        .expect_get(&api::projects_path("/api"))
        .return_json(json!([{"id": 1, "name": "Demo Corp"}]));
    rig.api
        .expect_create(&api::authorize_path("/api"))
        .return_json(json!({"authorized": true}));

    let handle = SceneStore::<CliAuthLogic>::spawn(deps).expect("spawn cli auth");
    handle.settled().await.expect("settle");
    let mut snapshots = handle.subscribe();
    snapshots.wait_for(|s| !s.projects.loading()).await.expect("projects");

    // Codes are entered lowercase from the terminal prompt; the reducer
    // canonicalizes.
    handle.dispatch(CliAuthAction::CodeChanged(" demo-1234 ".into())).await.expect("dispatch");
    handle.dispatch(CliAuthAction::ProjectPicked(Some(1))).await.expect("dispatch");
    handle.dispatch(CliAuthAction::Submitted).await.expect("dispatch");
    snapshots.wait_for(|s| s.authorized).await.expect("authorized");

    let request = rig.api.requests().pop().expect("authorize request");
    assert_eq!(request.body, Some(json!({"code": "DEMO-1234", "project": 1})));
    assert_eq!(rig.toasts.last(), Some((Severity::Success, "CLI authorized".to_string())));
    assert_eq!(rig.navigator.pushed().last().map(|loc| loc.path.clone()), Some("/".to_string()));
    rig.api.verify();
}

#[tokio::test]
async fn expired_code_rejection_lands_on_the_code_field() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api
        .expect_get(&api::projects_path("/api"))
        .return_json(json!([{"id": 1, "name": "Demo Corp"}]));
    rig.api
        .expect_create(&api::authorize_path("/api"))
        .return_err(ApiError::new(400, "invalid_code", "unknown or expired code"));

    let handle = SceneStore::<CliAuthLogic>::spawn(deps).expect("spawn cli auth");
    handle.settled().await.expect("settle");
    let mut snapshots = handle.subscribe();
    snapshots.wait_for(|s| !s.projects.loading()).await.expect("projects");

    handle.dispatch(CliAuthAction::CodeChanged("DEMO-1234".into())).await.expect("dispatch");
    handle.dispatch(CliAuthAction::ProjectPicked(Some(1))).await.expect("dispatch");
    handle.dispatch(CliAuthAction::Submitted).await.expect("dispatch");
    snapshots
        .wait_for(|s| s.form.field_error(AuthorizeValues::FIELD_CODE).is_some())
        .await
        .expect("rejection");

    let state = handle.state();
    assert!(!state.authorized);
    assert_eq!(
        state.form.field_error(AuthorizeValues::FIELD_CODE),
        Some("This code is invalid or has expired")
    );
    rig.api.verify();
}

#[tokio::test]
async fn out_of_range_threshold_blocks_the_save() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api
        .expect_get(&api::replay_config_path("/api"))
        .return_json(json!({"sample_rate": 1.0, "minimum_duration_ms": null}));

    let handle = SceneStore::<ReplaySettingsLogic>::spawn(deps).expect("spawn replay");
    handle.settled().await.expect("settle");
    let mut snapshots = handle.subscribe();
    snapshots.wait_for(|s| !s.config.loading()).await.expect("config");

    handle.dispatch(ReplaySettingsAction::SampleRateChanged("150".into())).await.expect("dispatch");
    handle.dispatch(ReplaySettingsAction::Submitted).await.expect("dispatch");
    handle.settled().await.expect("settle");

    let form = handle.state().form;
    assert!(!form.is_submitting());
    assert_eq!(
        form.field_error(RecordingValues::FIELD_SAMPLE_PERCENT),
        Some("Threshold must be between 0% and 100%")
    );
    assert_eq!(rig.api.requests().len(), 1, "only the config load may hit the API");
    rig.api.verify();
}

#[tokio::test]
async fn zero_percent_threshold_saves_as_fraction_zero() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api
        .expect_get(&api::replay_config_path("/api"))
        .return_json(json!({"sample_rate": 1.0, "minimum_duration_ms": null}));
    rig.api
        .expect_create(&api::replay_config_path("/api"))
        .return_json(json!({"sample_rate": 0.0, "minimum_duration_ms": null}));

    let handle = SceneStore::<ReplaySettingsLogic>::spawn(deps).expect("spawn replay");
    handle.settled().await.expect("settle");
    let mut snapshots = handle.subscribe();
    snapshots.wait_for(|s| !s.config.loading()).await.expect("config");

    // 0% is disabled-but-valid, not out of range.
    handle.dispatch(ReplaySettingsAction::SampleRateChanged("0".into())).await.expect("dispatch");
    handle.dispatch(ReplaySettingsAction::Submitted).await.expect("dispatch");
    handle.settled().await.expect("settle");
    snapshots.wait_for(|s| !s.form.is_submitting()).await.expect("saved");

    let request = rig.api.requests().pop().expect("save request");
    assert_eq!(request.body, Some(json!({"sample_rate": 0.0, "minimum_duration_ms": null})));
    assert_eq!(rig.toasts.last(), Some((Severity::Success, "Recording settings saved".to_string())));
    rig.api.verify();
}

#[tokio::test]
async fn picked_duration_floor_saves_in_milliseconds() {
    let (deps, rig) = ConsoleDeps::mocked();
    rig.api
        .expect_get(&api::replay_config_path("/api"))
        .return_json(json!({"sample_rate": 1.0, "minimum_duration_ms": null}));
    rig.api
        .expect_create(&api::replay_config_path("/api"))
        .return_json(json!({"sample_rate": 1.0, "minimum_duration_ms": 5000}));

    let handle = SceneStore::<ReplaySettingsLogic>::spawn(deps).expect("spawn replay");
    handle.settled().await.expect("settle");
    let mut snapshots = handle.subscribe();
    snapshots.wait_for(|s| !s.config.loading()).await.expect("config");

    // The picker only ever offers the preset durations.
    let floor = Some(5000);
    assert!(DURATION_OPTIONS.contains(&floor));

    handle.dispatch(ReplaySettingsAction::MinDurationPicked(floor)).await.expect("dispatch");
    handle.dispatch(ReplaySettingsAction::Submitted).await.expect("dispatch");
    handle.settled().await.expect("settle");
    snapshots.wait_for(|s| !s.form.is_submitting()).await.expect("saved");

    let request = rig.api.requests().pop().expect("save request");
    assert_eq!(request.body, Some(json!({"sample_rate": 1.0, "minimum_duration_ms": 5000})));
    assert_eq!(rig.toasts.last(), Some((Severity::Success, "Recording settings saved".to_string())));
    rig.api.verify();
}

#[test]
fn reapplying_the_same_edit_changes_nothing() {
    let deps = ConsoleDeps::mocked().0;
    let mut state = CliAuthLogic::initial(&deps);

    CliAuthLogic::reduce(&mut state, &CliAuthAction::CodeChanged("demo-1234".into()));
    let once = state.clone();
    CliAuthLogic::reduce(&mut state, &CliAuthAction::CodeChanged("demo-1234".into()));

    assert_eq!(state, once);
}
