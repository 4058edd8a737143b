//! Session-recording settings. The sampling threshold is edited as free
//! percentage text and validated, never coerced: non-numeric or
//! out-of-range input keeps the field value and gets an error message.
//! What the server stores is the fraction, so `"25"` saves as `0.25` and
//! `"0"` as `0.0`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use scene_store::{
    decode, form_model, ApiError, Effects, FieldErrors, Form, FormModel, LoadTicket, LoaderCell,
    SceneLogic, StoreAction,
};

use crate::api::{self, ReplayConfig};
use crate::console::ConsoleDeps;

/// Minimum-duration choices offered by the picker, in milliseconds.
/// `None` records sessions of any length.
pub const DURATION_OPTIONS: &[Option<u64>] = &[None, Some(1000), Some(5000), Some(15_000)];

/// Percentage text to the stored fraction. `None` for anything that is
/// not a number in `[0, 100]`.
pub fn percent_to_fraction(raw: &str) -> Option<f64> {
    let percent: f64 = raw.trim().parse().ok()?;
    (0.0..=100.0).contains(&percent).then_some(percent / 100.0)
}

/// Stored fraction back to percentage text, whole numbers without a
/// trailing `.0`.
pub fn fraction_to_percent(fraction: f64) -> String {
    let percent = fraction * 100.0;
    if percent.fract() == 0.0 {
        format!("{}", percent as i64)
    } else {
        format!("{percent}")
    }
}

form_model! {
    #[derive(Clone, Debug, PartialEq)]
    pub struct RecordingValues {
        /// Sampling threshold as typed, in percent.
        pub sample_percent: String,
        pub minimum_duration_ms: Option<u64>,
    }
}

impl Default for RecordingValues {
    fn default() -> Self {
        Self { sample_percent: "100".to_string(), minimum_duration_ms: None }
    }
}

impl FormModel for RecordingValues {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if percent_to_fraction(&self.sample_percent).is_none() {
            errors.set(Self::FIELD_SAMPLE_PERCENT, "Threshold must be between 0% and 100%");
        }
        errors
    }
}

fn values_from(config: &ReplayConfig) -> RecordingValues {
    RecordingValues {
        sample_percent: fraction_to_percent(config.sample_rate),
        minimum_duration_ms: config.minimum_duration_ms,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReplaySettingsState {
    pub config: LoaderCell<ReplayConfig>,
    pub form: Form<RecordingValues>,
}

#[derive(Debug, Clone)]
pub enum ReplaySettingsAction {
    ConfigRequested,
    ConfigLoaded(LoadTicket, Result<ReplayConfig, ApiError>),
    SampleRateChanged(String),
    MinDurationPicked(Option<u64>),
    Submitted,
    SubmitRejected,
    SubmitStarted,
    SubmitFinished(Result<(), ApiError>),
}

impl StoreAction for ReplaySettingsAction {
    fn kind(&self) -> &'static str {
        match self {
            ReplaySettingsAction::ConfigRequested => "config_requested",
            ReplaySettingsAction::ConfigLoaded(..) => "config_loaded",
            ReplaySettingsAction::SampleRateChanged(_) => "sample_rate_changed",
            ReplaySettingsAction::MinDurationPicked(_) => "min_duration_picked",
            ReplaySettingsAction::Submitted => "submitted",
            ReplaySettingsAction::SubmitRejected => "submit_rejected",
            ReplaySettingsAction::SubmitStarted => "submit_started",
            ReplaySettingsAction::SubmitFinished(_) => "submit_finished",
        }
    }
}

fn server_field_errors(error: &ApiError) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match error.code.as_str() {
        "invalid_rate" => {
            errors.set(RecordingValues::FIELD_SAMPLE_PERCENT, "Threshold must be between 0% and 100%");
        }
        _ => {
            errors.set(RecordingValues::FIELD_SAMPLE_PERCENT, "Save failed, please try again");
        }
    }
    errors
}

pub struct ReplaySettingsLogic;

#[async_trait]
impl SceneLogic for ReplaySettingsLogic {
    type State = ReplaySettingsState;
    type Action = ReplaySettingsAction;
    type Deps = Arc<ConsoleDeps>;

    fn initial(_deps: &Arc<ConsoleDeps>) -> ReplaySettingsState {
        ReplaySettingsState {
            config: LoaderCell::new(ReplayConfig { sample_rate: 1.0, minimum_duration_ms: None }),
            form: Form::new(RecordingValues::default()),
        }
    }

    fn reduce(state: &mut ReplaySettingsState, action: &ReplaySettingsAction) {
        match action {
            ReplaySettingsAction::ConfigRequested => {
                state.config.begin();
            }
            ReplaySettingsAction::ConfigLoaded(ticket, outcome) => {
                if state.config.resolve(*ticket, outcome.clone()).committed() {
                    state.form.reset(Some(values_from(state.config.value())));
                }
            }
            ReplaySettingsAction::SampleRateChanged(raw) => {
                state.form.set_sample_percent(raw.clone());
            }
            ReplaySettingsAction::MinDurationPicked(duration) => {
                state.form.set_minimum_duration_ms(*duration);
            }
            ReplaySettingsAction::Submitted => {}
            ReplaySettingsAction::SubmitRejected => {
                state.form.validate();
            }
            ReplaySettingsAction::SubmitStarted => {
                state.form.begin_submit();
            }
            ReplaySettingsAction::SubmitFinished(Ok(())) => {
                state.form.submit_succeeded();
            }
            ReplaySettingsAction::SubmitFinished(Err(error)) => {
                state.form.submit_failed(server_field_errors(error));
            }
        }
    }

    async fn react(
        action: &ReplaySettingsAction,
        state: &ReplaySettingsState,
        effects: &mut Effects<'_, Self>,
    ) {
        match action {
            ReplaySettingsAction::ConfigRequested => {
                if let Some(ticket) = state.config.ticket() {
                    let api = effects.deps().api.clone();
                    let path = api::replay_config_path(&effects.deps().config.api_base);
                    effects.load(
                        ticket,
                        async move { api.get(&path).await.and_then(decode) },
                        ReplaySettingsAction::ConfigLoaded,
                    );
                }
            }
            ReplaySettingsAction::ConfigLoaded(ticket, Err(_)) => {
                if state.config.accepts(*ticket) {
                    effects.deps().toasts.error("Failed to load recording settings");
                }
            }
            ReplaySettingsAction::Submitted => {
                if state.form.is_submitting() {
                    return;
                }
                if state.form.values().validate().is_clean() {
                    effects.dispatch(ReplaySettingsAction::SubmitStarted);
                } else {
                    effects.dispatch(ReplaySettingsAction::SubmitRejected);
                }
            }
            ReplaySettingsAction::SubmitStarted => {
                if !state.form.is_submitting() {
                    return;
                }
                let values = state.form.values();
                let Some(fraction) = percent_to_fraction(&values.sample_percent) else {
                    return;
                };
                let api = effects.deps().api.clone();
                let path = api::replay_config_path(&effects.deps().config.api_base);
                let body = json!({
                    "sample_rate": fraction,
                    "minimum_duration_ms": values.minimum_duration_ms,
                });
                effects.spawn(async move {
                    let outcome = api.create(&path, body).await.map(|_| ());
                    Some(ReplaySettingsAction::SubmitFinished(outcome))
                });
            }
            ReplaySettingsAction::SubmitFinished(Ok(())) => {
                effects.deps().toasts.success("Recording settings saved");
            }
            _ => {}
        }
    }

    async fn on_mount(_state: &ReplaySettingsState, effects: &mut Effects<'_, Self>) {
        effects.dispatch(ReplaySettingsAction::ConfigRequested);
    }

    fn effect_edges() -> &'static [(&'static str, &'static str)] {
        &[
            ("submitted", "submit_rejected"),
            ("submitted", "submit_started"),
        ]
    }
}
