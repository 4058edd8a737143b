//! Pipeline detail scene. The active tab lives in the URL: selecting a
//! tab only rewrites the `tab` query parameter, the route binding echoes
//! that back as [`PipelineAction::Opened`], and the reducer takes the tab
//! from there. Deep links, back/forward and in-app clicks all arrive
//! through the same action.

use std::sync::Arc;

use async_trait::async_trait;

use scene_store::{decode, ApiError, Effects, LoadTicket, LoaderCell, SceneLogic, StoreAction};

use crate::api::{self, LogLine, MetricPoint};
use crate::console::ConsoleDeps;

pub const DEFAULT_METRICS_WINDOW: &str = "24h";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineTab {
    Configuration,
    Metrics,
    Logs,
    Testing,
    History,
}

impl PipelineTab {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineTab::Configuration => "configuration",
            PipelineTab::Metrics => "metrics",
            PipelineTab::Logs => "logs",
            PipelineTab::Testing => "testing",
            PipelineTab::History => "history",
        }
    }

    /// Reads a tab from a query parameter. Anything unrecognized, including
    /// a missing parameter, lands on the configuration tab.
    pub fn from_query(raw: Option<&str>) -> PipelineTab {
        match raw {
            Some("metrics") => PipelineTab::Metrics,
            Some("logs") => PipelineTab::Logs,
            Some("testing") => PipelineTab::Testing,
            Some("history") => PipelineTab::History,
            _ => PipelineTab::Configuration,
        }
    }
}

impl Default for PipelineTab {
    fn default() -> Self {
        PipelineTab::Configuration
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct PipelineState {
    pub pipeline_id: Option<String>,
    pub tab: PipelineTab,
    pub metrics: LoaderCell<Vec<MetricPoint>>,
    pub logs: LoaderCell<Vec<LogLine>>,
    pub window: String,
}

#[derive(Debug, Clone)]
pub enum PipelineAction {
    /// Emitted by the route binding for every navigation that lands on
    /// this scene, carrying the resolved tab.
    Opened { id: String, tab: PipelineTab },
    TabSelected(PipelineTab),
    WindowChanged(String),
    MetricsRequested,
    MetricsLoaded(LoadTicket, Result<Vec<MetricPoint>, ApiError>),
    LogsRequested,
    LogsLoaded(LoadTicket, Result<Vec<LogLine>, ApiError>),
}

impl StoreAction for PipelineAction {
    fn kind(&self) -> &'static str {
        match self {
            PipelineAction::Opened { .. } => "opened",
            PipelineAction::TabSelected(_) => "tab_selected",
            PipelineAction::WindowChanged(_) => "window_changed",
            PipelineAction::MetricsRequested => "metrics_requested",
            PipelineAction::MetricsLoaded(..) => "metrics_loaded",
            PipelineAction::LogsRequested => "logs_requested",
            PipelineAction::LogsLoaded(..) => "logs_loaded",
        }
    }
}

pub struct PipelineLogic;

#[async_trait]
impl SceneLogic for PipelineLogic {
    type State = PipelineState;
    type Action = PipelineAction;
    type Deps = Arc<ConsoleDeps>;

    fn initial(_deps: &Arc<ConsoleDeps>) -> PipelineState {
        PipelineState {
            window: DEFAULT_METRICS_WINDOW.to_string(),
            ..PipelineState::default()
        }
    }

    fn reduce(state: &mut PipelineState, action: &PipelineAction) {
        match action {
            PipelineAction::Opened { id, tab } => {
                state.pipeline_id = Some(id.clone());
                state.tab = *tab;
            }
            // The tab click itself changes nothing; the URL echo does.
            PipelineAction::TabSelected(_) => {}
            PipelineAction::WindowChanged(window) => {
                state.window = window.clone();
            }
            PipelineAction::MetricsRequested => {
                state.metrics.begin();
            }
            PipelineAction::MetricsLoaded(ticket, outcome) => {
                state.metrics.resolve(*ticket, outcome.clone());
            }
            PipelineAction::LogsRequested => {
                state.logs.begin();
            }
            PipelineAction::LogsLoaded(ticket, outcome) => {
                state.logs.resolve(*ticket, outcome.clone());
            }
        }
    }

    async fn react(action: &PipelineAction, state: &PipelineState, effects: &mut Effects<'_, Self>) {
        match action {
            PipelineAction::Opened { tab, .. } => match tab {
                PipelineTab::Metrics => effects.dispatch(PipelineAction::MetricsRequested),
                PipelineTab::Logs => effects.dispatch(PipelineAction::LogsRequested),
                _ => {}
            },
            PipelineAction::TabSelected(tab) => {
                let value = (*tab != PipelineTab::default()).then_some(tab.as_str());
                effects.deps().navigator.update_query("tab", value);
            }
            PipelineAction::WindowChanged(_) => {
                // Window pickers get dragged through several values; refetch
                // only once the selection settles.
                if state.tab == PipelineTab::Metrics {
                    let delay = effects.deps().config.debounce();
                    effects.debounce("metrics-refresh", delay, PipelineAction::MetricsRequested);
                }
            }
            PipelineAction::MetricsRequested => {
                let (Some(ticket), Some(id)) = (state.metrics.ticket(), &state.pipeline_id) else {
                    return;
                };
                let api = effects.deps().api.clone();
                let path = api::metrics_path(&effects.deps().config.api_base, id, &state.window);
                effects.load(
                    ticket,
                    async move { api.get(&path).await.and_then(decode) },
                    PipelineAction::MetricsLoaded,
                );
            }
            PipelineAction::MetricsLoaded(ticket, Err(_)) => {
                if state.metrics.accepts(*ticket) {
                    effects.deps().toasts.error("Failed to load metrics");
                }
            }
            PipelineAction::LogsRequested => {
                let (Some(ticket), Some(id)) = (state.logs.ticket(), &state.pipeline_id) else {
                    return;
                };
                let api = effects.deps().api.clone();
                let path = api::logs_path(&effects.deps().config.api_base, id);
                effects.load(
                    ticket,
                    async move { api.get(&path).await.and_then(decode) },
                    PipelineAction::LogsLoaded,
                );
            }
            PipelineAction::LogsLoaded(ticket, Err(_)) => {
                if state.logs.accepts(*ticket) {
                    effects.deps().toasts.error("Failed to load logs");
                }
            }
            _ => {}
        }
    }

    fn effect_edges() -> &'static [(&'static str, &'static str)] {
        &[
            ("opened", "metrics_requested"),
            ("opened", "logs_requested"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tab_falls_back_to_configuration() {
        assert_eq!(PipelineTab::from_query(Some("bogus")), PipelineTab::Configuration);
        assert_eq!(PipelineTab::from_query(None), PipelineTab::Configuration);
        assert_eq!(PipelineTab::from_query(Some("logs")), PipelineTab::Logs);
    }

    #[test]
    fn opened_sets_identity_and_tab() {
        let mut state = PipelineState::default();
        PipelineLogic::reduce(
            &mut state,
            &PipelineAction::Opened { id: "hf_1".into(), tab: PipelineTab::Metrics },
        );
        assert_eq!(state.pipeline_id.as_deref(), Some("hf_1"));
        assert_eq!(state.tab, PipelineTab::Metrics);
    }
}
