//! Device-style CLI authorization: the user lands here from a terminal
//! prompt, enters the pairing code the CLI printed, picks which project to
//! grant, and submits. Server rejections come back as field-level
//! messages; success notifies and navigates back home.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use scene_store::{
    decode, form_model, ApiError, Effects, FieldErrors, Form, FormModel, LoadTicket, Location,
    LoaderCell, SceneLogic, StoreAction,
};

use crate::api::{self, Project};
use crate::console::ConsoleDeps;

/// The pairing code is always printed as `XXXX-XXXX`: eight characters
/// plus the separator.
pub const CODE_LENGTH: usize = 9;

form_model! {
    #[derive(Clone, Debug, PartialEq)]
    pub struct AuthorizeValues {
        pub code: String,
        pub project: Option<u64>,
    }
}

impl FormModel for AuthorizeValues {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.code.chars().count() != CODE_LENGTH {
            errors.set(Self::FIELD_CODE, "Code must be 9 characters (XXXX-XXXX)");
        }
        if self.project.is_none() {
            errors.set(Self::FIELD_PROJECT, "Choose a project to authorize");
        }
        errors
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CliAuthState {
    pub form: Form<AuthorizeValues>,
    pub projects: LoaderCell<Vec<Project>>,
    pub authorized: bool,
}

#[derive(Debug, Clone)]
pub enum CliAuthAction {
    CodeChanged(String),
    ProjectPicked(Option<u64>),
    ProjectsRequested,
    ProjectsLoaded(LoadTicket, Result<Vec<Project>, ApiError>),
    Submitted,
    SubmitRejected,
    SubmitStarted,
    SubmitFinished(Result<(), ApiError>),
}

impl StoreAction for CliAuthAction {
    fn kind(&self) -> &'static str {
        match self {
            CliAuthAction::CodeChanged(_) => "code_changed",
            CliAuthAction::ProjectPicked(_) => "project_picked",
            CliAuthAction::ProjectsRequested => "projects_requested",
            CliAuthAction::ProjectsLoaded(..) => "projects_loaded",
            CliAuthAction::Submitted => "submitted",
            CliAuthAction::SubmitRejected => "submit_rejected",
            CliAuthAction::SubmitStarted => "submit_started",
            CliAuthAction::SubmitFinished(_) => "submit_finished",
        }
    }
}

/// Maps a server rejection onto the field that caused it. Unknown codes
/// land on the code field with a generic retry message, so every failed
/// submit is visible somewhere.
fn server_field_errors(error: &ApiError) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match error.code.as_str() {
        "invalid_code" => {
            errors.set(AuthorizeValues::FIELD_CODE, "This code is invalid or has expired");
        }
        "access_denied" => {
            errors.set(AuthorizeValues::FIELD_PROJECT, "You do not have access to this project");
        }
        _ => {
            errors.set(AuthorizeValues::FIELD_CODE, "Authorization failed, please try again");
        }
    }
    errors
}

pub struct CliAuthLogic;

#[async_trait]
impl SceneLogic for CliAuthLogic {
    type State = CliAuthState;
    type Action = CliAuthAction;
    type Deps = Arc<ConsoleDeps>;

    fn initial(_deps: &Arc<ConsoleDeps>) -> CliAuthState {
        CliAuthState {
            form: Form::new(AuthorizeValues { code: String::new(), project: None }),
            projects: LoaderCell::new(Vec::new()),
            authorized: false,
        }
    }

    fn reduce(state: &mut CliAuthState, action: &CliAuthAction) {
        match action {
            CliAuthAction::CodeChanged(code) => {
                // Codes are printed uppercase; accept either case.
                state.form.set_code(code.trim().to_uppercase());
            }
            CliAuthAction::ProjectPicked(project) => {
                state.form.set_project(*project);
            }
            CliAuthAction::ProjectsRequested => {
                state.projects.begin();
            }
            CliAuthAction::ProjectsLoaded(ticket, outcome) => {
                state.projects.resolve(*ticket, outcome.clone());
            }
            CliAuthAction::Submitted => {}
            CliAuthAction::SubmitRejected => {
                state.form.validate();
            }
            CliAuthAction::SubmitStarted => {
                state.form.begin_submit();
            }
            CliAuthAction::SubmitFinished(Ok(())) => {
                state.form.submit_succeeded();
                state.authorized = true;
            }
            CliAuthAction::SubmitFinished(Err(error)) => {
                state.form.submit_failed(server_field_errors(error));
            }
        }
    }

    async fn react(action: &CliAuthAction, state: &CliAuthState, effects: &mut Effects<'_, Self>) {
        match action {
            CliAuthAction::ProjectsRequested => {
                if let Some(ticket) = state.projects.ticket() {
                    let api = effects.deps().api.clone();
                    let path = api::projects_path(&effects.deps().config.api_base);
                    effects.load(
                        ticket,
                        async move { api.get(&path).await.and_then(decode) },
                        CliAuthAction::ProjectsLoaded,
                    );
                }
            }
            CliAuthAction::ProjectsLoaded(ticket, Err(_)) => {
                if state.projects.accepts(*ticket) {
                    effects.deps().toasts.error("Failed to load projects");
                }
            }
            CliAuthAction::Submitted => {
                // A submit already in flight absorbs repeat clicks.
                if state.form.is_submitting() {
                    return;
                }
                if state.form.values().validate().is_clean() {
                    effects.dispatch(CliAuthAction::SubmitStarted);
                } else {
                    effects.dispatch(CliAuthAction::SubmitRejected);
                }
            }
            CliAuthAction::SubmitStarted => {
                if !state.form.is_submitting() {
                    return;
                }
                let api = effects.deps().api.clone();
                let path = api::authorize_path(&effects.deps().config.api_base);
                let body = json!({
                    "code": state.form.values().code,
                    "project": state.form.values().project,
                });
                effects.spawn(async move {
                    let outcome = api.create(&path, body).await.map(|_| ());
                    Some(CliAuthAction::SubmitFinished(outcome))
                });
            }
            CliAuthAction::SubmitFinished(Ok(())) => {
                effects.deps().toasts.success("CLI authorized");
                effects.deps().navigator.push(Location::parse("/"));
            }
            _ => {}
        }
    }

    async fn on_mount(_state: &CliAuthState, effects: &mut Effects<'_, Self>) {
        effects.dispatch(CliAuthAction::ProjectsRequested);
    }

    fn effect_edges() -> &'static [(&'static str, &'static str)] {
        &[
            ("submitted", "submit_rejected"),
            ("submitted", "submit_started"),
        ]
    }
}
