//! Account sign-up. Validation reports every broken field in one pass so
//! the UI can mark all of them at once instead of revealing one error per
//! attempt.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use scene_store::{
    form_model, ApiError, Effects, FieldErrors, Form, FormModel, Location, SceneLogic, StoreAction,
};

use crate::api;
use crate::console::ConsoleDeps;

pub const MIN_PASSWORD_LENGTH: usize = 8;

form_model! {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct SignupValues {
        pub email: String,
        pub password: String,
        pub name: String,
    }
}

impl FormModel for SignupValues {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if !self.email.contains('@') {
            errors.set(Self::FIELD_EMAIL, "Enter a valid email address");
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.set(Self::FIELD_PASSWORD, "Password must be at least 8 characters");
        }
        if self.name.trim().is_empty() {
            errors.set(Self::FIELD_NAME, "Enter your name");
        }
        errors
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignupState {
    pub form: Form<SignupValues>,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub enum SignupAction {
    EmailChanged(String),
    PasswordChanged(String),
    NameChanged(String),
    Submitted,
    SubmitRejected,
    SubmitStarted,
    SubmitFinished(Result<(), ApiError>),
}

impl StoreAction for SignupAction {
    fn kind(&self) -> &'static str {
        match self {
            SignupAction::EmailChanged(_) => "email_changed",
            SignupAction::PasswordChanged(_) => "password_changed",
            SignupAction::NameChanged(_) => "name_changed",
            SignupAction::Submitted => "submitted",
            SignupAction::SubmitRejected => "submit_rejected",
            SignupAction::SubmitStarted => "submit_started",
            SignupAction::SubmitFinished(_) => "submit_finished",
        }
    }
}

fn server_field_errors(error: &ApiError) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match error.code.as_str() {
        "email_taken" => {
            errors.set(SignupValues::FIELD_EMAIL, "There is already an account with this email");
        }
        "weak_password" => {
            errors.set(SignupValues::FIELD_PASSWORD, "This password is too easy to guess");
        }
        _ => {
            errors.set(SignupValues::FIELD_EMAIL, "Sign-up failed, please try again");
        }
    }
    errors
}

pub struct SignupLogic;

#[async_trait]
impl SceneLogic for SignupLogic {
    type State = SignupState;
    type Action = SignupAction;
    type Deps = Arc<ConsoleDeps>;

    fn initial(_deps: &Arc<ConsoleDeps>) -> SignupState {
        SignupState { form: Form::new(SignupValues::default()), completed: false }
    }

    fn reduce(state: &mut SignupState, action: &SignupAction) {
        match action {
            SignupAction::EmailChanged(email) => state.form.set_email(email.clone()),
            SignupAction::PasswordChanged(password) => state.form.set_password(password.clone()),
            SignupAction::NameChanged(name) => state.form.set_name(name.clone()),
            SignupAction::Submitted => {}
            SignupAction::SubmitRejected => {
                state.form.validate();
            }
            SignupAction::SubmitStarted => {
                state.form.begin_submit();
            }
            SignupAction::SubmitFinished(Ok(())) => {
                state.form.submit_succeeded();
                state.completed = true;
            }
            SignupAction::SubmitFinished(Err(error)) => {
                state.form.submit_failed(server_field_errors(error));
            }
        }
    }

    async fn react(action: &SignupAction, state: &SignupState, effects: &mut Effects<'_, Self>) {
        match action {
            SignupAction::Submitted => {
                if state.form.is_submitting() {
                    return;
                }
                if state.form.values().validate().is_clean() {
                    effects.dispatch(SignupAction::SubmitStarted);
                } else {
                    effects.dispatch(SignupAction::SubmitRejected);
                }
            }
            SignupAction::SubmitStarted => {
                if !state.form.is_submitting() {
                    return;
                }
                let api = effects.deps().api.clone();
                let path = api::signup_path(&effects.deps().config.api_base);
                let values = state.form.values().clone();
                let body = json!({
                    "email": values.email,
                    "password": values.password,
                    "name": values.name,
                });
                effects.spawn(async move {
                    let outcome = api.create(&path, body).await.map(|_| ());
                    Some(SignupAction::SubmitFinished(outcome))
                });
            }
            SignupAction::SubmitFinished(Ok(())) => {
                effects.deps().toasts.success("Welcome aboard");
                effects.deps().navigator.push(Location::parse("/"));
            }
            _ => {}
        }
    }

    fn effect_edges() -> &'static [(&'static str, &'static str)] {
        &[
            ("submitted", "submit_rejected"),
            ("submitted", "submit_started"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_empty_form_reports_every_field_at_once() {
        let errors = SignupValues::default().validate();
        assert_eq!(errors.len(), 3);
        assert!(errors.get(SignupValues::FIELD_EMAIL).is_some());
        assert!(errors.get(SignupValues::FIELD_PASSWORD).is_some());
        assert!(errors.get(SignupValues::FIELD_NAME).is_some());
    }

    #[test]
    fn seven_character_password_is_rejected() {
        let values = SignupValues {
            email: "ada@example.com".into(),
            password: "hunter2".into(),
            name: "Ada".into(),
        };
        assert_eq!(
            values.validate().get(SignupValues::FIELD_PASSWORD),
            Some("Password must be at least 8 characters")
        );
    }

    #[test]
    fn eight_character_password_passes() {
        let values = SignupValues {
            email: "ada@example.com".into(),
            password: "hunter22".into(),
            name: "Ada".into(),
        };
        assert!(values.validate().is_clean());
    }
}
