//! Organization members: the roster, an invite form and member removal.
//!
//! The invite email gets normalized on a trailing-edge debounce: every
//! keystroke re-arms the timer with the trimmed, lowercased form of the
//! text as typed, so a burst of edits produces exactly one normalization,
//! of the final value. Removal is guarded by a confirmation dialog and the
//! roster is refetched after the server acknowledges.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use scene_store::{
    decode, form_model, ApiError, Choice, Effects, FieldErrors, Form, FormModel, LoadTicket,
    LoaderCell, SceneLogic, StoreAction,
};

use crate::api::{self, Member, MemberLevel};
use crate::console::ConsoleDeps;

pub const EMAIL_DEBOUNCE_KEY: &str = "invite-email";

form_model! {
    #[derive(Clone, Debug, PartialEq)]
    pub struct InviteValues {
        pub email: String,
        pub level: MemberLevel,
    }
}

impl Default for InviteValues {
    fn default() -> Self {
        Self { email: String::new(), level: MemberLevel::Member }
    }
}

impl FormModel for InviteValues {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if !self.email.contains('@') {
            errors.set(Self::FIELD_EMAIL, "Enter a valid email address");
        }
        if self.level == MemberLevel::Owner {
            errors.set(Self::FIELD_LEVEL, "New members cannot be invited as owners");
        }
        errors
    }
}

/// Canonical form of an invite email: surrounding whitespace dropped,
/// lowercased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Clone, Debug, PartialEq)]
pub struct MembersState {
    pub members: LoaderCell<Vec<Member>>,
    pub invite: Form<InviteValues>,
    pub invite_open: bool,
    /// The member id a removal is in flight for, if any.
    pub removing: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum MembersAction {
    MembersRequested,
    MembersLoaded(LoadTicket, Result<Vec<Member>, ApiError>),
    InviteOpened(bool),
    EmailChanged(String),
    /// Fired by the debounce timer with the already-normalized value.
    EmailNormalized(String),
    LevelPicked(MemberLevel),
    InviteSubmitted,
    InviteRejected,
    InviteStarted,
    InviteFinished(Result<Member, ApiError>),
    RemoveRequested(u64),
    RemoveConfirmed(u64),
    RemoveFinished(u64, Result<(), ApiError>),
}

impl StoreAction for MembersAction {
    fn kind(&self) -> &'static str {
        match self {
            MembersAction::MembersRequested => "members_requested",
            MembersAction::MembersLoaded(..) => "members_loaded",
            MembersAction::InviteOpened(_) => "invite_opened",
            MembersAction::EmailChanged(_) => "email_changed",
            MembersAction::EmailNormalized(_) => "email_normalized",
            MembersAction::LevelPicked(_) => "level_picked",
            MembersAction::InviteSubmitted => "invite_submitted",
            MembersAction::InviteRejected => "invite_rejected",
            MembersAction::InviteStarted => "invite_started",
            MembersAction::InviteFinished(_) => "invite_finished",
            MembersAction::RemoveRequested(_) => "remove_requested",
            MembersAction::RemoveConfirmed(_) => "remove_confirmed",
            MembersAction::RemoveFinished(..) => "remove_finished",
        }
    }
}

fn server_field_errors(error: &ApiError) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match error.code.as_str() {
        "already_member" => {
            errors.set(InviteValues::FIELD_EMAIL, "This person is already a member");
        }
        "invite_pending" => {
            errors.set(InviteValues::FIELD_EMAIL, "An invite for this email is already pending");
        }
        _ => {
            errors.set(InviteValues::FIELD_EMAIL, "Invite failed, please try again");
        }
    }
    errors
}

pub struct MembersLogic;

#[async_trait]
impl SceneLogic for MembersLogic {
    type State = MembersState;
    type Action = MembersAction;
    type Deps = Arc<ConsoleDeps>;

    fn initial(_deps: &Arc<ConsoleDeps>) -> MembersState {
        MembersState {
            members: LoaderCell::new(Vec::new()),
            invite: Form::new(InviteValues::default()),
            invite_open: false,
            removing: None,
        }
    }

    fn reduce(state: &mut MembersState, action: &MembersAction) {
        match action {
            MembersAction::MembersRequested => {
                state.members.begin();
            }
            MembersAction::MembersLoaded(ticket, outcome) => {
                state.members.resolve(*ticket, outcome.clone());
            }
            MembersAction::InviteOpened(open) => {
                state.invite_open = *open;
                if !open {
                    state.invite.reset(None);
                }
            }
            MembersAction::EmailChanged(email) => {
                state.invite.set_email(email.clone());
            }
            MembersAction::EmailNormalized(email) => {
                // A debounce can outlive the form; drop its output once
                // the invite panel is closed.
                if state.invite_open {
                    state.invite.set_email(email.clone());
                }
            }
            MembersAction::LevelPicked(level) => {
                state.invite.set_level(*level);
            }
            MembersAction::InviteSubmitted => {}
            MembersAction::InviteRejected => {
                state.invite.validate();
            }
            MembersAction::InviteStarted => {
                state.invite.begin_submit();
            }
            MembersAction::InviteFinished(Ok(member)) => {
                state.members.value_mut().push(member.clone());
                state.invite.reset(None);
                state.invite_open = false;
            }
            MembersAction::InviteFinished(Err(error)) => {
                state.invite.submit_failed(server_field_errors(error));
            }
            MembersAction::RemoveRequested(_) => {}
            MembersAction::RemoveConfirmed(id) => {
                if state.removing.is_none() {
                    state.removing = Some(*id);
                }
            }
            MembersAction::RemoveFinished(id, _) => {
                if state.removing == Some(*id) {
                    state.removing = None;
                }
            }
        }
    }

    async fn react(action: &MembersAction, state: &MembersState, effects: &mut Effects<'_, Self>) {
        match action {
            MembersAction::MembersRequested => {
                if let Some(ticket) = state.members.ticket() {
                    let api = effects.deps().api.clone();
                    let path = api::members_path(&effects.deps().config.api_base);
                    effects.load(
                        ticket,
                        async move { api.get(&path).await.and_then(decode) },
                        MembersAction::MembersLoaded,
                    );
                }
            }
            MembersAction::MembersLoaded(ticket, Err(_)) => {
                if state.members.accepts(*ticket) {
                    effects.deps().toasts.error("Failed to load members");
                }
            }
            MembersAction::EmailChanged(raw) => {
                let delay = effects.deps().config.debounce();
                effects.debounce(
                    EMAIL_DEBOUNCE_KEY,
                    delay,
                    MembersAction::EmailNormalized(normalize_email(raw)),
                );
            }
            MembersAction::InviteSubmitted => {
                if state.invite.is_submitting() {
                    return;
                }
                if state.invite.values().validate().is_clean() {
                    effects.dispatch(MembersAction::InviteStarted);
                } else {
                    effects.dispatch(MembersAction::InviteRejected);
                }
            }
            MembersAction::InviteStarted => {
                if !state.invite.is_submitting() {
                    return;
                }
                let api = effects.deps().api.clone();
                let path = api::invite_path(&effects.deps().config.api_base);
                let values = state.invite.values().clone();
                let body = json!({ "email": values.email, "level": values.level });
                effects.spawn(async move {
                    let outcome = api.create(&path, body).await.and_then(decode);
                    Some(MembersAction::InviteFinished(outcome))
                });
            }
            MembersAction::InviteFinished(Ok(member)) => {
                effects.deps().toasts.success(&format!("Invited {}", member.email));
            }
            MembersAction::RemoveRequested(id) => {
                if state.removing.is_some() {
                    return;
                }
                let prompt = match state.members.value().iter().find(|member| member.id == *id) {
                    Some(member) => format!("Remove {} from the organization?", member.email),
                    None => "Remove this member from the organization?".to_string(),
                };
                let dialogs = effects.deps().dialogs.clone();
                let id = *id;
                effects.spawn(async move {
                    match dialogs.confirm(&prompt).await {
                        Choice::Accepted => Some(MembersAction::RemoveConfirmed(id)),
                        Choice::Canceled => None,
                    }
                });
            }
            MembersAction::RemoveConfirmed(id) => {
                if state.removing != Some(*id) {
                    return;
                }
                let api = effects.deps().api.clone();
                let path = api::remove_member_path(&effects.deps().config.api_base, *id);
                let id = *id;
                effects.spawn(async move {
                    let outcome = api.create(&path, json!({})).await.map(|_| ());
                    Some(MembersAction::RemoveFinished(id, outcome))
                });
            }
            MembersAction::RemoveFinished(_, Ok(())) => {
                effects.deps().toasts.success("Member removed");
                effects.dispatch(MembersAction::MembersRequested);
            }
            MembersAction::RemoveFinished(_, Err(_)) => {
                effects.deps().toasts.error("Failed to remove member");
            }
            _ => {}
        }
    }

    async fn on_mount(_state: &MembersState, effects: &mut Effects<'_, Self>) {
        effects.dispatch(MembersAction::MembersRequested);
        // Deep links can land with `#invite=1` to open the invite form.
        let hash = effects.deps().navigator.current().hash;
        if hash.get("invite").map(String::as_str) == Some("1") {
            effects.dispatch(MembersAction::InviteOpened(true));
        }
    }

    fn effect_edges() -> &'static [(&'static str, &'static str)] {
        &[
            ("invite_submitted", "invite_rejected"),
            ("invite_submitted", "invite_started"),
            ("remove_finished", "members_requested"),
        ]
    }
}
