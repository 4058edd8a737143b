//! Personal API key scope editor. The server stores a flat scope list
//! (`"insight:read"`, `"dashboard:write"`, or the `"*"` wildcard); the UI
//! edits a per-resource access map. [`access_map`] and [`write_scope`]
//! convert between the two without losing grants.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use scene_store::{
    decode, ApiError, Effects, LoadTicket, LoaderCell, SceneLogic, StoreAction,
};

use crate::api::{self, ApiKey};
use crate::console::ConsoleDeps;

/// Resources a key can be scoped to. Order here is presentation order.
pub const RESOURCES: &[&str] = &[
    "action",
    "dashboard",
    "insight",
    "person",
    "session_recording",
    "survey",
];

pub const WILDCARD_SCOPE: &str = "*";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    None,
    Read,
    Write,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::None => "none",
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
        }
    }

    fn parse(raw: &str) -> Option<AccessLevel> {
        match raw {
            "read" => Some(AccessLevel::Read),
            "write" => Some(AccessLevel::Write),
            _ => None,
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Projects a scope list into resource access levels. The wildcard grants
/// write on every known resource; otherwise the strongest level named for
/// a resource wins. Resources without a grant are absent from the map.
pub fn access_map(scopes: &[String]) -> BTreeMap<String, AccessLevel> {
    let mut map = BTreeMap::new();
    if scopes.iter().any(|scope| scope == WILDCARD_SCOPE) {
        for &resource in RESOURCES {
            map.insert(resource.to_string(), AccessLevel::Write);
        }
        return map;
    }
    for scope in scopes {
        let Some((resource, level)) = scope.split_once(':') else {
            continue;
        };
        let Some(level) = AccessLevel::parse(level) else {
            continue;
        };
        let entry = map.entry(resource.to_string()).or_insert(level);
        if level > *entry {
            *entry = level;
        }
    }
    map
}

/// Rewrites the scope list so `resource` carries exactly `level`. A
/// wildcard list is expanded to explicit writes first, so lowering one
/// resource never silently lowers the rest.
pub fn write_scope(scopes: &[String], resource: &str, level: AccessLevel) -> Vec<String> {
    let mut scopes: Vec<String> = if scopes.iter().any(|scope| scope == WILDCARD_SCOPE) {
        RESOURCES
            .iter()
            .map(|resource| format!("{resource}:write"))
            .collect()
    } else {
        scopes.to_vec()
    };
    scopes.retain(|scope| {
        scope
            .split_once(':')
            .map(|(prefix, _)| prefix != resource)
            .unwrap_or(true)
    });
    if level != AccessLevel::None {
        scopes.push(format!("{resource}:{level}"));
    }
    scopes
}

/// Canonical scope list for an access map. `access_map` of the result
/// reproduces the input map exactly.
pub fn scopes_from_map(map: &BTreeMap<String, AccessLevel>) -> Vec<String> {
    map.iter()
        .filter(|(_, &level)| level != AccessLevel::None)
        .map(|(resource, level)| format!("{resource}:{level}"))
        .collect()
}

/// A named starter scope set for a common integration.
#[derive(Debug, PartialEq, Eq)]
pub struct ScopePreset {
    pub key: &'static str,
    pub label: &'static str,
    pub scopes: &'static [&'static str],
}

pub const SCOPE_PRESETS: &[ScopePreset] = &[
    ScopePreset { key: "full_access", label: "Full access", scopes: &[WILDCARD_SCOPE] },
    ScopePreset {
        key: "read_only",
        label: "Read only",
        scopes: &[
            "action:read",
            "dashboard:read",
            "insight:read",
            "person:read",
            "session_recording:read",
            "survey:read",
        ],
    },
    ScopePreset {
        key: "reporting",
        label: "Reporting",
        scopes: &["insight:read", "dashboard:read", "survey:read"],
    },
    ScopePreset { key: "no_access", label: "No access", scopes: &[] },
];

pub fn preset(key: &str) -> Option<&'static ScopePreset> {
    SCOPE_PRESETS.iter().find(|preset| preset.key == key)
}

/// Required scopes not covered by the current grants. The wildcard covers
/// everything; write on a resource covers read. Malformed requirements
/// count as missing rather than silently passing.
pub fn missing_required_scopes(scopes: &[String], required: &[&str]) -> Vec<String> {
    let granted = access_map(scopes);
    required
        .iter()
        .filter(|requirement| {
            if **requirement == WILDCARD_SCOPE {
                return !scopes.iter().any(|scope| scope == WILDCARD_SCOPE);
            }
            let Some((resource, level)) = requirement.split_once(':') else {
                return true;
            };
            let Some(level) = AccessLevel::parse(level) else {
                return true;
            };
            granted.get(resource).map_or(true, |&have| have < level)
        })
        .map(|requirement| requirement.to_string())
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiScopesState {
    pub key: LoaderCell<ApiKey>,
    /// Scopes as currently edited, which may differ from the saved key.
    pub scopes: Vec<String>,
    pub dirty: bool,
    pub saving: bool,
}

#[derive(Debug, Clone)]
pub enum ApiScopesAction {
    KeyRequested,
    KeyLoaded(LoadTicket, Result<ApiKey, ApiError>),
    LevelSet { resource: String, level: AccessLevel },
    /// Carries a [`SCOPE_PRESETS`] key; unknown keys reduce to nothing.
    PresetApplied(String),
    SaveRequested,
    SaveStarted,
    SaveFinished(Result<(), ApiError>),
}

impl StoreAction for ApiScopesAction {
    fn kind(&self) -> &'static str {
        match self {
            ApiScopesAction::KeyRequested => "key_requested",
            ApiScopesAction::KeyLoaded(..) => "key_loaded",
            ApiScopesAction::LevelSet { .. } => "level_set",
            ApiScopesAction::PresetApplied(_) => "preset_applied",
            ApiScopesAction::SaveRequested => "save_requested",
            ApiScopesAction::SaveStarted => "save_started",
            ApiScopesAction::SaveFinished(_) => "save_finished",
        }
    }
}

pub struct ApiScopesLogic;

#[async_trait]
impl SceneLogic for ApiScopesLogic {
    type State = ApiScopesState;
    type Action = ApiScopesAction;
    type Deps = Arc<ConsoleDeps>;

    fn initial(_deps: &Arc<ConsoleDeps>) -> ApiScopesState {
        ApiScopesState {
            key: LoaderCell::new(ApiKey { label: String::new(), scopes: Vec::new() }),
            scopes: Vec::new(),
            dirty: false,
            saving: false,
        }
    }

    fn reduce(state: &mut ApiScopesState, action: &ApiScopesAction) {
        match action {
            ApiScopesAction::KeyRequested => {
                state.key.begin();
            }
            ApiScopesAction::KeyLoaded(ticket, outcome) => {
                if state.key.resolve(*ticket, outcome.clone()).committed() {
                    state.scopes = state.key.value().scopes.clone();
                    state.dirty = false;
                }
            }
            ApiScopesAction::LevelSet { resource, level } => {
                state.scopes = write_scope(&state.scopes, resource, *level);
                state.dirty = true;
            }
            ApiScopesAction::PresetApplied(key) => {
                if let Some(preset) = preset(key) {
                    state.scopes = preset.scopes.iter().map(|scope| scope.to_string()).collect();
                    state.dirty = true;
                }
            }
            ApiScopesAction::SaveRequested => {}
            ApiScopesAction::SaveStarted => {
                state.saving = true;
            }
            ApiScopesAction::SaveFinished(outcome) => {
                state.saving = false;
                if outcome.is_ok() {
                    state.key.value_mut().scopes = state.scopes.clone();
                    state.dirty = false;
                }
            }
        }
    }

    async fn react(action: &ApiScopesAction, state: &ApiScopesState, effects: &mut Effects<'_, Self>) {
        match action {
            ApiScopesAction::KeyRequested => {
                if let Some(ticket) = state.key.ticket() {
                    let api = effects.deps().api.clone();
                    let path = api::current_key_path(&effects.deps().config.api_base);
                    effects.load(
                        ticket,
                        async move { api.get(&path).await.and_then(decode) },
                        ApiScopesAction::KeyLoaded,
                    );
                }
            }
            ApiScopesAction::KeyLoaded(ticket, Err(_)) => {
                if state.key.accepts(*ticket) {
                    effects.deps().toasts.error("Failed to load API key");
                }
            }
            ApiScopesAction::SaveRequested => {
                if state.saving {
                    return;
                }
                effects.dispatch(ApiScopesAction::SaveStarted);
            }
            ApiScopesAction::SaveStarted => {
                if !state.saving {
                    return;
                }
                let api = effects.deps().api.clone();
                let path = api::update_key_path(&effects.deps().config.api_base);
                let body = json!({ "scopes": state.scopes });
                effects.spawn(async move {
                    let outcome = api.create(&path, body).await.map(|_| ());
                    Some(ApiScopesAction::SaveFinished(outcome))
                });
            }
            ApiScopesAction::SaveFinished(Ok(())) => {
                effects.deps().toasts.success("Scopes updated");
            }
            ApiScopesAction::SaveFinished(Err(_)) => {
                effects.deps().toasts.error("Failed to update scopes");
            }
            _ => {}
        }
    }

    async fn on_mount(_state: &ApiScopesState, effects: &mut Effects<'_, Self>) {
        effects.dispatch(ApiScopesAction::KeyRequested);
    }

    fn effect_edges() -> &'static [(&'static str, &'static str)] {
        &[("save_requested", "save_started")]
    }
}
