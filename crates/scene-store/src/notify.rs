//! # User Notifications
//!
//! Toasts and confirmation dialogs as injected capabilities. Scenes fire
//! them from listeners; what "showing a toast" physically means belongs to
//! the embedder. The in-crate implementations cover the common cases:
//! recording for assertions, scripting for dialog-driven flows, tracing
//! for demos.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

/// Toast severity, in escalating order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Fire-and-forget user notifications.
pub trait Toasts: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);

    fn info(&self, message: &str) {
        self.notify(Severity::Info, message);
    }

    fn success(&self, message: &str) {
        self.notify(Severity::Success, message);
    }

    fn warning(&self, message: &str) {
        self.notify(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.notify(Severity::Error, message);
    }
}

/// Collects every toast for later assertions.
#[derive(Clone, Default)]
pub struct RecordingToasts {
    shown: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl RecordingToasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<(Severity, String)> {
        self.shown.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last(&self) -> Option<(Severity, String)> {
        self.shown.lock().unwrap_or_else(|e| e.into_inner()).last().cloned()
    }
}

impl Toasts for RecordingToasts {
    fn notify(&self, severity: Severity, message: &str) {
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((severity, message.to_string()));
    }
}

/// Emits toasts as log lines. The demo binary's notification surface.
pub struct TracingToasts;

impl Toasts for TracingToasts {
    fn notify(&self, severity: Severity, message: &str) {
        info!(severity = ?severity, "{message}");
    }
}

/// A user's answer to a confirmation prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Accepted,
    Canceled,
}

/// Blocking-from-the-user's-point-of-view confirmation dialogs. Scenes
/// call this from spawned effect work, never from reducers.
#[async_trait]
pub trait Dialogs: Send + Sync {
    async fn confirm(&self, prompt: &str) -> Choice;
}

/// Answers prompts from a queue, recording what was asked. Runs out of
/// scripted answers, cancels: the safe default for destructive flows.
#[derive(Clone, Default)]
pub struct ScriptedDialogs {
    answers: Arc<Mutex<VecDeque<Choice>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedDialogs {
    pub fn answering(answers: impl IntoIterator<Item = Choice>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().collect())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Queues one more answer behind any already scripted.
    pub fn push_answer(&self, choice: Choice) {
        self.answers.lock().unwrap_or_else(|e| e.into_inner()).push_back(choice);
    }
}

#[async_trait]
impl Dialogs for ScriptedDialogs {
    async fn confirm(&self, prompt: &str) -> Choice {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(Choice::Canceled)
    }
}

/// Accepts every prompt. For demos that should just proceed.
pub struct AcceptAll;

#[async_trait]
impl Dialogs for AcceptAll {
    async fn confirm(&self, _prompt: &str) -> Choice {
        Choice::Accepted
    }
}
