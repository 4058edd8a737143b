//! Marketing-analytics onboarding wizard. The reducer-owned slice is the
//! only source of truth for progress; storage is read once in [`initial`]
//! and written back in a single listener path, with the step and the
//! completed flag under separate keys so either survives alone.
//!
//! [`initial`]: OnboardingLogic::initial

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use scene_store::{Effects, SceneLogic, Storage, StoreAction};

use crate::console::ConsoleDeps;

pub const STORAGE_FEATURE: &str = "onboarding";
pub const STEP_KEY: &str = "step";
pub const COMPLETED_KEY: &str = "completed";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnboardingStep {
    /// Link the marketing data source.
    Connect,
    /// Map source columns onto the expected schema.
    Schema,
    /// Confirm events are arriving.
    Verify,
}

pub const STEPS: &[OnboardingStep] =
    &[OnboardingStep::Connect, OnboardingStep::Schema, OnboardingStep::Verify];

impl OnboardingStep {
    pub fn as_str(self) -> &'static str {
        match self {
            OnboardingStep::Connect => "connect",
            OnboardingStep::Schema => "schema",
            OnboardingStep::Verify => "verify",
        }
    }

    pub fn parse(raw: &str) -> Option<OnboardingStep> {
        STEPS.iter().copied().find(|step| step.as_str() == raw)
    }

    fn index(self) -> usize {
        STEPS.iter().position(|step| *step == self).unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OnboardingState {
    pub step: OnboardingStep,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub enum OnboardingAction {
    /// Move to the next step; on the last step this completes the wizard.
    Advanced,
    /// Step back; when already completed this reopens the last step.
    SteppedBack,
    /// Jump to an earlier step for review. Forward jumps are ignored.
    StepSelected(OnboardingStep),
    /// Start over from the first step.
    Reset,
}

impl StoreAction for OnboardingAction {
    fn kind(&self) -> &'static str {
        match self {
            OnboardingAction::Advanced => "advanced",
            OnboardingAction::SteppedBack => "stepped_back",
            OnboardingAction::StepSelected(_) => "step_selected",
            OnboardingAction::Reset => "reset",
        }
    }
}

pub struct OnboardingLogic;

#[async_trait]
impl SceneLogic for OnboardingLogic {
    type State = OnboardingState;
    type Action = OnboardingAction;
    type Deps = Arc<ConsoleDeps>;

    fn initial(deps: &Arc<ConsoleDeps>) -> OnboardingState {
        let storage = deps.feature_storage(STORAGE_FEATURE);
        let step = storage
            .get(STEP_KEY)
            .as_deref()
            .and_then(OnboardingStep::parse)
            .unwrap_or(OnboardingStep::Connect);
        let completed = storage.get(COMPLETED_KEY).as_deref() == Some("true");
        OnboardingState { step, completed }
    }

    fn reduce(state: &mut OnboardingState, action: &OnboardingAction) {
        match action {
            OnboardingAction::Advanced => {
                if state.completed {
                    return;
                }
                match STEPS.get(state.step.index() + 1) {
                    Some(next) => state.step = *next,
                    None => state.completed = true,
                }
            }
            OnboardingAction::SteppedBack => {
                if state.completed {
                    state.completed = false;
                } else if let Some(index) = state.step.index().checked_sub(1) {
                    state.step = STEPS[index];
                }
            }
            OnboardingAction::StepSelected(step) => {
                if !state.completed && step.index() <= state.step.index() {
                    state.step = *step;
                }
            }
            OnboardingAction::Reset => {
                state.step = OnboardingStep::Connect;
                state.completed = false;
            }
        }
    }

    async fn react(_action: &OnboardingAction, state: &OnboardingState, effects: &mut Effects<'_, Self>) {
        // Every action in this scene mutates the slice, so each pass writes
        // it back. This is the only place onboarding storage is written.
        let storage = effects.deps().feature_storage(STORAGE_FEATURE);
        storage.set(STEP_KEY, state.step.as_str());
        storage.set(COMPLETED_KEY, if state.completed { "true" } else { "false" });
        debug!(step = state.step.as_str(), completed = state.completed, "Onboarding saved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> OnboardingState {
        OnboardingState { step: OnboardingStep::Connect, completed: false }
    }

    #[test]
    fn advancing_walks_the_steps_then_completes() {
        let mut state = fresh();
        OnboardingLogic::reduce(&mut state, &OnboardingAction::Advanced);
        assert_eq!(state.step, OnboardingStep::Schema);
        OnboardingLogic::reduce(&mut state, &OnboardingAction::Advanced);
        assert_eq!(state.step, OnboardingStep::Verify);
        assert!(!state.completed);

        OnboardingLogic::reduce(&mut state, &OnboardingAction::Advanced);
        assert!(state.completed);
        assert_eq!(state.step, OnboardingStep::Verify);

        // Advancing past completion changes nothing.
        let done = state.clone();
        OnboardingLogic::reduce(&mut state, &OnboardingAction::Advanced);
        assert_eq!(state, done);
    }

    #[test]
    fn stepping_back_reopens_a_completed_wizard() {
        let mut state = OnboardingState { step: OnboardingStep::Verify, completed: true };
        OnboardingLogic::reduce(&mut state, &OnboardingAction::SteppedBack);
        assert!(!state.completed);
        assert_eq!(state.step, OnboardingStep::Verify);

        OnboardingLogic::reduce(&mut state, &OnboardingAction::SteppedBack);
        assert_eq!(state.step, OnboardingStep::Schema);
    }

    #[test]
    fn forward_jumps_are_ignored() {
        let mut state = fresh();
        OnboardingLogic::reduce(
            &mut state,
            &OnboardingAction::StepSelected(OnboardingStep::Verify),
        );
        assert_eq!(state.step, OnboardingStep::Connect);

        state.step = OnboardingStep::Verify;
        OnboardingLogic::reduce(
            &mut state,
            &OnboardingAction::StepSelected(OnboardingStep::Connect),
        );
        assert_eq!(state.step, OnboardingStep::Connect);
    }

    #[test]
    fn initial_reads_persisted_progress() {
        let deps = crate::console::ConsoleDeps::mocked().0;
        deps.feature_storage(STORAGE_FEATURE).set(STEP_KEY, "schema");
        deps.feature_storage(STORAGE_FEATURE).set(COMPLETED_KEY, "false");

        let state = OnboardingLogic::initial(&deps);
        assert_eq!(state.step, OnboardingStep::Schema);
        assert!(!state.completed);
    }

    #[test]
    fn garbage_in_storage_falls_back_to_the_first_step() {
        let deps = crate::console::ConsoleDeps::mocked().0;
        deps.feature_storage(STORAGE_FEATURE).set(STEP_KEY, "warp");

        let state = OnboardingLogic::initial(&deps);
        assert_eq!(state.step, OnboardingStep::Connect);
    }
}
