//! One scene per screen family. Each submodule owns its state shape, its
//! action enum and its [`SceneLogic`](scene_store::SceneLogic) wiring;
//! `surveys` is the odd one out, a store-free module of pure chart
//! builders.

pub mod api_scopes;
pub mod cli_auth;
pub mod members;
pub mod onboarding;
pub mod pipeline;
pub mod replay_settings;
pub mod signup;
pub mod surveys;
