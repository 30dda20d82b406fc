//! Application-level orchestration.
//!
//! Owns the session lifecycle between a UI and the controllers. UI layers send
//! [`UiCommand`]s and render the events the controllers emit.

mod controller;

pub(crate) use controller::{run_controller, UiCommand};
