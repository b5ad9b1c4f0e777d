//! Select, cartoonize, preview and save.

mod config;
mod controller;
mod state;

pub use config::Config;
pub use controller::{Action, Controller};
pub use state::PipelineState;
