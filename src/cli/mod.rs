mod args;
mod commands;

pub use args::{Args, Command, SettingsAction, TagAction, ViewAction};
pub use commands::{run_cli, DEFAULT_PROFILE};
