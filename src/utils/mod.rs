mod command;
mod config;
mod logging;

pub use command::{CommandExecutor, Invocation};
pub use config::Config;
pub use logging::set_up_logging;
