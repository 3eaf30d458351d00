mod config_cmd;
mod id;
mod package;

pub use config_cmd::ConfigCommand;
pub use id::IdCommand;
pub use package::PackageCommand;
