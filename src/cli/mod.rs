//! CLI command implementations

pub mod comments;
pub mod error;
pub mod export;
pub mod seed;
pub mod status;

pub use comments::CommentsArgs;
pub use error::CliError;
pub use export::{Cli, Commands, ExportArgs, OutputFormat};
pub use seed::SeedArgs;
