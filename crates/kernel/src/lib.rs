pub mod settings;
pub mod statements;

pub use settings::{CommitMode, Settings};
pub use statements::StatementSet;
