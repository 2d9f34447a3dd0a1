pub mod config;
pub mod job;
pub mod types;

pub use config::TallyConfig;
pub use job::*;
pub use types::*;
