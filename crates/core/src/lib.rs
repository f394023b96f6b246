pub mod config;
pub mod job;
pub mod mention;

pub use config::Config;
pub use job::*;
pub use mention::*;
