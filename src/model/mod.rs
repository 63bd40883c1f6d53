pub mod task;
pub mod tree;
pub mod config;

pub use task::*;
pub use tree::*;
pub use config::*;
