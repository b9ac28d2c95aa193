pub mod config;
pub mod focus;

pub use config::*;
pub use focus::*;
