// region:    --- Modules
pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod event;
pub mod hooks;
pub mod probe;
pub mod sink;
pub mod state;
pub mod supervisor;
pub mod trx;
pub mod workers;
// endregion: --- Modules

pub use self::error::{Error, Result};
