mod api;
pub mod args;
mod backup;
mod cache;
mod clock;
pub mod commands;
mod config;
mod error;
pub mod model;
mod save;
pub mod session;
pub mod ticket;
mod uploader;
mod utils;
mod writer;

#[cfg(test)]
mod test;

pub use api::Mode;
pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use save::SaveOutcome;
pub use writer::WriteOutcome;
