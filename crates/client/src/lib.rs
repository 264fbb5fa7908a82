pub mod api;
pub mod app;
pub mod config;
pub mod context;
pub mod controllers;
pub mod error;
pub mod keys;
pub mod push;
pub mod state;
pub mod ui;

#[cfg(test)]
mod test_support;

pub use app::App;
pub use config::Config;
pub use error::{ClientError, TransportError};
