pub mod alignment;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod localization;
pub mod recording;
pub mod trajectory;

pub use config::BenchConfig;
pub use error::{BenchError, Result};
