pub mod cancel;
pub mod chunk;
pub mod commands;
pub mod decompress;
pub mod download;
pub mod error;
pub mod manifest;
pub mod reconstruct;
pub mod transport;

pub use error::{Error, Result};
