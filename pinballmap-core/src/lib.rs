//! Pinball Map client library exports

pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod matching;

pub use client::PinballMapClient;
pub use config::ClientConfig;
pub use error::{PinballMapError, Result};
pub use matching::{MatchResult, NameMatcher};
