//! # FCAT Chat Logs
//!
//! Turns EVE chat logs into a boost index.
//!
//! ```text
//! channel name ──> find_latest_log ──> bytes ──> decode_log_bytes
//!                                                    │
//!                        BoostParser (per-pilot facts) <┘
//!                                │
//!                        BoostAggregator ──> BoostIndex
//! ```

mod aggregator;
mod decode;
mod error;
mod locate;
mod parser;

pub use aggregator::BoostAggregator;
pub use decode::{decode_log_bytes, TextEncoding};
pub use error::{ChatLogError, Result};
pub use locate::{default_chatlog_dir, find_latest_log};
pub use parser::BoostParser;
