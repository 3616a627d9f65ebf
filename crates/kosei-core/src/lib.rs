//! Core library for kosei, a proofreading tool for Japanese video scripts.
//!
//! The pipeline has three stages: fast local pattern checks
//! ([`checker`]), an optional AI review round trip ([`openrouter`] +
//! [`remote`]), and a merge step that orders everything for display
//! ([`coordinator`]). Reports are rendered by [`export`]; configuration,
//! credentials, and logging live in their own modules.

pub mod checker;
pub mod config;
pub mod coordinator;
pub mod export;
pub mod finding;
pub mod logging;
pub mod openrouter;
pub mod patterns;
pub mod remote;
pub mod secret_store;

pub use checker::DEFAULT_MAX_LINE_CHARS;
pub use config::{
    ConfigLoadResult, ConfigSource, DEFAULT_OPENROUTER_MODEL, FileConfig, load_config, save_config,
};
pub use coordinator::{CheckOptions, CheckOutcome, merge_and_sort, run_check};
pub use export::{default_csv_filename, to_csv, to_text_report};
pub use finding::{CheckSummary, Finding, Severity};
pub use logging::{LoggingDestination, LoggingError, init_logging};
pub use openrouter::{OpenRouterClient, ReviewClient, ReviewError};
