//! keyconsole - administrative console for wa-bomb and mail-storm activation keys
//!
//! The console issues, verifies, lists and deactivates activation keys and
//! shows per-customer statistics. Every operation is a call to the external
//! activation key service; key derivation and storage happen there.
//!
//! # Features
//!
//! - `cli` - The `keyconsole` terminal binary and tracing subscriber setup.
//!   Enabled by default.
//!
//! # Example
//!
//! ```toml
//! # Library only (typed client and view state, no terminal front end)
//! keyconsole = { path = "../keyconsole", default-features = false }
//! ```

// Core modules (always available)
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod render;

// Activation key service client
pub mod api;

// View state of the four console tabs
pub mod console {
    pub mod commands;
    pub mod forms;
    pub mod notifier;
    pub mod tab;

    mod state;

    pub use commands::ConsoleCommand;
    pub use forms::{GenerateForm, StatsQuery, Validity, VerifyForm};
    pub use notifier::{Notifier, TerminalNotifier};
    pub use state::{Console, DEACTIVATE_QUESTION};
    pub use tab::Tab;
}

pub use errors::{ConsoleError, ConsoleResult};
