//! kindrun - ephemeral kind clusters for CI test runs.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── run           # Full lifecycle for one workload
//! │   ├── name          # Print the derived cluster name
//! │   ├── teardown      # Manual cleanup of a leftover cluster
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # kindrun.toml and per-run settings
//!     ├── exec          # Executor trait over external tools
//!     ├── interrupt     # Termination-signal watcher
//!     ├── lifecycle     # Create, export, inject, deploy, run, teardown
//!     ├── guard         # Teardown on every exit path
//!     ├── registry      # Registry credential staging
//!     ├── deploy        # Helm deployment descriptor
//!     └── pipeline      # The run, start to finish
//! ```
//!
//! # Guarantees
//!
//! - The cluster name never contains characters kind rejects
//! - Exactly one teardown per run: on success, on failure, on SIGINT,
//!   SIGTERM or SIGHUP, and while unwinding from a panic
//! - External tool diagnostics are passed through untouched and their exit
//!   codes become the process exit code

pub mod cli;
pub mod core;
pub mod error;
