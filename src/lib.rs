//! # Media Renamer
//!
//! Batch renaming of photos and videos into numbered sequences.
//!
//! ## Core Philosophy
//! - **Preview first** - every batch can be dry-run and shows its conflicts
//! - **Never overwrite** - a colliding name is skipped, not clobbered
//! - **One bad file never stops a batch** - failures are reported per item
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - Sorting, naming, preview, execution and folder monitoring
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//! - `config` - Settings file

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{RenamerError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
/// `RUST_LOG` wins over `verbose`. Calling it twice is harmless.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
