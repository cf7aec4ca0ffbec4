/*!
 * # vnloc - visual novel script localization
 *
 * A Rust library that pulls translatable text out of visual novel scripts,
 * keeps it in a persistent slot registry, and rebuilds the scripts from stored
 * translations with their inline markup put back in place.
 *
 * ## Features
 *
 * - Line classification into discarded, standard and structured lines
 * - Markup tokenizing for line breaks, links and metadata tags
 * - Clean-text extraction with a recorded tag layout
 * - SQLite-backed translation slots with change detection
 * - Proportional line break and link reinsertion into translated text
 * - Concurrent translation through an OpenAI-compatible API
 * - JSON export and import of registry rows for hand editing
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `script`: per-line processing:
 *   - `script::markup`: markup tokenizer
 *   - `script::classifier`: line classifier
 *   - `script::extractor`: clean text and tag layout
 *   - `script::reinsertion`: tag reinsertion engine
 *   - `script::rebuilder`: line rebuilder
 *   - `script::diagnostics`: per-line diagnostics and file reports
 * - `registry`: translation slot storage
 * - `pipeline`: extract, translate and rebuild passes over files
 * - `providers`: translation provider clients
 * - `validation`: checks over rebuilt output
 * - `exchange`: JSON row export and import, review reports
 * - `app_config`: configuration management
 * - `app_controller`: main application controller
 * - `file_utils`: file system operations
 * - `errors`: custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod exchange;
pub mod file_utils;
pub mod pipeline;
pub mod providers;
pub mod registry;
pub mod script;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, ProviderError, RegistryError, ScriptError};
pub use registry::{SlotKey, SlotRegistry, TranslationSlot};
pub use script::{ExtractionRecord, LineClass, LineRebuilder, ScriptLine, TagLayout};
