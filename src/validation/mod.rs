/*!
 * Validation of rebuilt output.
 *
 * Validators run after a line is rebuilt and never change it; they only report.
 *
 * # Architecture
 *
 * - `markers`: recounts line breaks and link constructs against the source layout
 * - `script_purity`: finds source-script characters left in the output
 * - `service`: runs the enabled validators for one line
 */

pub mod markers;
pub mod script_purity;
pub mod service;

// Re-export main types
pub use markers::MarkerValidator;
pub use script_purity::ScriptPurityValidator;
pub use service::{ValidationConfig, ValidationService};
