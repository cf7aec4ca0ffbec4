/*!
 * Localization passes over script files.
 *
 * A file goes through the passes in order:
 *
 * 1. `extract_pass`: classify and extract every line, registering one slot per
 *    translatable line and one per link phrase
 * 2. `translate_pass`: fill pending slots through a translation provider
 * 3. `rebuild_pass`: reassemble every line from the stored translations
 *
 * `batch` runs the file-level passes over a whole directory tree.
 */

pub mod batch;
pub mod extract_pass;
pub mod rebuild_pass;
pub mod translate_pass;

pub use batch::{BatchRunner, BatchSummary, ScriptFile};
pub use extract_pass::extract_file;
pub use rebuild_pass::{rebuild_file, RebuildOutput};
pub use translate_pass::{TranslatePass, TranslateSummary};
