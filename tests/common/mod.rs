/*!
 * Common test utilities for the vnloc test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use vnloc::app_config::{Config, TranslationProvider};
use vnloc::registry::{DatabaseConnection, SlotRepository};
use vnloc::Controller;

/// Choice directive, always discarded
pub const CHOICE_LINE: &str = "> @choice |#0101Trial01_Choice003|";

/// Speaker line with an inline break
pub const STANDARD_LINE: &str =
    "> Ema: |#0101Adv02_Ema001| 何を考えていますの！？<br>わたくしをこんなところに閉じ込めるなんて！";

/// Clean text of `STANDARD_LINE`
pub const STANDARD_CLEAN: &str = "何を考えていますの！？わたくしをこんなところに閉じ込めるなんて！";

/// Translation of `STANDARD_CLEAN`
pub const STANDARD_TRANSLATION: &str = "Cậu đang nghĩ gì vậy!? Nhốt mình vào một nơi như thế này ư!";

/// Debate line with three breaks and one link
pub const STRUCTURED_LINE: &str = "> @printDebate pos:65,35 |#0101Trial01_Sherry003| 死体の後ろ、<br>そして周囲……<br>そこに<link=\"Objection_01_01_01_01\">血で描かれた</link><br>蝶の絵が描かれているんです！";

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content, creating parent directories
pub fn create_test_file(dir: &Path, relative: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(relative);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A small chapter mixing every line class
pub fn sample_chapter() -> String {
    format!("{}\n{}\n{}\n", CHOICE_LINE, STANDARD_LINE, STRUCTURED_LINE)
}

/// Config pointing at `original/`, `translated/` and `slots.db` under `root`
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Mock;
    config.translation.retry_backoff_ms = 1;
    config.pipeline.original_dir = root.join("original");
    config.pipeline.translated_dir = root.join("translated");
    config.pipeline.database_path = Some(root.join("slots.db"));
    config.pipeline.write_bom = false;
    config
}

/// Route crate logs to the test harness; set RUST_LOG to see them
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Controller over the SQLite database configured for `root`
pub fn create_controller(root: &Path) -> Result<Controller> {
    init_test_logging();
    Controller::with_config(test_config(root))
}

/// Controller over a fresh in-memory registry
pub fn create_memory_controller(root: &Path) -> Result<Controller> {
    init_test_logging();
    Controller::with_repository(test_config(root), SlotRepository::new(DatabaseConnection::new_in_memory()?))
}
