/*!
 * Directory-level batch runner.
 *
 * Files are independent: each one is read, processed and written on the blocking
 * pool, several at a time. Reports come back in file id order regardless of
 * completion order. A registry failure aborts the whole run.
 */

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::extract_pass::extract_file;
use super::rebuild_pass::rebuild_file;
use crate::file_utils::FileManager;
use crate::registry::{SlotRegistry, SlotStore};
use crate::script::{FileReport, LineRebuilder, Severity};
use crate::validation::ValidationService;

/// A script file under the source root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    /// Path relative to the source root with '/' separators
    pub file_id: String,
    pub path: PathBuf,
}

impl ScriptFile {
    /// Every script with the given extension under `root`, sorted by file id
    pub fn discover<P: AsRef<Path>>(root: P, extension: &str) -> Result<Vec<ScriptFile>> {
        let root = root.as_ref();
        if !FileManager::dir_exists(root) {
            return Err(anyhow!("Source directory does not exist: {:?}", root));
        }

        let mut files: Vec<ScriptFile> = FileManager::find_files(root, extension)?
            .into_iter()
            .map(|path| ScriptFile {
                file_id: FileManager::file_id(root, &path),
                path,
            })
            .collect();
        files.sort_by(|a, b| a.file_id.cmp(&b.file_id));
        Ok(files)
    }
}

/// Reports of one batch run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub reports: Vec<FileReport>,
}

impl BatchSummary {
    pub fn files(&self) -> usize {
        self.reports.len()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.reports.iter().map(|report| report.count(severity)).sum()
    }

    pub fn slots_created(&self) -> usize {
        self.reports.iter().map(|report| report.slots_created).sum()
    }

    pub fn written_lines(&self) -> usize {
        self.reports.iter().map(|report| report.written_lines).sum()
    }

    pub fn excluded_lines(&self) -> usize {
        self.reports.iter().map(FileReport::excluded_lines).sum()
    }
}

/// Runs the file passes over many files concurrently
#[derive(Debug, Clone)]
pub struct BatchRunner {
    max_parallel_files: usize,
}

impl BatchRunner {
    pub fn new(max_parallel_files: usize) -> Self {
        Self {
            max_parallel_files: max_parallel_files.max(1),
        }
    }

    /// Extract every file and register its slots
    pub async fn extract_all<S: SlotStore + 'static>(
        &self,
        files: &[ScriptFile],
        registry: Arc<SlotRegistry<S>>,
    ) -> Result<BatchSummary> {
        self.run(files, move |file| {
            let content = FileManager::read_script(&file.path)?;
            let report = extract_file(&file.file_id, &content, registry.as_ref())
                .with_context(|| format!("Registry failure while extracting {}", file.file_id))?;
            Ok(report)
        })
        .await
    }

    /// Rebuild every file into `output_dir`, mirroring file ids as relative paths
    pub async fn rebuild_all<S: SlotStore + 'static>(
        &self,
        files: &[ScriptFile],
        registry: Arc<SlotRegistry<S>>,
        rebuilder: Arc<LineRebuilder>,
        validator: Arc<ValidationService>,
        output_dir: PathBuf,
        write_bom: bool,
    ) -> Result<BatchSummary> {
        self.run(files, move |file| {
            let content = FileManager::read_script(&file.path)?;
            let output = rebuild_file(&file.file_id, &content, registry.as_ref(), rebuilder.as_ref(), validator.as_ref())
                .with_context(|| format!("Registry failure while rebuilding {}", file.file_id))?;
            let output_path = FileManager::generate_output_path(&output_dir, &file.file_id);
            FileManager::write_script(&output_path, &output.content, write_bom)?;
            Ok(output.report)
        })
        .await
    }

    async fn run<F>(&self, files: &[ScriptFile], process: F) -> Result<BatchSummary>
    where
        F: Fn(&ScriptFile) -> Result<FileReport> + Send + Sync + 'static,
    {
        info!("Processing {} files, {} at a time", files.len(), self.max_parallel_files);
        let process = Arc::new(process);

        let results = stream::iter(files.iter().cloned().enumerate())
            .map(|(index, file)| {
                let process = process.clone();
                async move {
                    let file_id = file.file_id.clone();
                    let result = tokio::task::spawn_blocking(move || process(&file))
                        .await
                        .map_err(|e| anyhow!("Worker for {} panicked: {}", file_id, e))
                        .and_then(|result| result);
                    (index, file_id, result)
                }
            })
            .buffer_unordered(self.max_parallel_files)
            .collect::<Vec<_>>()
            .await;

        let mut sorted_results = results;
        sorted_results.sort_by_key(|(index, _, _)| *index);

        let mut summary = BatchSummary::default();
        for (_, file_id, result) in sorted_results {
            match result {
                Ok(report) => summary.reports.push(report),
                Err(e) => {
                    error!("Processing {} failed: {:#}", file_id, e);
                    return Err(e);
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemorySlotStore, SlotKey};
    use std::fs;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_shouldSortByFileId() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b/two.txt", "");
        write(dir.path(), "a.txt", "");

        let files = ScriptFile::discover(dir.path(), "txt").unwrap();

        let ids: Vec<&str> = files.iter().map(|f| f.file_id.as_str()).collect();
        assert_eq!(ids, vec!["a.txt", "b/two.txt"]);
    }

    #[test]
    fn test_discover_withMissingRoot_shouldFail() {
        assert!(ScriptFile::discover("/definitely/not/here", "txt").is_err());
    }

    #[tokio::test]
    async fn test_extract_then_rebuild_all_shouldMirrorTree() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(source.path(), "ch01/a.txt", "> A: |#A1| 一\n> @choice |#C1|\n");
        write(source.path(), "b.txt", "> B: |#B1| 二\n");

        let files = ScriptFile::discover(source.path(), "txt").unwrap();
        let registry = Arc::new(SlotRegistry::new(MemorySlotStore::new()));
        let runner = BatchRunner::new(2);

        let extracted = runner.extract_all(&files, registry.clone()).await.unwrap();
        assert_eq!(extracted.files(), 2);
        assert_eq!(extracted.slots_created(), 2);

        registry.record_translation(&SlotKey::line("ch01/a.txt", 0), "một").unwrap();
        registry.record_translation(&SlotKey::line("b.txt", 0), "hai").unwrap();

        let rebuilt = runner
            .rebuild_all(
                &files,
                registry,
                Arc::new(LineRebuilder::default()),
                Arc::new(ValidationService::default()),
                output.path().to_path_buf(),
                false,
            )
            .await
            .unwrap();

        assert_eq!(rebuilt.written_lines(), 2);
        assert_eq!(
            fs::read_to_string(output.path().join("ch01").join("a.txt")).unwrap(),
            "> A: |#A1| một\n"
        );
        assert_eq!(fs::read_to_string(output.path().join("b.txt")).unwrap(), "> B: |#B1| hai\n");
    }
}
