/*!
 * Integration tests for row export, import and review
 */

use std::fs;

use vnloc::exchange::ExchangeRow;
use vnloc::registry::SlotKey;

use crate::common::{create_memory_controller, create_temp_dir, create_test_file, sample_chapter};

/// Test that exported rows can be edited by hand and imported back
#[tokio::test]
async fn test_export_editImport_build_shouldUseHandTranslations() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "original/ch01.txt", &sample_chapter()).unwrap();
    let controller = create_memory_controller(dir.path()).unwrap();
    controller.extract().await.unwrap();

    let rows_path = dir.path().join("rows.json");
    assert_eq!(controller.export(&rows_path, None).unwrap(), 3);

    let mut rows: Vec<ExchangeRow> = serde_json::from_str(&fs::read_to_string(&rows_path).unwrap()).unwrap();
    for row in rows.iter_mut() {
        row.translated = match row.key.as_str() {
            "ch01.txt#1" => "Cậu đang nghĩ gì vậy!?".to_string(),
            "ch01.txt#2" => "Sau xác chết, quanh đó, vẽ bằng máu, con bướm!".to_string(),
            _ => "vẽ bằng máu".to_string(),
        };
    }
    fs::write(&rows_path, serde_json::to_string_pretty(&rows).unwrap()).unwrap();

    let summary = controller.import(&rows_path).unwrap();
    assert_eq!(summary.applied, 3);
    assert!(controller.review().unwrap().is_empty());

    let built = controller.build().await.unwrap();
    assert_eq!(built.written_lines(), 2);
    let output = fs::read_to_string(dir.path().join("translated").join("ch01.txt")).unwrap();
    assert!(output.contains("Cậu đang nghĩ gì vậy!?"));
    assert!(output.contains("vẽ bằng máu</color></link>"));
}

/// Test that rows exported before a source edit are not applied
#[tokio::test]
async fn test_import_afterSourceEdit_shouldSkipMismatchedRows() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "original/a.txt", "> A: |#A1| 古い\n").unwrap();
    let controller = create_memory_controller(dir.path()).unwrap();
    controller.extract().await.unwrap();

    let rows_path = dir.path().join("rows.json");
    controller.export(&rows_path, Some("a.txt")).unwrap();

    create_test_file(dir.path(), "original/a.txt", "> A: |#A1| 新しい\n").unwrap();
    controller.extract().await.unwrap();

    let edited = fs::read_to_string(&rows_path)
        .unwrap()
        .replace("\"translated\": \"\"", "\"translated\": \"cũ\"");
    fs::write(&rows_path, edited).unwrap();

    let summary = controller.import(&rows_path).unwrap();

    assert_eq!(summary.applied, 0);
    assert_eq!(summary.mismatched, 1);
    assert_eq!(controller.registry().lookup_translation("a.txt", 0).unwrap(), None);
}

/// Test that accepting a stale row clears it from the review
#[tokio::test]
async fn test_markReviewed_shouldClearStaleRow() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "original/a.txt", "> A: |#A1| 一\n").unwrap();
    let controller = create_memory_controller(dir.path()).unwrap();
    controller.extract().await.unwrap();
    controller
        .registry()
        .record_translation(&SlotKey::line("a.txt", 0), "một")
        .unwrap();

    create_test_file(dir.path(), "original/a.txt", "> A: |#A1| 壱\n").unwrap();
    controller.extract().await.unwrap();
    assert_eq!(controller.review().unwrap().stale.len(), 1);

    controller.mark_reviewed("a.txt#0").unwrap();

    assert!(controller.review().unwrap().stale.is_empty());
    assert!(controller.mark_reviewed("not a key").is_err());
}
