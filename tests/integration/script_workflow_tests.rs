/*!
 * End-to-end tests: extract, translate and build over a script tree.
 */

use std::fs;
use std::sync::Arc;

use vnloc::providers::mock::MockTranslator;
use vnloc::registry::SlotKey;
use vnloc::script::{Diagnostic, Severity};

use crate::common::{
    create_controller, create_memory_controller, create_temp_dir, create_test_file, sample_chapter,
    test_config, CHOICE_LINE, STANDARD_CLEAN, STANDARD_TRANSLATION,
};

/// Test the full run over the sample chapter with a dictionary translator
#[tokio::test]
async fn test_full_run_withSampleChapter_shouldWriteLocalizedScript() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "original/ch01/trial.txt", &sample_chapter()).unwrap();
    let controller = create_controller(dir.path()).unwrap();

    let extracted = controller.extract().await.unwrap();
    assert_eq!(extracted.slots_created(), 3);

    let translator = Arc::new(MockTranslator::with_dictionary([
        (STANDARD_CLEAN, STANDARD_TRANSLATION),
        (
            "死体の後ろ、そして周囲……そこに血で描かれた蝶の絵が描かれているんです！",
            "Phía sau xác chết, và xung quanh…… ở đó có bức tranh con bướm được vẽ bằng máu!",
        ),
        ("血で描かれた", "được vẽ bằng máu"),
    ]));
    let translated = controller.translate_with(translator, 100, false).await.unwrap();
    assert_eq!(translated.translated, 3);

    let built = controller.build().await.unwrap();
    let output = fs::read_to_string(dir.path().join("translated").join("ch01").join("trial.txt")).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(built.written_lines(), 2);
    assert_eq!(lines.len(), 2);
    assert!(!output.contains(CHOICE_LINE));
    assert_eq!(lines[0], format!("> Ema: |#0101Adv02_Ema001| {}", STANDARD_TRANSLATION));
    assert!(lines[1].starts_with("> @printDebate pos:65,35 |#0101Trial01_Sherry003| <size=90%>"));
    assert_eq!(lines[1].matches("<br><size=90%>").count(), 3);
    assert_eq!(lines[1].matches("<link=\"Objection_01_01_01_01\">").count(), 1);
    assert_eq!(lines[1].matches("được vẽ bằng máu").count(), 1);
    assert_eq!(built.count(Severity::Error), 0);
}

/// Test that the output carries a byte order mark when configured
#[tokio::test]
async fn test_build_withBomEnabled_shouldPrefixOutput() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "original/a.txt", "> A: |#A1| 猫\n").unwrap();
    let mut config = test_config(dir.path());
    config.pipeline.write_bom = true;
    let controller = vnloc::Controller::with_config(config).unwrap();

    controller.extract().await.unwrap();
    controller
        .registry()
        .record_translation(&SlotKey::line("a.txt", 0), "Mèo")
        .unwrap();
    controller.build().await.unwrap();

    let bytes = fs::read(dir.path().join("translated").join("a.txt")).unwrap();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    assert_eq!(String::from_utf8_lossy(&bytes[3..]), "> A: |#A1| Mèo\n");
}

/// Test that re-running extraction on unchanged input creates nothing
#[tokio::test]
async fn test_extract_runTwice_shouldBeIdempotent() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "original/ch01.txt", &sample_chapter()).unwrap();
    let controller = create_controller(dir.path()).unwrap();

    controller.extract().await.unwrap();
    let before = controller.registry().all_rows().unwrap();
    let second = controller.extract().await.unwrap();
    let after = controller.registry().all_rows().unwrap();

    assert_eq!(second.slots_created(), 0);
    assert_eq!(before, after);
}

/// Test that untranslated lines are left out of the output and reported
#[tokio::test]
async fn test_build_withoutTranslations_shouldExcludeLinesAndReport() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "original/ch01.txt", &sample_chapter()).unwrap();
    let controller = create_memory_controller(dir.path()).unwrap();

    controller.extract().await.unwrap();
    let built = controller.build().await.unwrap();

    let output = fs::read_to_string(dir.path().join("translated").join("ch01.txt")).unwrap();
    assert!(output.is_empty());
    assert_eq!(built.excluded_lines(), 2);
    assert!(built.reports[0]
        .diagnostics
        .iter()
        .all(|diagnostic| matches!(diagnostic, Diagnostic::MissingTranslation { .. })));
}

/// Test that an edited source line keeps its translation and flags it stale
#[tokio::test]
async fn test_extract_afterSourceEdit_shouldFlagStaleAndStillBuild() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "original/a.txt", "> A: |#A1| 古い台詞\n").unwrap();
    let controller = create_memory_controller(dir.path()).unwrap();

    controller.extract().await.unwrap();
    controller
        .translate_with(Arc::new(MockTranslator::with_dictionary([("古い台詞", "Lời thoại cũ")])), 10, false)
        .await
        .unwrap();

    create_test_file(dir.path(), "original/a.txt", "> A: |#A1| 新しい台詞\n").unwrap();
    let extracted = controller.extract().await.unwrap();

    assert_eq!(extracted.count(Severity::Warning), 1);
    assert_eq!(controller.review().unwrap().stale.len(), 1);

    controller.build().await.unwrap();
    let output = fs::read_to_string(dir.path().join("translated").join("a.txt")).unwrap();
    assert_eq!(output, "> A: |#A1| Lời thoại cũ\n");
}

/// Test that building from a source edited after extraction does not reuse the old translation
#[tokio::test]
async fn test_build_afterSourceEditWithoutExtract_shouldNotWriteOldTranslation() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "original/a.txt", "> A: |#A1| 猫です\n").unwrap();
    let controller = create_memory_controller(dir.path()).unwrap();
    controller.extract().await.unwrap();
    controller
        .registry()
        .record_translation(&SlotKey::line("a.txt", 0), "Là mèo")
        .unwrap();

    create_test_file(dir.path(), "original/a.txt", "> A: |#A1| 犬が走る\n").unwrap();
    let built = controller.build().await.unwrap();

    let output = fs::read_to_string(dir.path().join("translated").join("a.txt")).unwrap();
    assert!(!output.contains("Là mèo"));
    assert_eq!(built.excluded_lines(), 1);
    assert_eq!(built.count(Severity::Warning), 1);
}

/// Test that a malformed line is skipped while the rest of the file is built
#[tokio::test]
async fn test_full_run_withMalformedLine_shouldSkipOnlyThatLine() {
    let dir = create_temp_dir().unwrap();
    create_test_file(
        dir.path(),
        "original/a.txt",
        "> @printDebate pos:1,1 |#D1| 前<link=\"X\">証拠\n> B: |#B1| 次の行\n",
    )
    .unwrap();
    let controller = create_memory_controller(dir.path()).unwrap();

    let extracted = controller.extract().await.unwrap();
    controller
        .translate_with(Arc::new(MockTranslator::with_dictionary([("次の行", "Dòng tiếp theo")])), 10, false)
        .await
        .unwrap();
    let built = controller.build().await.unwrap();

    assert_eq!(extracted.count(Severity::Error), 1);
    assert_eq!(built.excluded_lines(), 1);
    let output = fs::read_to_string(dir.path().join("translated").join("a.txt")).unwrap();
    assert_eq!(output, "> B: |#B1| Dòng tiếp theo\n");
}

/// Test that failed provider calls leave slots pending for the next run
#[tokio::test]
async fn test_translate_withFailingProvider_shouldLeaveSlotsPending() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "original/a.txt", "> A: |#A1| 一\n> B: |#B1| 二\n").unwrap();
    let controller = create_memory_controller(dir.path()).unwrap();
    controller.extract().await.unwrap();

    let summary = controller
        .translate_with(Arc::new(MockTranslator::failing()), 10, false)
        .await
        .unwrap();

    assert_eq!(summary.failed, 2);
    assert_eq!(controller.stats().unwrap().pending, 2);
}

/// Test that many files are processed and reported in file id order
#[tokio::test]
async fn test_extract_withManyFiles_shouldReportInFileIdOrder() {
    let dir = create_temp_dir().unwrap();
    for index in (0..12).rev() {
        create_test_file(
            dir.path(),
            &format!("original/part{:02}.txt", index),
            &format!("> A: |#A{}| 台詞{}\n", index, index),
        )
        .unwrap();
    }
    let controller = create_memory_controller(dir.path()).unwrap();

    let summary = controller.extract().await.unwrap();

    let ids: Vec<&str> = summary.reports.iter().map(|r| r.file_id.as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    assert_eq!(controller.stats().unwrap().total, 12);
}
