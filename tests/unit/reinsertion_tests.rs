/*!
 * Tests for tag reinsertion and line rebuilding
 */

use vnloc::script::extractor::extract;
use vnloc::script::reinsertion::{Partition, ReinsertionEngine, ReinsertionStyle, SegmentationStrategy};
use vnloc::script::{LineRebuilder, ScriptLine};

use crate::common::{STANDARD_LINE, STANDARD_TRANSLATION, STRUCTURED_LINE};

fn link_translation() -> Vec<String> {
    vec!["được vẽ bằng máu".to_string()]
}

/// Test the standard example rebuild
#[test]
fn test_rebuild_withStandardExample_shouldWritePrefixAndTranslation() {
    let record = extract(&ScriptLine::new(STANDARD_LINE, 0)).unwrap().unwrap();

    let rebuilt = LineRebuilder::default()
        .rebuild(&record, STANDARD_TRANSLATION, &[])
        .unwrap()
        .unwrap();

    assert_eq!(
        rebuilt.text,
        format!("> Ema: |#0101Adv02_Ema001| {}", STANDARD_TRANSLATION)
    );
    assert!(!rebuilt.text.contains("<br>"));
}

/// Test the structured example rebuild
#[test]
fn test_rebuild_withStructuredExample_shouldEmitBreaksLinkAndWrappers() {
    let record = extract(&ScriptLine::new(STRUCTURED_LINE, 0)).unwrap().unwrap();
    let translated = "Phía sau xác chết, và xung quanh…… ở đó có bức tranh con bướm được vẽ bằng máu!";

    let rebuilt = LineRebuilder::default()
        .rebuild(&record, translated, &link_translation())
        .unwrap()
        .unwrap();

    assert!(rebuilt.text.starts_with("> @printDebate pos:65,35 |#0101Trial01_Sherry003| <size=90%>"));
    assert_eq!(rebuilt.body.matches("<br>").count(), 3);
    assert_eq!(rebuilt.body.matches("<br><size=90%>").count(), 3);
    assert_eq!(rebuilt.body.matches("<link=\"Objection_01_01_01_01\">").count(), 1);
    assert_eq!(rebuilt.body.matches("</link>").count(), 1);
    assert!(rebuilt.body.contains("<color=#F2B035>"));

    let link_at = rebuilt.body.find("</link>").unwrap();
    let last_break = rebuilt.body.rfind("<br>").unwrap();
    assert!(link_at < last_break, "link must stay before the last break");
}

/// Test that the link phrase of the structured example is written once, inside its own line
#[test]
fn test_reinsert_withStructuredExample_shouldWriteLinkPhraseOnceInItsLine() {
    let record = extract(&ScriptLine::new(STRUCTURED_LINE, 0)).unwrap().unwrap();
    let engine = ReinsertionEngine::default();

    let outcome = engine
        .reinsert(
            &record.tag_layout,
            "Phía sau xác chết, và xung quanh…… ở đó có bức tranh con bướm được vẽ bằng máu!",
            &link_translation(),
        )
        .unwrap();
    let lines: Vec<&str> = outcome.text.split("<br>").collect();

    assert_eq!(outcome.text.matches("được vẽ bằng máu").count(), 1);
    assert!(outcome.text.contains("bức tranh con bướm"));
    assert_eq!(lines.len(), 4);
    assert!(lines[2].contains("<link=\"Objection_01_01_01_01\"><color=#F2B035>được vẽ bằng máu</color></link>"));
}

/// Test that a phrase in mid sentence keeps the surrounding clauses on their lines
#[test]
fn test_reinsert_withPhraseBetweenClauses_shouldCutAroundIt() {
    let record = extract(&ScriptLine::new(STRUCTURED_LINE, 0)).unwrap().unwrap();
    let engine = ReinsertionEngine::default();

    let outcome = engine
        .reinsert(
            &record.tag_layout,
            "Phía sau xác chết, và xung quanh…… Ở đó, được vẽ bằng máu, là hình con bướm!",
            &link_translation(),
        )
        .unwrap();

    assert_eq!(
        outcome.text,
        "<size=90%>Phía sau xác chết,<br><size=90%>và xung quanh……<br><size=90%>Ở đó, \
         <link=\"Objection_01_01_01_01\"><color=#F2B035>được vẽ bằng máu</color></link>,\
         <br><size=90%>là hình con bướm!"
    );
    assert!(!outcome.lossy);
}

/// Test that marker counts hold for translations of any shape
#[test]
fn test_reinsert_withVariousTranslations_shouldKeepMarkerCounts() {
    let record = extract(&ScriptLine::new(STRUCTURED_LINE, 0)).unwrap().unwrap();
    let engine = ReinsertionEngine::default();
    let translations = [
        "x",
        "Behind the corpse",
        "Không có dấu câu nào ở đây cả nhưng vẫn phải chia thành bốn dòng",
        "Mộtchuỗidàikhôngcókhoảngtrắngnàocả",
        "Đằng sau xác chết. Xung quanh nữa! Ở đó, vẽ bằng máu? Là con bướm.",
        "Line one\nline two\r\nline three",
    ];

    for translated in translations {
        let outcome = engine
            .reinsert(&record.tag_layout, translated, &link_translation())
            .unwrap();

        assert_eq!(outcome.text.matches("<br>").count(), 3, "breaks for {:?}", translated);
        assert_eq!(outcome.text.matches("</link>").count(), 1, "links for {:?}", translated);
        assert!(!outcome.text.contains('\n'));
    }
}

/// Test that rebuilding with the source text reproduces the source markers
#[test]
fn test_rebuild_withSourceText_shouldRoundTripMarkers() {
    let line = ScriptLine::new(STRUCTURED_LINE, 3);
    let record = extract(&line).unwrap().unwrap();
    let phrase = vec!["血で描かれた".to_string()];

    let rebuilt = LineRebuilder::default()
        .rebuild(&record, &record.clean_text, &phrase)
        .unwrap()
        .unwrap();
    let again = extract(&ScriptLine::new(rebuilt.text.clone(), 3)).unwrap().unwrap();

    assert!(!rebuilt.lossy);
    assert_eq!(again.clean_text, record.clean_text);
    assert_eq!(again.tag_layout, record.tag_layout);
}

/// Test that a configured style is used for wrappers and links
#[test]
fn test_reinsert_withCustomStyle_shouldUseIt() {
    let record = extract(&ScriptLine::new(STRUCTURED_LINE, 0)).unwrap().unwrap();
    let engine = ReinsertionEngine::new(ReinsertionStyle {
        size_wrapper: "<size=80%>".to_string(),
        link_style_open: "<b>".to_string(),
        link_style_close: "</b>".to_string(),
    });

    let outcome = engine
        .reinsert(&record.tag_layout, "một, hai, ba, được vẽ bằng máu bốn", &link_translation())
        .unwrap();

    assert!(outcome.text.starts_with("<size=80%>"));
    assert!(outcome.text.contains("<b>"));
    assert!(!outcome.text.contains("<size=90%>"));
}

/// Splits text into equal character runs
struct EvenSplit;

impl SegmentationStrategy for EvenSplit {
    fn partition(&self, text: &str, weights: &[usize]) -> Partition {
        let chars: Vec<char> = text.chars().collect();
        let size = chars.len().div_ceil(weights.len().max(1)).max(1);
        let mut chunks: Vec<String> = chars.chunks(size).map(|c| c.iter().collect()).collect();
        chunks.resize(weights.len(), String::new());
        Partition { chunks, exact: true }
    }
}

/// Test that a custom segmentation strategy can be plugged in
#[test]
fn test_reinsert_withCustomStrategy_shouldUseItsChunks() {
    let record = extract(&ScriptLine::new("@printDebate pos:0,0 |#S1| 一<br>二", 0))
        .unwrap()
        .unwrap();
    let engine = ReinsertionEngine::with_strategy(ReinsertionStyle::default(), Box::new(EvenSplit));

    let outcome = engine.reinsert(&record.tag_layout, "abcd", &[]).unwrap();

    assert_eq!(outcome.text, "<size=90%>ab<br><size=90%>cd");
    assert!(!outcome.lossy);
}

/// Test that a wrong number of link translations is rejected
#[test]
fn test_reinsert_withMissingLinkTranslation_shouldFail() {
    let record = extract(&ScriptLine::new(STRUCTURED_LINE, 0)).unwrap().unwrap();

    assert!(ReinsertionEngine::default()
        .reinsert(&record.tag_layout, "text", &[])
        .is_err());
}
