/*!
 * Tests for line classification and clean-text extraction
 */

use vnloc::errors::ScriptError;
use vnloc::script::classifier::{classify, LineClass};
use vnloc::script::extractor::extract;
use vnloc::script::{ScriptLine, TagKind};

use crate::common::{CHOICE_LINE, STANDARD_CLEAN, STANDARD_LINE, STRUCTURED_LINE};

/// Test that choice directives and speaker-only lines are discarded
#[test]
fn test_classify_withDirectiveLines_shouldDiscard() {
    assert_eq!(classify(CHOICE_LINE), LineClass::Discard);
    assert_eq!(classify("> @bgm play 12"), LineClass::Discard);
    assert_eq!(classify("> Ema: |#0101Adv02_Ema002|"), LineClass::Discard);
    assert_eq!(classify(""), LineClass::Discard);
}

/// Test that dialogue and debate lines are recognized
#[test]
fn test_classify_withDialogueLines_shouldKeep() {
    assert_eq!(classify(STANDARD_LINE), LineClass::StandardContent);
    assert_eq!(classify(STRUCTURED_LINE), LineClass::StructuredContent);
}

/// Test that a discarded line never yields a record
#[test]
fn test_extract_withChoiceLine_shouldYieldNothing() {
    assert_eq!(extract(&ScriptLine::new(CHOICE_LINE, 0)), Ok(None));
}

/// Test the standard example line
#[test]
fn test_extract_withStandardExample_shouldDropBreaksAndKeepPrefix() {
    let record = extract(&ScriptLine::new(STANDARD_LINE, 1)).unwrap().unwrap();

    assert_eq!(record.clean_text, STANDARD_CLEAN);
    assert_eq!(record.structural_prefix, "> Ema: |#0101Adv02_Ema001| ");
    assert_eq!(record.tag_layout.line_break_count(), 0);
    assert_eq!(record.tag_layout.link_count(), 0);
}

/// Test the structured example line marker order
#[test]
fn test_extract_withStructuredExample_shouldRecordBreakBreakLinkBreak() {
    let record = extract(&ScriptLine::new(STRUCTURED_LINE, 2)).unwrap().unwrap();

    assert_eq!(
        record.tag_layout.marker_kinds(),
        vec![
            TagKind::LineBreak,
            TagKind::LineBreak,
            TagKind::LinkOpen,
            TagKind::LinkClose,
            TagKind::LineBreak,
        ]
    );
    assert_eq!(record.tag_layout.links(), vec![("Objection_01_01_01_01", "血で描かれた")]);
}

/// Test that a malformed line fails alone and later lines still extract
#[test]
fn test_extract_withMalformedLine_shouldNotAffectFollowingLines() {
    let content = format!(
        "> @printDebate pos:1,1 |#Bad01| 前<link=\"X\">text\n{}\n",
        STANDARD_LINE
    );
    let lines = ScriptLine::parse_content(&content);

    let results: Vec<_> = lines.iter().map(extract).collect();

    assert!(matches!(
        results[0],
        Err(ScriptError::MalformedTag { line_index: 0, .. })
    ));
    assert_eq!(results[1].as_ref().unwrap().as_ref().unwrap().clean_text, STANDARD_CLEAN);
}

/// Test that break variants and metadata tags are handled on structured lines
#[test]
fn test_extract_withBreakVariantsAndMetadata_shouldCountBreaksAndStripMetadata() {
    let raw = "@printDebate pos:0,0 |#M01| <size=90%>一<br/>二<BR>三<color=#F2B035>四</color>";
    let record = extract(&ScriptLine::new(raw, 0)).unwrap().unwrap();

    assert_eq!(record.clean_text, "一二三四");
    assert_eq!(record.tag_layout.line_break_count(), 2);
}

/// Test that extraction is stable across repeated runs
#[test]
fn test_extract_calledTwice_shouldProduceIdenticalRecords() {
    let line = ScriptLine::new(STRUCTURED_LINE, 5);

    assert_eq!(extract(&line), extract(&line));
}

/// Test that CRLF input and a BOM do not leak into records
#[test]
fn test_parse_content_withCrlfAndBom_shouldExtractCleanly() {
    let content = format!("\u{feff}{}\r\n{}\r\n", CHOICE_LINE, STANDARD_LINE);
    let lines = ScriptLine::parse_content(&content);

    assert_eq!(lines.len(), 2);
    let record = extract(&lines[1]).unwrap().unwrap();
    assert_eq!(record.structural_suffix, "");
    assert_eq!(record.line_index, 1);
}
