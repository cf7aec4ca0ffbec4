/*!
 * Prompt construction for LLM-backed translators.
 */

use super::TranslationRequest;

/// Project notes used when the configuration supplies none
pub const DEFAULT_KNOWLEDGE_BASE: [&str; 4] = [
    "Project type: Visual Novel translation.",
    "Goal: Produce high-quality, natural translations suitable for a visual novel UI/dialogue.",
    "Guidelines: Preserve placeholders, variables, control codes, and line breaks. Maintain speaker tone, honorifics where appropriate, and context.",
    "Text between <ruby> should be converted to Romaji",
];

/// Language name for a short code, falling back to the code itself
pub fn language_name(code: &str) -> &str {
    match code.to_lowercase().as_str() {
        "ja" | "jpn" => "Japanese",
        "vi" | "vie" => "Vietnamese (Tiếng Việt)",
        "en" | "eng" => "English",
        "zh" | "zho" => "Chinese",
        "ko" | "kor" => "Korean",
        "fr" | "fra" => "French",
        "de" | "deu" => "German",
        "es" | "spa" => "Spanish",
        _ => code,
    }
}

/// System prompt: the knowledge base notes
pub fn build_system_prompt(knowledge_base: &[String]) -> String {
    let notes: Vec<&str> = knowledge_base
        .iter()
        .map(|note| note.trim())
        .filter(|note| !note.is_empty())
        .collect();

    let body = if notes.is_empty() {
        DEFAULT_KNOWLEDGE_BASE.join("\n\n")
    } else {
        notes.join("\n\n")
    };

    format!("Knowledge base (user-provided notes):\n{}", body)
}

/// User prompt for one request
pub fn build_user_prompt(request: &TranslationRequest, source_language: &str, target_language: &str) -> String {
    let mut prompt = format!("Key: {}\n", request.key);
    if let Some(dialogue_id) = &request.dialogue_id {
        prompt.push_str(&format!("ID: {}\n", dialogue_id));
    }
    prompt.push_str(&format!(
        "\nOriginal value ({}):\n{}\n\n",
        language_name(source_language),
        request.text
    ));
    prompt.push_str(&format!(
        "Task: Produce the final localized line in {}.\n",
        language_name(target_language)
    ));
    prompt.push_str(
        "Rules: Return plain text on a single line. Do not add tags or markup. Return ONLY the final text, no explanations.",
    );
    prompt
}
