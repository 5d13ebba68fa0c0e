use std::sync::LazyLock;

use regex::Regex;

use super::types::{InputModification, InputModificationKind, SafetyError, SanitizedInput};

/// Maximum patient message length in characters.
pub const MAX_QUERY_LENGTH: usize = 2_000;

/// Clean a patient message before it reaches the prompt.
///
/// Only non-visible characters and excess length are removed. Injection
/// markers are flagged, never rewritten, so the question is quoted as the
/// patient wrote it. Fails with `EmptyInput` when nothing but whitespace
/// is left.
pub fn sanitize_patient_input(
    raw_query: &str,
    max_chars: usize,
) -> Result<SanitizedInput, SafetyError> {
    let mut text = raw_query.to_string();
    let mut modifications = Vec::new();

    let before = text.clone();
    text = remove_invisible_unicode(&text);
    if text != before {
        modifications.push(InputModification {
            kind: InputModificationKind::InvisibleUnicodeRemoved,
            description: "Stripped non-visible Unicode characters".to_string(),
        });
    }

    let before = text.clone();
    text = remove_control_characters(&text);
    if text != before {
        modifications.push(InputModification {
            kind: InputModificationKind::ControlCharacterRemoved,
            description: "Stripped control characters".to_string(),
        });
    }

    let injection_suspected = contains_injection_pattern(&text);

    let original_chars = text.chars().count();
    if original_chars > max_chars {
        text = truncate_at_word_boundary(&text, max_chars);
        modifications.push(InputModification {
            kind: InputModificationKind::ExcessiveLengthTruncated,
            description: format!(
                "Truncated from {} to {} characters",
                original_chars,
                text.chars().count()
            ),
        });
    }

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(SafetyError::EmptyInput);
    }

    Ok(SanitizedInput {
        text,
        was_modified: !modifications.is_empty(),
        modifications,
        injection_suspected,
    })
}

pub fn sanitize_query(raw_query: &str) -> Result<SanitizedInput, SafetyError> {
    sanitize_patient_input(raw_query, MAX_QUERY_LENGTH)
}

/// Remove zero-width and invisible Unicode characters.
fn remove_invisible_unicode(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}'..='\u{200F}'  // zero-width
                | '\u{202A}'..='\u{202E}' // directional formatting
                | '\u{2060}'..='\u{2064}' // invisible operators
                | '\u{2066}'..='\u{2069}' // directional isolates
                | '\u{FEFF}'
                | '\u{00AD}'
                | '\u{034F}'
                | '\u{061C}'
                | '\u{180E}'
            )
        })
        .collect()
}

/// Remove control characters except newline and tab.
fn remove_control_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

fn contains_injection_pattern(text: &str) -> bool {
    static INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
        [
            r"(?i)ignore\s+(?:previous|above|all\s+prior|the\s+above)\s+(?:instructions?|rules?|prompts?)",
            r"(?i)forget\s+(?:everything|all|your)\s+(?:previous|prior)?",
            r"(?i)new\s+instructions?:",
            r"(?i)you\s+are\s+now\s+(?:a|an)\s+",
            r"(?i)\bsystem\s*:",
            r"(?i)\bassistant\s*:",
            r"<<SYS>>",
            r"\[INST\]",
            r"<\|im_start\|>",
            r"<\|im_end\|>",
            r"(?i)(?:DAN|do\s+anything\s+now)\s+mode",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    });

    INJECTION_PATTERNS.iter().any(|pattern| pattern.is_match(text))
}

/// Cut to at most `max_chars` characters, preferring the last whitespace.
fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    let cut = match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => byte_idx,
        None => return text.to_string(),
    };
    let truncated = &text[..cut];
    match truncated.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => truncated[..pos].to_string(),
        _ => truncated.to_string(),
    }
}
