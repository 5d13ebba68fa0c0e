use crate::models::enums::MessageRole;
use crate::models::profile::{non_blank, populated};
use crate::models::{HistoryTurn, PatientContext};

use super::types::{PromptContext, QueryType};

/// Rough English estimate used for logging and budgeting.
const CHARS_PER_TOKEN: usize = 4;

pub const CONTEXT_HEADER: &str = "=== CONTEXT FOR THIS QUESTION ===";

pub const NO_SOURCES_NOTICE: &str = "NO RELEVANT SOURCES FOUND in the medical reference library for this question.";

const NO_SOURCES_INSTRUCTION: &str = "Answer from well-established general oncology principles. \
State clearly that this is general information and not drawn from the patient's references, \
and encourage the patient to confirm details with their oncology team.";

const PROFILE_INSTRUCTION: &str = "Tailor the answer to this patient's cancer type, stage, \
treatments, and current situation.";

const SOURCES_INSTRUCTION: &str = "Base the answer on these sources and cite them as [Source N] \
where they support a statement.";

const HISTORY_INSTRUCTION: &str = "Keep continuity with the conversation above. Do not repeat \
information already given unless the patient asks for it.";

/// Focus instruction per query type. `General` is the fallback entry.
const FOCUS_INSTRUCTIONS: &[(QueryType, &str)] = &[
    (
        QueryType::Treatment,
        "Explain the relevant treatment options, how they are given, typical schedules, \
         and what the patient can expect during treatment.",
    ),
    (
        QueryType::SideEffect,
        "Describe the likely side effects, practical ways to manage them, and which \
         symptoms should be reported to the oncology team right away.",
    ),
    (
        QueryType::Prognosis,
        "Give honest, balanced information about outcomes. Explain that statistics \
         describe groups, not individuals, and mention the factors that influence prognosis.",
    ),
    (
        QueryType::Diagnosis,
        "Explain the diagnostic findings, staging, and tests in plain language, and what \
         they mean for next steps.",
    ),
    (
        QueryType::Screening,
        "Explain the screening recommendations, who they apply to, how often, and what \
         the tests involve.",
    ),
    (
        QueryType::General,
        "Answer the question directly and clearly, then add any context that helps the \
         patient understand their situation.",
    ),
];

const REMINDERS: [&str; 4] = [
    "Be specific: use concrete names, numbers, and timeframes where the sources support them.",
    "Be accurate: do not invent facts, drugs, or statistics.",
    "Be helpful: give the patient something they can act on or ask their team about.",
    "Be caring: acknowledge that this is a difficult situation and keep a warm, calm tone.",
];

pub fn focus_instruction(query_type: QueryType) -> &'static str {
    lookup_focus(query_type)
        .or_else(|| lookup_focus(QueryType::General))
        .unwrap_or_default()
}

fn lookup_focus(query_type: QueryType) -> Option<&'static str> {
    FOCUS_INSTRUCTIONS
        .iter()
        .find(|(qt, _)| *qt == query_type)
        .map(|(_, text)| *text)
}

/// Build the user prompt for one question.
///
/// `history` must be in chronological order (oldest first). Sections with
/// nothing to show are omitted, except the reference block, which always
/// states whether sources were found.
pub fn assemble_prompt(
    question: &str,
    chunks: &[String],
    patient: Option<&PatientContext>,
    history: &[HistoryTurn],
    query_type: QueryType,
) -> PromptContext {
    let mut sections: Vec<String> = vec![CONTEXT_HEADER.to_string()];

    let profile_block = patient.and_then(format_profile);
    let patient_context_used = profile_block.is_some();
    if let Some(block) = profile_block {
        sections.push(block);
    }

    sections.push(format_sources(chunks));

    if !history.is_empty() {
        sections.push(format_history(history));
    }

    sections.push(format!(
        "PATIENT QUESTION: \"{question}\"\nQUERY TYPE: {}",
        query_type.as_str().to_uppercase()
    ));

    let mut focus = format!("FOCUS: {}\n\nREMINDERS:", focus_instruction(query_type));
    for reminder in REMINDERS {
        focus.push_str("\n- ");
        focus.push_str(reminder);
    }
    sections.push(focus);

    let text = sections.join("\n\n");
    let estimated_tokens = text.len() / CHARS_PER_TOKEN;

    PromptContext {
        text,
        sources_used: chunks.len(),
        patient_context_used,
        estimated_tokens,
    }
}

/// `None` when the profile has no populated field.
fn format_profile(profile: &PatientContext) -> Option<String> {
    if !profile.has_any_field() {
        return None;
    }

    let mut lines = vec!["PATIENT PROFILE:".to_string()];

    if let Some(cancer_type) = populated(&profile.cancer_type) {
        lines.push(format!("- Cancer type: {cancer_type}"));
    }
    if let Some(stage) = populated(&profile.stage) {
        lines.push(format!("- Stage: {stage}"));
    }
    if let Some(date) = profile.diagnosis_date {
        lines.push(format!("- Diagnosis date: {}", date.format("%Y-%m-%d")));
    }
    if let Some(age) = profile.age {
        lines.push(format!("- Age: {age}"));
    }
    if let Some(gender) = populated(&profile.gender) {
        lines.push(format!("- Gender: {gender}"));
    }

    for (label, values) in [
        ("Current treatments", &profile.treatments),
        ("Medications", &profile.medications),
        ("Current symptoms", &profile.symptoms),
    ] {
        let values = non_blank(values);
        if !values.is_empty() {
            lines.push(format!("- {label}: {}", values.join(", ")));
        }
    }

    if !profile.biomarkers.is_empty() {
        let markers = profile
            .biomarkers
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("- Biomarkers: {markers}"));
    }

    lines.push(String::new());
    lines.push(PROFILE_INSTRUCTION.to_string());
    Some(lines.join("\n"))
}

fn format_sources(chunks: &[String]) -> String {
    if chunks.is_empty() {
        return format!("{NO_SOURCES_NOTICE}\n{NO_SOURCES_INSTRUCTION}");
    }

    let mut block = String::from("MEDICAL REFERENCES:");
    for (i, chunk) in chunks.iter().enumerate() {
        block.push_str(&format!("\n\n[Source {}]\n{}", i + 1, chunk.trim()));
    }
    block.push_str("\n\n");
    block.push_str(SOURCES_INSTRUCTION);
    block
}

fn format_history(history: &[HistoryTurn]) -> String {
    let mut block = String::from("CONVERSATION HISTORY:");
    for turn in history {
        let speaker = match turn.role {
            MessageRole::User => "Patient",
            MessageRole::Assistant => "Assistant",
        };
        block.push_str(&format!("\n{speaker}: {}", turn.content));
    }
    block.push_str("\n\n");
    block.push_str(HISTORY_INSTRUCTION);
    block
}
