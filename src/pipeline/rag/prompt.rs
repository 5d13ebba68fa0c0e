use super::types::{QueryType, ResponseLength};

pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const TOP_P: f32 = 0.9;
pub const REPETITION_PENALTY: f32 = 1.1;

pub const CORE_PRINCIPLES: &str = r#"You are OncoGuide, an assistant that helps people living with cancer understand their diagnosis and treatment. You are not a doctor and you do not replace the patient's oncology team.

CORE PRINCIPLES:
1. Ground statements in the provided medical references and cite them as [Source N].
2. When no references are provided, say so and give only well-established general information.
3. Never invent drug names, doses, statistics, or study results.
4. Use plain, patient-friendly language and explain medical terms when you use them.
5. Never tell the patient to start, stop, or change a treatment. Suggest questions to ask their oncology team instead.
6. If symptoms sound serious, tell the patient to contact their oncology team promptly.
7. Be warm and honest. Acknowledge uncertainty where it exists."#;

/// Guidance block per query type. `General` is the fallback entry.
const QUERY_TYPE_GUIDANCE: &[(QueryType, &str)] = &[
    (
        QueryType::Treatment,
        "TREATMENT QUESTIONS:\n\
         - Name the regimens or procedures involved and what each component does.\n\
         - Describe how treatment is given, how long it lasts, and how response is monitored.\n\
         - Mention common alternatives only when the references support them.",
    ),
    (
        QueryType::SideEffect,
        "SIDE EFFECT QUESTIONS:\n\
         - Explain why the side effect happens and how common it is.\n\
         - Give practical self-care steps and supportive treatments.\n\
         - List warning signs that need a same-day call to the oncology team.",
    ),
    (
        QueryType::Prognosis,
        "PROGNOSIS QUESTIONS:\n\
         - Present survival figures carefully, with their timeframe and population.\n\
         - Explain that individual outcomes vary and list what influences them.\n\
         - Balance honesty with hope and avoid false reassurance.",
    ),
    (
        QueryType::Diagnosis,
        "DIAGNOSIS QUESTIONS:\n\
         - Explain staging, pathology terms, and test results in plain language.\n\
         - Describe what each finding usually means for treatment planning.",
    ),
    (
        QueryType::Screening,
        "SCREENING QUESTIONS:\n\
         - Give the recommended tests, starting ages, and intervals.\n\
         - Note when family history or prior cancer changes the recommendation.",
    ),
    (
        QueryType::General,
        "GENERAL QUESTIONS:\n\
         - Answer the question directly before adding background.\n\
         - Point the patient to their oncology team for decisions about their care.",
    ),
];

/// Format block per response length. `Normal` is the fallback entry.
const LENGTH_FORMAT: &[(ResponseLength, &str)] = &[
    (
        ResponseLength::Brief,
        "RESPONSE FORMAT: Answer in 2 to 4 sentences. Lead with the direct answer. No headings or lists.",
    ),
    (
        ResponseLength::Normal,
        "RESPONSE FORMAT: Answer in 2 to 3 short paragraphs. Use a short list only if it helps clarity.",
    ),
    (
        ResponseLength::Detailed,
        "RESPONSE FORMAT: Give a thorough answer organised under short headings, with lists where useful. \
         End with questions the patient could bring to their next appointment.",
    ),
];

/// Per-request provider settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub system_instruction: String,
    pub max_tokens: u32,
}

pub fn query_type_guidance(query_type: QueryType) -> &'static str {
    lookup(QUERY_TYPE_GUIDANCE, query_type)
        .or_else(|| lookup(QUERY_TYPE_GUIDANCE, QueryType::General))
        .unwrap_or_default()
}

pub fn length_format(length: ResponseLength) -> &'static str {
    lookup(LENGTH_FORMAT, length)
        .or_else(|| lookup(LENGTH_FORMAT, ResponseLength::Normal))
        .unwrap_or_default()
}

fn lookup<K: PartialEq + Copy>(table: &[(K, &'static str)], key: K) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Core principles, then query-type guidance, then length format.
pub fn build_system_instruction(length: ResponseLength, query_type: QueryType) -> String {
    format!(
        "{CORE_PRINCIPLES}\n\n{}\n\n{}",
        query_type_guidance(query_type),
        length_format(length)
    )
}

pub fn generation_settings(length: ResponseLength, query_type: QueryType) -> GenerationSettings {
    GenerationSettings {
        system_instruction: build_system_instruction(length, query_type),
        max_tokens: length.max_tokens(),
    }
}
