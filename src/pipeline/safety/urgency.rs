/// Phrases that indicate a possible medical emergency.
///
/// Matched as lowercase substrings, so "chest pain" also matches
/// "chest pains" and phrases embedded in longer words.
const EMERGENCY_PHRASES: &[&str] = &[
    "can't breathe",
    "cannot breathe",
    "can not breathe",
    "difficulty breathing",
    "trouble breathing",
    "shortness of breath",
    "chest pain",
    "severe pain",
    "severe bleeding",
    "heavy bleeding",
    "coughing up blood",
    "vomiting blood",
    "blood in vomit",
    "black stool",
    "high fever",
    "fainted",
    "passed out",
    "unconscious",
    "seizure",
    "severe diarrhea",
    "severe vomiting",
    "can't stop vomiting",
    "severe abdominal pain",
    "leg swelling",
    "suicidal",
    "kill myself",
];

/// True when the message mentions any emergency phrase.
pub fn is_urgent(message: &str) -> bool {
    let lower = message.to_lowercase();
    EMERGENCY_PHRASES.iter().any(|phrase| lower.contains(phrase))
}
