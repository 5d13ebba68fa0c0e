use thiserror::Error;

/// Result of input sanitization (pre-LLM).
#[derive(Debug, Clone)]
pub struct SanitizedInput {
    /// The cleaned query text.
    pub text: String,
    pub was_modified: bool,
    /// What was stripped (for logging, no patient text).
    pub modifications: Vec<InputModification>,
    /// A known prompt-injection marker is present. The text is unchanged.
    pub injection_suspected: bool,
}

#[derive(Debug, Clone)]
pub struct InputModification {
    pub kind: InputModificationKind,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputModificationKind {
    InvisibleUnicodeRemoved,
    ControlCharacterRemoved,
    ExcessiveLengthTruncated,
}

impl InputModificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvisibleUnicodeRemoved => "invisible_unicode_removed",
            Self::ControlCharacterRemoved => "control_character_removed",
            Self::ExcessiveLengthTruncated => "excessive_length_truncated",
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SafetyError {
    #[error("Message is empty")]
    EmptyInput,
}
