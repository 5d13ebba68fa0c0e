pub const URGENT_BANNER: &str = "URGENT: Your message describes symptoms that may need immediate medical attention.

1. Call your oncology team's 24-hour emergency line now.
2. If you cannot reach them, go to the nearest emergency room or call emergency services.
3. Do not wait to see if your symptoms improve.";

pub const SEPARATOR: &str = "\n\n---\n\n";

/// Prefix the emergency banner when the message was flagged urgent.
pub fn finalize(answer: &str, urgent: bool) -> String {
    if urgent {
        format!("{URGENT_BANNER}{SEPARATOR}{answer}")
    } else {
        answer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgent_answer_gets_banner() {
        let out = finalize("X", true);
        assert!(out.starts_with(URGENT_BANNER));
        assert!(out.ends_with("\n\n---\n\nX"));
    }

    #[test]
    fn non_urgent_answer_unchanged() {
        assert_eq!(finalize("X", false), "X");
    }

    #[test]
    fn banner_has_three_numbered_actions() {
        for n in ["1. ", "2. ", "3. "] {
            assert!(URGENT_BANNER.contains(n));
        }
        assert!(URGENT_BANNER.contains("emergency room"));
    }
}
