use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Oncology profile for a single user.
///
/// Every field is optional. A user with no stored profile is represented
/// by `None` at the store boundary, which is distinct from a profile whose
/// fields are all empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContext {
    pub cancer_type: Option<String>,
    pub stage: Option<String>,
    pub diagnosis_date: Option<NaiveDate>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    #[serde(default)]
    pub treatments: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    /// Biomarker name → value (e.g. "KRAS" → "wild-type").
    #[serde(default)]
    pub biomarkers: BTreeMap<String, String>,
}

impl PatientContext {
    /// True when at least one field carries a usable value.
    pub fn has_any_field(&self) -> bool {
        populated(&self.cancer_type).is_some()
            || populated(&self.stage).is_some()
            || self.diagnosis_date.is_some()
            || self.age.is_some()
            || populated(&self.gender).is_some()
            || !non_blank(&self.treatments).is_empty()
            || !non_blank(&self.medications).is_empty()
            || !non_blank(&self.symptoms).is_empty()
            || !self.biomarkers.is_empty()
    }
}

/// Treat blank strings the same as missing values.
pub fn populated(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Entries of a list field that are not blank.
pub fn non_blank(values: &[String]) -> Vec<&str> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_has_no_fields() {
        assert!(!PatientContext::default().has_any_field());
    }

    #[test]
    fn blank_strings_do_not_count_as_populated() {
        let profile = PatientContext {
            cancer_type: Some("   ".into()),
            treatments: vec!["".into()],
            ..Default::default()
        };
        assert!(!profile.has_any_field());
    }

    #[test]
    fn single_biomarker_counts_as_populated() {
        let mut profile = PatientContext::default();
        profile.biomarkers.insert("MSI".into(), "high".into());
        assert!(profile.has_any_field());
    }

    #[test]
    fn deserializes_with_missing_collections() {
        let profile: PatientContext =
            serde_json::from_str(r#"{"cancer_type":"colon","stage":"III"}"#).unwrap();
        assert_eq!(profile.cancer_type.as_deref(), Some("colon"));
        assert!(profile.treatments.is_empty());
        assert!(profile.biomarkers.is_empty());
    }
}
