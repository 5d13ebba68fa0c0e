use super::types::QueryType;

const TREATMENT_KEYWORDS: &[&str] = &[
    "treatment",
    "treat",
    "chemo",
    "therapy",
    "radiation",
    "radiotherapy",
    "surgery",
    "surgical",
    "operation",
    "folfox",
    "folfiri",
    "capox",
    "xelox",
    "oxaliplatin",
    "irinotecan",
    "capecitabine",
    "fluorouracil",
    "5-fu",
    "bevacizumab",
    "cetuximab",
    "regimen",
    "drug",
    "medication",
    "infusion",
    "clinical trial",
];

const SIDE_EFFECT_KEYWORDS: &[&str] = &[
    "side effect",
    "side-effect",
    "adverse",
    "toxicity",
    "nausea",
    "vomit",
    "fatigue",
    "tired",
    "neuropathy",
    "numbness",
    "tingling",
    "diarrhea",
    "diarrhoea",
    "constipation",
    "hair loss",
    "mouth sore",
    "rash",
    "appetite",
    "weight loss",
    "pain",
    "cold sensitivity",
];

const PROGNOSIS_KEYWORDS: &[&str] = &[
    "prognosis",
    "survival",
    "survive",
    "life expectancy",
    "how long do i have",
    "outlook",
    "curable",
    "cure rate",
    "chance",
    "odds",
    "recurrence",
    "come back",
    "remission",
    "5-year",
    "five-year",
];

const DIAGNOSIS_KEYWORDS: &[&str] = &[
    "diagnos",
    "stage",
    "staging",
    "biopsy",
    "pathology",
    "tumor",
    "tumour",
    "cea level",
    "ct scan",
    "pet scan",
    "mri",
    "lymph node",
    "metasta",
    "grade",
    "biomarker",
    "kras",
    "test result",
];

const SCREENING_KEYWORDS: &[&str] = &[
    "screening",
    "screen",
    "colonoscopy",
    "early detection",
    "prevent",
    "risk factor",
    "family history",
    "hereditary",
    "genetic testing",
    "polyp",
    "fit test",
    "stool test",
    "lynch syndrome",
];

/// Keyword sets in priority order. The first set with a hit decides the type.
const PRIORITY_ORDER: &[(QueryType, &[&str])] = &[
    (QueryType::Treatment, TREATMENT_KEYWORDS),
    (QueryType::SideEffect, SIDE_EFFECT_KEYWORDS),
    (QueryType::Prognosis, PROGNOSIS_KEYWORDS),
    (QueryType::Diagnosis, DIAGNOSIS_KEYWORDS),
    (QueryType::Screening, SCREENING_KEYWORDS),
];

/// Classify a patient query into a type using keyword heuristics.
pub fn classify_query(text: &str) -> QueryType {
    let lower = text.to_lowercase();

    PRIORITY_ORDER
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(query_type, _)| *query_type)
        .unwrap_or(QueryType::General)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_treatment_queries() {
        assert_eq!(
            classify_query("What chemotherapy drugs treat stage 3 colon cancer?"),
            QueryType::Treatment
        );
        assert_eq!(classify_query("Should I have surgery first?"), QueryType::Treatment);
        assert_eq!(classify_query("WHAT IS FOLFIRI"), QueryType::Treatment);
    }

    #[test]
    fn classify_side_effect_queries() {
        assert_eq!(classify_query("How do I manage nausea?"), QueryType::SideEffect);
        assert_eq!(classify_query("Why are my fingers tingling?"), QueryType::SideEffect);
    }

    #[test]
    fn classify_prognosis_queries() {
        assert_eq!(classify_query("What is my prognosis?"), QueryType::Prognosis);
        assert_eq!(classify_query("Could it come back after remission?"), QueryType::Prognosis);
    }

    #[test]
    fn classify_diagnosis_queries() {
        assert_eq!(classify_query("What does stage IIIB mean?"), QueryType::Diagnosis);
        assert_eq!(classify_query("My biopsy came back today"), QueryType::Diagnosis);
    }

    #[test]
    fn classify_screening_queries() {
        assert_eq!(
            classify_query("When should my children get a colonoscopy?"),
            QueryType::Screening
        );
        assert_eq!(classify_query("Is Lynch syndrome hereditary?"), QueryType::Screening);
    }

    #[test]
    fn classify_general_queries() {
        assert_eq!(classify_query("Thank you so much"), QueryType::General);
        assert_eq!(classify_query("Hello"), QueryType::General);
        assert_eq!(classify_query(""), QueryType::General);
    }

    #[test]
    fn earlier_sets_win_when_keywords_overlap() {
        // treatment > side_effect
        assert_eq!(classify_query("Does FOLFOX cause neuropathy?"), QueryType::Treatment);
        // side_effect > prognosis
        assert_eq!(classify_query("Is fatigue a sign of recurrence?"), QueryType::SideEffect);
        // prognosis > diagnosis
        assert_eq!(
            classify_query("What is the survival rate for stage 3?"),
            QueryType::Prognosis
        );
        // diagnosis > screening
        assert_eq!(
            classify_query("Does a polyp mean my biopsy is bad?"),
            QueryType::Diagnosis
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let text = "Can radiation help my survival odds?";
        let first = classify_query(text);
        for _ in 0..10 {
            assert_eq!(classify_query(text), first);
        }
    }

    #[test]
    fn priority_table_covers_every_specific_type() {
        let types: Vec<_> = PRIORITY_ORDER.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            types,
            vec![
                QueryType::Treatment,
                QueryType::SideEffect,
                QueryType::Prognosis,
                QueryType::Diagnosis,
                QueryType::Screening,
            ]
        );
    }
}
