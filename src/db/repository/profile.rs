use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::PatientContext;

/// Insert or replace the oncology profile for a user.
pub fn upsert_patient_profile(
    conn: &Connection,
    user_id: &str,
    profile: &PatientContext,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patient_profiles
            (user_id, cancer_type, stage, diagnosis_date, age, gender,
             treatments, medications, symptoms, biomarkers, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, datetime('now'))
         ON CONFLICT(user_id) DO UPDATE SET
            cancer_type = excluded.cancer_type,
            stage = excluded.stage,
            diagnosis_date = excluded.diagnosis_date,
            age = excluded.age,
            gender = excluded.gender,
            treatments = excluded.treatments,
            medications = excluded.medications,
            symptoms = excluded.symptoms,
            biomarkers = excluded.biomarkers,
            updated_at = excluded.updated_at",
        params![
            user_id,
            profile.cancer_type,
            profile.stage,
            profile.diagnosis_date.map(|d| d.to_string()),
            profile.age,
            profile.gender,
            to_json("treatments", &profile.treatments)?,
            to_json("medications", &profile.medications)?,
            to_json("symptoms", &profile.symptoms)?,
            to_json("biomarkers", &profile.biomarkers)?,
        ],
    )?;
    Ok(())
}

struct ProfileRow {
    cancer_type: Option<String>,
    stage: Option<String>,
    diagnosis_date: Option<String>,
    age: Option<u32>,
    gender: Option<String>,
    treatments: String,
    medications: String,
    symptoms: String,
    biomarkers: String,
}

/// Load a user's profile. `Ok(None)` when the user never created one.
pub fn get_patient_profile(
    conn: &Connection,
    user_id: &str,
) -> Result<Option<PatientContext>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT cancer_type, stage, diagnosis_date, age, gender,
                    treatments, medications, symptoms, biomarkers
             FROM patient_profiles WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(ProfileRow {
                    cancer_type: row.get(0)?,
                    stage: row.get(1)?,
                    diagnosis_date: row.get(2)?,
                    age: row.get(3)?,
                    gender: row.get(4)?,
                    treatments: row.get(5)?,
                    medications: row.get(6)?,
                    symptoms: row.get(7)?,
                    biomarkers: row.get(8)?,
                })
            },
        )
        .optional()?;

    row.map(profile_from_row).transpose()
}

fn profile_from_row(row: ProfileRow) -> Result<PatientContext, DatabaseError> {
    let diagnosis_date = match row.diagnosis_date.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                DatabaseError::InvalidData {
                    field: "diagnosis_date".into(),
                    reason: e.to_string(),
                }
            })?,
        ),
        _ => None,
    };

    Ok(PatientContext {
        cancer_type: row.cancer_type,
        stage: row.stage,
        diagnosis_date,
        age: row.age,
        gender: row.gender,
        treatments: from_json("treatments", &row.treatments)?,
        medications: from_json("medications", &row.medications)?,
        symptoms: from_json("symptoms", &row.symptoms)?,
        biomarkers: from_json::<BTreeMap<String, String>>("biomarkers", &row.biomarkers)?,
    })
}

fn to_json<T: serde::Serialize>(field: &str, value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::InvalidData {
        field: field.into(),
        reason: e.to_string(),
    })
}

fn from_json<T: serde::de::DeserializeOwned>(field: &str, raw: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::InvalidData {
        field: field.into(),
        reason: e.to_string(),
    })
}
