use rusqlite::Connection;

use super::types::ProfileStore;
use super::RagError;
use crate::db::repository;
use crate::models::PatientContext;

/// `ProfileStore` over the `patient_profiles` table.
pub struct PatientProfiles<'a> {
    conn: &'a Connection,
}

impl<'a> PatientProfiles<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ProfileStore for PatientProfiles<'_> {
    fn patient_context(&self, user_id: &str) -> Result<Option<PatientContext>, RagError> {
        Ok(repository::get_patient_profile(self.conn, user_id)?)
    }
}
