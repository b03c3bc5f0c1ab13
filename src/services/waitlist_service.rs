use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::query::{Principal, QueryError};
use crate::resources::waitlist;

use super::SearchService;

pub struct WaitlistService {
    search: SearchService,
}

impl WaitlistService {
    pub fn new(search: SearchService) -> Self {
        Self { search }
    }

    /// Add a patient to an appointment's waitlist.
    ///
    /// The appointment is looked up through the scoped engine first, so an
    /// out-of-scope appointment reads as NotFound before anything is
    /// written. Uniqueness of the (appointment, patient) pair is delegated
    /// to the gateway's atomic conditional insert; two concurrent joins
    /// resolve to one success and one Conflict.
    pub async fn join(
        &self,
        appointment_id: Uuid,
        patient_id: Uuid,
        principal: Option<&Principal>,
    ) -> Result<Value, QueryError> {
        let caller = principal
            .ok_or_else(|| QueryError::Authentication("no authenticated principal".to_string()))?;

        let appointment = self.search.get_by_id("appointments", appointment_id, principal).await?;
        let organization_id = appointment
            .get("organization_id")
            .and_then(Value::as_str)
            .ok_or_else(|| QueryError::Mapping("appointment row carries no organization".to_string()))?
            .to_string();

        let mut entry: Map<String, Value> = Map::new();
        entry.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        entry.insert("appointment_id".to_string(), Value::String(appointment_id.to_string()));
        entry.insert("patient_id".to_string(), Value::String(patient_id.to_string()));
        entry.insert("organization_id".to_string(), Value::String(organization_id));
        entry.insert("created_by".to_string(), Value::String(caller.id.to_string()));
        entry.insert("created_at".to_string(), Value::String(Utc::now().to_rfc3339()));

        let inserted = self
            .search
            .gateway()
            .insert_unique("waitlist_entries", entry, waitlist::UNIQUE_COLUMNS)
            .await?;
        let binding = self.search.registry().get("waitlist_entries")?;
        (binding.map_row)(&inserted)
    }
}
