// libs/therapist-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::{ClientId, SpecializationId, TherapistId, TimezoneOffset, WhatsAppNumber};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialization {
    pub id: SpecializationId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Therapist {
    pub id: TherapistId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp_number: WhatsAppNumber,
    pub speaks_english: bool,
    #[serde(default)]
    pub specializations: Vec<Specialization>,
    pub device_id: Option<String>,
    pub timezone_offset: TimezoneOffset,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Therapist {
    pub fn has_specialization(&self, tag: &str) -> bool {
        // Tag comparison is case-sensitive.
        self.specializations.iter().any(|s| s.name == tag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: Option<String>,
    pub whatsapp_number: WhatsAppNumber,
    pub timezone_offset: TimezoneOffset,
    pub created_at: DateTime<Utc>,
}
