// libs/therapist-cell/src/repository.rs
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use shared_database::{DatabaseError, SupabaseClient};
use shared_models::{ClientId, TherapistId};

use crate::models::{Client, Therapist};

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait TherapistRepository: Send + Sync {
    /// Fetch the therapists with the given ids; missing ids are silently
    /// dropped from the result.
    async fn find_by_ids(&self, ids: Vec<TherapistId>) -> Result<Vec<Therapist>, DatabaseError>;

    /// All therapists carrying a specialization whose name equals `tag`
    /// (case-sensitive), optionally restricted to English speakers.
    async fn find_by_specialization(
        &self,
        tag: String,
        must_speak_english: bool,
    ) -> Result<Vec<Therapist>, DatabaseError>;

    async fn get_by_id(&self, id: TherapistId) -> Result<Option<Therapist>, DatabaseError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn get_by_id(&self, id: ClientId) -> Result<Option<Client>, DatabaseError>;
}

pub struct SupabaseTherapistRepository {
    supabase: SupabaseClient,
}

impl SupabaseTherapistRepository {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl TherapistRepository for SupabaseTherapistRepository {
    async fn find_by_ids(&self, ids: Vec<TherapistId>) -> Result<Vec<Therapist>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let id_list = ids
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/therapists?select=*,specializations(*)&id=in.({})&order=id.asc",
            id_list
        );

        self.supabase.request(Method::GET, &path, None).await
    }

    async fn find_by_specialization(
        &self,
        tag: String,
        must_speak_english: bool,
    ) -> Result<Vec<Therapist>, DatabaseError> {
        debug!("Fetching therapists for specialization {:?}", tag);

        let mut path = format!(
            "/rest/v1/therapists?select=*,specializations!inner(*)&specializations.name=eq.{}&order=id.asc",
            urlencoding::encode(&tag)
        );
        if must_speak_english {
            path.push_str("&speaks_english=eq.true");
        }

        self.supabase.request(Method::GET, &path, None).await
    }

    async fn get_by_id(&self, id: TherapistId) -> Result<Option<Therapist>, DatabaseError> {
        let path = format!(
            "/rest/v1/therapists?select=*,specializations(*)&id=eq.{}",
            id
        );
        let result: Vec<Therapist> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }
}

pub struct SupabaseClientRepository {
    supabase: SupabaseClient,
}

impl SupabaseClientRepository {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl ClientRepository for SupabaseClientRepository {
    async fn get_by_id(&self, id: ClientId) -> Result<Option<Client>, DatabaseError> {
        let path = format!("/rest/v1/clients?id=eq.{}", id);
        let result: Vec<Client> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(result.into_iter().next())
    }
}
