// libs/booking-cell/src/services/session.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::{ClientId, SessionId, TherapistId};

use crate::models::{BookingError, Session, SessionState};
use crate::repository::{SessionRepository, SupabaseSessionRepository};

pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
}

impl SessionService {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Arc::new(SupabaseSessionRepository::new(SupabaseClient::new(config))))
    }

    pub async fn get_session(&self, id: &SessionId) -> Result<Session, BookingError> {
        self.sessions
            .get_by_id(id.clone())
            .await?
            .ok_or(BookingError::SessionNotFound)
    }

    /// From `planned` any state is reachable, once. Terminal states accept
    /// only a self-transition, which reads back the stored row unchanged.
    pub async fn update_state(
        &self,
        id: &SessionId,
        new_state: SessionState,
    ) -> Result<Session, BookingError> {
        let session = self.get_session(id).await?;

        if session.state.is_terminal() {
            if session.state == new_state {
                return Ok(session);
            }
            return Err(BookingError::InvalidStateTransition(format!(
                "session {} -> {}",
                session.state, new_state
            )));
        }

        let updated = self.sessions.save_state(session.id.clone(), new_state).await?;
        info!("Session {} moved to {}", updated.id, updated.state);

        Ok(updated)
    }

    /// Appends a timestamped chunk to the transcript. Prior content is never
    /// rewritten; chunks are separated by a blank line. Writable in every
    /// state.
    pub async fn append_notes(&self, id: &SessionId, notes: &str) -> Result<Session, BookingError> {
        if notes.trim().is_empty() {
            return Err(BookingError::ValidationError(
                "notes must not be empty".to_string(),
            ));
        }

        let session = self.get_session(id).await?;

        let chunk = format!("{}\n{}", Utc::now().to_rfc3339(), notes);
        let combined = if session.notes.is_empty() {
            chunk
        } else {
            format!("{}\n\n{}", session.notes, chunk)
        };

        debug!("Appending notes to session {}", session.id);
        Ok(self.sessions.save_notes(session.id.clone(), combined).await?)
    }

    /// Writable in every state, terminal ones included.
    pub async fn update_meeting_url(
        &self,
        id: &SessionId,
        meeting_url: &str,
    ) -> Result<Session, BookingError> {
        if meeting_url.is_empty() {
            return Err(BookingError::ValidationError(
                "meeting URL must not be empty".to_string(),
            ));
        }

        let session = self.get_session(id).await?;
        Ok(self
            .sessions
            .save_meeting_url(session.id.clone(), meeting_url.to_string())
            .await?)
    }

    pub async fn list_by_therapist(
        &self,
        therapist_id: &TherapistId,
    ) -> Result<Vec<Session>, BookingError> {
        Ok(self.sessions.list_by_therapist(therapist_id.clone()).await?)
    }

    pub async fn list_by_client(&self, client_id: &ClientId) -> Result<Vec<Session>, BookingError> {
        Ok(self.sessions.list_by_client(client_id.clone()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_models::{BookingId, TimeSlotId, TimezoneOffset};

    use crate::models::SessionLanguage;
    use crate::repository::MockSessionRepository;

    fn session(state: SessionState, notes: &str) -> Session {
        Session {
            id: SessionId::new(),
            booking_id: BookingId::new(),
            therapist_id: TherapistId::new(),
            client_id: ClientId::new(),
            time_slot_id: TimeSlotId::new(),
            start_time: Utc::now(),
            duration_minutes: 60,
            client_timezone_offset: TimezoneOffset::UTC,
            paid_amount: 4500,
            language: SessionLanguage::Arabic,
            state,
            notes: notes.to_string(),
            meeting_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn planned_session_can_move_to_any_terminal_state() {
        for target in [
            SessionState::Done,
            SessionState::Rescheduled,
            SessionState::Cancelled,
            SessionState::Refunded,
        ] {
            let planned = session(SessionState::Planned, "");
            let mut updated_row = planned.clone();
            updated_row.state = target;

            let mut repo = MockSessionRepository::new();
            repo.expect_get_by_id().returning(move |_| Ok(Some(planned.clone())));
            repo.expect_save_state()
                .times(1)
                .returning(move |_, _| Ok(updated_row.clone()));

            let service = SessionService::new(Arc::new(repo));
            let result = service.update_state(&SessionId::new(), target).await.unwrap();
            assert_eq!(result.state, target);
        }
    }

    #[tokio::test]
    async fn terminal_state_allows_only_self_transition() {
        let done = session(SessionState::Done, "");

        let mut repo = MockSessionRepository::new();
        let stored = done.clone();
        repo.expect_get_by_id().returning(move |_| Ok(Some(stored.clone())));
        repo.expect_save_state().never();

        let service = SessionService::new(Arc::new(repo));

        let same = service.update_state(&done.id, SessionState::Done).await.unwrap();
        assert_eq!(same.state, SessionState::Done);

        let result = service.update_state(&done.id, SessionState::Refunded).await;
        assert_matches!(result, Err(BookingError::InvalidStateTransition(_)));
    }

    #[tokio::test]
    async fn notes_append_with_timestamp_and_blank_line() {
        let stored = session(SessionState::Done, "2024-01-08T10:00:00+00:00\nfirst entry");

        let mut repo = MockSessionRepository::new();
        let lookup = stored.clone();
        repo.expect_get_by_id().returning(move |_| Ok(Some(lookup.clone())));
        repo.expect_save_notes()
            .withf(|_, combined| {
                combined.starts_with("2024-01-08T10:00:00+00:00\nfirst entry\n\n")
                    && combined.ends_with("\nsecond entry")
            })
            .times(1)
            .returning(move |_, combined| {
                let mut updated = stored.clone();
                updated.notes = combined;
                Ok(updated)
            });

        let service = SessionService::new(Arc::new(repo));
        let updated = service.append_notes(&SessionId::new(), "second entry").await.unwrap();

        assert!(updated.notes.contains("first entry"));
        assert!(updated.notes.contains("second entry"));
    }

    #[tokio::test]
    async fn first_note_gets_no_leading_separator() {
        let stored = session(SessionState::Planned, "");

        let mut repo = MockSessionRepository::new();
        let lookup = stored.clone();
        repo.expect_get_by_id().returning(move |_| Ok(Some(lookup.clone())));
        repo.expect_save_notes()
            .withf(|_, combined| !combined.starts_with('\n') && combined.ends_with("\nhello"))
            .returning(move |_, combined| {
                let mut updated = stored.clone();
                updated.notes = combined;
                Ok(updated)
            });

        let service = SessionService::new(Arc::new(repo));
        assert!(service.append_notes(&SessionId::new(), "hello").await.is_ok());
    }

    #[tokio::test]
    async fn meeting_url_is_writable_in_terminal_state() {
        let stored = session(SessionState::Refunded, "");

        let mut repo = MockSessionRepository::new();
        let lookup = stored.clone();
        repo.expect_get_by_id().returning(move |_| Ok(Some(lookup.clone())));
        repo.expect_save_meeting_url().times(1).returning(move |_, url| {
            let mut updated = stored.clone();
            updated.meeting_url = Some(url);
            Ok(updated)
        });

        let service = SessionService::new(Arc::new(repo));
        let updated = service
            .update_meeting_url(&SessionId::new(), "https://meet.example.com/abc")
            .await
            .unwrap();

        assert_eq!(updated.meeting_url.as_deref(), Some("https://meet.example.com/abc"));
    }
}
