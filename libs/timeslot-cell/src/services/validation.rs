// libs/timeslot-cell/src/services/validation.rs
use shared_models::{
    DayOfWeek, Time24h, TimeSlotId, TimezoneOffset, MIN_AFTER_SESSION_BREAK_MINUTES,
    MIN_SLOT_GAP_MINUTES,
};

use crate::models::{CreateTimeSlotRequest, NormalizedSlot, TimeSlot, TimeSlotError};

const MINUTES_PER_DAY: i32 = 24 * 60;

/// Validates a proposed weekly slot and normalizes its wall-clock fields to
/// UTC. Field checks run in order; the first failure aborts.
pub fn validate_slot(request: &CreateTimeSlotRequest) -> Result<NormalizedSlot, TimeSlotError> {
    if request.day_of_week.is_empty() {
        return Err(TimeSlotError::ValidationError("day_of_week is required".to_string()));
    }
    if request.start.is_empty() {
        return Err(TimeSlotError::ValidationError("start is required".to_string()));
    }

    let day: DayOfWeek = request
        .day_of_week
        .parse()
        .map_err(TimeSlotError::ValidationError)?;
    let start: Time24h = request
        .start
        .parse()
        .map_err(TimeSlotError::ValidationError)?;

    if request.duration_minutes <= 0 || request.duration_minutes > MINUTES_PER_DAY {
        return Err(TimeSlotError::ValidationError(format!(
            "duration must be in 1..={MINUTES_PER_DAY} minutes, got {}",
            request.duration_minutes
        )));
    }

    let advance_notice = request.advance_notice_minutes.unwrap_or(0);
    if advance_notice < 0 {
        return Err(TimeSlotError::ValidationError(
            "advance notice must not be negative".to_string(),
        ));
    }

    let break_minutes = request
        .after_session_break_minutes
        .unwrap_or(MIN_AFTER_SESSION_BREAK_MINUTES);
    if break_minutes < MIN_AFTER_SESSION_BREAK_MINUTES {
        return Err(TimeSlotError::ValidationError(format!(
            "after-session break must be at least {MIN_AFTER_SESSION_BREAK_MINUTES} minutes"
        )));
    }

    let offset = TimezoneOffset::try_new(request.timezone_offset.unwrap_or(0))
        .map_err(TimeSlotError::ValidationError)?;

    let (day, start) = normalize_to_utc(day, start, offset);

    Ok(NormalizedSlot {
        day_of_week: day,
        start,
        duration_minutes: request.duration_minutes,
        advance_notice_minutes: advance_notice,
        after_session_break_minutes: break_minutes,
        timezone_offset: offset,
    })
}

/// Converts a local weekly wall-clock start to its UTC day and time. The day
/// shifts when the subtraction crosses midnight, e.g. Monday 01:30 at +180
/// becomes Sunday 22:30.
pub fn normalize_to_utc(
    day: DayOfWeek,
    start: Time24h,
    offset: TimezoneOffset,
) -> (DayOfWeek, Time24h) {
    let utc_minutes = start.minutes_from_midnight() - offset.minutes();
    let time = Time24h::from_minutes_wrapped(utc_minutes);

    let day = if utc_minutes < 0 {
        day.pred()
    } else if utc_minutes >= MINUTES_PER_DAY {
        day.succ()
    } else {
        day
    };

    (day, time)
}

/// Inverse of [`normalize_to_utc`]: recovers the local wall-clock day and
/// time a stored UTC slot was authored with. Update requests merge against
/// these local fields before re-normalizing.
pub fn denormalize_from_utc(
    day: DayOfWeek,
    start: Time24h,
    offset: TimezoneOffset,
) -> (DayOfWeek, Time24h) {
    let local_minutes = start.minutes_from_midnight() + offset.minutes();
    let time = Time24h::from_minutes_wrapped(local_minutes);

    let day = if local_minutes < 0 {
        day.pred()
    } else if local_minutes >= MINUTES_PER_DAY {
        day.succ()
    } else {
        day
    };

    (day, time)
}

/// Checks a normalized proposal against the therapist's other slots. Only
/// active slots on the same UTC day participate; the slot being updated is
/// excluded by id. Ranges are compared with pre/post buffers applied.
pub fn check_slot_conflicts(
    proposal: &NormalizedSlot,
    existing: &[TimeSlot],
    exclude_id: Option<&TimeSlotId>,
) -> Result<(), TimeSlotError> {
    let proposal_start =
        proposal.start.minutes_from_midnight() - proposal.advance_notice_minutes;
    let proposal_end = proposal.start.minutes_from_midnight()
        + proposal.duration_minutes
        + proposal
            .after_session_break_minutes
            .max(MIN_AFTER_SESSION_BREAK_MINUTES);

    for slot in existing {
        if !slot.is_active || slot.day_of_week != proposal.day_of_week {
            continue;
        }
        if exclude_id.is_some_and(|id| *id == slot.id) {
            continue;
        }

        let (slot_start, slot_end) = slot.effective_range_minutes();

        if proposal_start < slot_end && slot_start < proposal_end {
            return Err(TimeSlotError::OverlappingSlot);
        }

        let gap = if proposal_start >= slot_end {
            proposal_start - slot_end
        } else {
            slot_start - proposal_end
        };
        if gap < MIN_SLOT_GAP_MINUTES {
            return Err(TimeSlotError::InsufficientGap);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use shared_models::TherapistId;

    fn request(day: &str, start: &str, duration: i32) -> CreateTimeSlotRequest {
        CreateTimeSlotRequest {
            day_of_week: day.to_string(),
            start: start.to_string(),
            duration_minutes: duration,
            advance_notice_minutes: None,
            after_session_break_minutes: None,
            timezone_offset: None,
        }
    }

    fn slot(day: DayOfWeek, start: &str, duration: i32) -> TimeSlot {
        TimeSlot {
            id: TimeSlotId::new(),
            therapist_id: TherapistId::new(),
            is_active: true,
            day_of_week: day,
            start: start.parse().unwrap(),
            duration_minutes: duration,
            advance_notice_minutes: 0,
            after_session_break_minutes: MIN_AFTER_SESSION_BREAK_MINUTES,
            timezone_offset: TimezoneOffset::UTC,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn accepts_a_plain_slot() {
        let normalized = validate_slot(&request("Monday", "09:00", 120)).unwrap();
        assert_eq!(normalized.day_of_week, DayOfWeek::Monday);
        assert_eq!(normalized.start.to_string(), "09:00");
        assert_eq!(normalized.after_session_break_minutes, 15);
    }

    #[test]
    fn rejects_malformed_fields_in_order() {
        assert_matches!(
            validate_slot(&request("monday", "09:00", 60)),
            Err(TimeSlotError::ValidationError(_))
        );
        assert_matches!(
            validate_slot(&request("Monday", "9:00", 60)),
            Err(TimeSlotError::ValidationError(_))
        );
        assert_matches!(
            validate_slot(&request("Monday", "09:00", 0)),
            Err(TimeSlotError::ValidationError(_))
        );
        assert_matches!(
            validate_slot(&request("Monday", "09:00", 1441)),
            Err(TimeSlotError::ValidationError(_))
        );
    }

    #[test]
    fn rejects_break_below_minimum() {
        let mut req = request("Monday", "09:00", 60);
        req.after_session_break_minutes = Some(10);
        assert_matches!(validate_slot(&req), Err(TimeSlotError::ValidationError(_)));
    }

    #[test]
    fn rejects_offset_out_of_range() {
        let mut req = request("Monday", "09:00", 60);
        req.timezone_offset = Some(900);
        assert_matches!(validate_slot(&req), Err(TimeSlotError::ValidationError(_)));
    }

    #[test]
    fn normalizes_local_monday_night_to_utc_sunday() {
        let mut req = request("Monday", "01:30", 60);
        req.timezone_offset = Some(180);
        let normalized = validate_slot(&req).unwrap();
        assert_eq!(normalized.day_of_week, DayOfWeek::Sunday);
        assert_eq!(normalized.start.to_string(), "22:30");
    }

    #[test]
    fn normalization_round_trips_through_denormalize() {
        for (day, start, offset) in [
            (DayOfWeek::Monday, "01:30", 180),
            (DayOfWeek::Friday, "23:30", -60),
            (DayOfWeek::Sunday, "12:00", 0),
        ] {
            let offset = TimezoneOffset::try_new(offset).unwrap();
            let start: Time24h = start.parse().unwrap();
            let (utc_day, utc_start) = normalize_to_utc(day, start, offset);
            assert_eq!(denormalize_from_utc(utc_day, utc_start, offset), (day, start));
        }
    }

    #[test]
    fn normalizes_westward_offsets_forward() {
        let (day, time) =
            normalize_to_utc(DayOfWeek::Friday, "23:30".parse().unwrap(), TimezoneOffset::try_new(-60).unwrap());
        assert_eq!(day, DayOfWeek::Saturday);
        assert_eq!(time.to_string(), "00:30");
    }

    #[test]
    fn detects_overlap_on_same_utc_day() {
        let existing = vec![slot(DayOfWeek::Monday, "09:00", 120)];
        let proposal = validate_slot(&request("Monday", "10:00", 60)).unwrap();
        assert_matches!(
            check_slot_conflicts(&proposal, &existing, None),
            Err(TimeSlotError::OverlappingSlot)
        );
    }

    #[test]
    fn detects_gap_below_thirty_minutes() {
        // Existing effective range ends 11:00 + 15min break = 11:15.
        let existing = vec![slot(DayOfWeek::Monday, "09:00", 120)];
        let proposal = validate_slot(&request("Monday", "11:30", 60)).unwrap();
        assert_matches!(
            check_slot_conflicts(&proposal, &existing, None),
            Err(TimeSlotError::InsufficientGap)
        );
    }

    #[test]
    fn accepts_sufficient_gap_and_other_days() {
        let existing = vec![slot(DayOfWeek::Monday, "09:00", 120)];

        let later = validate_slot(&request("Monday", "12:30", 60)).unwrap();
        assert!(check_slot_conflicts(&later, &existing, None).is_ok());

        let other_day = validate_slot(&request("Tuesday", "09:30", 60)).unwrap();
        assert!(check_slot_conflicts(&other_day, &existing, None).is_ok());
    }

    #[test]
    fn inactive_slots_do_not_conflict() {
        let mut existing = slot(DayOfWeek::Monday, "09:00", 120);
        existing.is_active = false;
        let proposal = validate_slot(&request("Monday", "10:00", 60)).unwrap();
        assert!(check_slot_conflicts(&proposal, &[existing], None).is_ok());
    }

    #[test]
    fn updated_slot_is_excluded_by_id() {
        let existing = slot(DayOfWeek::Monday, "09:00", 120);
        let id = existing.id.clone();
        let proposal = validate_slot(&request("Monday", "09:30", 60)).unwrap();
        assert!(check_slot_conflicts(&proposal, &[existing], Some(&id)).is_ok());
    }
}
