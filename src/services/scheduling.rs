use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::{Appointment, BlockedSlot, WorkingHours};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    #[error("Duração inválida")]
    InvalidDuration,

    #[error("Fora do horário de atendimento. Horários: {hours}")]
    OutsideWorkingHours { hours: String },

    #[error("Horário ocupado")]
    SlotOccupied { occupant: Occupant },
}

/// What holds a stretch of a professional's timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Occupant {
    Appointment {
        ids: Vec<String>,
        client_name: String,
    },
    Blocked {
        id: String,
        reason: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub occupant: Occupant,
}

impl Interval {
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        overlaps(self.start, self.end, start, end)
    }

    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Half-open overlap: intervals that merely touch do not overlap.
pub fn overlaps(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// A proposed appointment (or multi-service booking) on one professional.
#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub professional_id: String,
    pub start: NaiveDateTime,
    pub duration_minutes: i32,
    /// Appointments being rescheduled; they don't conflict with themselves.
    pub ignore_ids: Vec<String>,
}

impl SlotRequest {
    pub fn new(professional_id: &str, start: NaiveDateTime, duration_minutes: i32) -> Self {
        Self {
            professional_id: professional_id.to_string(),
            start,
            duration_minutes,
            ignore_ids: Vec::new(),
        }
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(self.duration_minutes as i64)
    }
}

/// Occupied stretches of one professional's timeline, sorted by start.
///
/// Occupying appointments for the same client and start time collapse into a
/// single interval covering their summed durations.
pub fn occupied_intervals(
    professional_id: &str,
    appointments: &[Appointment],
    blocked: &[BlockedSlot],
    ignore_ids: &[String],
) -> Vec<Interval> {
    let mut order: Vec<(String, NaiveDateTime)> = Vec::new();
    let mut merged: HashMap<(String, NaiveDateTime), (i64, Vec<String>)> = HashMap::new();

    for appt in appointments {
        if appt.professional_id != professional_id
            || !appt.is_occupying()
            || ignore_ids.contains(&appt.id)
        {
            continue;
        }
        let key = (appt.client_name.clone(), appt.start_time);
        let entry = merged.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (0, Vec::new())
        });
        entry.0 += appt.duration as i64;
        entry.1.push(appt.id.clone());
    }

    let mut intervals: Vec<Interval> = order
        .into_iter()
        .filter_map(|key| {
            let (minutes, ids) = merged.remove(&key)?;
            let (client_name, start) = key;
            Some(Interval {
                start,
                end: start + Duration::minutes(minutes),
                occupant: Occupant::Appointment { ids, client_name },
            })
        })
        .collect();

    intervals.extend(
        blocked
            .iter()
            .filter(|b| b.professional_id == professional_id && b.end_time > b.start_time)
            .map(|b| Interval {
                start: b.start_time,
                end: b.end_time,
                occupant: Occupant::Blocked {
                    id: b.id.clone(),
                    reason: b.reason.clone(),
                },
            }),
    );

    intervals.sort_by_key(|i| (i.start, i.end));
    intervals
}

pub fn validate_appointment(
    request: &SlotRequest,
    appointments: &[Appointment],
    blocked: &[BlockedSlot],
    hours: Option<&WorkingHours>,
) -> Result<(), SchedulingError> {
    if request.duration_minutes <= 0 {
        return Err(SchedulingError::InvalidDuration);
    }

    // Working hours only restrict when configured
    if let Some(hours) = hours {
        if !hours.is_empty() && !hours.fits(&request.start, request.duration_minutes) {
            return Err(SchedulingError::OutsideWorkingHours {
                hours: hours.to_human_readable(),
            });
        }
    }

    let proposed_end = request.end();
    let occupied = occupied_intervals(
        &request.professional_id,
        appointments,
        blocked,
        &request.ignore_ids,
    );

    if let Some(hit) = occupied
        .into_iter()
        .find(|i| i.overlaps(request.start, proposed_end))
    {
        tracing::debug!(
            professional_id = %request.professional_id,
            start = %request.start,
            "proposed slot overlaps an occupied interval"
        );
        return Err(SchedulingError::SlotOccupied {
            occupant: hit.occupant,
        });
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct SlotQuery {
    pub professional_id: String,
    pub date: NaiveDate,
    pub duration_minutes: i32,
    pub step_minutes: u32,
    /// Starts before this instant are not offered (usually "now").
    pub not_before: Option<NaiveDateTime>,
}

/// Start times on a `step_minutes` grid where the whole duration is free.
///
/// `default_hours` is used when the professional has no working hours for
/// that weekday.
pub fn available_starts(
    query: &SlotQuery,
    hours: Option<&WorkingHours>,
    default_hours: (chrono::NaiveTime, chrono::NaiveTime),
    appointments: &[Appointment],
    blocked: &[BlockedSlot],
) -> Vec<NaiveDateTime> {
    if query.duration_minutes <= 0 || query.step_minutes == 0 {
        return Vec::new();
    }

    let windows = match hours {
        Some(h) if !h.is_empty() => h.windows_on(query.date),
        _ => vec![default_hours],
    };

    let occupied = occupied_intervals(&query.professional_id, appointments, blocked, &[]);
    let duration = Duration::minutes(query.duration_minutes as i64);
    let step = Duration::minutes(query.step_minutes as i64);

    let mut starts = Vec::new();
    for (open, close) in windows {
        let window_end = query.date.and_time(close);
        let mut cursor = query.date.and_time(open);
        while cursor + duration <= window_end {
            let end = cursor + duration;
            let too_early = query.not_before.map(|nb| cursor < nb).unwrap_or(false);
            if !too_early && !occupied.iter().any(|i| i.overlaps(cursor, end)) {
                starts.push(cursor);
            }
            cursor += step;
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::NaiveTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn appt(id: &str, client: &str, prof: &str, start: &str, duration: i32) -> Appointment {
        Appointment {
            id: id.to_string(),
            client_name: client.to_string(),
            client_id: None,
            professional_id: prof.to_string(),
            professional_name: None,
            service_id: format!("svc-{id}"),
            service_name: None,
            start_time: dt(start),
            duration,
            price: 50.0,
            status: AppointmentStatus::Scheduled,
            notes: None,
        }
    }

    fn block(id: &str, prof: &str, start: &str, end: &str) -> BlockedSlot {
        BlockedSlot {
            id: id.to_string(),
            professional_id: prof.to_string(),
            start_time: dt(start),
            end_time: dt(end),
            reason: Some("Almoço".to_string()),
        }
    }

    fn hours(json: &str) -> WorkingHours {
        WorkingHours::from_json(json).unwrap()
    }

    fn day_window() -> (NaiveTime, NaiveTime) {
        (
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_overlap_is_half_open() {
        assert!(overlaps(dt("2025-06-16 09:00"), dt("2025-06-16 10:00"), dt("2025-06-16 09:30"), dt("2025-06-16 10:30")));
        assert!(!overlaps(dt("2025-06-16 09:00"), dt("2025-06-16 10:00"), dt("2025-06-16 10:00"), dt("2025-06-16 11:00")));
        assert!(overlaps(dt("2025-06-16 09:00"), dt("2025-06-16 12:00"), dt("2025-06-16 10:00"), dt("2025-06-16 10:30")));
    }

    #[test]
    fn test_blocked_slot_conflict() {
        // Carlos Lima at 09:00 for 60 minutes vs a block 09:30-10:00
        let blocked = vec![block("b1", "p1", "2025-06-16 09:30", "2025-06-16 10:00")];
        let request = SlotRequest::new("p1", dt("2025-06-16 09:00"), 60);
        let err = validate_appointment(&request, &[], &blocked, None).unwrap_err();
        assert_eq!(err.to_string(), "Horário ocupado");
        assert!(matches!(
            err,
            SchedulingError::SlotOccupied { occupant: Occupant::Blocked { .. } }
        ));
    }

    #[test]
    fn test_conflict_with_existing_appointment() {
        let existing = vec![appt("a1", "Alice", "p1", "2025-06-16 10:00", 60)];
        let request = SlotRequest::new("p1", dt("2025-06-16 10:30"), 60);
        let err = validate_appointment(&request, &existing, &[], None).unwrap_err();
        assert!(matches!(err, SchedulingError::SlotOccupied { .. }));
    }

    #[test]
    fn test_no_conflict_adjacent() {
        let existing = vec![appt("a1", "Alice", "p1", "2025-06-16 10:00", 60)];
        let request = SlotRequest::new("p1", dt("2025-06-16 11:00"), 60);
        assert!(validate_appointment(&request, &existing, &[], None).is_ok());
    }

    #[test]
    fn test_other_professional_does_not_conflict() {
        let existing = vec![appt("a1", "Alice", "p2", "2025-06-16 10:00", 60)];
        let blocked = vec![block("b1", "p2", "2025-06-16 10:00", "2025-06-16 12:00")];
        let request = SlotRequest::new("p1", dt("2025-06-16 10:00"), 60);
        assert!(validate_appointment(&request, &existing, &blocked, None).is_ok());
    }

    #[test]
    fn test_cancelled_appointment_frees_slot() {
        let mut cancelled = appt("a1", "Alice", "p1", "2025-06-16 10:00", 60);
        cancelled.status = AppointmentStatus::Cancelled;
        let mut no_show = appt("a2", "Bia", "p1", "2025-06-16 10:00", 60);
        no_show.status = AppointmentStatus::NoShow;
        let request = SlotRequest::new("p1", dt("2025-06-16 10:00"), 60);
        assert!(validate_appointment(&request, &[cancelled, no_show], &[], None).is_ok());
    }

    #[test]
    fn test_ignore_ids_when_rescheduling() {
        let existing = vec![appt("a1", "Alice", "p1", "2025-06-16 10:00", 60)];
        let mut request = SlotRequest::new("p1", dt("2025-06-16 10:30"), 60);
        request.ignore_ids.push("a1".to_string());
        assert!(validate_appointment(&request, &existing, &[], None).is_ok());
    }

    #[test]
    fn test_group_occupies_summed_duration() {
        // Two services for the same client at 09:00: 30 + 45 minutes
        let existing = vec![
            appt("a1", "Carlos Lima", "p1", "2025-06-16 09:00", 30),
            appt("a2", "Carlos Lima", "p1", "2025-06-16 09:00", 45),
        ];
        let intervals = occupied_intervals("p1", &existing, &[], &[]);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].end, dt("2025-06-16 10:15"));

        let request = SlotRequest::new("p1", dt("2025-06-16 10:00"), 30);
        assert!(validate_appointment(&request, &existing, &[], None).is_err());
        let request = SlotRequest::new("p1", dt("2025-06-16 10:15"), 30);
        assert!(validate_appointment(&request, &existing, &[], None).is_ok());
    }

    #[test]
    fn test_invalid_duration() {
        let request = SlotRequest::new("p1", dt("2025-06-16 10:00"), 0);
        assert_eq!(
            validate_appointment(&request, &[], &[], None).unwrap_err(),
            SchedulingError::InvalidDuration
        );
    }

    #[test]
    fn test_outside_working_hours() {
        let h = hours(r#"{"windows":[{"day":"mon","start":"09:00","end":"17:00"}]}"#);
        let request = SlotRequest::new("p1", dt("2025-06-16 16:30"), 60);
        let err = validate_appointment(&request, &[], &[], Some(&h)).unwrap_err();
        assert!(matches!(err, SchedulingError::OutsideWorkingHours { .. }));
        assert!(err.to_string().contains("Mon: 09:00-17:00"));
    }

    #[test]
    fn test_empty_working_hours_skip_check() {
        let h = hours(r#"{"windows":[]}"#);
        let request = SlotRequest::new("p1", dt("2025-06-15 20:00"), 60);
        assert!(validate_appointment(&request, &[], &[], Some(&h)).is_ok());
    }

    #[test]
    fn test_available_starts_skip_occupied() {
        let existing = vec![appt("a1", "Alice", "p1", "2025-06-16 10:00", 60)];
        let blocked = vec![block("b1", "p1", "2025-06-16 11:30", "2025-06-16 12:00")];
        let query = SlotQuery {
            professional_id: "p1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            duration_minutes: 30,
            step_minutes: 30,
            not_before: None,
        };
        let starts = available_starts(&query, None, day_window(), &existing, &blocked);
        let labels: Vec<String> = starts.iter().map(|s| s.format("%H:%M").to_string()).collect();
        assert_eq!(labels, vec!["09:00", "09:30", "11:00"]);
    }

    #[test]
    fn test_available_starts_long_service() {
        let existing = vec![appt("a1", "Alice", "p1", "2025-06-16 10:00", 30)];
        let query = SlotQuery {
            professional_id: "p1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            duration_minutes: 90,
            step_minutes: 30,
            not_before: None,
        };
        let starts = available_starts(&query, None, day_window(), &existing, &[]);
        let labels: Vec<String> = starts.iter().map(|s| s.format("%H:%M").to_string()).collect();
        // 09:00 would run into 10:00; 10:30 ends exactly at closing
        assert_eq!(labels, vec!["10:30"]);
    }

    #[test]
    fn test_available_starts_not_before_and_hours() {
        let h = hours(r#"{"windows":[{"day":"mon","start":"14:00","end":"16:00"}]}"#);
        let query = SlotQuery {
            professional_id: "p1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            duration_minutes: 60,
            step_minutes: 30,
            not_before: Some(dt("2025-06-16 14:10")),
        };
        let starts = available_starts(&query, Some(&h), day_window(), &[], &[]);
        let labels: Vec<String> = starts.iter().map(|s| s.format("%H:%M").to_string()).collect();
        assert_eq!(labels, vec!["14:30", "15:00"]);
    }
}
