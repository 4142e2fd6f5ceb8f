use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use super::{Appointment, AppointmentStatus};

/// Appointments booked for the same client at the same start time, shown as
/// one card and checked out together.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentGroup {
    pub client_name: String,
    pub start_time: NaiveDateTime,
    /// Sum of member durations, in minutes.
    pub duration: i32,
    /// Sum of member prices.
    pub price: f64,
    pub appointments: Vec<Appointment>,
}

impl AppointmentGroup {
    pub fn new(first: Appointment) -> Self {
        Self {
            client_name: first.client_name.clone(),
            start_time: first.start_time,
            duration: first.duration,
            price: first.price,
            appointments: vec![first],
        }
    }

    pub fn push(&mut self, appointment: Appointment) {
        self.duration += appointment.duration;
        self.price += appointment.price;
        self.appointments.push(appointment);
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.start_time + Duration::minutes(self.duration as i64)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.appointments.iter().map(|a| a.id.as_str()).collect()
    }

    pub fn contains(&self, appointment_id: &str) -> bool {
        self.appointments.iter().any(|a| a.id == appointment_id)
    }

    /// The least advanced lifecycle status among members. A group whose
    /// members all dropped out reports the first member's status.
    pub fn status(&self) -> AppointmentStatus {
        self.appointments
            .iter()
            .filter_map(|a| a.status.position().map(|p| (p, a.status)))
            .min_by_key(|(p, _)| *p)
            .map(|(_, s)| s)
            .or_else(|| self.appointments.first().map(|a| a.status))
            .unwrap_or(AppointmentStatus::Scheduled)
    }

    /// Distinct professionals, in order of first appearance.
    pub fn professional_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for appt in &self.appointments {
            if !ids.contains(&appt.professional_id.as_str()) {
                ids.push(&appt.professional_id);
            }
        }
        ids
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.appointments
            .iter()
            .map(|a| a.service_name.as_deref().unwrap_or(a.service_id.as_str()))
            .collect()
    }

    /// Minutes this group keeps a given professional busy.
    pub fn duration_for(&self, professional_id: &str) -> i32 {
        self.appointments
            .iter()
            .filter(|a| a.professional_id == professional_id)
            .map(|a| a.duration)
            .sum()
    }
}
