use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::models::{Appointment, AppointmentGroup};

/// Merges appointments sharing client name and start time into groups,
/// ordered by start time. Ties keep the order in which groups first appear.
pub fn group_appointments(appointments: &[Appointment]) -> Vec<AppointmentGroup> {
    let mut groups: Vec<AppointmentGroup> = Vec::new();
    let mut index: HashMap<(&str, NaiveDateTime), usize> = HashMap::new();

    for appt in appointments {
        let key = (appt.client_name.as_str(), appt.start_time);
        match index.get(&key) {
            Some(&i) => groups[i].push(appt.clone()),
            None => {
                index.insert(key, groups.len());
                groups.push(AppointmentGroup::new(appt.clone()));
            }
        }
    }

    groups.sort_by_key(|g| g.start_time);
    groups
}

pub fn find_group<'a>(
    groups: &'a [AppointmentGroup],
    appointment_id: &str,
) -> Option<&'a AppointmentGroup> {
    groups.iter().find(|g| g.contains(appointment_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn appt(id: &str, client: &str, start: &str, duration: i32, price: f64) -> Appointment {
        Appointment {
            id: id.to_string(),
            client_name: client.to_string(),
            client_id: None,
            professional_id: "p1".to_string(),
            professional_name: None,
            service_id: format!("svc-{id}"),
            service_name: Some(format!("Serviço {id}")),
            start_time: dt(start),
            duration,
            price,
            status: AppointmentStatus::Confirmed,
            notes: None,
        }
    }

    #[test]
    fn test_group_sums_duration_and_price() {
        let appointments = vec![
            appt("a1", "Carlos Lima", "2025-06-16 09:00", 30, 40.0),
            appt("a2", "Carlos Lima", "2025-06-16 09:00", 45, 35.5),
            appt("a3", "Carlos Lima", "2025-06-16 09:00", 15, 20.0),
        ];
        let groups = group_appointments(&appointments);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].duration, 90);
        assert_eq!(groups[0].price, 95.5);
        assert_eq!(groups[0].ids(), vec!["a1", "a2", "a3"]);
        assert_eq!(groups[0].end_time(), dt("2025-06-16 10:30"));
    }

    #[test]
    fn test_different_time_or_client_not_grouped() {
        let appointments = vec![
            appt("a1", "Carlos Lima", "2025-06-16 09:00", 30, 40.0),
            appt("a2", "Carlos Lima", "2025-06-16 10:00", 30, 40.0),
            appt("a3", "Ana Souza", "2025-06-16 09:00", 30, 40.0),
        ];
        let groups = group_appointments(&appointments);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.appointments.len() == 1));
    }

    #[test]
    fn test_groups_sorted_by_start_time() {
        let appointments = vec![
            appt("a1", "Bruno", "2025-06-16 11:00", 30, 40.0),
            appt("a2", "Ana", "2025-06-16 09:00", 30, 40.0),
            appt("a3", "Bruno", "2025-06-16 11:00", 30, 10.0),
        ];
        let groups = group_appointments(&appointments);
        assert_eq!(groups[0].client_name, "Ana");
        assert_eq!(groups[1].client_name, "Bruno");
        assert_eq!(groups[1].price, 50.0);
    }

    #[test]
    fn test_group_status_is_least_advanced() {
        let mut first = appt("a1", "Ana", "2025-06-16 09:00", 30, 40.0);
        first.status = AppointmentStatus::InService;
        let mut second = appt("a2", "Ana", "2025-06-16 09:00", 30, 40.0);
        second.status = AppointmentStatus::Arrived;
        let mut third = appt("a3", "Ana", "2025-06-16 09:00", 30, 40.0);
        third.status = AppointmentStatus::Cancelled;

        let groups = group_appointments(&[first, second, third]);
        assert_eq!(groups[0].status(), AppointmentStatus::Arrived);
    }

    #[test]
    fn test_find_group() {
        let appointments = vec![
            appt("a1", "Ana", "2025-06-16 09:00", 30, 40.0),
            appt("a2", "Ana", "2025-06-16 09:00", 30, 40.0),
        ];
        let groups = group_appointments(&appointments);
        assert!(find_group(&groups, "a2").is_some());
        assert!(find_group(&groups, "zz").is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(group_appointments(&[]).is_empty());
    }
}
