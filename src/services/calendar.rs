use crate::models::AppointmentGroup;

pub fn generate_ics(group: &AppointmentGroup, salon_name: &str) -> String {
    let dtstart = group.start_time.format("%Y%m%dT%H%M%S").to_string();
    let dtend = group.end_time().format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    let uid = format!("{}@salonbook", group.ids().join("-"));

    let summary = escape(&format!("{} - {}", group.service_names().join(" + "), salon_name));
    let client = escape(&group.client_name);
    let description = group
        .appointments
        .iter()
        .filter_map(|a| a.notes.as_deref())
        .collect::<Vec<_>>()
        .join("; ");
    let description = if description.is_empty() {
        format!("Cliente: {client}")
    } else {
        format!("Cliente: {client}\\n{}", escape(&description))
    };

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Salonbook//Agenda//PT\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, AppointmentStatus};
    use chrono::NaiveDateTime;

    fn appt(id: &str, service: &str, duration: i32, notes: Option<&str>) -> Appointment {
        Appointment {
            id: id.to_string(),
            client_name: "Carlos Lima".to_string(),
            client_id: None,
            professional_id: "p1".to_string(),
            professional_name: None,
            service_id: format!("svc-{id}"),
            service_name: Some(service.to_string()),
            start_time: NaiveDateTime::parse_from_str("2025-03-15 14:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            duration,
            price: 40.0,
            status: AppointmentStatus::Confirmed,
            notes: notes.map(|n| n.to_string()),
        }
    }

    #[test]
    fn test_generate_ics_for_group() {
        let mut group = AppointmentGroup::new(appt("a1", "Corte", 30, Some("Máquina 2")));
        group.push(appt("a2", "Barba", 30, None));

        let ics = generate_ics(&group, "Barbearia Central");
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("DTSTART:20250315T140000"));
        assert!(ics.contains("DTEND:20250315T150000"));
        assert!(ics.contains("SUMMARY:Corte + Barba - Barbearia Central"));
        assert!(ics.contains("DESCRIPTION:Cliente: Carlos Lima\\nMáquina 2"));
        assert!(ics.contains("UID:a1-a2@salonbook"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn test_generate_ics_escapes_text() {
        let group = AppointmentGroup::new(appt("a1", "Corte, lavagem", 45, None));
        let ics = generate_ics(&group, "Salão; Centro");
        assert!(ics.contains("SUMMARY:Corte\\, lavagem - Salão\\; Centro"));
        assert!(ics.contains("DESCRIPTION:Cliente: Carlos Lima\r\n"));
        assert!(ics.contains("DTEND:20250315T144500"));
    }
}
