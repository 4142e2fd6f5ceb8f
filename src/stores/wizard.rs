use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AppointmentStatus, NewAppointment};
use crate::stores::cart::ServicesCart;

pub const WIZARD_KEY: &str = "salonbook.wizard";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Date,
    Professional,
    Slot,
    Confirm,
}

impl WizardStep {
    pub fn next(self) -> Option<Self> {
        match self {
            WizardStep::Date => Some(WizardStep::Professional),
            WizardStep::Professional => Some(WizardStep::Slot),
            WizardStep::Slot => Some(WizardStep::Confirm),
            WizardStep::Confirm => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            WizardStep::Date => None,
            WizardStep::Professional => Some(WizardStep::Date),
            WizardStep::Slot => Some(WizardStep::Professional),
            WizardStep::Confirm => Some(WizardStep::Slot),
        }
    }
}

/// Client booking flow: date, then professional, then slot, then confirm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub step: WizardStep,
    pub date: Option<NaiveDate>,
    pub professional_id: Option<String>,
    pub slot: Option<NaiveTime>,
    pub client_name: Option<String>,
    pub client_id: Option<String>,
    pub notes: Option<String>,
}

impl WizardState {
    pub fn load(conn: &Connection) -> anyhow::Result<Self> {
        Ok(queries::load_json(conn, WIZARD_KEY)?.unwrap_or_default())
    }

    pub fn save(&self, conn: &Connection) -> anyhow::Result<()> {
        queries::save_json(conn, WIZARD_KEY, self)
    }

    pub fn reset(&mut self, conn: &Connection) -> anyhow::Result<()> {
        *self = Self::default();
        queries::remove_item(conn, WIZARD_KEY)?;
        Ok(())
    }

    // Changing an earlier choice invalidates the later ones.

    pub fn select_date(&mut self, date: NaiveDate) {
        if self.date != Some(date) {
            self.professional_id = None;
            self.slot = None;
        }
        self.date = Some(date);
    }

    pub fn select_professional(&mut self, professional_id: &str) {
        if self.professional_id.as_deref() != Some(professional_id) {
            self.slot = None;
        }
        self.professional_id = Some(professional_id.to_string());
    }

    pub fn select_slot(&mut self, slot: NaiveTime) {
        self.slot = Some(slot);
    }

    pub fn set_client(&mut self, name: &str, client_id: Option<String>) {
        self.client_name = Some(name.trim().to_string());
        self.client_id = client_id;
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        Some(self.date?.and_time(self.slot?))
    }

    fn missing_for(&self, step: WizardStep) -> Option<&'static str> {
        match step {
            WizardStep::Date if self.date.is_none() => Some("Selecione uma data."),
            WizardStep::Professional if self.professional_id.is_none() => {
                Some("Selecione um profissional.")
            }
            WizardStep::Slot if self.slot.is_none() => Some("Selecione um horário."),
            _ => None,
        }
    }

    pub fn next(&mut self) -> Result<WizardStep, AppError> {
        if let Some(msg) = self.missing_for(self.step) {
            return Err(AppError::Validation(msg.to_string()));
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> WizardStep {
        if let Some(prev) = self.step.previous() {
            self.step = prev;
        }
        self.step
    }

    /// One create request per cart service, all at the chosen start so the
    /// backend returns them as one group.
    pub fn to_requests(&self, cart: &ServicesCart) -> Result<Vec<NewAppointment>, AppError> {
        for step in [WizardStep::Date, WizardStep::Professional, WizardStep::Slot] {
            if let Some(msg) = self.missing_for(step) {
                return Err(AppError::Validation(msg.to_string()));
            }
        }
        if cart.is_empty() {
            return Err(AppError::Validation("Selecione ao menos um serviço.".to_string()));
        }
        let client_name = self
            .client_name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::Validation("Informe o nome do cliente.".to_string()))?;
        let start_time = self
            .start_time()
            .ok_or_else(|| AppError::Validation("Selecione um horário.".to_string()))?;
        let professional_id = self.professional_id.clone().unwrap_or_default();

        Ok(cart
            .items
            .iter()
            .map(|item| NewAppointment {
                client_name: client_name.clone(),
                client_id: self.client_id.clone(),
                professional_id: professional_id.clone(),
                service_id: item.service_id.clone(),
                start_time,
                duration: item.duration,
                price: item.price,
                status: AppointmentStatus::Scheduled,
                notes: self.notes.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::Service;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn cart() -> ServicesCart {
        let mut cart = ServicesCart::default();
        for (id, duration, price) in [("s1", 30, 40.0), ("s2", 20, 25.0)] {
            cart.add(&Service {
                id: id.to_string(),
                name: id.to_string(),
                category_id: None,
                duration,
                price,
                active: true,
            });
        }
        cart
    }

    #[test]
    fn test_steps_require_selection() {
        let mut wizard = WizardState::default();
        assert!(matches!(wizard.next(), Err(AppError::Validation(_))));

        wizard.select_date(date("2025-06-16"));
        assert_eq!(wizard.next().unwrap(), WizardStep::Professional);
        assert!(wizard.next().is_err());

        wizard.select_professional("p1");
        assert_eq!(wizard.next().unwrap(), WizardStep::Slot);
        wizard.select_slot(time("09:00"));
        assert_eq!(wizard.next().unwrap(), WizardStep::Confirm);
        assert_eq!(wizard.next().unwrap(), WizardStep::Confirm);

        assert_eq!(wizard.back(), WizardStep::Slot);
    }

    #[test]
    fn test_changing_date_clears_later_choices() {
        let mut wizard = WizardState::default();
        wizard.select_date(date("2025-06-16"));
        wizard.select_professional("p1");
        wizard.select_slot(time("09:00"));

        wizard.select_date(date("2025-06-16"));
        assert!(wizard.slot.is_some());

        wizard.select_professional("p2");
        assert!(wizard.slot.is_none());

        wizard.select_date(date("2025-06-17"));
        assert!(wizard.professional_id.is_none());
    }

    #[test]
    fn test_to_requests_share_start() {
        let mut wizard = WizardState::default();
        wizard.select_date(date("2025-06-16"));
        wizard.select_professional("p1");
        wizard.select_slot(time("09:00"));
        wizard.set_client("Carlos Lima", None);

        let requests = wizard.to_requests(&cart()).unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.start_time == wizard.start_time().unwrap()));
        assert_eq!(requests[1].duration, 20);
        assert_eq!(requests[0].status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_to_requests_validation() {
        let mut wizard = WizardState::default();
        wizard.select_date(date("2025-06-16"));
        wizard.select_professional("p1");
        wizard.select_slot(time("09:00"));
        assert!(wizard.to_requests(&cart()).is_err());

        wizard.set_client("Ana", None);
        assert!(wizard.to_requests(&ServicesCart::default()).is_err());
    }

    #[test]
    fn test_persistence() {
        let conn = db::init_db(":memory:").unwrap();
        let mut wizard = WizardState::default();
        wizard.select_date(date("2025-06-16"));
        wizard.next().unwrap();
        wizard.save(&conn).unwrap();

        let loaded = WizardState::load(&conn).unwrap();
        assert_eq!(loaded, wizard);

        wizard.reset(&conn).unwrap();
        assert_eq!(WizardState::load(&conn).unwrap(), WizardState::default());
    }
}
