use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Appointment, AppointmentGroup, AppointmentStatus, StatusUpdate};
use crate::services::api::SalonApi;
use crate::services::grouping::{find_group, group_appointments};

#[derive(Debug, Clone, Serialize)]
pub struct KanbanColumn {
    pub status: AppointmentStatus,
    pub groups: Vec<AppointmentGroup>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub client_name: String,
    pub items: Vec<(String, f64)>,
    pub total_price: f64,
    pub total_duration: i32,
    pub payment_method: String,
}

/// Staff board for one day. Local state is optimistic; the API is the source
/// of truth and a failed mutation reloads everything.
#[derive(Debug, Clone)]
pub struct KanbanBoard {
    pub date: NaiveDate,
    appointments: Vec<Appointment>,
}

impl KanbanBoard {
    pub fn new(date: NaiveDate, appointments: Vec<Appointment>) -> Self {
        let appointments = appointments
            .into_iter()
            .filter(|a| a.start_time.date() == date)
            .collect();
        Self { date, appointments }
    }

    pub async fn load(api: &dyn SalonApi, date: NaiveDate) -> Result<Self, AppError> {
        let appointments = api.appointments(date).await?;
        tracing::debug!(%date, count = appointments.len(), "loaded board");
        Ok(Self::new(date, appointments))
    }

    pub async fn reload(&mut self, api: &dyn SalonApi) -> Result<(), AppError> {
        let fresh = Self::load(api, self.date).await?;
        self.appointments = fresh.appointments;
        Ok(())
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn groups(&self) -> Vec<AppointmentGroup> {
        group_appointments(&self.appointments)
    }

    /// One column per lifecycle status. Cancelled and no-show cards are off
    /// the board.
    pub fn columns(&self) -> Vec<KanbanColumn> {
        let groups = self.groups();
        AppointmentStatus::LIFECYCLE
            .iter()
            .map(|status| KanbanColumn {
                status: *status,
                groups: groups
                    .iter()
                    .filter(|g| g.status() == *status)
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    pub fn hidden_count(&self) -> usize {
        self.groups()
            .iter()
            .filter(|g| g.status().position().is_none())
            .count()
    }

    pub fn group_of(&self, appointment_id: &str) -> Option<AppointmentGroup> {
        find_group(&self.groups(), appointment_id).cloned()
    }

    /// Moves the whole group holding `appointment_id` to `to`.
    pub async fn move_group(
        &mut self,
        api: &dyn SalonApi,
        appointment_id: &str,
        to: AppointmentStatus,
    ) -> Result<AppointmentGroup, AppError> {
        let (group, _) = self.apply(api, appointment_id, to, None).await?;
        Ok(group)
    }

    /// Completes a group that is ready to pay (or still in service).
    pub async fn checkout(
        &mut self,
        api: &dyn SalonApi,
        appointment_id: &str,
        payment_method: &str,
    ) -> Result<Receipt, AppError> {
        let group = self
            .group_of(appointment_id)
            .ok_or_else(|| AppError::NotFound(format!("agendamento {appointment_id}")))?;

        let status = group.status();
        if !matches!(status, AppointmentStatus::ReadyToPay | AppointmentStatus::InService) {
            return Err(AppError::InvalidTransition {
                from: status,
                to: AppointmentStatus::Completed,
            });
        }
        if payment_method.trim().is_empty() {
            return Err(AppError::Validation("Informe a forma de pagamento.".to_string()));
        }

        let (group, moved) = self
            .apply(
                api,
                appointment_id,
                AppointmentStatus::Completed,
                Some(payment_method.to_string()),
            )
            .await?;

        // Dropped-out members are not billed
        let billed: Vec<&Appointment> = group
            .appointments
            .iter()
            .filter(|a| moved.contains(&a.id))
            .collect();

        Ok(Receipt {
            client_name: group.client_name.clone(),
            items: billed
                .iter()
                .map(|a| {
                    let name = a.service_name.clone().unwrap_or_else(|| a.service_id.clone());
                    (name, a.price)
                })
                .collect(),
            total_price: billed.iter().map(|a| a.price).sum(),
            total_duration: billed.iter().map(|a| a.duration).sum(),
            payment_method: payment_method.to_string(),
        })
    }

    /// Moves the members of the group that may legally reach `to` and
    /// returns the refreshed group with the ids that moved. Cancelled and
    /// no-show members keep their status.
    async fn apply(
        &mut self,
        api: &dyn SalonApi,
        appointment_id: &str,
        to: AppointmentStatus,
        payment_method: Option<String>,
    ) -> Result<(AppointmentGroup, Vec<String>), AppError> {
        let group = self
            .group_of(appointment_id)
            .ok_or_else(|| AppError::NotFound(format!("agendamento {appointment_id}")))?;

        let from = group.status();
        if !from.can_transition(to) {
            return Err(AppError::InvalidTransition { from, to });
        }

        let ids: Vec<String> = group
            .appointments
            .iter()
            .filter(|a| a.status.can_transition(to))
            .map(|a| a.id.clone())
            .collect();
        if ids.is_empty() {
            return Err(AppError::InvalidTransition { from, to });
        }
        for appt in self.appointments.iter_mut().filter(|a| ids.contains(&a.id)) {
            appt.status = to;
        }

        let update = StatusUpdate {
            status: to,
            payment_method,
        };
        for id in &ids {
            if let Err(e) = api.update_status(id, &update).await {
                tracing::warn!(appointment_id = %id, error = %e, "status update failed, reloading board");
                if let Err(reload_err) = self.reload(api).await {
                    tracing::error!(error = %reload_err, "failed to reload board after rollback");
                }
                return Err(e);
            }
        }

        tracing::info!(client = %group.client_name, %from, %to, count = ids.len(), "moved group");
        let group = self
            .group_of(appointment_id)
            .ok_or_else(|| AppError::NotFound(format!("agendamento {appointment_id}")))?;
        Ok((group, ids))
    }
}
