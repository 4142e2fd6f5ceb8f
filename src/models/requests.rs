use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{datetime, Appointment, AppointmentStatus, BlockedSlot, Professional, User, WorkingHours};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub client_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub professional_id: String,
    pub service_id: String,
    #[serde(with = "datetime")]
    pub start_time: NaiveDateTime,
    pub duration: i32,
    pub price: f64,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockedSlotInput {
    #[serde(with = "datetime")]
    pub start_time: NaiveDateTime,
    #[serde(with = "datetime")]
    pub end_time: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<WorkingHours>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub duration: i32,
    pub price: f64,
    pub active: bool,
}

impl ServiceInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Nome do serviço é obrigatório.".to_string());
        }
        if self.duration <= 0 {
            return Err("Duração deve ser maior que zero.".to_string());
        }
        if self.price < 0.0 {
            return Err("Preço não pode ser negativo.".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ClientInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Nome do cliente é obrigatório.".to_string());
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err("E-mail inválido.".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// Payload of `/appointments/daily-schedule/{date}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyScheduleData {
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default, alias = "blocked")]
    pub blocked_slots: Vec<BlockedSlot>,
    #[serde(default)]
    pub professionals: Vec<Professional>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_update_skips_missing_payment() {
        let update = StatusUpdate {
            status: AppointmentStatus::InService,
            payment_method: None,
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"status":"IN_SERVICE"}"#
        );
    }

    #[test]
    fn test_login_response_aliases() {
        let resp: LoginResponse = serde_json::from_str(r#"{"accessToken":"abc"}"#).unwrap();
        assert_eq!(resp.token, "abc");
        assert!(resp.user.is_none());
    }

    #[test]
    fn test_service_input_validation() {
        let mut input = ServiceInput {
            name: "Corte".to_string(),
            category_id: None,
            duration: 30,
            price: 40.0,
            active: true,
        };
        assert!(input.validate().is_ok());
        input.duration = 0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_client_input_validation() {
        let input = ClientInput {
            name: "Ana".to_string(),
            phone: None,
            email: Some("ana.salao.com".to_string()),
        };
        assert_eq!(input.validate().unwrap_err(), "E-mail inválido.");
    }

    #[test]
    fn test_daily_schedule_defaults() {
        let data: DailyScheduleData = serde_json::from_str(r#"{"appointments":[]}"#).unwrap();
        assert!(data.blocked_slots.is_empty());
        assert!(data.professionals.is_empty());
    }
}
