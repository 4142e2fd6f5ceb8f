use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{datetime, wire};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub client_name: String,
    #[serde(default, deserialize_with = "wire::opt_id")]
    pub client_id: Option<String>,
    #[serde(deserialize_with = "wire::id")]
    pub professional_id: String,
    #[serde(default)]
    pub professional_name: Option<String>,
    #[serde(deserialize_with = "wire::id")]
    pub service_id: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(with = "datetime")]
    pub start_time: NaiveDateTime,
    pub duration: i32,
    #[serde(default, deserialize_with = "wire::amount")]
    pub price: f64,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Appointment {
    pub fn end_time(&self) -> NaiveDateTime {
        self.start_time + Duration::minutes(self.duration as i64)
    }

    /// Whether the appointment still holds its slot on the timeline.
    pub fn is_occupying(&self) -> bool {
        self.status.is_occupying()
    }
}

/// Appointment lifecycle, in the order cards travel across the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    WalkIn,
    Arrived,
    InService,
    ReadyToPay,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const LIFECYCLE: [AppointmentStatus; 7] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::WalkIn,
        AppointmentStatus::Arrived,
        AppointmentStatus::InService,
        AppointmentStatus::ReadyToPay,
        AppointmentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::WalkIn => "WALK_IN",
            AppointmentStatus::Arrived => "ARRIVED",
            AppointmentStatus::InService => "IN_SERVICE",
            AppointmentStatus::ReadyToPay => "READY_TO_PAY",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }

    /// Lenient parse; unknown values fall back to `Scheduled`.
    pub fn parse(s: &str) -> Self {
        Self::try_parse(s).unwrap_or(AppointmentStatus::Scheduled)
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        let status = match normalized.as_str() {
            "SCHEDULED" => AppointmentStatus::Scheduled,
            "CONFIRMED" => AppointmentStatus::Confirmed,
            "WALK_IN" => AppointmentStatus::WalkIn,
            "ARRIVED" => AppointmentStatus::Arrived,
            "IN_SERVICE" => AppointmentStatus::InService,
            "READY_TO_PAY" => AppointmentStatus::ReadyToPay,
            "COMPLETED" => AppointmentStatus::Completed,
            "CANCELLED" | "CANCELED" => AppointmentStatus::Cancelled,
            "NO_SHOW" => AppointmentStatus::NoShow,
            _ => return None,
        };
        Some(status)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Agendado",
            AppointmentStatus::Confirmed => "Confirmado",
            AppointmentStatus::WalkIn => "Encaixe",
            AppointmentStatus::Arrived => "Chegou",
            AppointmentStatus::InService => "Em atendimento",
            AppointmentStatus::ReadyToPay => "Aguardando pagamento",
            AppointmentStatus::Completed => "Concluído",
            AppointmentStatus::Cancelled => "Cancelado",
            AppointmentStatus::NoShow => "Não compareceu",
        }
    }

    /// Position in the linear lifecycle. `None` for cancelled and no-show.
    pub fn position(&self) -> Option<usize> {
        Self::LIFECYCLE.iter().position(|s| s == self)
    }

    pub fn next(&self) -> Option<Self> {
        let idx = self.position()?;
        Self::LIFECYCLE.get(idx + 1).copied()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    pub fn is_occupying(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }

    /// Client-side guard for board moves. Cards may jump forward any number
    /// of columns, or drop out as cancelled / no-show, but never go back.
    pub fn can_transition(&self, to: AppointmentStatus) -> bool {
        if self.is_terminal() || *self == to {
            return false;
        }
        match (self.position(), to.position()) {
            (Some(from), Some(target)) => target > from,
            (_, None) => true,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AppointmentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AppointmentStatus::parse(&raw))
    }
}
