use crate::models::AppointmentStatus;
use crate::services::scheduling::SchedulingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid token: {0}")]
    Token(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Schedule(#[from] SchedulingError),

    #[error("local storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    /// Text shown to staff and clients in alerts.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Http(_) => {
                "Não foi possível conectar ao servidor. Tente novamente.".to_string()
            }
            AppError::Decode(_) => "Resposta inválida do servidor.".to_string(),
            AppError::Api { status, message } if message.is_empty() => {
                format!("Erro do servidor ({status}).")
            }
            AppError::Api { message, .. } => message.clone(),
            AppError::Unauthorized => "Sessão expirada. Faça login novamente.".to_string(),
            AppError::Token(_) => "Token de acesso inválido. Faça login novamente.".to_string(),
            AppError::Config(msg) => format!("Configuração inválida: {msg}"),
            AppError::NotFound(what) => format!("Não encontrado: {what}"),
            AppError::InvalidTransition { from, to } => format!(
                "Não é possível mover de {} para {}.",
                from.label(),
                to.label()
            ),
            AppError::Validation(msg) => msg.clone(),
            AppError::Schedule(err) => err.to_string(),
            AppError::Storage(_) => "Erro ao acessar os dados locais.".to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized)
    }
}
