pub mod http;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::{
    Appointment, BlockedSlot, BlockedSlotInput, Category, Client, ClientInput, DailyScheduleData,
    LoginResponse, NewAppointment, Professional, ProfessionalInput, Service, ServiceInput,
    StatusUpdate, Tenant, User,
};

/// The salon REST API as the apps consume it.
#[async_trait]
pub trait SalonApi: Send + Sync {
    /// Replaces the bearer token sent with every request.
    fn set_token(&self, token: Option<String>);

    fn set_tenant(&self, tenant_id: Option<String>);

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError>;

    async fn current_user(&self) -> Result<User, AppError>;

    async fn tenant(&self, tenant_id: &str) -> Result<Tenant, AppError>;

    async fn categories(&self) -> Result<Vec<Category>, AppError>;

    async fn services(&self) -> Result<Vec<Service>, AppError>;

    async fn services_by_category(&self, category_id: &str) -> Result<Vec<Service>, AppError>;

    async fn save_service(&self, id: Option<&str>, input: &ServiceInput) -> Result<Service, AppError>;

    async fn appointments(&self, date: NaiveDate) -> Result<Vec<Appointment>, AppError>;

    async fn create_appointment(&self, request: &NewAppointment) -> Result<Appointment, AppError>;

    async fn update_status(&self, appointment_id: &str, update: &StatusUpdate) -> Result<(), AppError>;

    async fn daily_schedule(&self, date: NaiveDate) -> Result<DailyScheduleData, AppError>;

    async fn professionals(&self) -> Result<Vec<Professional>, AppError>;

    async fn save_professional(
        &self,
        id: Option<&str>,
        input: &ProfessionalInput,
    ) -> Result<Professional, AppError>;

    async fn clients(&self) -> Result<Vec<Client>, AppError>;

    async fn create_client(&self, input: &ClientInput) -> Result<Client, AppError>;

    async fn blocked_slots(
        &self,
        professional_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<BlockedSlot>, AppError>;

    async fn create_blocked_slot(
        &self,
        professional_id: &str,
        input: &BlockedSlotInput,
    ) -> Result<BlockedSlot, AppError>;
}
