use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::SalonApi;
use crate::errors::AppError;
use crate::models::datetime::format_date;
use crate::models::{
    Appointment, BlockedSlot, BlockedSlotInput, Category, Client, ClientInput, DailyScheduleData,
    LoginResponse, NewAppointment, Professional, ProfessionalInput, Service, ServiceInput,
    StatusUpdate, Tenant, User,
};

pub const TENANT_HEADER: &str = "X-Tenant-ID";
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

pub struct HttpSalonApi {
    base_url: String,
    client: reqwest::Client,
    token: RwLock<Option<String>>,
    tenant_id: RwLock<Option<String>>,
}

impl HttpSalonApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: RwLock::new(None),
            tenant_id: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        if let Some(token) = self.token.read().unwrap_or_else(PoisonError::into_inner).as_deref() {
            builder = builder.bearer_auth(token);
        }
        if let Some(tenant) = self
            .tenant_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
        {
            builder = builder.header(TENANT_HEADER, tenant);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, AppError> {
        let resp = builder.send().await?;
        let status = resp.status();
        let url = resp.url().path().to_string();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = %url, "request rejected with 401");
            return Err(AppError::Unauthorized);
        }

        let body = resp.text().await?;
        if !status.is_success() {
            let message = error_message(&body);
            tracing::warn!(path = %url, status = status.as_u16(), %message, "api request failed");
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(path = %url, status = status.as_u16(), "api request ok");
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let value = self.send(self.request(Method::GET, path)).await?;
        unwrap_envelope(value)
    }

    async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let value = self.send(self.request(Method::GET, path).query(query)).await?;
        unwrap_envelope(value)
    }

    async fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let value = self.send(self.request(method, path).json(body)).await?;
        unwrap_envelope(value)
    }
}

/// Accepts both bare payloads and `{ "data": ... }` envelopes.
fn unwrap_envelope<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    if let Value::Object(map) = &value {
        if let Some(inner) = map.get("data") {
            if let Ok(decoded) = serde_json::from_value(inner.clone()) {
                return Ok(decoded);
            }
        }
    }
    Ok(serde_json::from_value(value)?)
}

fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().chars().take(200).collect();
    };
    match value.get("message").or_else(|| value.get("error")) {
        Some(Value::String(s)) => s.clone(),
        // Validation errors often come back as a list of messages
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl SalonApi for HttpSalonApi {
    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn set_tenant(&self, tenant_id: Option<String>) {
        *self.tenant_id.write().unwrap_or_else(PoisonError::into_inner) = tenant_id;
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let body = json!({ "email": email, "password": password });

        match self
            .write::<_, LoginResponse>(Method::POST, "/auth/enhanced-login", &body)
            .await
        {
            Err(AppError::Api { status: 404, .. }) => {
                tracing::info!("enhanced login unavailable, falling back to /auth/login");
                self.write(Method::POST, "/auth/login", &body).await
            }
            other => other,
        }
    }

    async fn current_user(&self) -> Result<User, AppError> {
        self.get("/users/me").await
    }

    async fn tenant(&self, tenant_id: &str) -> Result<Tenant, AppError> {
        self.get(&format!("/tenants/{tenant_id}")).await
    }

    async fn categories(&self) -> Result<Vec<Category>, AppError> {
        self.get("/categories").await
    }

    async fn services(&self) -> Result<Vec<Service>, AppError> {
        self.get("/services").await
    }

    async fn services_by_category(&self, category_id: &str) -> Result<Vec<Service>, AppError> {
        self.get(&format!("/services-by-category/{category_id}")).await
    }

    async fn save_service(&self, id: Option<&str>, input: &ServiceInput) -> Result<Service, AppError> {
        match id {
            Some(id) => self.write(Method::PUT, &format!("/services/{id}"), input).await,
            None => self.write(Method::POST, "/services", input).await,
        }
    }

    async fn appointments(&self, date: NaiveDate) -> Result<Vec<Appointment>, AppError> {
        self.get_query("/appointments", &[("date", format_date(&date))])
            .await
    }

    async fn create_appointment(&self, request: &NewAppointment) -> Result<Appointment, AppError> {
        self.write(Method::POST, "/appointments", request).await
    }

    async fn update_status(&self, appointment_id: &str, update: &StatusUpdate) -> Result<(), AppError> {
        let path = format!("/appointments/{appointment_id}/status");
        self.send(self.request(Method::PATCH, &path).json(update))
            .await?;
        Ok(())
    }

    async fn daily_schedule(&self, date: NaiveDate) -> Result<DailyScheduleData, AppError> {
        self.get(&format!("/appointments/daily-schedule/{}", format_date(&date)))
            .await
    }

    async fn professionals(&self) -> Result<Vec<Professional>, AppError> {
        self.get("/professionals").await
    }

    async fn save_professional(
        &self,
        id: Option<&str>,
        input: &ProfessionalInput,
    ) -> Result<Professional, AppError> {
        match id {
            Some(id) => self.write(Method::PUT, &format!("/professionals/{id}"), input).await,
            None => self.write(Method::POST, "/professionals", input).await,
        }
    }

    async fn clients(&self) -> Result<Vec<Client>, AppError> {
        self.get("/clients").await
    }

    async fn create_client(&self, input: &ClientInput) -> Result<Client, AppError> {
        self.write(Method::POST, "/clients", input).await
    }

    async fn blocked_slots(
        &self,
        professional_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<BlockedSlot>, AppError> {
        self.get_query(
            &format!("/availability/professional/{professional_id}/blocked-slots"),
            &[("date", format_date(&date))],
        )
        .await
    }

    async fn create_blocked_slot(
        &self,
        professional_id: &str,
        input: &BlockedSlotInput,
    ) -> Result<BlockedSlot, AppError> {
        self.write(
            Method::POST,
            &format!("/availability/professional/{professional_id}/blocked-slots"),
            input,
        )
        .await
    }
}
