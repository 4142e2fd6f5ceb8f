pub mod appointment;
pub mod blocked_slot;
pub mod catalog;
pub mod datetime;
pub mod group;
pub mod people;
pub mod requests;
pub mod user;
pub mod wire;
pub mod working_hours;

pub use appointment::{Appointment, AppointmentStatus};
pub use blocked_slot::BlockedSlot;
pub use catalog::{Category, Service};
pub use group::AppointmentGroup;
pub use people::{Client, Professional, Tenant};
pub use requests::{
    BlockedSlotInput, ClientInput, DailyScheduleData, LoginResponse, NewAppointment,
    ProfessionalInput, ServiceInput, StatusUpdate,
};
pub use user::{Role, User};
pub use working_hours::{TimeWindow, WorkingHours};
