pub mod api;
pub mod calendar;
pub mod daily_schedule;
pub mod grouping;
pub mod kanban;
pub mod scheduling;
