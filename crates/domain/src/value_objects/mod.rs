pub mod collaborator_errors;
pub mod enums;
pub mod reminders;
pub mod sweep_actions;
pub mod sweep_reports;
