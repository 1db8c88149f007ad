//! Route handlers organized by resource

pub mod content;
pub mod health;
pub mod report_groups;
pub mod schedules;
pub mod settings;
pub mod test_email;
