//! Report assembly and delivery
//!
//! `ReportEmailer` turns a schedule into an `Email` (recipients from the
//! schedule's report group, one panel render link per report content row)
//! and hands it to a `Mailer`.

pub mod emailer;
pub mod mailer;

pub use emailer::{PanelLink, Report, ReportEmailer, ReportError};
pub use mailer::{Email, LogMailer, MailError, Mailer};
