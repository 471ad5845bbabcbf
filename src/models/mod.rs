pub mod draft;
pub mod mailbox;
pub mod reminder;

pub use draft::ReminderDraft;
pub use mailbox::MailboxId;
pub use reminder::{
    NewReminder, Reminder, Repeat, UpdateReminderRequest, format_remind_at, parse_remind_at,
    remind_at_format, REMIND_AT_FORMAT,
};
