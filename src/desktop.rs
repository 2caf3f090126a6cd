use crate::{
    error::{AgendaError, AgendaResult},
    reminder::Reminder,
};
use notify_rust::{Notification, Timeout};

pub fn show(reminder: &Reminder) -> AgendaResult<()> {
    Notification::new()
        .appname(env!("CARGO_PKG_NAME"))
        .summary(&reminder.title)
        .body(&reminder.body)
        .timeout(Timeout::Never)
        .show()
        .map(|_| ())
        .map_err(|e| AgendaError::Notify(e.to_string()))
}
