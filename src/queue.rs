use crate::{
    error::{AgendaResult, StoreError},
    reminder::{Notifier, Permission, Reminder, ReminderHandle},
    store,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;
use uuid::Uuid;

pub const REMINDERS_FILE: &str = "reminders.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queued {
    pub handle: ReminderHandle,
    pub reminder: Reminder,
}

/// Pending reminders kept on disk until `take_due` hands them out.
pub struct ReminderQueue {
    path: PathBuf,
    permission: Permission,
    pending: Vec<Queued>,
}

impl ReminderQueue {
    pub fn open(dir: &Path, permission: Permission) -> Result<Self, StoreError> {
        let path = dir.join(REMINDERS_FILE);
        let pending = store::read_json(&path)?.unwrap_or_default();

        Ok(Self {
            path,
            permission,
            pending,
        })
    }

    /// Like [`ReminderQueue::open`], but an unreadable queue starts empty.
    pub fn open_or_empty(dir: &Path, permission: Permission) -> Self {
        Self::open(dir, permission).unwrap_or_else(|error| {
            tracing::warn!("Failed to load reminders, starting empty: {error}");
            Self {
                path: dir.join(REMINDERS_FILE),
                permission,
                pending: Vec::new(),
            }
        })
    }

    pub fn pending(&self) -> &[Queued] {
        &self.pending
    }

    /// Appointment id to handle of every pending reminder.
    pub fn handles(&self) -> impl Iterator<Item = (Uuid, ReminderHandle)> + '_ {
        self.pending
            .iter()
            .map(|queued| (queued.reminder.payload.appointment_id, queued.handle))
    }

    /// Removes and returns every reminder whose trigger is at or before `now`.
    pub fn take_due(&mut self, now: PrimitiveDateTime) -> AgendaResult<Vec<Queued>> {
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|queued| queued.reminder.trigger <= now);

        self.pending = pending;

        if !due.is_empty() {
            self.save()?;
        }

        tracing::debug!(due = due.len(), pending = self.pending.len(), "Drained reminder queue");

        Ok(due)
    }

    /// Puts reminders that could not be delivered back, keeping their handles.
    pub fn requeue(&mut self, undelivered: Vec<Queued>) -> AgendaResult<()> {
        if undelivered.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = undelivered.len(), "Requeued undelivered reminders");

        self.pending.extend(undelivered);
        self.pending.sort_by_key(|queued| queued.reminder.trigger);
        self.save()?;

        Ok(())
    }

    fn save(&self) -> Result<(), StoreError> {
        store::write_json(&self.path, &self.pending)
    }
}

impl Notifier for ReminderQueue {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn schedule(&mut self, reminder: Reminder) -> AgendaResult<ReminderHandle> {
        let handle = ReminderHandle::new();

        self.pending.push(Queued { handle, reminder });
        self.pending.sort_by_key(|queued| queued.reminder.trigger);
        self.save()?;

        Ok(handle)
    }

    fn cancel(&mut self, handle: ReminderHandle) -> AgendaResult<()> {
        let before = self.pending.len();
        self.pending.retain(|queued| queued.handle != handle);

        if self.pending.len() != before {
            self.save()?;
        }

        Ok(())
    }
}
