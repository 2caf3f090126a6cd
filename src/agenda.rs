use crate::{
    appointments::{Appointment, Appointments, Draft},
    error::{AgendaError, AgendaResult},
    markers::{self, Markers},
    reminder::{Notifier, ReminderScheduler, ScheduleOutcome},
    store::Store,
};
use std::str::FromStr;
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Which appointment an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Id(Uuid),
    Position(usize),
}

impl FromStr for Target {
    type Err = AgendaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = Uuid::parse_str(s) {
            return Ok(Self::Id(id));
        }

        s.parse()
            .map(Self::Position)
            .map_err(|_| AgendaError::InvalidTarget(s.to_string()))
    }
}

/// Whether the list made it to disk after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    Saved,
    Failed(String),
}

#[derive(Debug)]
pub struct Change {
    pub appointment: Appointment,
    pub persisted: Persisted,
    pub reminder: AgendaResult<ScheduleOutcome>,
}

#[derive(Debug)]
pub struct Removal {
    pub removed: Vec<Appointment>,
    pub persisted: Persisted,
    pub cancelled_reminders: usize,
}

/// The appointment list plus everything that reacts to its changes.
///
/// Every mutation rewrites the whole list to the store; markers are derived on demand.
pub struct Agenda<N> {
    store: Store,
    appointments: Appointments,
    selected: Option<Date>,
    scheduler: ReminderScheduler<N>,
}

impl<N: Notifier> Agenda<N> {
    pub fn open(store: Store, scheduler: ReminderScheduler<N>) -> Self {
        let mut appointments = store.load_or_empty();
        let assigned = appointments.assign_missing_ids();

        tracing::debug!(count = appointments.len(), path = %store.path().display(), "Loaded appointments");

        let agenda = Self {
            store,
            appointments,
            selected: None,
            scheduler,
        };

        if assigned > 0 {
            tracing::info!(assigned, "Assigned ids to appointments stored without one");
            agenda.persist();
        }

        agenda
    }

    pub fn appointments(&self) -> &Appointments {
        &self.appointments
    }

    pub fn scheduler(&self) -> &ReminderScheduler<N> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut ReminderScheduler<N> {
        &mut self.scheduler
    }

    #[cfg(test)]
    pub fn selected(&self) -> Option<Date> {
        self.selected
    }

    pub fn markers(&self, today: Date) -> Markers {
        markers::project(self.appointments.iter(), today)
    }

    /// The "events of the day" panel.
    pub fn today(&self, today: Date) -> Vec<&Appointment> {
        self.appointments.on(today).collect()
    }

    /// Appointments on the selected date, empty when nothing is selected.
    pub fn selected_day(&self) -> Vec<&Appointment> {
        match self.selected {
            Some(date) => self.appointments.on(date).collect(),
            None => Vec::new(),
        }
    }

    pub fn select(&mut self, date: Date) -> Persisted {
        self.selected = Some(date);
        self.persist()
    }

    pub fn add(&mut self, draft: Draft, now: PrimitiveDateTime) -> Change {
        let appointment = self.appointments.add(draft).clone();
        tracing::info!(id = %appointment.id, "Added appointment");

        self.changed(appointment, now)
    }

    pub fn edit(&mut self, target: Target, draft: Draft, now: PrimitiveDateTime) -> AgendaResult<Change> {
        let appointment = match target {
            Target::Id(id) => self.appointments.edit(id, draft)?,
            Target::Position(index) => self.appointments.edit_at(index, draft)?,
        }
        .clone();
        tracing::info!(id = %appointment.id, "Edited appointment");

        Ok(self.changed(appointment, now))
    }

    pub fn delete(&mut self, id: Uuid) -> AgendaResult<Removal> {
        let removed = self.appointments.delete(id)?;
        tracing::info!(%id, "Deleted appointment");

        Ok(self.removed(vec![removed]))
    }

    pub fn delete_matching(&mut self, date: Date, time: Time, description: &str) -> Removal {
        let removed = self.appointments.delete_matching(date, time, description);
        tracing::info!(count = removed.len(), "Deleted matching appointments");

        self.removed(removed)
    }

    fn changed(&mut self, appointment: Appointment, now: PrimitiveDateTime) -> Change {
        let persisted = self.persist();
        let reminder = self.scheduler.schedule(&appointment, now);

        if let Err(error) = &reminder {
            tracing::warn!(id = %appointment.id, "Failed to schedule reminder: {error}");
        }

        Change {
            appointment,
            persisted,
            reminder,
        }
    }

    fn removed(&mut self, removed: Vec<Appointment>) -> Removal {
        let persisted = self.persist();

        let cancelled_reminders = removed
            .iter()
            .filter(|appointment| match self.scheduler.cancel(appointment.id) {
                Ok(cancelled) => cancelled,
                Err(error) => {
                    tracing::warn!(id = %appointment.id, "Failed to cancel reminder: {error}");
                    false
                }
            })
            .count();

        Removal {
            removed,
            persisted,
            cancelled_reminders,
        }
    }

    fn persist(&self) -> Persisted {
        match self.store.persist(&self.appointments) {
            Ok(()) => Persisted::Saved,
            Err(error) => {
                tracing::warn!("Failed to save appointments: {error}");
                Persisted::Failed(error.to_string())
            }
        }
    }
}
