use crate::{
    dates::{self, clock_time, iso_date},
    error::{AgendaError, AgendaResult},
};
use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Ordered appointments, serialized as a bare JSON array.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Appointments {
    entries: Vec<Appointment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// Older files store bare (date, time, description) records; those load as nil
    /// until [`Appointments::assign_missing_ids`] runs.
    #[serde(default = "Uuid::nil")]
    pub id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "clock_time")]
    pub time: Time,
    #[serde(default)]
    pub description: String,
}

/// The user-editable fields of an appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub date: Date,
    pub time: Time,
    pub description: String,
}

impl Draft {
    pub fn new(date: Date, time: Time, description: impl Into<String>) -> Self {
        Self {
            date,
            time,
            description: description.into(),
        }
    }

    pub fn parse(date: &str, time: &str, description: impl Into<String>) -> AgendaResult<Self> {
        Ok(Self::new(
            dates::parse_date(date)?,
            dates::parse_time(time)?,
            description,
        ))
    }
}

impl Appointment {
    pub fn starts_at(&self) -> PrimitiveDateTime {
        PrimitiveDateTime::new(self.date, self.time)
    }

    pub fn matches(&self, date: Date, time: Time, description: &str) -> bool {
        self.date == date && self.time == time && self.description == description
    }

    fn apply(&mut self, draft: Draft) {
        self.date = draft.date;
        self.time = draft.time;
        self.description = draft.description;
    }
}

impl Appointments {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Appointment> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn get(&self, id: Uuid) -> Option<&Appointment> {
        self.entries.iter().find(|a| a.id == id)
    }

    /// Gives every record loaded without an id a fresh one. Returns how many were assigned.
    pub fn assign_missing_ids(&mut self) -> usize {
        let mut assigned = 0;

        for entry in self.entries.iter_mut().filter(|a| a.id.is_nil()) {
            entry.id = Uuid::new_v4();
            assigned += 1;
        }

        assigned
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.entries.iter().position(|a| a.id == id)
    }

    pub fn add(&mut self, draft: Draft) -> &Appointment {
        let index = self.entries.len();

        self.entries.push(Appointment {
            id: Uuid::new_v4(),
            date: draft.date,
            time: draft.time,
            description: draft.description,
        });

        &self.entries[index]
    }

    pub fn edit(&mut self, id: Uuid, draft: Draft) -> AgendaResult<&Appointment> {
        let index = self.position(id).ok_or(AgendaError::NotFound(id))?;

        self.edit_at(index, draft)
    }

    pub fn edit_at(&mut self, index: usize, draft: Draft) -> AgendaResult<&Appointment> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(AgendaError::IndexOutOfRange { index, len })?;

        entry.apply(draft);

        Ok(entry)
    }

    pub fn delete(&mut self, id: Uuid) -> AgendaResult<Appointment> {
        let index = self.position(id).ok_or(AgendaError::NotFound(id))?;

        Ok(self.entries.remove(index))
    }

    /// Removes every appointment with exactly this date, time and description.
    pub fn delete_matching(&mut self, date: Date, time: Time, description: &str) -> Vec<Appointment> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|a| a.matches(date, time, description));

        self.entries = kept;

        removed
    }

    pub fn on(&self, date: Date) -> impl Iterator<Item = &Appointment> {
        self.entries.iter().filter(move |a| a.date == date)
    }
}
