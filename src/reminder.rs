use crate::{
    appointments::Appointment,
    dates::{self, clock_time, iso_date, local_datetime},
    error::AgendaResult,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::{Date, Duration, PrimitiveDateTime, Time};
use uuid::Uuid;

pub const DEFAULT_OFFSET_MINUTES: i64 = 5;
pub const DEFAULT_TITLE: &str = "Appointment reminder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderHandle(pub Uuid);

impl ReminderHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReminderHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// A one-shot notification fired before an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(with = "local_datetime")]
    pub trigger: PrimitiveDateTime,
    pub title: String,
    pub body: String,
    pub payload: Payload,
}

/// The appointment a reminder was created for, as it was at scheduling time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub appointment_id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "clock_time")]
    pub time: Time,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Platform service that delivers reminders.
pub trait Notifier {
    fn permission(&self) -> Permission;

    fn schedule(&mut self, reminder: Reminder) -> AgendaResult<ReminderHandle>;

    fn cancel(&mut self, handle: ReminderHandle) -> AgendaResult<()>;
}

/// What to do when the trigger time has already passed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PastTriggerPolicy {
    /// Fire right away if the appointment itself has not started yet.
    #[default]
    FireNow,
    Skip,
}

#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub offset: Duration,
    pub policy: PastTriggerPolicy,
    pub title: String,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            offset: Duration::minutes(DEFAULT_OFFSET_MINUTES),
            policy: PastTriggerPolicy::default(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled {
        handle: ReminderHandle,
        trigger: PrimitiveDateTime,
    },
    Skipped(SkipReason),
    PermissionDenied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TriggerPassed { trigger: PrimitiveDateTime },
    AlreadyStarted { starts_at: PrimitiveDateTime },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TriggerPassed { trigger } => {
                write!(f, "reminder time {} has passed", dates::format_datetime(*trigger))
            }
            SkipReason::AlreadyStarted { starts_at } => {
                write!(f, "appointment started at {}", dates::format_datetime(*starts_at))
            }
        }
    }
}

/// Keeps at most one outstanding reminder per appointment.
pub struct ReminderScheduler<N> {
    notifier: N,
    settings: ReminderSettings,
    handles: HashMap<Uuid, ReminderHandle>,
}

impl<N: Notifier> ReminderScheduler<N> {
    pub fn new(notifier: N, settings: ReminderSettings) -> Self {
        Self {
            notifier,
            settings,
            handles: HashMap::new(),
        }
    }

    /// Seeds the handles of reminders scheduled by an earlier run.
    pub fn with_handles(mut self, handles: impl IntoIterator<Item = (Uuid, ReminderHandle)>) -> Self {
        self.handles.extend(handles);
        self
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    #[cfg(test)]
    pub fn handle_for(&self, appointment_id: Uuid) -> Option<ReminderHandle> {
        self.handles.get(&appointment_id).copied()
    }

    /// Event time minus the configured offset, `None` if that underflows the calendar.
    pub fn trigger_for(&self, appointment: &Appointment) -> Option<PrimitiveDateTime> {
        appointment.starts_at().checked_sub(self.settings.offset)
    }

    pub fn reminder(&self, appointment: &Appointment, trigger: PrimitiveDateTime) -> Reminder {
        let at = dates::format_time(appointment.time);
        let body = if appointment.description.is_empty() {
            format!("Starts at {at}")
        } else {
            format!("{} starts at {at}", appointment.description)
        };

        Reminder {
            trigger,
            title: self.settings.title.clone(),
            body,
            payload: Payload {
                appointment_id: appointment.id,
                date: appointment.date,
                time: appointment.time,
                description: appointment.description.clone(),
            },
        }
    }

    /// Schedules a reminder for the appointment, replacing any earlier one.
    pub fn schedule(
        &mut self,
        appointment: &Appointment,
        now: PrimitiveDateTime,
    ) -> AgendaResult<ScheduleOutcome> {
        self.cancel(appointment.id)?;

        if self.notifier.permission() == Permission::Denied {
            tracing::warn!(id = %appointment.id, "Notification permission denied, reminder not scheduled");
            return Ok(ScheduleOutcome::PermissionDenied);
        }

        let starts_at = appointment.starts_at();
        if starts_at <= now {
            return Ok(self.skip(appointment, SkipReason::AlreadyStarted { starts_at }));
        }

        let trigger = match self.trigger_for(appointment) {
            Some(trigger) if trigger >= now => trigger,
            passed => match self.settings.policy {
                PastTriggerPolicy::FireNow => now,
                PastTriggerPolicy::Skip => {
                    let trigger = passed.unwrap_or(now);
                    return Ok(self.skip(appointment, SkipReason::TriggerPassed { trigger }));
                }
            },
        };

        let reminder = self.reminder(appointment, trigger);
        let handle = self.notifier.schedule(reminder)?;
        self.handles.insert(appointment.id, handle);

        tracing::info!(
            id = %appointment.id,
            trigger = %dates::format_datetime(trigger),
            "Scheduled reminder"
        );

        Ok(ScheduleOutcome::Scheduled { handle, trigger })
    }

    /// Cancels the outstanding reminder of an appointment, if any.
    pub fn cancel(&mut self, appointment_id: Uuid) -> AgendaResult<bool> {
        let Some(handle) = self.handles.remove(&appointment_id) else {
            return Ok(false);
        };

        self.notifier.cancel(handle)?;
        tracing::info!(id = %appointment_id, "Cancelled reminder");

        Ok(true)
    }

    fn skip(&self, appointment: &Appointment, reason: SkipReason) -> ScheduleOutcome {
        tracing::info!(id = %appointment.id, "Reminder skipped: {reason}");
        ScheduleOutcome::Skipped(reason)
    }
}


#[cfg(test)]
mod tests {
    use super::{testing::RecordingNotifier, *};
    use crate::appointments::{Appointments, Draft};
    use time::macros::{date, datetime, time};

    fn appointment(date: Date, time: Time, description: &str) -> Appointment {
        let mut appointments = Appointments::default();
        appointments.add(Draft::new(date, time, description)).clone()
    }

    fn scheduler(policy: PastTriggerPolicy) -> ReminderScheduler<RecordingNotifier> {
        ReminderScheduler::new(
            RecordingNotifier::granted(),
            ReminderSettings {
                policy,
                ..ReminderSettings::default()
            },
        )
    }

    #[test]
    fn triggers_five_minutes_before() {
        let mut scheduler = scheduler(PastTriggerPolicy::FireNow);
        let dentist = appointment(date!(2024 - 03 - 01), time!(09:00), "Dentist");

        let outcome = scheduler.schedule(&dentist, datetime!(2024-02-01 12:00)).unwrap();

        assert!(matches!(
            outcome,
            ScheduleOutcome::Scheduled { trigger, .. } if trigger == datetime!(2024-03-01 08:55)
        ));

        let reminder = &scheduler.notifier().scheduled[0].1;
        assert_eq!(reminder.title, DEFAULT_TITLE);
        assert_eq!(reminder.body, "Dentist starts at 09:00");
        assert_eq!(
            reminder.payload,
            Payload {
                appointment_id: dentist.id,
                date: date!(2024 - 03 - 01),
                time: time!(09:00),
                description: "Dentist".to_string(),
            }
        );
    }

    #[test]
    fn offset_crosses_midnight() {
        let scheduler = scheduler(PastTriggerPolicy::FireNow);
        let early = appointment(date!(2024 - 03 - 01), time!(00:02), "");

        assert_eq!(scheduler.trigger_for(&early), Some(datetime!(2024-02-29 23:57)));
    }

    #[test]
    fn passed_trigger_fires_now_by_default() {
        let mut scheduler = scheduler(PastTriggerPolicy::FireNow);
        let soon = appointment(date!(2024 - 03 - 01), time!(09:00), "Soon");
        let now = datetime!(2024-03-01 08:58);

        let outcome = scheduler.schedule(&soon, now).unwrap();

        assert!(matches!(outcome, ScheduleOutcome::Scheduled { trigger, .. } if trigger == now));
    }

    #[test]
    fn passed_trigger_is_skipped_when_configured() {
        let mut scheduler = scheduler(PastTriggerPolicy::Skip);
        let soon = appointment(date!(2024 - 03 - 01), time!(09:00), "Soon");

        let outcome = scheduler.schedule(&soon, datetime!(2024-03-01 08:58)).unwrap();

        assert_eq!(
            outcome,
            ScheduleOutcome::Skipped(SkipReason::TriggerPassed {
                trigger: datetime!(2024-03-01 08:55)
            })
        );
        assert!(scheduler.notifier().scheduled.is_empty());
    }

    #[test]
    fn started_appointments_are_skipped() {
        let mut scheduler = scheduler(PastTriggerPolicy::FireNow);
        let past = appointment(date!(2024 - 03 - 01), time!(09:00), "Past");

        let outcome = scheduler.schedule(&past, datetime!(2024-03-01 09:00)).unwrap();

        assert_eq!(
            outcome,
            ScheduleOutcome::Skipped(SkipReason::AlreadyStarted {
                starts_at: datetime!(2024-03-01 09:00)
            })
        );
    }

    #[test]
    fn denied_permission_skips_scheduling() {
        let mut scheduler =
            ReminderScheduler::new(RecordingNotifier::denied(), ReminderSettings::default());
        let dentist = appointment(date!(2024 - 03 - 01), time!(09:00), "Dentist");

        let outcome = scheduler.schedule(&dentist, datetime!(2024-02-01 12:00)).unwrap();

        assert_eq!(outcome, ScheduleOutcome::PermissionDenied);
        assert!(scheduler.notifier().scheduled.is_empty());
    }

    #[test]
    fn rescheduling_cancels_the_previous_reminder() {
        let mut scheduler = scheduler(PastTriggerPolicy::FireNow);
        let mut dentist = appointment(date!(2024 - 03 - 01), time!(09:00), "Dentist");
        let now = datetime!(2024-02-01 12:00);

        scheduler.schedule(&dentist, now).unwrap();
        let first = scheduler.handle_for(dentist.id).unwrap();

        dentist.time = time!(10:00);
        scheduler.schedule(&dentist, now).unwrap();

        assert_eq!(scheduler.notifier().cancelled, [first]);
        let pending = scheduler.notifier().pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].trigger, datetime!(2024-03-01 09:55));
    }

    #[test]
    fn cancel_without_reminder_is_a_no_op() {
        let mut scheduler = scheduler(PastTriggerPolicy::FireNow);

        assert!(!scheduler.cancel(Uuid::new_v4()).unwrap());
        assert!(scheduler.notifier().cancelled.is_empty());
    }

    #[test]
    fn seeded_handles_can_be_cancelled() {
        let id = Uuid::new_v4();
        let handle = ReminderHandle::new();
        let mut scheduler = scheduler(PastTriggerPolicy::FireNow).with_handles([(id, handle)]);

        assert!(scheduler.cancel(id).unwrap());
        assert_eq!(scheduler.notifier().cancelled, [handle]);
    }
}
