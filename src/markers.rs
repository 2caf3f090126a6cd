use crate::appointments::Appointment;
use std::collections::BTreeMap;
use time::{Date, Month};

/// What a calendar day is annotated with.
///
/// Today keeps its own flag when it also has appointments.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub today: bool,
    pub has_appointments: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Today,
    Appointments,
    TodayWithAppointments,
}

impl Marker {
    pub fn kind(&self) -> Option<MarkerKind> {
        match (self.today, self.has_appointments) {
            (true, true) => Some(MarkerKind::TodayWithAppointments),
            (true, false) => Some(MarkerKind::Today),
            (false, true) => Some(MarkerKind::Appointments),
            (false, false) => None,
        }
    }
}

pub type Markers = BTreeMap<Date, Marker>;

pub fn project<'a>(appointments: impl IntoIterator<Item = &'a Appointment>, today: Date) -> Markers {
    let mut marks = Markers::new();

    marks.entry(today).or_default().today = true;

    for appointment in appointments {
        marks.entry(appointment.date).or_default().has_appointments = true;
    }

    tracing::debug!(dates = marks.len(), "Projected calendar markers");

    marks
}

/// The projection restricted to a single month.
pub fn project_month<'a>(
    appointments: impl IntoIterator<Item = &'a Appointment>,
    today: Date,
    year: i32,
    month: Month,
) -> Markers {
    project(appointments, today)
        .into_iter()
        .filter(|(date, _)| date.year() == year && date.month() == month)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::{Appointments, Draft};
    use std::collections::BTreeSet;
    use time::macros::{date, time};

    fn agenda(dates: &[Date]) -> Appointments {
        let mut appointments = Appointments::default();
        for date in dates {
            appointments.add(Draft::new(*date, time!(10:00), "x"));
        }
        appointments
    }

    #[test]
    fn empty_agenda_marks_only_today() {
        let today = date!(2024 - 02 - 28);
        let marks = project(Appointments::default().iter(), today);

        assert_eq!(marks.len(), 1);
        assert_eq!(marks[&today].kind(), Some(MarkerKind::Today));
    }

    #[test]
    fn marks_today_and_appointment_dates_only() {
        let today = date!(2024 - 02 - 28);
        let dates = [date!(2024 - 03 - 01), date!(2024 - 03 - 05), date!(2024 - 03 - 01)];
        let appointments = agenda(&dates);

        let marks = project(appointments.iter(), today);

        let marked: BTreeSet<_> = marks.keys().copied().collect();
        let expected: BTreeSet<_> = dates.iter().copied().chain([today]).collect();
        assert_eq!(marked, expected);
        assert!(marks.values().all(|m| m.kind().is_some()));
        assert_eq!(marks[&date!(2024 - 03 - 01)].kind(), Some(MarkerKind::Appointments));
    }

    #[test]
    fn today_with_appointments_keeps_both_flags() {
        let today = date!(2024 - 03 - 01);
        let appointments = agenda(&[today]);

        let marks = project(appointments.iter(), today);

        assert_eq!(marks.len(), 1);
        assert_eq!(
            marks[&today],
            Marker {
                today: true,
                has_appointments: true
            }
        );
        assert_eq!(marks[&today].kind(), Some(MarkerKind::TodayWithAppointments));
    }

    #[test]
    fn new_appointment_is_marked_alongside_today() {
        let today = date!(2024 - 02 - 20);
        let mut appointments = Appointments::default();
        appointments.add(Draft::new(date!(2024 - 03 - 01), time!(09:00), "Dentist"));

        let marks = project(appointments.iter(), today);

        assert!(marks[&date!(2024 - 03 - 01)].has_appointments);
        assert!(marks[&today].today);
        assert_eq!(marks.len(), 2);
    }

    #[test]
    fn month_projection_drops_other_months() {
        let today = date!(2024 - 02 - 28);
        let appointments = agenda(&[date!(2024 - 03 - 01), date!(2024 - 04 - 01)]);

        let marks = project_month(appointments.iter(), today, 2024, Month::March);

        assert_eq!(marks.keys().copied().collect::<Vec<_>>(), [date!(2024 - 03 - 01)]);
    }
}
