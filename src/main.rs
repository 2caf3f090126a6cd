use agenda::{Agenda, Change, Persisted, Removal, Target};
use appointments::{Appointment, Draft};
use clap::Parser;
use cli::{Cli, Command};
use color_eyre::eyre::WrapErr;
use config::Config;
use markers::MarkerKind;
use queue::ReminderQueue;
use reminder::{ReminderScheduler, ScheduleOutcome};
use store::Store;
use tracing_subscriber::EnvFilter;

mod agenda;
mod appointments;
mod cli;
mod config;
mod dates;
mod desktop;
mod error;
mod markers;
mod queue;
mod reminder;
mod store;

const DEFAULT_LOG_FILTER: &str = "agenda=warn";

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load().wrap_err("Failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let queue = ReminderQueue::open_or_empty(&config.data_dir, config.permission());
    let handles: Vec<_> = queue.handles().collect();
    let scheduler = ReminderScheduler::new(queue, config.reminder_settings()).with_handles(handles);
    let mut agenda = Agenda::open(Store::in_dir(&config.data_dir), scheduler);

    run(&mut agenda, cli.command, dates::now())
}

fn run(
    agenda: &mut Agenda<ReminderQueue>,
    command: Command,
    now: time::PrimitiveDateTime,
) -> color_eyre::Result<()> {
    let today = now.date();

    match command {
        Command::Add {
            date,
            time,
            description,
        } => {
            let draft = Draft::parse(&date, &time, description)?;
            let change = agenda.add(draft, now);

            println!("Added appointment {}", change.appointment.id);
            report_change(&change);
        }
        Command::Edit {
            target,
            date,
            time,
            description,
        } => {
            let target: Target = target.parse()?;
            let draft = Draft::parse(&date, &time, description)?;
            let change = agenda.edit(target, draft, now)?;

            println!("Updated appointment {}", change.appointment.id);
            report_change(&change);
        }
        Command::Remove { id } => {
            let removal = agenda.delete(id)?;

            println!("Removed appointment {id}");
            report_removal(&removal);
        }
        Command::RemoveMatching {
            date,
            time,
            description,
        } => {
            let removal = agenda.delete_matching(
                dates::parse_date(&date)?,
                dates::parse_time(&time)?,
                &description,
            );

            match removal.removed.len() {
                0 => println!("No matching appointments :("),
                n => println!("Removed {n} appointment(s)"),
            }
            report_removal(&removal);
        }
        Command::Day { date } => {
            let date = match date {
                Some(date) => dates::parse_date(&date)?,
                None => today,
            };

            report_persisted(&agenda.select(date));

            println!("{}:", dates::format_date(date));
            print_appointments(&agenda.selected_day());
        }
        Command::Today => {
            println!("Today ({}):", dates::format_date(today));
            print_appointments(&agenda.today(today));
        }
        Command::List => {
            if agenda.appointments().is_empty() {
                println!("No appointments.");
            }

            for (position, appointment) in agenda.appointments().iter().enumerate() {
                println!(
                    "[{position}] {} {} {}\n\tid: {}",
                    dates::format_date(appointment.date),
                    dates::format_time(appointment.time),
                    appointment.description,
                    appointment.id
                );
            }
        }
        Command::Marks { month } => {
            let marks = match month {
                Some(month) => {
                    let (year, month) = dates::parse_month(&month)?;
                    markers::project_month(agenda.appointments().iter(), today, year, month)
                }
                None => agenda.markers(today),
            };

            for (date, marker) in marks {
                let label = match marker.kind() {
                    Some(MarkerKind::Today) => "today",
                    Some(MarkerKind::Appointments) => "appointments",
                    Some(MarkerKind::TodayWithAppointments) => "today, appointments",
                    None => continue,
                };

                println!("{} {label}", dates::format_date(date));
            }
        }
        Command::Reminders => {
            let pending = agenda.scheduler().notifier().pending();

            if pending.is_empty() {
                println!("No pending reminders.");
            }

            for queued in pending {
                println!(
                    "{} {} ({})",
                    dates::format_datetime(queued.reminder.trigger),
                    queued.reminder.body,
                    queued.reminder.payload.appointment_id
                );
            }
        }
        Command::Notify => {
            let due = agenda
                .scheduler_mut()
                .notifier_mut()
                .take_due(now)
                .wrap_err("Failed to update reminders")?;

            let mut undelivered = Vec::new();
            for queued in due {
                match desktop::show(&queued.reminder) {
                    Ok(()) => println!("Notified: {}", queued.reminder.body),
                    Err(error) => {
                        tracing::warn!("Reminder could not be shown, will retry: {error}");
                        undelivered.push(queued);
                    }
                }
            }

            agenda
                .scheduler_mut()
                .notifier_mut()
                .requeue(undelivered)
                .wrap_err("Failed to requeue undelivered reminders")?;
        }
    }

    Ok(())
}

fn print_appointments(appointments: &[&Appointment]) {
    if appointments.is_empty() {
        println!("\tNothing planned.");
    }

    for appointment in appointments {
        println!(
            "\t{} {} ({})",
            dates::format_time(appointment.time),
            appointment.description,
            appointment.id
        );
    }
}

fn report_change(change: &Change) {
    report_persisted(&change.persisted);

    match &change.reminder {
        Ok(ScheduleOutcome::Scheduled { trigger, .. }) => {
            println!("Reminder set for {}", dates::format_datetime(*trigger))
        }
        Ok(ScheduleOutcome::Skipped(reason)) => println!("No reminder set: {reason}"),
        Ok(ScheduleOutcome::PermissionDenied) => {
            println!("Notifications are disabled, no reminder was set")
        }
        Err(error) => eprintln!("Warning: reminder could not be set: {error}"),
    }
}

fn report_removal(removal: &Removal) {
    report_persisted(&removal.persisted);

    if removal.cancelled_reminders > 0 {
        println!("Cancelled {} reminder(s)", removal.cancelled_reminders);
    }
}

fn report_persisted(persisted: &Persisted) {
    if let Persisted::Failed(reason) = persisted {
        eprintln!("Warning: changes were not saved: {reason}");
    }
}
