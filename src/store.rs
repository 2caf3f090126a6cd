use crate::{appointments::Appointments, error::StoreError};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

pub const APPOINTMENTS_FILE: &str = "appointments.json";

/// The appointment list on disk, read whole and written whole.
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(APPOINTMENTS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty agenda.
    pub fn load(&self) -> Result<Appointments, StoreError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    /// Like [`Store::load`], but unreadable or corrupt data starts an empty agenda.
    pub fn load_or_empty(&self) -> Appointments {
        self.load().unwrap_or_else(|error| {
            tracing::warn!("Failed to load appointments, starting empty: {error}");
            Appointments::default()
        })
    }

    pub fn persist(&self, appointments: &Appointments) -> Result<(), StoreError> {
        write_json(&self.path, appointments)?;
        tracing::debug!(count = appointments.len(), path = %self.path.display(), "Saved appointments");
        Ok(())
    }
}

/// Reads a JSON document, `None` if the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_reader(BufReader::new(file))
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Replaces a JSON document by writing `<file>.new` and renaming it over the old one.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let mut staged = path.as_os_str().to_owned();
    staged.push(".new");
    let staged = PathBuf::from(staged);

    let mut writer = BufWriter::new(File::create(&staged).map_err(io_error)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_error)?;
    drop(writer);

    fs::rename(&staged, path).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::Draft;
    use time::macros::{date, time};

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::in_dir(dir.path());

        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn persist_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::in_dir(&dir.path().join("nested"));

        let mut appointments = Appointments::default();
        appointments.add(Draft::new(date!(2024 - 03 - 01), time!(09:00), "Dentist"));
        appointments.add(Draft::new(date!(2024 - 03 - 01), time!(09:00), "Dentist"));
        appointments.add(Draft::new(date!(2024 - 12 - 24), time!(18:30), ""));

        store.persist(&appointments).unwrap();

        assert_eq!(store.load().unwrap(), appointments);
        assert!(!dir.path().join("nested").join("appointments.json.new").exists());
    }

    #[test]
    fn persist_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::in_dir(dir.path());

        let mut appointments = Appointments::default();
        appointments.add(Draft::new(date!(2024 - 03 - 01), time!(09:00), "First"));
        store.persist(&appointments).unwrap();

        let empty = Appointments::default();
        store.persist(&empty).unwrap();

        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::in_dir(dir.path());
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
        assert!(store.load_or_empty().is_empty());
    }

    #[test]
    fn invalid_time_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::in_dir(dir.path());
        fs::write(
            store.path(),
            r#"[{"date":"2024-03-01","time":"25:00","description":"x"}]"#,
        )
        .unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }
}
