use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use blake3::Hash;

use crate::error::Result;

use super::Settings;

/// Whether a save touched the backing storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Written,
    /// Identical to the last document loaded or written; nothing was done.
    Unchanged,
}

/// Persistence boundary for the settings document.
///
/// Saves always carry the complete document; there is no partial update and
/// the last writer wins.
pub trait SettingsStore {
    /// Latest persisted document, or `None` when nothing was ever saved.
    fn load(&mut self) -> Result<Option<Settings>>;

    fn save(&mut self, settings: &Settings) -> Result<SaveStatus>;
}

/// In-memory store, used by tests and by hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Option<Settings>,
    last: Option<Hash>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(settings: Settings) -> Self {
        Self {
            document: Some(settings),
            ..Self::default()
        }
    }

    pub fn document(&self) -> Option<&Settings> {
        self.document.as_ref()
    }

    /// Number of saves that actually replaced the document.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SettingsStore for MemoryStore {
    fn load(&mut self) -> Result<Option<Settings>> {
        if let Some(doc) = self.document.as_ref() {
            self.last = Some(doc.fingerprint()?);
        }
        Ok(self.document.clone())
    }

    fn save(&mut self, settings: &Settings) -> Result<SaveStatus> {
        let hash = settings.fingerprint()?;
        if self.last == Some(hash) {
            return Ok(SaveStatus::Unchanged);
        }
        self.document = Some(settings.clone());
        self.last = Some(hash);
        self.writes += 1;
        Ok(SaveStatus::Written)
    }
}

/// Settings document stored as pretty-printed JSON on disk.
///
/// Writes go to a sibling temp file first and are renamed into place.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    last: Option<Hash>,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            last: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "settings.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<Settings>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let settings = Settings::from_json(&raw)?;
        self.last = Some(settings.fingerprint()?);
        Ok(Some(settings))
    }

    fn save(&mut self, settings: &Settings) -> Result<SaveStatus> {
        let hash = settings.fingerprint()?;
        if self.last == Some(hash) {
            return Ok(SaveStatus::Unchanged);
        }

        let json = settings.to_json_pretty()?;
        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        self.last = Some(hash);
        Ok(SaveStatus::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::WidgetType;
    use crate::layout::{Layout, WidgetInstance};

    fn sample() -> Settings {
        let mut settings = Settings::default();
        settings.set_layout(&Layout::new(vec![WidgetInstance::new(
            WidgetType::Progress,
            0,
            1,
            4,
            1,
        )]));
        settings
    }

    #[test]
    fn memory_store_skips_identical_saves() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        assert_eq!(store.save(&sample()).unwrap(), SaveStatus::Written);
        assert_eq!(store.save(&sample()).unwrap(), SaveStatus::Unchanged);
        assert_eq!(store.writes(), 1);
        assert_eq!(store.document(), Some(&sample()));
    }

    #[test]
    fn file_store_round_trips_and_skips_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = JsonFileStore::new(&path);
        assert!(store.load().unwrap().is_none());
        assert_eq!(store.save(&sample()).unwrap(), SaveStatus::Written);
        assert!(!dir.path().join("settings.json.tmp").exists());

        let mut reopened = JsonFileStore::new(&path);
        let loaded = reopened.load().unwrap().unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(reopened.save(&loaded).unwrap(), SaveStatus::Unchanged);
    }

    #[test]
    fn file_store_reports_malformed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, crate::error::DashboardError::Json(_)));
    }
}
