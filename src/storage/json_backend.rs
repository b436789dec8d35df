use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::{
    errors::{BudgetError, Result},
    ledger::BudgetState,
    utils::paths::{ensure_dir, PathResolver},
};

use super::{migrate, LoadReport, Snapshot, StorageBackend, CURRENT_VERSION};

const BACKUP_EXTENSION: &str = "json";
const BACKUP_PREFIX: &str = "snapshot";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Stores the budget as one JSON file, keeping timestamped copies of the
/// previous versions.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    snapshot_file: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = PathResolver::resolve_base(root);
        ensure_dir(&app_root)?;
        let backups_dir = PathResolver::backup_dir_in(&app_root);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            snapshot_file: PathResolver::snapshot_file_in(&app_root),
            root: app_root,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_file
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(b)
                .cmp(&parse_backup_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    fn backup_existing_file(&self) -> Result<()> {
        if !self.snapshot_file.exists() {
            return Ok(());
        }
        ensure_dir(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut backup_path = self
            .backups_dir
            .join(format!("{BACKUP_PREFIX}_{timestamp}.{BACKUP_EXTENSION}"));
        let mut suffix = 1;
        while backup_path.exists() {
            backup_path = self.backups_dir.join(format!(
                "{BACKUP_PREFIX}_{timestamp}_{suffix}.{BACKUP_EXTENSION}"
            ));
            suffix += 1;
        }
        fs::copy(&self.snapshot_file, &backup_path)?;
        debug!(path = %backup_path.display(), "previous snapshot backed up");
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<()> {
        let backups = self.list_backups()?;
        for name in backups.iter().skip(self.retention) {
            let _ = fs::remove_file(self.backups_dir.join(name));
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn load(&self, today: NaiveDate) -> Result<Option<LoadReport>> {
        if !self.snapshot_file.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.snapshot_file)?;
        let mut raw: serde_json::Value = serde_json::from_str(&data)?;
        let version = migrate::snapshot_version(&raw)?;
        let migrations = migrate::upgrade(&mut raw, today)?;
        let snapshot: Snapshot = serde_json::from_value(raw)?;
        if snapshot.version != CURRENT_VERSION {
            return Err(BudgetError::StorageError(format!(
                "snapshot version {} did not migrate to {CURRENT_VERSION}",
                snapshot.version
            )));
        }
        info!(
            path = %self.snapshot_file.display(),
            version = version.as_str(),
            migrations = migrations.len(),
            "snapshot loaded"
        );
        Ok(Some(LoadReport {
            state: snapshot.state,
            version,
            migrations,
            path: self.snapshot_file.clone(),
        }))
    }

    fn save(&self, state: &BudgetState) -> Result<()> {
        self.backup_existing_file()?;
        let json = serde_json::to_string_pretty(&Snapshot::new(state.clone()))?;
        let tmp = tmp_path(&self.snapshot_file);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.snapshot_file)?;
        debug!(path = %self.snapshot_file.display(), "snapshot saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.snapshot_file.exists() {
            fs::remove_file(&self.snapshot_file)?;
        }
        if self.backups_dir.exists() {
            fs::remove_dir_all(&self.backups_dir)?;
        }
        info!(path = %self.root.display(), "persisted snapshot cleared");
        Ok(())
    }
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{BACKUP_EXTENSION}"))?;
    let rest = stem.strip_prefix(&format!("{BACKUP_PREFIX}_"))?;
    let raw = rest.get(..15)?;
    NaiveDateTime::parse_from_str(raw, BACKUP_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

pub(crate) fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn storage_with_temp_dir(retention: usize) -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage = JsonStorage::new(Some(temp.path().to_path_buf()), Some(retention))
            .expect("json storage");
        (storage, temp)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 20).unwrap()
    }

    fn sample_state() -> BudgetState {
        let mut state = BudgetState::new(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        state.income.savings.credit(Money::from_cents(1_050));
        state
    }

    #[test]
    fn missing_snapshot_loads_as_none() {
        let (storage, _guard) = storage_with_temp_dir(3);
        assert!(storage.load(today()).unwrap().is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir(3);
        let state = sample_state();
        storage.save(&state).expect("save snapshot");
        let report = storage.load(today()).expect("load snapshot").expect("snapshot present");
        assert_eq!(report.state, state);
        assert_eq!(report.version, CURRENT_VERSION);
        assert!(report.migrations.is_empty());
        assert!(!tmp_path(storage.snapshot_path()).exists());
    }

    #[test]
    fn backups_are_pruned_to_retention() {
        let (storage, _guard) = storage_with_temp_dir(2);
        let state = sample_state();
        for _ in 0..5 {
            storage.save(&state).unwrap();
        }
        assert_eq!(storage.list_backups().unwrap().len(), 2);
    }

    #[test]
    fn clear_removes_snapshot_and_backups() {
        let (storage, _guard) = storage_with_temp_dir(3);
        storage.save(&sample_state()).unwrap();
        storage.save(&sample_state()).unwrap();
        storage.clear().unwrap();
        assert!(!storage.snapshot_path().exists());
        assert!(storage.list_backups().unwrap().is_empty());
        assert!(storage.load(today()).unwrap().is_none());
    }

    #[test]
    fn corrupt_snapshot_is_a_storage_error() {
        let (storage, _guard) = storage_with_temp_dir(3);
        fs::write(storage.snapshot_path(), "{ not json").unwrap();
        assert!(matches!(storage.load(today()), Err(BudgetError::StorageError(_))));
    }
}
