use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::game::config::RulesConfig;

const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub player_name: String,
    /// Language override for notices; the system locale is used when absent.
    pub lang: Option<String>,
    pub rules: RulesConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_name: String::new(),
            lang: None,
            rules: RulesConfig::default(),
        }
    }
}

/// One leaderboard line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub score: u64,
    pub date: String,
    pub time: String,
    pub name: String,
}

impl RecordEntry {
    pub fn new(score: u64, name: &str, at: DateTime<Local>) -> Self {
        let name = name.trim();
        Self {
            score,
            date: at.format("%Y-%m-%d").to_string(),
            time: at.format("%H:%M").to_string(),
            name: if name.is_empty() { ANONYMOUS.to_string() } else { name.to_string() },
        }
    }

    pub fn now(score: u64, name: &str) -> Self {
        Self::new(score, name, Local::now())
    }
}

/// Insert and keep the best `limit` entries, highest score first. Earlier
/// entries stay ahead on ties.
pub fn insert_record(records: &mut Vec<RecordEntry>, entry: RecordEntry, limit: usize) {
    records.push(entry);
    records.sort_by(|a, b| b.score.cmp(&a.score));
    records.truncate(limit);
}

/// Leaderboard and campaign progress persistence.
pub trait RecordStore {
    fn load_records(&self) -> Result<Vec<RecordEntry>, StorageError>;

    /// Store `entry` and return the updated leaderboard.
    fn save_record(&mut self, entry: RecordEntry, limit: usize) -> Result<Vec<RecordEntry>, StorageError>;

    /// Highest boss level unlocked; 1 when nothing was saved yet.
    fn load_max_level(&self) -> Result<u32, StorageError>;

    /// Raise the stored level; lower values are ignored.
    fn save_max_level(&mut self, level: u32) -> Result<(), StorageError>;
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    pub records: Vec<RecordEntry>,
    pub max_level: u32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            max_level: 1,
        }
    }
}

impl RecordStore for MemoryStore {
    fn load_records(&self) -> Result<Vec<RecordEntry>, StorageError> {
        Ok(self.records.clone())
    }

    fn save_record(&mut self, entry: RecordEntry, limit: usize) -> Result<Vec<RecordEntry>, StorageError> {
        insert_record(&mut self.records, entry, limit);
        Ok(self.records.clone())
    }

    fn load_max_level(&self) -> Result<u32, StorageError> {
        Ok(self.max_level)
    }

    fn save_max_level(&mut self, level: u32) -> Result<(), StorageError> {
        self.max_level = self.max_level.max(level);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Progress {
    max_level: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self { max_level: 1 }
    }
}

/// `records.json` and `progress.json` in one directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Store under the platform config directory.
    pub fn open() -> Result<Self, StorageError> {
        Ok(Self::at(ensure_config_dir()?))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn records_path(&self) -> PathBuf {
        self.dir.join("records.json")
    }

    fn progress_path(&self) -> PathBuf {
        self.dir.join("progress.json")
    }
}

impl RecordStore for JsonStore {
    fn load_records(&self) -> Result<Vec<RecordEntry>, StorageError> {
        read_json(&self.records_path())
    }

    fn save_record(&mut self, entry: RecordEntry, limit: usize) -> Result<Vec<RecordEntry>, StorageError> {
        let mut records = self.load_records()?;
        insert_record(&mut records, entry, limit);
        write_json(&self.records_path(), &records)?;
        Ok(records)
    }

    fn load_max_level(&self) -> Result<u32, StorageError> {
        let progress: Progress = read_json(&self.progress_path())?;
        Ok(progress.max_level.max(1))
    }

    fn save_max_level(&mut self, level: u32) -> Result<(), StorageError> {
        let current = self.load_max_level()?;
        if level > current {
            write_json(&self.progress_path(), &Progress { max_level: level })?;
        }
        Ok(())
    }
}

fn project_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("io.github", "puzzle-boss-battle", "PuzzleBossBattle")
        .map(|p| p.config_dir().to_path_buf())
}

fn ensure_config_dir() -> io::Result<PathBuf> {
    if let Some(dir) = project_config_dir() {
        fs::create_dir_all(&dir)?;
        Ok(dir)
    } else {
        // Fallback to current directory
        Ok(std::env::current_dir()?)
    }
}

/// A missing file reads as the default value.
fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StorageError> {
    if !path.is_file() {
        return Ok(T::default());
    }
    let mut s = String::new();
    File::open(path)?.read_to_string(&mut s)?;
    Ok(serde_json::from_str(&s)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(value)?;
    let mut f = File::create(path)?;
    f.write_all(data.as_bytes())?;
    Ok(())
}

/// Settings from `path`, or from the config directory when `None`.
/// Anything missing or unreadable falls back to defaults.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match ensure_config_dir() {
            Ok(dir) => dir.join("settings.json"),
            Err(_) => return Settings::default(),
        },
    };
    match read_json(&path) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignoring unreadable settings");
            Settings::default()
        }
    }
}
