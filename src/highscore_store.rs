use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{HighScoreEntry, HighScoreResponse};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct HighScoreFile {
    version: u8,
    entries: Vec<HighScoreEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct HighScoreFileRaw {
    version: u8,
    entries: Vec<serde_json::Value>,
}

pub struct HighScoreStore {
    file_path: PathBuf,
    capacity: usize,
    entries: Vec<HighScoreEntry>,
}

impl HighScoreStore {
    pub fn new(file_path: PathBuf, capacity: usize) -> Self {
        let mut entries = load_entries(&file_path);
        sort_descending(&mut entries);
        entries.truncate(capacity);
        Self {
            file_path,
            capacity,
            entries,
        }
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    pub fn append(&mut self, score: i32, level: i32) -> bool {
        self.entries.push(HighScoreEntry {
            score,
            level,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        sort_descending(&mut self.entries);
        self.entries.truncate(self.capacity);
        self.save()
    }

    pub fn build_response(&self) -> HighScoreResponse {
        HighScoreResponse {
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            entries: self.entries.clone(),
        }
    }

    fn save(&self) -> bool {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                eprintln!(
                    "[highscore-store] failed to create parent dir {}: {error}",
                    parent.display()
                );
                return false;
            }
        }

        let payload = HighScoreFile {
            version: 1,
            entries: self.entries.clone(),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    eprintln!(
                        "[highscore-store] failed to write {}: {error}",
                        self.file_path.display()
                    );
                    return false;
                }
                true
            }
            Err(error) => {
                eprintln!(
                    "[highscore-store] failed to serialize payload for {}: {error}",
                    self.file_path.display()
                );
                false
            }
        }
    }
}

fn sort_descending(entries: &mut [HighScoreEntry]) {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
}

fn load_entries(path: &Path) -> Vec<HighScoreEntry> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                eprintln!(
                    "[highscore-store] failed to read {}: {error}",
                    path.display()
                );
            }
            return Vec::new();
        }
    };
    let parsed: HighScoreFileRaw = match serde_json::from_str::<HighScoreFileRaw>(&text) {
        Ok(value) if value.version == 1 => value,
        Ok(value) => {
            eprintln!(
                "[highscore-store] unsupported version {} at {}",
                value.version,
                path.display()
            );
            return Vec::new();
        }
        Err(error) => {
            eprintln!(
                "[highscore-store] failed to parse {}: {error}",
                path.display()
            );
            return Vec::new();
        }
    };

    let mut sanitized = Vec::new();
    for (index, raw_value) in parsed.entries.into_iter().enumerate() {
        let entry: HighScoreEntry = match serde_json::from_value(raw_value) {
            Ok(entry) => entry,
            Err(error) => {
                eprintln!(
                    "[highscore-store] failed to parse entry {} in {}: {error}",
                    index,
                    path.display()
                );
                continue;
            }
        };
        if let Some(normalized) = sanitize_entry(entry) {
            sanitized.push(normalized);
        }
    }
    sanitized
}

fn sanitize_entry(value: HighScoreEntry) -> Option<HighScoreEntry> {
    if value.score < 0 || value.level < 1 {
        return None;
    }
    if value.timestamp.trim().is_empty() {
        return None;
    }
    Some(value)
}
