//! Session history on disk.
//!
//! Every save writes one JSON file under `<root>/<text|image>/`.  Text
//! sessions additionally move the pointer file (`<root>/last-saved.json`) to
//! the newest file so the next run can pick the conversation back up.  When a
//! resumed session is saved, the file it was resumed from is deleted, keeping
//! at most one resumable text session around.
//!
//! Each file is written to a temporary sibling and renamed into place.  The
//! sequence write, delete, repoint is not transactional: a crash in between
//! can leave an orphaned file or a pointer naming a deleted file.  The latter
//! reads back as "nothing to resume".

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::chat::Config;
use crate::error::{Error, Result};
use crate::observability::{
    HISTORY_RESUME_ERRORS, HISTORY_RESUMES, HISTORY_SAVE_ERRORS, HISTORY_SAVE_SKIPPED,
    HISTORY_SAVES, HISTORY_SUPERSEDED,
};
use crate::types::{ImageAttempt, Message, ModelType};
use crate::utils::time::{history_file_stem, now_in};

/// Name of the pointer file inside the history root.
pub const POINTER_FILE_NAME: &str = "last-saved.json";

/// One element of a saved history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum HistoryEntry {
    /// A transcript message of a text session.
    Message(Message),

    /// A generation attempt of an image session.
    Image(ImageAttempt),
}

/// The contents of one session file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    /// The configuration the session ran with.
    pub config: Config,

    /// Messages or image attempts, in order.
    pub history: Vec<HistoryEntry>,
}

impl SessionRecord {
    /// Builds the record for a session of `model_type`.
    ///
    /// Image sessions keep their attempts; text sessions keep the transcript.
    pub fn new(
        model_type: ModelType,
        config: &Config,
        messages: &[Message],
        images: &[ImageAttempt],
    ) -> Self {
        let history = match model_type {
            ModelType::Image => images.iter().cloned().map(HistoryEntry::Image).collect(),
            ModelType::Text => messages.iter().cloned().map(HistoryEntry::Message).collect(),
        };
        Self {
            config: config.clone(),
            history,
        }
    }

    /// The messages of the history, skipping anything else.
    pub fn transcript(&self) -> Vec<Message> {
        self.history
            .iter()
            .filter_map(|entry| match entry {
                HistoryEntry::Message(message) => Some(message.clone()),
                HistoryEntry::Image(_) => None,
            })
            .collect()
    }
}

/// Contents of the pointer file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LastSavedPointer {
    /// Absolute path of the most recent text session file.
    pub file_path: PathBuf,
}

/// Reads and writes session files below a root directory.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
    offset: UtcOffset,
    resumed_from: Option<PathBuf>,
}

impl HistoryStore {
    /// Creates a store rooted at `root`.  Nothing is touched until a save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            offset: UtcOffset::UTC,
            resumed_from: None,
        }
    }

    /// Names files after the time in `offset` instead of UTC.
    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    /// The history root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where sessions of `model_type` are written.
    pub fn directory_for(&self, model_type: ModelType) -> PathBuf {
        self.root.join(model_type.as_str())
    }

    /// Location of the pointer file.
    pub fn pointer_path(&self) -> PathBuf {
        self.root.join(POINTER_FILE_NAME)
    }

    /// Returns true if a pointer file exists.
    pub fn has_pointer(&self) -> bool {
        self.pointer_path().is_file()
    }

    /// The file this store resumed from, until a save supersedes it.
    pub fn resumed_from(&self) -> Option<&Path> {
        self.resumed_from.as_deref()
    }

    /// Saves a session and reports what happened.
    ///
    /// Returns `None` without touching the disk when there is nothing worth
    /// keeping: no image attempts and no more than the system message.
    /// Otherwise returns a line for the user, either naming the new file or
    /// describing why writing failed.
    pub fn save(
        &mut self,
        model_type: ModelType,
        config: &Config,
        messages: &[Message],
        images: &[ImageAttempt],
    ) -> Option<String> {
        if images.is_empty() && messages.len() <= 1 {
            HISTORY_SAVE_SKIPPED.click();
            return None;
        }

        let record = SessionRecord::new(model_type, config, messages, images);
        let path = match self.write_record(model_type, &record) {
            Ok(path) => path,
            Err(err) => {
                HISTORY_SAVE_ERRORS.click();
                tracing::warn!(error = %err, "failed to save history");
                return Some(format!("Error saving history to file: {err}"));
            }
        };
        HISTORY_SAVES.click();
        tracing::debug!(path = %path.display(), "saved history");

        let mut result = format!("History saved to file: {}", path.display());
        if model_type == ModelType::Text
            && let Err(err) = self.supersede(&path)
        {
            HISTORY_SAVE_ERRORS.click();
            tracing::warn!(error = %err, "failed to update last saved session");
            result.push_str(&format!(" (could not mark it as the last session: {err})"));
        }
        Some(result)
    }

    /// Loads the session named by the pointer file.
    ///
    /// Returns `None` when there is no pointer or when the pointer or the
    /// session file cannot be read; failures are logged.  A successful load
    /// marks the file as resumed so the next text save replaces it.
    pub fn load_last(&mut self) -> Option<SessionRecord> {
        let pointer = match read_json::<LastSavedPointer>(&self.pointer_path()) {
            Ok(Some(pointer)) => pointer,
            Ok(None) => return None,
            Err(err) => {
                HISTORY_RESUME_ERRORS.click();
                tracing::warn!(error = %err, "failed to read last saved session pointer");
                return None;
            }
        };
        match read_json::<SessionRecord>(&pointer.file_path) {
            Ok(Some(record)) => {
                HISTORY_RESUMES.click();
                tracing::debug!(path = %pointer.file_path.display(), "resuming session");
                self.resumed_from = Some(pointer.file_path);
                Some(record)
            }
            Ok(None) => {
                HISTORY_RESUME_ERRORS.click();
                tracing::warn!(
                    path = %pointer.file_path.display(),
                    "last saved session no longer exists"
                );
                None
            }
            Err(err) => {
                HISTORY_RESUME_ERRORS.click();
                tracing::warn!(
                    error = %err,
                    path = %pointer.file_path.display(),
                    "failed to read last saved session"
                );
                None
            }
        }
    }

    fn write_record(&self, model_type: ModelType, record: &SessionRecord) -> Result<PathBuf> {
        let directory = self.directory_for(model_type);
        fs::create_dir_all(&directory).map_err(|err| {
            Error::io(
                format!("failed to create {}: {err}", directory.display()),
                err,
            )
        })?;
        let stem = history_file_stem(now_in(self.offset));
        let path = std::path::absolute(unused_path(&directory, &stem))?;
        write_json_atomically(&path, record)?;
        Ok(path)
    }

    /// Retires the resumed file, if any, and points at `saved`.
    fn supersede(&mut self, saved: &Path) -> Result<()> {
        if let Some(previous) = self.resumed_from.take()
            && previous != saved
        {
            match fs::remove_file(&previous) {
                Ok(()) => HISTORY_SUPERSEDED.click(),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(Error::io(
                        format!("failed to remove {}: {err}", previous.display()),
                        err,
                    ));
                }
            }
        }
        let pointer = LastSavedPointer {
            file_path: saved.to_path_buf(),
        };
        write_json_atomically(&self.pointer_path(), &pointer)
    }
}

/// `<directory>/<stem>.json`, or `<stem>-N.json` with the first free `N`.
fn unused_path(directory: &Path, stem: &str) -> PathBuf {
    let candidate = directory.join(format!("{stem}.json"));
    if !candidate.exists() {
        return candidate;
    }
    (1u32..)
        .map(|n| directory.join(format!("{stem}-{n}.json")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Writes `value` as pretty JSON to a temporary sibling, then renames it over
/// `path`.
fn write_json_atomically<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let invalid = |message: &str| Error::io(message, std::io::ErrorKind::InvalidInput.into());
    let parent = path
        .parent()
        .ok_or_else(|| invalid("path has no parent directory"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| invalid("path has no file name"))?;
    fs::create_dir_all(parent)?;
    let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    let json = serde_json::to_string_pretty(value)?;
    let mut tmp_file = File::create(&tmp_path).map_err(|err| {
        Error::io(format!("failed to create {}: {err}", tmp_path.display()), err)
    })?;
    tmp_file.write_all(json.as_bytes())?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|err| {
        let _ = fs::remove_file(&tmp_path);
        Error::io(format!("failed to write {}: {err}", path.display()), err)
    })
}

/// Reads JSON from `path`; a missing file is `Ok(None)`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(Error::io(
                format!("failed to open {}: {err}", path.display()),
                err,
            ));
        }
    };
    let value = serde_json::from_reader(BufReader::new(file)).map_err(|err| {
        Error::serialization(
            format!("failed to parse {}: {err}", path.display()),
            Some(Box::new(err)),
        )
    })?;
    Ok(Some(value))
}
