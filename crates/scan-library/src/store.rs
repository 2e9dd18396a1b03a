//! Document directory.
//!
//! Every document is one file `<stem>.<extension>` directly inside the
//! library directory. Writes land in a hidden `.<file>.partial` sibling
//! first and are renamed into place once flushed, so a listing never
//! shows a half-written document. Mutations are serialised through one
//! lock; reads are not.

use crate::types::*;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};

type StoreResult<T> = std::result::Result<T, StorageError>;

/// Pick a name `<base>_<n>` that no existing document uses.
///
/// `n` starts at `now_secs` (seconds since the Unix epoch) but never below
/// one past the largest numeric suffix already present, so generated names
/// keep increasing even when the clock moves backwards. If the largest
/// suffix is already `u64::MAX`, the first free number from `now_secs` on is
/// used. `existing` may hold stems or file names.
pub fn generate_unique_name<'a, I>(base: &str, existing: I, now_secs: u64) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let stems: HashSet<&str> = existing.into_iter().map(strip_extension).collect();
    let prefix = format!("{base}_");

    let next_after_existing = stems
        .iter()
        .filter_map(|stem| stem.strip_prefix(&prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .and_then(|n| n.checked_add(1));

    let mut n = next_after_existing.map_or(now_secs, |next| now_secs.max(next));
    // Only finitely many stems can be taken, so the wrapping scan ends
    loop {
        let candidate = format!("{prefix}{n}");
        if !stems.contains(candidate.as_str()) {
            return candidate;
        }
        n = n.wrapping_add(1);
    }
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.parse::<u64>().is_err() => stem,
        _ => name,
    }
}

/// Turn user input into a file stem, or `None` when nothing usable remains
fn sanitize_stem(name: &str, extension: &str) -> Option<String> {
    let trimmed = name.trim();
    let without_ext = trimmed
        .strip_suffix(extension)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(trimmed);
    let cleaned: String = without_ext
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

pub struct DocumentStore {
    root: PathBuf,
    extension: String,
    write_lock: Mutex<()>,
}

impl DocumentStore {
    /// Open (creating if needed) the library directory
    pub async fn open(root: impl Into<PathBuf>, extension: impl Into<String>) -> StoreResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        log::debug!("Opened document store at {}", root.display());
        Ok(Self {
            root,
            extension: extension.into(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Location of a document on disk
    pub fn path_of(&self, handle: &DocumentHandle) -> StoreResult<PathBuf> {
        let name = handle.as_str();
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || Path::new(name).file_name() != Some(OsStr::new(name))
        {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.extension)
    }

    fn is_document(&self, name: &str) -> bool {
        !name.starts_with('.')
            && Path::new(name)
                .extension()
                .is_some_and(|ext| ext == self.extension.as_str())
    }

    /// All visible documents, oldest first
    pub async fn list(&self) -> StoreResult<Vec<DocumentEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(item) = dir.next_entry().await? {
            let Some(name) = item.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !self.is_document(&name) {
                continue;
            }
            // Entries can vanish between read_dir and stat
            let metadata = match item.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            entries.push(DocumentEntry::new(
                DocumentHandle::new(name),
                created_at(&metadata),
            ));
        }
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    /// Keep every mutation out until the guard is dropped
    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    async fn existing_stems(&self) -> StoreResult<Vec<String>> {
        let mut stems = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(item) = dir.next_entry().await? {
            if let Some(name) = item.file_name().to_str() {
                if !name.starts_with('.') {
                    stems.push(strip_extension(name).to_string());
                }
            }
        }
        Ok(stems)
    }

    /// Store `bytes` under `name` (a stem; the extension is added)
    pub async fn write(&self, name: &str, bytes: &[u8]) -> StoreResult<DocumentEntry> {
        let stem = sanitize_stem(name, &self.extension)
            .ok_or_else(|| StorageError::InvalidName(name.to_string()))?;
        let _guard = self.write_lock.lock().await;
        self.write_locked(&stem, bytes).await
    }

    /// Store `bytes` under a freshly generated `<base>_<n>` name
    pub async fn write_new(&self, base: &str, bytes: &[u8]) -> StoreResult<DocumentEntry> {
        let base = sanitize_stem(base, &self.extension)
            .ok_or_else(|| StorageError::InvalidName(base.to_string()))?;
        let _guard = self.write_lock.lock().await;
        let existing = self.existing_stems().await?;
        let stem = generate_unique_name(&base, existing.iter().map(String::as_str), now_secs());
        self.write_locked(&stem, bytes).await
    }

    async fn write_locked(&self, stem: &str, bytes: &[u8]) -> StoreResult<DocumentEntry> {
        let file_name = self.file_name(stem);
        let target = self.root.join(&file_name);
        if tokio::fs::try_exists(&target).await? {
            return Err(StorageError::NameCollision(file_name));
        }

        let partial = self.root.join(format!(".{file_name}.partial"));
        if let Err(e) = write_synced(&partial, bytes).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(StorageError::from_write(e));
        }
        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(StorageError::from_write(e));
        }

        let metadata = tokio::fs::metadata(&target).await?;
        log::info!("Stored {} ({} bytes)", file_name, bytes.len());
        Ok(DocumentEntry::new(
            DocumentHandle::new(file_name),
            created_at(&metadata),
        ))
    }

    /// Give a document a new name; renaming to its current name is a no-op
    pub async fn rename(
        &self,
        handle: &DocumentHandle,
        new_name: &str,
    ) -> StoreResult<DocumentEntry> {
        let source = self.path_of(handle)?;
        let stem = sanitize_stem(new_name, &self.extension)
            .ok_or_else(|| StorageError::InvalidName(new_name.to_string()))?;
        let file_name = self.file_name(&stem);

        let _guard = self.write_lock.lock().await;
        let metadata = match tokio::fs::metadata(&source).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(handle.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        if file_name == handle.as_str() {
            return Ok(DocumentEntry::new(handle.clone(), created_at(&metadata)));
        }

        let target = self.root.join(&file_name);
        if tokio::fs::try_exists(&target).await? {
            return Err(StorageError::NameCollision(file_name));
        }
        match tokio::fs::rename(&source, &target).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(handle.clone()));
            }
            Err(e) => return Err(e.into()),
        }

        log::info!("Renamed {} to {}", handle, file_name);
        Ok(DocumentEntry::new(
            DocumentHandle::new(file_name),
            created_at(&metadata),
        ))
    }

    pub async fn delete(&self, handle: &DocumentHandle) -> StoreResult<()> {
        let path = self.path_of(handle)?;
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("Deleted {}", handle);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(handle.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// Full contents of a stored document
    pub async fn read(&self, handle: &DocumentHandle) -> StoreResult<Vec<u8>> {
        let path = self.path_of(handle)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(handle.clone())),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Creation time where the filesystem records it, modification time otherwise
fn created_at(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}
