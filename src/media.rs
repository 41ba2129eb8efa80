//! Staged media uploads.
//!
//! A media field's state is an explicit tagged union rather than a blob URL
//! smuggled through the document: [`MediaSource::Remote`] is a persisted
//! URL, [`MediaSource::PendingUpload`] is a local binary awaiting the next
//! save, [`MediaSource::Cleared`] means the persisted URL should be removed.
//!
//! [`FileStaging`] tracks pending and cleared fields by document path, plus
//! every preview token it has issued. Revoking all previews after a
//! successful save (or reset) is a correctness requirement; the registry
//! makes the obligation checkable.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::path::{DotPath, Segment};

/// A locally selected binary not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl StagedFile {
    pub fn new(file_name: &str, content_type: &str, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.into(),
        }
    }
}

/// State of one media field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Persisted URL, nothing pending.
    Remote(String),
    /// Local file awaiting upload; `preview_url` is the token written into
    /// the document so a renderer shows an instant preview.
    PendingUpload {
        file: StagedFile,
        preview_url: String,
    },
    /// The persisted URL should be removed on the next save.
    Cleared,
}

/// Pending media changes keyed by field path.
#[derive(Debug, Default)]
pub struct FileStaging {
    entries: HashMap<DotPath, MediaSource>,
    issued_previews: HashSet<String>,
}

impl FileStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a file for `path`, returning the preview token to write into
    /// the document. Replaces (and revokes) any previous staging at the
    /// same path.
    pub fn stage(&mut self, path: DotPath, file: StagedFile) -> String {
        self.revoke_entry(&path);
        let preview_url = format!("staged:{}", Uuid::new_v4());
        self.issued_previews.insert(preview_url.clone());
        self.entries.insert(
            path,
            MediaSource::PendingUpload {
                file,
                preview_url: preview_url.clone(),
            },
        );
        preview_url
    }

    /// Mark a field's persisted URL for removal on the next save.
    pub fn clear_field(&mut self, path: DotPath) {
        self.revoke_entry(&path);
        self.entries.insert(path, MediaSource::Cleared);
    }

    /// Drop any staging at `path` without persisting anything.
    pub fn unstage(&mut self, path: &DotPath) {
        self.revoke_entry(path);
        self.entries.remove(path);
    }

    /// Revoke the preview token of whatever is currently staged at `path`.
    fn revoke_entry(&mut self, path: &DotPath) {
        if let Some(MediaSource::PendingUpload { preview_url, .. }) = self.entries.get(path) {
            self.issued_previews.remove(preview_url);
        }
    }

    pub fn get(&self, path: &DotPath) -> Option<&MediaSource> {
        self.entries.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending uploads, for building the save request.
    pub fn pending(&self) -> impl Iterator<Item = (&DotPath, &StagedFile)> {
        self.entries.iter().filter_map(|(path, src)| match src {
            MediaSource::PendingUpload { file, .. } => Some((path, file)),
            _ => None,
        })
    }

    /// Paths whose persisted URL should be blanked in the outgoing document:
    /// every pending upload (the server assigns the real URL) and every
    /// cleared field.
    pub fn blanked_paths(&self) -> impl Iterator<Item = &DotPath> {
        self.entries.iter().filter_map(|(path, src)| match src {
            MediaSource::PendingUpload { .. } | MediaSource::Cleared => Some(path),
            MediaSource::Remote(_) => None,
        })
    }

    /// Clear everything after a successful save, revoking all previews.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.issued_previews.clear();
    }

    /// Preview tokens issued and not yet revoked. Must be zero after a
    /// successful save or reset.
    pub fn outstanding_previews(&self) -> usize {
        self.issued_previews.len()
    }

    /// Drop staging addressed inside `list_path.{removed}` and shift later
    /// indices down by one, so entries keep addressing the same records.
    ///
    /// Orphaned files are silently dropped and their previews revoked; they
    /// are never uploaded.
    pub fn drop_list_item(&mut self, list_path: &DotPath, removed: usize) {
        let mut remapped = HashMap::with_capacity(self.entries.len());
        for (path, source) in std::mem::take(&mut self.entries) {
            let index = path.strip_prefix(list_path).and_then(|rest| match rest {
                [Segment::Index(i), ..] => Some(*i),
                _ => None,
            });
            match index {
                Some(i) if i == removed => {
                    if let MediaSource::PendingUpload { preview_url, .. } = &source {
                        self.issued_previews.remove(preview_url);
                    }
                    // dropped
                }
                Some(i) if i > removed => {
                    let mut segments = path.segments().to_vec();
                    segments[list_path.segments().len()] = Segment::Index(i - 1);
                    match DotPath::from_segments(segments) {
                        Ok(shifted) => {
                            remapped.insert(shifted, source);
                        }
                        Err(_) => warn!(%path, "could not re-index staged entry"),
                    }
                }
                _ => {
                    remapped.insert(path, source);
                }
            }
        }
        self.entries = remapped;
    }

    /// Re-key staging after a record moved from `from` to `to` within
    /// `list_path`, so entries keep addressing the same records.
    pub fn remap_move(&mut self, list_path: &DotPath, from: usize, to: usize) {
        if from == to {
            return;
        }
        let depth = list_path.segments().len();
        let mut remapped = HashMap::with_capacity(self.entries.len());
        for (path, source) in std::mem::take(&mut self.entries) {
            let index = path.strip_prefix(list_path).and_then(|rest| match rest {
                [Segment::Index(i), ..] => Some(*i),
                _ => None,
            });
            let new_index = match index {
                Some(i) if i == from => Some(to),
                Some(i) if from < to && i > from && i <= to => Some(i - 1),
                Some(i) if to < from && i >= to && i < from => Some(i + 1),
                other => other,
            };
            match (index, new_index) {
                (Some(old), Some(new)) if old != new => {
                    let mut segments = path.segments().to_vec();
                    segments[depth] = Segment::Index(new);
                    match DotPath::from_segments(segments) {
                        Ok(shifted) => {
                            remapped.insert(shifted, source);
                        }
                        Err(_) => warn!(%path, "could not re-index staged entry"),
                    }
                }
                _ => {
                    remapped.insert(path, source);
                }
            }
        }
        self.entries = remapped;
    }
}

impl Drop for FileStaging {
    fn drop(&mut self) {
        if !self.issued_previews.is_empty() {
            warn!(
                outstanding = self.issued_previews.len(),
                "file staging dropped with unrevoked preview tokens"
            );
        }
    }
}
