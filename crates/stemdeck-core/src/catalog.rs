//! Directory-backed catalog of processed tracks
//!
//! The filesystem is the source of truth: one subdirectory per track under
//! `separated/<model>/`, holding whatever stems and mixes the pipeline
//! produced for it. Listing, lookup and deletion all read the tree
//! directly.

use crate::error::CatalogError;
use crate::sanitize::sanitize_name;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Stem base names demucs emits, in display order.
pub const STEM_NAMES: [&str; 4] = ["vocals", "drums", "bass", "other"];

/// Drums + bass overlay.
pub const RHYTHM_MIX_FILE: &str = "mixed_audio.mp3";

/// Vocals + drums + bass overlay.
pub const FULL_MIX_FILE: &str = "mixed_audio_voice.mp3";

/// Every filename a track directory may expose.
pub const TRACK_FILES: [&str; 6] = [
    "vocals.mp3",
    "drums.mp3",
    "bass.mp3",
    "other.mp3",
    RHYTHM_MIX_FILE,
    FULL_MIX_FILE,
];

#[derive(Debug, Clone)]
pub struct TrackEntry {
    pub name: String,
    pub path: PathBuf,
    /// Stems present on disk, in [`STEM_NAMES`] order
    pub stems: Vec<&'static str>,
    pub has_rhythm_mix: bool,
    pub has_full_mix: bool,
    pub modified: DateTime<Local>,
}

impl TrackEntry {
    fn read(name: String, path: PathBuf) -> Option<TrackEntry> {
        let meta = fs::metadata(&path).ok()?;
        if !meta.is_dir() {
            return None;
        }
        let modified = meta
            .modified()
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());

        let stems = STEM_NAMES
            .iter()
            .copied()
            .filter(|stem| path.join(format!("{stem}.mp3")).is_file())
            .collect();

        Some(TrackEntry {
            has_rhythm_mix: path.join(RHYTHM_MIX_FILE).is_file(),
            has_full_mix: path.join(FULL_MIX_FILE).is_file(),
            name,
            path,
            stems,
            modified,
        })
    }

    pub fn has_all_stems(&self) -> bool {
        self.stems.len() == STEM_NAMES.len()
    }

    /// Number of playable files in this entry.
    pub fn file_count(&self) -> usize {
        self.stems.len() + usize::from(self.has_rhythm_mix) + usize::from(self.has_full_mix)
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All processed tracks, newest first.
    pub fn list(&self) -> Result<Vec<TrackEntry>, CatalogError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dirent in fs::read_dir(&self.root)? {
            let dirent = dirent?;
            let name = match dirent.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if let Some(entry) = TrackEntry::read(name, dirent.path()) {
                entries.push(entry);
            }
        }

        entries.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(entries)
    }

    /// Look up a single track by its sanitized name.
    pub fn entry(&self, name: &str) -> Option<TrackEntry> {
        if !is_track_name(name) {
            return None;
        }
        TrackEntry::read(name.to_string(), self.root.join(name))
    }

    /// Recursively remove a track directory. Deleting a track that is
    /// already gone is not an error.
    pub fn delete(&self, name: &str) -> Result<(), CatalogError> {
        if !is_track_name(name) {
            return Err(CatalogError::NotFound(name.to_string()));
        }
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Ok(());
        }
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    /// Resolve a (track, filename) pair to an on-disk path.
    ///
    /// Only the six known output filenames resolve; anything else —
    /// including traversal attempts — is rejected.
    pub fn resolve_file(&self, name: &str, file: &str) -> Option<PathBuf> {
        if !is_track_name(name) || !TRACK_FILES.contains(&file) {
            return None;
        }
        let path = self.root.join(name).join(file);
        if path.is_file() {
            Some(path)
        } else {
            None
        }
    }
}

/// Catalog names are exactly the sanitizer's fixed point, which rules out
/// separators and dot-dot components.
fn is_track_name(name: &str) -> bool {
    !name.is_empty() && sanitize_name(name) == name
}
