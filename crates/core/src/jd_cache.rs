//! Precomputed job-description features, built from a folder or from
//! uploaded bytes and optionally persisted as JSON.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ModelServices;
use crate::error::{PipelineError, ReadError};
use crate::models::JdCacheEntry;
use crate::reader::{extract_text_from_bytes, DocumentKind};
use crate::traits::Embedder;

/// Job-description entries keyed by file name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JdCache {
    entries: BTreeMap<String, JdCacheEntry>,
}

impl JdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`, replacing (and returning) any entry with the same file name.
    pub fn insert(&mut self, entry: JdCacheEntry) -> Option<JdCacheEntry> {
        let replaced = self.entries.insert(entry.filename.clone(), entry);
        if let Some(previous) = &replaced {
            warn!(
                filename = %previous.filename,
                "duplicate job description name; keeping the later file"
            );
        }
        replaced
    }

    pub fn get(&self, filename: &str) -> Option<&JdCacheEntry> {
        self.entries.get(filename)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JdCacheEntry> {
        self.entries.values()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl FromIterator<JdCacheEntry> for JdCache {
    fn from_iter<I: IntoIterator<Item = JdCacheEntry>>(iter: I) -> Self {
        let mut cache = JdCache::new();
        for entry in iter {
            cache.insert(entry);
        }
        cache
    }
}

/// Readable job-description files under `folder`, recursively, sorted by path.
pub fn discover_jd_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        if DocumentKind::from_path(entry.path()).is_some() {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn file_name(path: &Path) -> Result<String, ReadError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| ReadError::MissingFileName(path.display().to_string()))
}

#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct CacheBuildReport {
    pub cache: JdCache,
    pub skipped: Vec<SkippedDocument>,
}

pub struct JdCacheBuilder<'a> {
    services: &'a ModelServices,
}

impl<'a> JdCacheBuilder<'a> {
    pub fn new(services: &'a ModelServices) -> Self {
        Self { services }
    }

    /// Text, skills and embedding for one document.
    pub fn build_entry(&self, filename: &str, bytes: &[u8]) -> Result<JdCacheEntry, PipelineError> {
        let text = extract_text_from_bytes(filename, bytes)?;
        let skills = self.services.skills.extract_tokens(&text);
        let embedding = self.services.embedder.embed(&text)?;

        Ok(JdCacheEntry {
            filename: filename.to_string(),
            text,
            skills,
            embedding,
            checksum: digest_bytes(bytes),
            built_at: Utc::now(),
        })
    }

    /// Builds a cache from every supported file under `folder`. Files that
    /// fail are reported in `skipped` instead of aborting the batch.
    pub fn build_from_dir(&self, folder: &Path) -> Result<CacheBuildReport, PipelineError> {
        if !folder.is_dir() {
            return Err(PipelineError::InvalidArgument(format!(
                "not a directory: {}",
                folder.display()
            )));
        }

        let files = discover_jd_files(folder);
        if files.is_empty() {
            warn!(folder = %folder.display(), "no job description files found");
        }

        let mut report = CacheBuildReport::default();
        for path in files {
            let built = (|| -> Result<JdCacheEntry, PipelineError> {
                let name = file_name(&path)?;
                let bytes = fs::read(&path)?;
                self.build_entry(&name, &bytes)
            })();

            match built {
                Ok(entry) => {
                    report.cache.insert(entry);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping job description");
                    report.skipped.push(SkippedDocument {
                        path,
                        reason: error.to_string(),
                    });
                }
            }
        }

        info!(
            folder = %folder.display(),
            cached = report.cache.len(),
            skipped = report.skipped.len(),
            "job description cache built"
        );
        Ok(report)
    }

    /// Builds a cache from uploaded `(file name, bytes)` pairs. The first
    /// failing upload aborts the build.
    pub fn build_from_uploads<N, B>(&self, uploads: &[(N, B)]) -> Result<JdCache, PipelineError>
    where
        N: AsRef<str>,
        B: AsRef<[u8]>,
    {
        let mut cache = JdCache::new();
        for (name, bytes) in uploads {
            cache.insert(self.build_entry(name.as_ref(), bytes.as_ref())?);
        }
        info!(cached = cache.len(), "job description cache built from uploads");
        Ok(cache)
    }

    /// Reuses the cache persisted at `cache_path` when it covers exactly the
    /// files under `folder` with unchanged checksums; rebuilds and saves it
    /// otherwise.
    pub fn load_or_build(
        &self,
        folder: &Path,
        cache_path: &Path,
    ) -> Result<CacheBuildReport, PipelineError> {
        if cache_path.exists() {
            match JdCache::load(cache_path) {
                Ok(cache) if is_current(&cache, folder) => {
                    debug!(
                        path = %cache_path.display(),
                        entries = cache.len(),
                        "job description cache is current"
                    );
                    return Ok(CacheBuildReport {
                        cache,
                        skipped: Vec::new(),
                    });
                }
                Ok(_) => debug!(path = %cache_path.display(), "job description cache is stale"),
                Err(error) => {
                    warn!(
                        path = %cache_path.display(),
                        %error,
                        "unreadable job description cache; rebuilding"
                    )
                }
            }
        }

        let report = self.build_from_dir(folder)?;
        report.cache.save(cache_path)?;
        Ok(report)
    }
}

fn is_current(cache: &JdCache, folder: &Path) -> bool {
    let mut on_disk: HashMap<String, PathBuf> = HashMap::new();
    for path in discover_jd_files(folder) {
        match file_name(&path) {
            Ok(name) => {
                on_disk.insert(name, path);
            }
            Err(_) => return false,
        }
    }

    on_disk.len() == cache.len()
        && on_disk.iter().all(|(name, path)| {
            let Some(entry) = cache.get(name) else {
                return false;
            };
            fs::read(path).is_ok_and(|bytes| digest_bytes(&bytes) == entry.checksum)
        })
}
