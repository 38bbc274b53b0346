use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::config::Settings;
use crate::domain::{DatasetId, Frequency, TimeFormat};
use crate::error::FetchError;
use crate::table::TidyTable;

/// Resolves the cache directory: explicit override first (must already
/// exist), then the configured default, then a subdirectory of the system
/// temp area. Only the explicit override is never created implicitly.
pub fn resolve_cache_dir(
    explicit: Option<&Utf8Path>,
    settings: &Settings,
) -> Result<Utf8PathBuf, FetchError> {
    if let Some(dir) = explicit {
        if !dir.as_std_path().is_dir() {
            return Err(FetchError::CacheDirMissing(dir.to_owned()));
        }
        return Ok(dir.to_owned());
    }

    if let Some(dir) = &settings.cache_dir {
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        return Ok(dir.clone());
    }

    let fallback = std::env::temp_dir().join("eurostat-fetch");
    let fallback = Utf8PathBuf::from_path_buf(fallback)
        .map_err(|_| FetchError::Filesystem("non-utf8 temp directory".to_string()))?;
    fs::create_dir_all(fallback.as_std_path())
        .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    Ok(fallback)
}

/// One file per unique (dataset, time format, time selector, typing)
/// combination.
pub fn cache_path(
    dir: &Utf8Path,
    id: &DatasetId,
    time_format: TimeFormat,
    select_time: Option<Frequency>,
    typed_columns: bool,
) -> Utf8PathBuf {
    let select = match select_time {
        Some(frequency) => frequency.marker().to_ascii_lowercase().to_string(),
        None => "all".to_string(),
    };
    let typing = if typed_columns { "typed" } else { "plain" };
    dir.join(format!("{id}__{time_format}__{select}__{typing}.json"))
}

/// An absent entry is a miss; an unreadable or unparsable entry is surfaced
/// as corruption rather than silently refetched.
pub fn load(path: &Utf8Path) -> Result<TidyTable, FetchError> {
    if !path.as_std_path().is_file() {
        return Err(FetchError::CacheMiss(path.to_owned()));
    }
    let content = fs::read_to_string(path.as_std_path()).map_err(|err| FetchError::CacheCorrupt {
        path: path.to_owned(),
        message: err.to_string(),
    })?;
    let table = serde_json::from_str(&content).map_err(|err| FetchError::CacheCorrupt {
        path: path.to_owned(),
        message: err.to_string(),
    })?;
    info!(path = %path, "reading dataset from cache");
    Ok(table)
}

pub fn save(path: &Utf8Path, table: &TidyTable) -> Result<(), FetchError> {
    let parent = path
        .parent()
        .ok_or_else(|| FetchError::Filesystem("cache path has no parent".to_string()))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| FetchError::Filesystem(err.to_string()))?;

    let content =
        serde_json::to_vec(table).map_err(|err| FetchError::Filesystem(err.to_string()))?;
    let temp = tempfile::Builder::new()
        .prefix(".eurostat-fetch")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    fs::write(temp.path(), &content).map_err(|err| FetchError::Filesystem(err.to_string()))?;
    if path.as_std_path().exists() {
        fs::remove_file(path.as_std_path())
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    }
    temp.persist(path.as_std_path())
        .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    info!(path = %path, "wrote dataset to cache");
    Ok(())
}

/// Removes this crate's cache entries from the directory. Manual
/// invalidation; entries never expire on their own.
pub fn clean_cache_dir(dir: &Utf8Path) -> Result<usize, FetchError> {
    let mut removed = 0;
    let entries =
        fs::read_dir(dir.as_std_path()).map_err(|err| FetchError::Filesystem(err.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|err| FetchError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if path.is_file() && path.extension().map(|ext| ext == "json").unwrap_or(false) {
            fs::remove_file(&path).map_err(|err| FetchError::Filesystem(err.to_string()))?;
            removed += 1;
        }
    }
    info!(dir = %dir, removed, "cleared cache directory");
    Ok(removed)
}
