use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::cache;
use crate::client::BulkClient;
use crate::config::Settings;
use crate::domain::{DatasetId, Frequency, TimeFormat};
use crate::error::FetchError;
use crate::table::TidyTable;
use crate::tidy::tidy;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub time_format: TimeFormat,
    pub select_time: Option<Frequency>,
    pub cache: bool,
    pub force_update: bool,
    pub cache_dir: Option<Utf8PathBuf>,
    pub typed_columns: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::Date,
            select_time: None,
            cache: true,
            force_update: false,
            cache_dir: None,
            typed_columns: true,
        }
    }
}

#[derive(Clone)]
pub struct App<C: BulkClient> {
    client: C,
    settings: Settings,
}

impl<C: BulkClient> App<C> {
    pub fn new(client: C, settings: Settings) -> Self {
        Self { client, settings }
    }

    /// Fetches, caches, and reshapes one dataset.
    ///
    /// Decision table: caching disabled -> fetch without persisting; forced
    /// update (per-call or settings flag) -> fetch and overwrite the entry;
    /// entry absent -> fetch and persist; entry present -> load, no fetch.
    pub fn get_dataset(
        &self,
        id: &DatasetId,
        options: &FetchOptions,
    ) -> Result<TidyTable, FetchError> {
        if !options.cache {
            let raw = self.client.fetch_raw(id)?;
            return tidy(
                &raw,
                options.time_format,
                options.select_time,
                options.typed_columns,
            );
        }

        // Resolve before touching the network so a bad explicit directory
        // fails without a fetch.
        let dir = cache::resolve_cache_dir(options.cache_dir.as_deref(), &self.settings)?;
        let path = cache::cache_path(
            &dir,
            id,
            options.time_format,
            options.select_time,
            options.typed_columns,
        );

        let force = options.force_update || self.settings.force_update;
        if !force {
            match cache::load(&path) {
                Ok(table) => return Ok(table),
                Err(FetchError::CacheMiss(_)) => {}
                Err(err) => return Err(err),
            }
        }

        debug!(id = %id, "fetching dataset from bulk service");
        let raw = self.client.fetch_raw(id)?;
        let table = tidy(
            &raw,
            options.time_format,
            options.select_time,
            options.typed_columns,
        )?;
        cache::save(&path, &table)?;
        Ok(table)
    }

    /// Removes cache entries from the resolved cache directory.
    pub fn clean_cache(&self, cache_dir: Option<&Utf8Path>) -> Result<usize, FetchError> {
        let dir = cache::resolve_cache_dir(cache_dir, &self.settings)?;
        cache::clean_cache_dir(&dir)
    }
}
