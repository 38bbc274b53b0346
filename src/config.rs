use camino::Utf8PathBuf;

/// Process-wide defaults, threaded explicitly instead of living in global
/// state. Per-call options win for the cache directory; the update flag is a
/// union with the per-call one.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub cache_dir: Option<Utf8PathBuf>,
    pub force_update: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        let cache_dir = std::env::var("EUROSTAT_CACHE_DIR")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(Utf8PathBuf::from);
        let force_update = std::env::var("EUROSTAT_FORCE_UPDATE")
            .map(|value| flag_enabled(&value))
            .unwrap_or(false);
        Self {
            cache_dir,
            force_update,
        }
    }
}

pub fn flag_enabled(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes" | "on")
}
