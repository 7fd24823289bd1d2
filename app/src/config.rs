use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const STORE_URL_ENV: [&str; 2] = ["FOLIO_STORE_URL", "PUBLIC_SUPABASE_URL"];
pub const ANON_KEY_ENV: [&str; 2] = ["FOLIO_ANON_KEY", "PUBLIC_SUPABASE_ANON_KEY"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FolioConfig {
    pub log_level: String,
    pub store_url: String,
    pub anon_key: String,
    pub thumbnails_preload: usize,
    pub debug_console: bool,
    pub trace_spans: bool,
    pub use_file_store: bool,
    pub cache_path: PathBuf,
}

#[derive(Debug, Default)]
pub struct FolioConfigOverrides {
    pub log_level: Option<String>,
    pub store_url: Option<String>,
    pub anon_key: Option<String>,
    pub thumbnails_preload: Option<usize>,
    pub debug_console: bool,
    pub trace_spans: bool,
    pub use_file_store: bool,
}

fn folio_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".folio")
}

fn default_path() -> PathBuf {
    folio_dir().join("config")
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|n| std::env::var(n).ok())
        .find(|v| !v.trim().is_empty())
}

impl FolioConfig {
    /// Read the config file, then fill unset connection values from the
    /// environment. Missing files and keys fall back to defaults.
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(default_path);
        let cfg = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .build()
            .unwrap_or_default();

        let non_empty = |key: &str| cfg.get_string(key).ok().filter(|v| !v.trim().is_empty());

        let log_level = non_empty("log_level").unwrap_or_else(|| "info".to_string());
        let store_url = non_empty("store_url")
            .or_else(|| first_env(&STORE_URL_ENV))
            .unwrap_or_default();
        let anon_key = non_empty("anon_key")
            .or_else(|| first_env(&ANON_KEY_ENV))
            .unwrap_or_default();
        let thumbnails_preload = cfg
            .get_int("thumbnails_preload")
            .ok()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(24);
        let debug_console = cfg.get_bool("debug_console").unwrap_or(false);
        let trace_spans = cfg.get_bool("trace_spans").unwrap_or(false);
        let use_file_store = cfg.get_bool("use_file_store").unwrap_or(false);
        let cache_path = non_empty("cache_path")
            .map(PathBuf::from)
            .unwrap_or_else(folio_dir);

        Self {
            log_level,
            store_url,
            anon_key,
            thumbnails_preload,
            debug_console,
            trace_spans,
            use_file_store,
            cache_path,
        }
    }

    pub fn apply_overrides(mut self, ov: &FolioConfigOverrides) -> Self {
        if let Some(l) = &ov.log_level {
            self.log_level = l.clone();
        }
        if let Some(u) = &ov.store_url {
            self.store_url = u.clone();
        }
        if let Some(k) = &ov.anon_key {
            self.anon_key = k.clone();
        }
        if let Some(t) = ov.thumbnails_preload {
            self.thumbnails_preload = t;
        }
        if ov.debug_console {
            self.debug_console = true;
        }
        if ov.trace_spans {
            self.trace_spans = true;
        }
        if ov.use_file_store {
            self.use_file_store = true;
        }
        self
    }

    /// Spans were requested but this binary was built without `trace-spans`.
    pub fn missing_span_support(&self) -> bool {
        self.trace_spans && !cfg!(feature = "trace-spans")
    }

    /// Both connection values are needed before anything talks to the store.
    pub fn require_store(&self) -> Result<(), String> {
        if self.store_url.trim().is_empty() {
            return Err(format!(
                "No store URL configured. Set store_url in {} or {}",
                default_path().display(),
                STORE_URL_ENV[0]
            ));
        }
        if self.anon_key.trim().is_empty() {
            return Err(format!(
                "No anon key configured. Set anon_key in {} or {}",
                default_path().display(),
                ANON_KEY_ENV[0]
            ));
        }
        Ok(())
    }

    pub fn save_to(&self, path: Option<PathBuf>) -> std::io::Result<()> {
        let path = path.unwrap_or_else(default_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = toml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, data)
    }
}
