use glshim_kernel::{GenerateOptions, Generator, MemoryCatalog, TweakRegistry};
use glshim_tweaks::{builtin_registry, load_tweak_table};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_CONFIG_PATH: &str = "glshim.toml";
pub const BUILTIN_TWEAKS_LABEL: &str = "<builtin>";

/// Report was produced but rejected.
pub const EXIT_REJECTED: i32 = 1;
/// Inputs could not be read or parsed.
pub const EXIT_INPUT: i32 = 2;

/// `glshim.toml`. Command-line flags override every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlshimConfig {
    #[serde(default)]
    pub api_label: Option<String>,
    #[serde(default)]
    pub shadow_suffix: Option<String>,
    #[serde(default)]
    pub jobs: Option<usize>,
    /// Relative paths resolve against the config file's directory.
    #[serde(default)]
    pub tweaks: Option<String>,
}

impl GlshimConfig {
    pub fn parse(text: &str, base_dir: &Path) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(text)?;
        if let Some(tweaks) = config.tweaks.take() {
            let path = PathBuf::from(&tweaks);
            config.tweaks = Some(if path.is_absolute() {
                tweaks
            } else {
                base_dir.join(path).display().to_string()
            });
        }
        Ok(config)
    }

    pub fn generate_options(&self) -> GenerateOptions {
        let defaults = GenerateOptions::default();
        GenerateOptions {
            api_label: self.api_label.clone().unwrap_or(defaults.api_label),
            shadow_suffix: self.shadow_suffix.clone().unwrap_or(defaults.shadow_suffix),
        }
    }
}

/// Where each input came from, for text output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSources {
    pub catalog: String,
    pub tweaks: String,
    pub config: Option<String>,
}

pub fn fail(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(code);
}

/// Explicit `--config`, else `./glshim.toml` when present, else defaults.
pub fn load_config_or_exit(explicit: Option<&str>) -> (GlshimConfig, Option<PathBuf>) {
    let path = match explicit {
        Some(path) => PathBuf::from(path),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !default.is_file() {
                return (GlshimConfig::default(), None);
            }
            default
        }
    };
    let text = fs::read_to_string(&path).unwrap_or_else(|e| {
        fail(EXIT_INPUT, format!("failed to read {}: {e}", path.display()));
    });
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let config = GlshimConfig::parse(&text, base_dir).unwrap_or_else(|e| {
        fail(EXIT_INPUT, format!("invalid config {}: {e}", path.display()));
    });
    tracing::debug!(path = %path.display(), "config loaded");
    (config, Some(path))
}

pub fn load_catalog_or_exit(path: &str) -> MemoryCatalog {
    let catalog = MemoryCatalog::load_json(path).unwrap_or_else(|e| {
        fail(EXIT_INPUT, format!("failed to load catalog {path}: {e}"));
    });
    tracing::debug!(path, functions = catalog.len(), "catalog loaded");
    catalog
}

/// `--tweaks` wins over the config file; neither means the built-in table.
pub fn load_registry_or_exit(tweaks: Option<&str>) -> (TweakRegistry, String) {
    match tweaks {
        Some(path) => {
            let registry = load_tweak_table(path).unwrap_or_else(|e| fail(EXIT_INPUT, e));
            (registry, path.to_string())
        }
        None => {
            let registry = builtin_registry().unwrap_or_else(|e| fail(EXIT_INPUT, e));
            (registry, BUILTIN_TWEAKS_LABEL.to_string())
        }
    }
}

/// Load catalog, tweak table and config into a ready generator.
pub fn generator_or_exit(
    catalog_path: &str,
    tweaks: Option<String>,
    config: Option<&str>,
) -> (Generator, GlshimConfig, InputSources) {
    let (config, config_path) = load_config_or_exit(config);
    let catalog = load_catalog_or_exit(catalog_path);
    let tweaks = tweaks.or_else(|| config.tweaks.clone());
    let (registry, tweaks_label) = load_registry_or_exit(tweaks.as_deref());
    let generator = Generator::new(Arc::new(registry), Arc::new(catalog))
        .with_options(config.generate_options());
    let sources = InputSources {
        catalog: catalog_path.to_string(),
        tweaks: tweaks_label,
        config: config_path.map(|path| path.display().to_string()),
    };
    (generator, config, sources)
}

/// Run `work` on a dedicated pool when a job count is given.
pub fn with_jobs_or_exit<T: Send>(jobs: Option<usize>, work: impl FnOnce() -> T + Send) -> T {
    let Some(jobs) = jobs else {
        return work();
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .unwrap_or_else(|e| fail(EXIT_INPUT, format!("failed to start {jobs} workers: {e}")));
    tracing::debug!(threads = pool.current_num_threads(), "worker pool ready");
    pool.install(work)
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization")
    );
}
