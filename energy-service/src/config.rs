use serde::Deserialize;
use std::{fs, path::PathBuf};

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub root_dir: PathBuf,
    pub csv_delimiter: char,
    pub date_column: String,
    pub time_column: String,
    pub read_concurrency: usize,
    pub cache_dir: Option<PathBuf>,
    pub forecast_dir: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("SINERT_DATA_CONCENTRATOR"),
            csv_delimiter: ';',
            date_column: "Date".to_string(),
            time_column: "Time".to_string(),
            read_concurrency: 4,
            cache_dir: None,
            forecast_dir: None,
        }
    }
}

/// How a power column for one building is recognised in a file header.
///
/// A header matches when it contains any of `tokens`, all of `required` and
/// none of `excluded` (case-insensitive, after suffix stripping).
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelMatcherConfig {
    pub tokens: Vec<String>,
    #[serde(default = "default_required")]
    pub required: Vec<String>,
    #[serde(default = "default_excluded")]
    pub excluded: Vec<String>,
}

fn default_required() -> Vec<String> {
    vec!["kw sys".to_string(), "avg".to_string()]
}

fn default_excluded() -> Vec<String> {
    vec!["kvar".to_string()]
}

impl ChannelMatcherConfig {
    fn with_tokens(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            required: default_required(),
            excluded: default_excluded(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    pub tour_a: ChannelMatcherConfig,
    pub tour_b: ChannelMatcherConfig,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            tour_a: ChannelMatcherConfig::with_tokens(&["TOUR_A_(TGBT_D14)"]),
            tour_b: ChannelMatcherConfig::with_tokens(&["Tour_B_(TGBT_D5)"]),
        }
    }
}

/// What to do with rows stamped `24:00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EndOfDayPolicy {
    /// Treat the row as invalid and drop it.
    #[default]
    Drop,
    /// Read it as 00:00:00 of the following day.
    RollOver,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub interval_minutes: i64,
    pub end_of_day_policy: EndOfDayPolicy,
    pub max_power_kw: f64,
    pub outlier_sigma: Option<f64>,
    pub interpolate_limit: Option<usize>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
            end_of_day_policy: EndOfDayPolicy::Drop,
            max_power_kw: 50.0,
            outlier_sigma: None,
            interpolate_limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsEngineConfig {
    pub correlation: CorrelationMethod,
    pub default_bins: usize,
    pub default_top_n: usize,
    pub percentiles: Vec<f64>,
}

impl Default for MetricsEngineConfig {
    fn default() -> Self {
        Self {
            correlation: CorrelationMethod::Pearson,
            default_bins: 20,
            default_top_n: 5,
            percentiles: vec![5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub channels: ChannelsConfig,
    pub cleaning: CleaningConfig,
    pub metrics_engine: MetricsEngineConfig,
    pub api: ApiConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Reads `ENERGY_CONFIG` (default `energy-config.toml`). A missing file
    /// yields the defaults; `ENERGY_DATA_DIR` overrides `data.root_dir`.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("ENERGY_CONFIG").unwrap_or_else(|_| "energy-config.toml".to_string());
        let mut cfg = match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path, "config file not found, using defaults");
                AppConfig::default()
            }
            Err(e) => return Err(anyhow::anyhow!("failed to read config {path}: {e}")),
        };

        if let Ok(dir) = env::var("ENERGY_DATA_DIR") {
            cfg.data.root_dir = PathBuf::from(dir);
        }

        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        if cfg.cleaning.interval_minutes <= 0 {
            anyhow::bail!("cleaning.interval_minutes must be positive");
        }
        if MINUTES_PER_DAY % cfg.cleaning.interval_minutes != 0 {
            anyhow::bail!(
                "cleaning.interval_minutes must divide a day evenly, got {}",
                cfg.cleaning.interval_minutes
            );
        }
        if !cfg.data.csv_delimiter.is_ascii() {
            anyhow::bail!("data.csv_delimiter must be a single ASCII character");
        }
        Ok(cfg)
    }
}
