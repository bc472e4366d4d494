use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

/// Results site serving `MyResults.aspx`.
pub const DEFAULT_RESULTS_BASE: &str = "https://results.fsaeonline.com";
/// Tab of the results page that lists the E-Meter link.
pub const DEFAULT_RESULTS_TAB: &str = "notices";
/// Backend API host for the stub endpoint and the archive itself.
pub const DEFAULT_API_HOST: &str = "https://emeter-api.fsaeonline.com";
pub const DEFAULT_FIRST_CAR: u32 = 201;
pub const DEFAULT_LAST_CAR: u32 = 305;
pub const DEFAULT_THROTTLE_MS: u64 = 200;
pub const DEFAULT_OUTPUT_DIR: &str = "data/raw/2025-Energy_Meter";

/// Per-request timeouts (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Results page fetch, in seconds.
    pub page_secs: u64,
    /// Stub endpoint call, in seconds.
    pub stub_secs: u64,
    /// Archive stream; enforced as a low-speed window, not a total cap.
    pub archive_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            page_secs: 10,
            stub_secs: 30,
            archive_secs: 60,
        }
    }
}

impl TimeoutConfig {
    pub fn page(&self) -> Duration {
        Duration::from_secs(self.page_secs)
    }

    pub fn stub(&self) -> Duration {
        Duration::from_secs(self.stub_secs)
    }

    pub fn archive(&self) -> Duration {
        Duration::from_secs(self.archive_secs)
    }
}

/// Global configuration loaded from `~/.config/emeter/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmeterConfig {
    /// Scheme and host of the results site.
    pub results_base: String,
    /// `tab` query value for the results page.
    pub results_tab: String,
    /// Scheme and host of the backend API.
    pub api_host: String,
    /// First car number of the batch (inclusive).
    pub first_car: u32,
    /// Last car number of the batch (inclusive).
    pub last_car: u32,
    /// Pause between teams in milliseconds.
    pub throttle_ms: u64,
    /// Root directory for `car_NNN.zip` files; created if absent.
    pub output_dir: PathBuf,
    /// Optional timeouts; if missing, built-in defaults are used.
    #[serde(default)]
    pub timeouts: Option<TimeoutConfig>,
}

impl Default for EmeterConfig {
    fn default() -> Self {
        Self {
            results_base: DEFAULT_RESULTS_BASE.to_string(),
            results_tab: DEFAULT_RESULTS_TAB.to_string(),
            api_host: DEFAULT_API_HOST.to_string(),
            first_car: DEFAULT_FIRST_CAR,
            last_car: DEFAULT_LAST_CAR,
            throttle_ms: DEFAULT_THROTTLE_MS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timeouts: None,
        }
    }
}

impl EmeterConfig {
    pub fn car_range(&self) -> RangeInclusive<u32> {
        self.first_car..=self.last_car
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        self.timeouts.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("emeter")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<EmeterConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = EmeterConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: EmeterConfig = toml::from_str(&data)?;
    Ok(cfg)
}
