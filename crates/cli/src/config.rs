use anyhow::{bail, Context, Result};
use fcat_chatlog::default_chatlog_dir;
use fcat_esi::{EsiConfig, DEFAULT_ESI_BASE_URL, DEFAULT_USER_AGENT};
use fcat_fleet::{AlertThresholds, DEFAULT_OVERRIDE_THRESHOLD};
use fcat_protocol::{BoostTaxonomy, CharacterId};
use fcat_roles::default_cache_path;
use fcat_sync::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_ACCESS_TOKEN: &str = "FCAT_ACCESS_TOKEN";
pub const ENV_CHARACTER_ID: &str = "FCAT_CHARACTER_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub esi: EsiSettings,
    pub auth: AuthSettings,
    pub refresh: RefreshSettings,
    pub boosts: BoostSettings,
    pub roles: RoleSettings,
    pub alerts: AlertThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EsiSettings {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for EsiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ESI_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// When set, the token is trusted as-is and `/verify/` is skipped.
    pub character_id: Option<CharacterId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    pub interval_secs: u64,
    pub deadline_secs: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            deadline_secs: 45,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostSettings {
    pub channels: Vec<String>,
    pub chatlog_dir: Option<PathBuf>,
    pub taxonomy: Option<BoostTaxonomy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleSettings {
    pub cache_path: Option<PathBuf>,
    pub override_threshold: f64,
}

impl Default for RoleSettings {
    fn default() -> Self {
        Self {
            cache_path: None,
            override_threshold: DEFAULT_OVERRIDE_THRESHOLD,
        }
    }
}

/// `~/.config/fcat/config.toml` (platform config dir).
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fcat").join("config.toml"))
}

impl Config {
    /// Reads the config file, then applies environment overrides.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.auth.access_token = Some(token.trim().to_string());
        }
        if let Some(raw) = lookup(ENV_CHARACTER_ID).filter(|v| !v.trim().is_empty()) {
            let id = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_CHARACTER_ID} is not a character id: {raw}"))?;
            self.auth.character_id = Some(id);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh.interval_secs == 0 {
            bail!("refresh.interval_secs must be positive");
        }
        if self.refresh.deadline_secs == 0 {
            bail!("refresh.deadline_secs must be positive");
        }
        for (name, value) in [
            ("roles.override_threshold", self.roles.override_threshold),
            ("alerts.min_dps_share", self.alerts.min_dps_share),
            ("alerts.min_logistics_per_dps", self.alerts.min_logistics_per_dps),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{name} must be between 0 and 1, got {value}");
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn esi_config(&self) -> EsiConfig {
        EsiConfig {
            base_url: self.esi.base_url.clone(),
            user_agent: self.esi.user_agent.clone(),
            timeout: Duration::from_secs(self.esi.timeout_secs.max(1)),
        }
    }

    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.refresh.interval_secs),
            deadline: Duration::from_secs(self.refresh.deadline_secs),
            channels: self.boosts.channels.clone(),
            override_threshold: self.roles.override_threshold,
            alert_thresholds: self.alerts,
        }
    }

    #[must_use]
    pub fn chatlog_dir(&self) -> PathBuf {
        self.boosts
            .chatlog_dir
            .clone()
            .unwrap_or_else(default_chatlog_dir)
    }

    #[must_use]
    pub fn taxonomy(&self) -> BoostTaxonomy {
        self.boosts.taxonomy.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn role_cache_path(&self) -> PathBuf {
        self.roles
            .cache_path
            .clone()
            .unwrap_or_else(default_cache_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.refresh.interval_secs, 60);
        assert_eq!(config.refresh.deadline_secs, 45);
        assert_eq!(config.esi.base_url, DEFAULT_ESI_BASE_URL);
        assert!((config.alerts.min_dps_share - 0.40).abs() < f64::EPSILON);
        assert_eq!(config.taxonomy(), BoostTaxonomy::default());
    }

    #[test]
    fn file_settings_and_custom_taxonomy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[refresh]
interval_secs = 30

[boosts]
channels = ["Incredibleboosts", "AllianceBoosts"]
chatlog_dir = "/tmp/logs"

[[boosts.taxonomy.categories]]
name = "Mining Foreman"
scripts = ["Mining Laser Field Enhancement Charge"]

[alerts]
min_dps_share = 0.5
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.refresh.interval_secs, 30);
        assert_eq!(config.refresh.deadline_secs, 45);
        assert_eq!(config.boosts.channels.len(), 2);
        assert_eq!(config.chatlog_dir(), PathBuf::from("/tmp/logs"));
        assert_eq!(config.taxonomy().categories[0].name, "Mining Foreman");
        assert!((config.alerts.min_logistics_per_dps - 0.20).abs() < f64::EPSILON);
        assert_eq!(config.scheduler_config().interval, Duration::from_secs(30));
    }

    #[test]
    fn environment_overrides_credentials() {
        let env: HashMap<&str, &str> = [
            (ENV_ACCESS_TOKEN, " token-123 "),
            (ENV_CHARACTER_ID, "90000001"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.auth.access_token.as_deref(), Some("token-123"));
        assert_eq!(config.auth.character_id, Some(90_000_001));

        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == ENV_CHARACTER_ID).then(|| "pilot".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_CHARACTER_ID));
    }

    #[test]
    fn out_of_range_thresholds_are_rejected() {
        let mut config = Config::default();
        config.roles.override_threshold = 1.5;
        assert!(config.validate().is_err());
        config.roles.override_threshold = 0.4;
        config.refresh.interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
