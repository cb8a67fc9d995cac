use crate::core::allocation::AllocationError;
use crate::core::cache::CACHE_FILE_NAME;
use crate::core::price::CASH_SYMBOL;
use crate::core::strategy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub symbol: String,
    /// Classification tag the symbol is grouped under, e.g. `equity` or `bond`
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    /// Percentage (0-100) of the balance per classification tag
    #[serde(default, deserialize_with = "exact_percentages")]
    pub allocations: BTreeMap<String, Decimal>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Account {
    pub name: String,
    #[serde(deserialize_with = "rust_decimal::serde::str::deserialize")]
    pub balance: Decimal,
    pub strategy: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AlphaVantageProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub alpha_vantage: Option<AlphaVantageProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            alpha_vantage: Some(AlphaVantageProviderConfig {
                base_url: DEFAULT_ALPHA_VANTAGE_URL.to_string(),
            }),
        }
    }
}

// YAML numbers are read from their source text; going through f64 would round
// anything past ~16 significant digits
fn exact_percentages<'de, D>(deserializer: D) -> Result<BTreeMap<String, Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Exact(#[serde(deserialize_with = "rust_decimal::serde::str::deserialize")] Decimal);

    let raw = BTreeMap::<String, Exact>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(tag, Exact(pct))| (tag, pct)).collect())
}

pub const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co";

fn default_output_filename() -> String {
    "output.csv".to_string()
}

fn default_request_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub strategies: Vec<Strategy>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default = "default_output_filename")]
    pub output_filename: String,
    #[serde(default)]
    pub alpha_vantage_api_key: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Pause after every network fetch, the provider's free tier is heavily rate limited
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "balancer", "balancer")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "balancer", "balancer")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Location of the persisted quote cache.
    pub fn cache_path(&self) -> Result<PathBuf> {
        Ok(self.default_data_path()?.join(CACHE_FILE_NAME))
    }

    pub fn alpha_vantage_base_url(&self) -> &str {
        self.providers
            .alpha_vantage
            .as_ref()
            .map_or(DEFAULT_ALPHA_VANTAGE_URL, |p| &p.base_url)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Checks what is needed before any quote is fetched.
    pub fn validate(&self) -> Result<()> {
        let needs_fetch = self.all_symbols().iter().any(|s| s != CASH_SYMBOL);
        if needs_fetch && self.alpha_vantage_api_key.trim().is_empty() {
            anyhow::bail!("alpha_vantage_api_key is not set");
        }
        Ok(())
    }

    /// Every distinct symbol across all strategies, sorted.
    pub fn all_symbols(&self) -> Vec<String> {
        self.strategies
            .iter()
            .flat_map(|s| s.symbols.iter().map(|sym| sym.symbol.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn find_strategy(&self, name: &str) -> Result<&Strategy, AllocationError> {
        strategy::resolve(&self.strategies, name)
    }
}
