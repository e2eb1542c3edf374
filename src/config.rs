use crate::adjacency::DEFAULT_TOLERANCE;
use crate::data::{DatasetKind, IdentifierPolicy, DEFAULT_PLACEHOLDER};
use crate::types::Palette;
use anyhow::{anyhow, ensure, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub adjacency: AdjacencyConfig,
    #[serde(default)]
    pub palette: Palette,
    pub datasets: BTreeMap<String, DatasetConfig>,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdjacencyConfig {
    pub tolerance: f64, // Degrees
}

impl Default for AdjacencyConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    pub path: PathBuf, // GeoJSON or Shapefile
    /// Plural noun used in summaries, e.g. "countries".
    #[serde(default = "default_label")]
    pub label: String,
    pub kind: Option<DatasetKind>,
    /// Overrides the built-in property list for `kind`.
    pub id_properties: Option<Vec<String>>,
    pub placeholder: Option<String>,
}

fn default_label() -> String {
    "regions".to_string()
}

impl DatasetConfig {
    pub fn identifier_policy(&self) -> Result<IdentifierPolicy> {
        let placeholder = self.placeholder.as_deref().unwrap_or(DEFAULT_PLACEHOLDER);
        match (&self.id_properties, self.kind) {
            (Some(keys), _) => Ok(IdentifierPolicy::new(keys.clone(), placeholder)),
            (None, Some(kind)) => {
                let mut policy = IdentifierPolicy::for_dataset(kind);
                policy.placeholder = placeholder.to_string();
                Ok(policy)
            }
            (None, None) => Err(anyhow!(
                "Dataset {:?} needs either `kind` or `id_properties`",
                self.path
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            static_dir: None,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let tolerance = self.adjacency.tolerance;
        ensure!(
            tolerance.is_finite() && tolerance >= 0.0,
            "Adjacency tolerance must be a non-negative number, got {}",
            tolerance
        );
        ensure!(
            self.palette.len() >= 2,
            "Palette needs at least 2 colors, got {}",
            self.palette.len()
        );
        ensure!(
            self.palette.len() <= u8::MAX as usize + 1,
            "Palette has more than 256 colors"
        );
        for (name, dataset) in &self.datasets {
            dataset
                .identifier_policy()
                .with_context(|| format!("Invalid dataset '{}'", name))?;
        }
        Ok(())
    }

    pub fn dataset(&self, name: &str) -> Result<&DatasetConfig> {
        self.datasets.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.datasets.keys().map(String::as_str).collect();
            anyhow!("Unknown dataset '{}' (configured: {})", name, known.join(", "))
        })
    }
}
