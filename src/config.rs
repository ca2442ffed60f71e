use crate::models::Cents;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use std::{collections::BTreeSet, env, path::Path, path::PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::info;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STOCK: u32 = 10;
const DEFAULT_PRICE: Cents = Cents(80);

const BUILTIN_FLAVORS: [&str; 20] = [
    "Naranjilla Hielo",
    "Mora Hielo",
    "Coco Hielo",
    "Tres Sabores Hielo",
    "Come y Bebe",
    "Coco Mora",
    "Maracumango",
    "Guanábana Mora",
    "Tres Sabores",
    "Chocolate Coco",
    "Chocolate Hielo",
    "Chocovainilla",
    "Coco Crema",
    "Chicle",
    "Ron Pasas",
    "Mora Crema",
    "Mora Chocovainilla",
    "Chocolate Crema",
    "Maracuyá",
    "Queso Crema",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid catalog: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub catalog_path: PathBuf,
    pub sales_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            port,
            catalog_path: path_from_env("APP_CATALOG_PATH", "data/sabores.json"),
            sales_path: path_from_env("APP_SALES_PATH", "data/ventas.json"),
        }
    }
}

fn path_from_env(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavorConfig {
    pub name: String,
    pub stock: u32,
    pub price: Cents,
}

/// The flavors the ledger starts with, and returns to on reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub flavors: Vec<FlavorConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default = "default_stock")]
    stock_inicial: u32,
    #[serde(default = "default_price")]
    precio: Cents,
    sabores: Vec<FlavorEntry>,
}

#[derive(Debug)]
enum FlavorEntry {
    Name(String),
    Detailed(FlavorDetail),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FlavorDetail {
    nombre: String,
    stock: Option<u32>,
    precio: Option<Cents>,
}

// Dispatch on the JSON shape so a bad object entry reports its own field error.
impl<'de> Deserialize<'de> for FlavorEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(name) => Ok(FlavorEntry::Name(name)),
            value @ Value::Object(_) => serde_json::from_value(value)
                .map(FlavorEntry::Detailed)
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "flavor entry must be a name or an object, got {other}"
            ))),
        }
    }
}

fn default_stock() -> u32 {
    DEFAULT_STOCK
}

fn default_price() -> Cents {
    DEFAULT_PRICE
}

impl Catalog {
    pub fn new(flavors: Vec<FlavorConfig>) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();
        // Sales since the last clear never exceed the configured stock, so
        // this bounds every running total the ledger can reach.
        let mut capacity = Cents::ZERO;
        for flavor in &flavors {
            if flavor.name.trim().is_empty() {
                return Err(ConfigError::Invalid("flavor names must not be empty".to_string()));
            }
            if flavor.name.trim() != flavor.name {
                return Err(ConfigError::Invalid(format!(
                    "flavor name {:?} has surrounding whitespace",
                    flavor.name
                )));
            }
            if !seen.insert(flavor.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "flavor {} is listed more than once",
                    flavor.name
                )));
            }
            capacity = flavor
                .price
                .checked_mul(flavor.stock)
                .and_then(|value| capacity.checked_add(value))
                .filter(|total| *total <= Cents::MAX_EXACT)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "stock times price across the catalog exceeds {}",
                        Cents::MAX_EXACT
                    ))
                })?;
        }
        Ok(Self { flavors })
    }

    pub fn builtin() -> Self {
        Self {
            flavors: BUILTIN_FLAVORS
                .iter()
                .map(|name| FlavorConfig {
                    name: name.to_string(),
                    stock: DEFAULT_STOCK,
                    price: DEFAULT_PRICE,
                })
                .collect(),
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let file: CatalogFile = serde_json::from_slice(bytes)?;
        let flavors = file
            .sabores
            .into_iter()
            .map(|entry| match entry {
                FlavorEntry::Name(name) => FlavorConfig {
                    name,
                    stock: file.stock_inicial,
                    price: file.precio,
                },
                FlavorEntry::Detailed(detail) => FlavorConfig {
                    name: detail.nombre,
                    stock: detail.stock.unwrap_or(file.stock_inicial),
                    price: detail.precio.unwrap_or(file.precio),
                },
            })
            .collect();
        Self::new(flavors)
    }
}

/// Reads the catalog at `path`, falling back to the built-in flavors when the
/// file does not exist.
pub async fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    match fs::read(path).await {
        Ok(bytes) => Catalog::from_json(&bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("no catalog at {}, using built-in flavors", path.display());
            Ok(Catalog::builtin())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
