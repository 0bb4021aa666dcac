//! Concerns configuration.
//!
//! Loaded from `~/.concerns/config.toml`. Every key is optional; a missing
//! file means defaults.
//!
//! ```toml
//! default-actor = "jdelacruz"
//! storage-root = "/srv/concerns"
//! outbox = "/srv/concerns/outbox.jsonl"
//!
//! [surfaces.merchant]
//! scope = [{ exact = "Merchant Office" }]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scope::DepartmentScope;

const OUTBOX_FILE: &str = "outbox.jsonl";

/// Concerns configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Who acts when neither `--as` nor `CONCERNS_ACTOR` is given.
    pub default_actor: Option<String>,

    /// Where the ticket database lives. Defaults to `~/.concerns/`.
    pub storage_root: Option<PathBuf>,

    /// Where notification intents are queued. Defaults to
    /// `outbox.jsonl` under the storage root.
    pub outbox: Option<PathBuf>,

    /// Named admin surfaces and the departments each may see.
    /// Entries here replace the built-in surface of the same name.
    pub surfaces: BTreeMap<String, Surface>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Surface {
    pub scope: DepartmentScope,
}

impl Config {
    /// Load config from `~/.concerns/config.toml`, or defaults if absent.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// The config file path: `~/.concerns/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".concerns").join("config.toml"))
    }

    /// The department scope for a named surface.
    ///
    /// Configured surfaces win over the built-in `merchant`, `motorpool`,
    /// and `admin` surfaces.
    pub fn surface(&self, name: &str) -> Result<DepartmentScope, String> {
        if let Some(surface) = self.surfaces.get(name) {
            return Ok(surface.scope.clone());
        }
        builtin_surface(name).ok_or_else(|| {
            let mut known: Vec<&str> = BUILTIN_SURFACES.to_vec();
            known.extend(self.surfaces.keys().map(String::as_str));
            known.sort_unstable();
            known.dedup();
            format!("unknown surface '{name}' (known: {})", known.join(", "))
        })
    }

    pub fn storage_root(&self) -> Option<PathBuf> {
        self.storage_root.clone().or_else(crate::storage::Storage::default_root)
    }

    pub fn outbox_path(&self, storage_root: &std::path::Path) -> PathBuf {
        self.outbox
            .clone()
            .unwrap_or_else(|| storage_root.join(OUTBOX_FILE))
    }
}

const BUILTIN_SURFACES: [&str; 3] = ["admin", "merchant", "motorpool"];

fn builtin_surface(name: &str) -> Option<DepartmentScope> {
    match name {
        "admin" => Some(DepartmentScope::All),
        "merchant" => Some(DepartmentScope::exact("Merchant Office")),
        "motorpool" => Some(DepartmentScope::containing(["motorpool", "shuttle"])),
        _ => None,
    }
}
