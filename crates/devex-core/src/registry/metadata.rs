//! Registry catalog types: plugin metadata, per-platform binaries, and the
//! registry snapshot itself.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A downloadable binary for one `<os>-<arch>` platform key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlatformBinary {
    #[serde(default)]
    pub url: String,
    /// Hex SHA-256 of the binary.
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub arch: String,
}

impl PlatformBinary {
    /// A binary is installable iff url, checksum, and a positive size are
    /// all present. Catalog entries for unreleased builds fail this.
    pub fn is_installable(&self) -> bool {
        !self.url.is_empty() && !self.checksum.is_empty() && self.size > 0
    }
}

/// Catalog entry describing one plugin and how to obtain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PluginMetadata {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Installation ordering hint; higher installs earlier.
    #[serde(default)]
    pub priority: i32,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// `"<os>-<arch>"` → binary.
    #[serde(default)]
    pub platforms: HashMap<String, PlatformBinary>,
    /// Set on local copies only; never present in registry payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl PluginMetadata {
    /// Binary for a platform key such as `linux-amd64`.
    pub fn binary_for(&self, platform_key: &str) -> Option<&PlatformBinary> {
        self.platforms.get(platform_key)
    }
}

/// Snapshot of the whole registry. Constructed by the client, never
/// mutated in place; refreshes replace the snapshot atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRegistry {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub version: String,
    #[serde(
        default = "unix_epoch",
        deserialize_with = "deserialize_last_updated"
    )]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub plugins: HashMap<String, PluginMetadata>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            version: String::new(),
            last_updated: unix_epoch(),
            plugins: HashMap::new(),
        }
    }
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Malformed timestamps degrade to the Unix epoch instead of failing the
/// whole snapshot; downstream freshness checks then treat the registry as
/// needing a refresh.
fn deserialize_last_updated<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(parsed) => Ok(parsed.with_timezone(&Utc)),
        Err(err) => {
            log::warn!(
                "Malformed registry last_updated '{}': {}; substituting Unix epoch",
                raw,
                err
            );
            Ok(unix_epoch())
        }
    }
}
