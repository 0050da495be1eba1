use crate::{Result, RoleCacheError};
use fcat_protocol::{TacticalRole, TypeId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CACHE_FILE_NAME: &str = ".fcat_ship_roles.json";

/// `~/.fcat_ship_roles.json`, or the working directory when no home exists.
#[must_use]
pub fn default_cache_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_FILE_NAME)
}

/// Process-wide ship type → role mapping persisted as a JSON object of
/// `"type_id": "role"` pairs.
#[derive(Debug, Clone, Default)]
pub struct RoleCache {
    path: Option<PathBuf>,
    entries: BTreeMap<TypeId, TacticalRole>,
}

impl RoleCache {
    /// A cache that never touches disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the cache at `path`. A missing or corrupt file yields an empty
    /// cache bound to the same path.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => parse_entries(&bytes, &path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                log::warn!("Role cache {} unreadable: {err}", path.display());
                BTreeMap::new()
            }
        };
        log::debug!(
            "Loaded {} cached ship roles from {}",
            entries.len(),
            path.display()
        );
        Self {
            path: Some(path),
            entries,
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn get(&self, type_id: TypeId) -> Option<TacticalRole> {
        self.entries.get(&type_id).copied()
    }

    /// Stores a resolved role. Unresolved roles are refused so a failed
    /// lookup is retried later.
    pub fn insert(&mut self, type_id: TypeId, role: TacticalRole) -> bool {
        if !role.is_resolved() {
            return false;
        }
        self.entries.insert(type_id, role);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, TacticalRole)> + '_ {
        self.entries.iter().map(|(id, role)| (*id, *role))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Writes the cache through a temp file and rename. In-memory caches
    /// have nothing to persist.
    pub async fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = self.to_json()?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(err) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(RoleCacheError::IoError(err));
        }
        Ok(())
    }

    fn to_json(&self) -> Result<Vec<u8>> {
        let object: BTreeMap<String, &'static str> = self
            .entries
            .iter()
            .map(|(id, role)| (id.to_string(), role.as_str()))
            .collect();
        Ok(serde_json::to_vec_pretty(&object)?)
    }
}

fn parse_entries(bytes: &[u8], path: &Path) -> BTreeMap<TypeId, TacticalRole> {
    let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_slice(bytes) {
        Ok(raw) => raw,
        Err(err) => {
            log::warn!("Role cache {} corrupted, starting fresh: {err}", path.display());
            return BTreeMap::new();
        }
    };

    let mut entries = BTreeMap::new();
    let mut dropped = 0usize;
    for (key, value) in raw {
        let type_id = key.trim().parse::<TypeId>().ok();
        let role = value
            .as_str()
            .and_then(|v| TacticalRole::from_cache_value(v).ok())
            .filter(|role| role.is_resolved());
        match (type_id, role) {
            (Some(type_id), Some(role)) => {
                entries.insert(type_id, role);
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        log::info!(
            "Dropped {dropped} unusable role cache entries from {}",
            path.display()
        );
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_an_empty_cache() {
        let temp = TempDir::new().unwrap();
        let cache = RoleCache::load(temp.path().join("absent.json"));
        assert!(cache.is_empty());
        assert!(cache.path().is_some());
    }

    #[test]
    fn corrupt_file_is_an_empty_cache() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("roles.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(RoleCache::load(&path).is_empty());
    }

    #[test]
    fn legacy_entries_are_migrated_and_failures_dropped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("roles.json");
        std::fs::write(
            &path,
            r#"{"587": "DPS", "11978": "Logistics", "22442": "Command",
                "17478": "mining", "999": "Unknown", "998": "undefined",
                "abc": "combat", "24690": 7}"#,
        )
        .unwrap();

        let cache = RoleCache::load(&path);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get(587), Some(TacticalRole::Combat));
        assert_eq!(cache.get(11978), Some(TacticalRole::Logistics));
        assert_eq!(cache.get(22442), Some(TacticalRole::Boosters));
        assert_eq!(cache.get(17478), Some(TacticalRole::Mining));
        assert_eq!(cache.get(999), None);
        assert_eq!(cache.get(998), None);
    }

    #[test]
    fn undefined_roles_are_never_inserted() {
        let mut cache = RoleCache::in_memory();
        assert!(!cache.insert(1, TacticalRole::Undefined));
        assert!(cache.insert(1, TacticalRole::Combat));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn persist_round_trips_through_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("roles.json");
        let mut cache = RoleCache::load(&path);
        cache.insert(11978, TacticalRole::Logistics);
        cache.insert(587, TacticalRole::Combat);
        cache.persist().await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["587"], "combat");
        assert_eq!(raw["11978"], "logistics");

        let reloaded = RoleCache::load(&path);
        assert_eq!(reloaded.get(11978), Some(TacticalRole::Logistics));
        assert!(!path.with_extension("json.tmp").exists());
    }
}
