use crate::{ClassificationRules, RoleCache};
use fcat_esi::SharedGateway;
use fcat_protocol::{TacticalRole, TypeId};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Resolves ship type ids to tactical roles.
///
/// The cache sits behind an async mutex that stays locked for a whole
/// classification, so concurrent callers are serialized and there is a
/// single writer of the persisted file.
pub struct ShipClassifier {
    gateway: SharedGateway,
    cache: Mutex<RoleCache>,
    rules: ClassificationRules,
}

impl ShipClassifier {
    pub fn new(gateway: SharedGateway, cache: RoleCache) -> Self {
        Self::with_rules(gateway, cache, ClassificationRules::default())
    }

    pub fn with_rules(gateway: SharedGateway, cache: RoleCache, rules: ClassificationRules) -> Self {
        Self {
            gateway,
            cache: Mutex::new(cache),
            rules,
        }
    }

    /// Always returns a role. Lookup failures come back as
    /// [`TacticalRole::Undefined`] and leave the cache untouched.
    pub async fn classify(&self, type_id: TypeId) -> TacticalRole {
        let mut cache = self.cache.lock().await;
        if let Some(role) = cache.get(type_id) {
            return role;
        }
        if type_id <= 0 {
            log::debug!("Refusing to classify invalid ship type id {type_id}");
            return TacticalRole::Undefined;
        }

        let role = match self.resolve(type_id).await {
            Ok(role) => role,
            Err(err) => {
                log::warn!("Ship type {type_id} classification failed: {err}");
                return TacticalRole::Undefined;
            }
        };

        if cache.insert(type_id, role) {
            if let Err(err) = cache.persist().await {
                log::warn!("Failed to persist role cache: {err}");
            }
        }
        role
    }

    /// Classifies each distinct id once, one after another.
    pub async fn classify_all(&self, type_ids: &[TypeId]) -> HashMap<TypeId, TacticalRole> {
        let mut roles = HashMap::with_capacity(type_ids.len());
        for type_id in type_ids {
            if roles.contains_key(type_id) {
                continue;
            }
            let role = self.classify(*type_id).await;
            roles.insert(*type_id, role);
        }
        roles
    }

    /// Copy of the current cache contents.
    pub async fn snapshot(&self) -> RoleCache {
        self.cache.lock().await.clone()
    }

    async fn resolve(&self, type_id: TypeId) -> fcat_esi::Result<TacticalRole> {
        let ty = self.gateway.type_metadata(type_id).await?;
        let group = self.gateway.group_metadata(ty.group_id).await?;
        let role = self.rules.classify(ty.group_id, &group.name);
        log::debug!(
            "Classified {} ({type_id}) in group {} ({}) as {role}",
            ty.name,
            group.name,
            ty.group_id
        );
        Ok(role)
    }
}
