use fcat_protocol::{GroupId, TacticalRole};

/// Ordered rule table applied to a resolved ship group.
///
/// Priority: exact group name, then known group id, then keyword heuristics
/// over the group name, then `fallback`.
#[derive(Debug, Clone)]
pub struct ClassificationRules {
    group_names: Vec<(String, TacticalRole)>,
    group_ids: Vec<(GroupId, TacticalRole)>,
    keywords: Vec<(TacticalRole, Vec<String>)>,
    fallback: TacticalRole,
}

const GROUP_NAMES: &[(&str, TacticalRole)] = &[
    ("logistics", TacticalRole::Logistics),
    ("logistics frigate", TacticalRole::Logistics),
    ("force auxiliary", TacticalRole::Logistics),
    ("command ship", TacticalRole::Boosters),
    ("command destroyer", TacticalRole::Boosters),
    ("industrial command ship", TacticalRole::Boosters),
    ("mining barge", TacticalRole::Mining),
    ("exhumer", TacticalRole::Mining),
    ("expedition frigate", TacticalRole::Mining),
    ("capital industrial ship", TacticalRole::Mining),
];

const GROUP_IDS: &[(GroupId, TacticalRole)] = &[
    (832, TacticalRole::Logistics),
    (1527, TacticalRole::Logistics),
    (1538, TacticalRole::Logistics),
    (540, TacticalRole::Boosters),
    (1534, TacticalRole::Boosters),
    (941, TacticalRole::Boosters),
    (463, TacticalRole::Mining),
    (543, TacticalRole::Mining),
    (1283, TacticalRole::Mining),
    (883, TacticalRole::Mining),
];

const LOGISTICS_KEYWORDS: &[&str] = &["logistics", "osprey", "guardian", "scimitar", "basilisk"];
const BOOSTER_KEYWORDS: &[&str] = &["command", "booster", "link"];
const MINING_KEYWORDS: &[&str] = &["mining", "barge", "exhumer", "skiff", "hulk", "mackinaw"];

impl Default for ClassificationRules {
    fn default() -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| (*w).to_string()).collect();
        Self {
            group_names: GROUP_NAMES
                .iter()
                .map(|(name, role)| ((*name).to_string(), *role))
                .collect(),
            group_ids: GROUP_IDS.to_vec(),
            keywords: vec![
                (TacticalRole::Logistics, owned(LOGISTICS_KEYWORDS)),
                (TacticalRole::Boosters, owned(BOOSTER_KEYWORDS)),
                (TacticalRole::Mining, owned(MINING_KEYWORDS)),
            ],
            fallback: TacticalRole::Combat,
        }
    }
}

impl ClassificationRules {
    /// Adds (or replaces) an exact group-name rule; matching ignores case.
    #[must_use]
    pub fn with_group_name(mut self, name: &str, role: TacticalRole) -> Self {
        let name = name.trim().to_lowercase();
        self.group_names.retain(|(existing, _)| *existing != name);
        self.group_names.insert(0, (name, role));
        self
    }

    pub fn classify(&self, group_id: GroupId, group_name: &str) -> TacticalRole {
        let name = group_name.trim().to_lowercase();

        if let Some((_, role)) = self.group_names.iter().find(|(n, _)| *n == name) {
            return *role;
        }
        if let Some((_, role)) = self.group_ids.iter().find(|(id, _)| *id == group_id) {
            return *role;
        }
        for (role, words) in &self.keywords {
            if words.iter().any(|w| name.contains(w.as_str())) {
                return *role;
            }
        }
        self.fallback
    }
}
