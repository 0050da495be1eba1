use serde::{Deserialize, Serialize};

/// A named group of boost scripts, e.g. "Shield Boosts".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostCategory {
    pub name: String,
    pub scripts: Vec<String>,
}

impl BoostCategory {
    pub fn new(name: impl Into<String>, scripts: &[&str]) -> Self {
        Self {
            name: name.into(),
            scripts: scripts.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Ordered set of categories and the script names announced under them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostTaxonomy {
    pub categories: Vec<BoostCategory>,
}

impl Default for BoostTaxonomy {
    fn default() -> Self {
        Self {
            categories: vec![
                BoostCategory::new(
                    "Shield Boosts",
                    &[
                        "Active Shielding Charge",
                        "Shield Extension Charge",
                        "Shield Harmonizing Charge",
                    ],
                ),
                BoostCategory::new(
                    "Armor Boosts",
                    &[
                        "Armor Energizing Charge",
                        "Armor Reinforcement Charge",
                        "Rapid Repair Charge",
                    ],
                ),
                BoostCategory::new(
                    "Information Command",
                    &[
                        "Electronic Hardening charge",
                        "Electronic Superiority Charge",
                        "Sensor Optimization Charge",
                    ],
                ),
                BoostCategory::new(
                    "Skirmish Command",
                    &[
                        "Evasive Maneuvers charge",
                        "Interdiction Maneuvers charge",
                        "Rapid Deployment Charge",
                    ],
                ),
            ],
        }
    }
}

impl BoostTaxonomy {
    /// Every script name across all categories, in taxonomy order.
    pub fn scripts(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .flat_map(|c| c.scripts.iter().map(String::as_str))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|c| c.scripts.is_empty())
    }
}

/// Facts extracted for one pilot from a chat log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotFacts {
    pub scripts: Vec<String>,
    pub mindlink: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostAnnouncement {
    pub pilot: String,
    pub mindlink: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptBucket {
    pub script: String,
    pub pilots: Vec<BoostAnnouncement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub category: String,
    pub scripts: Vec<ScriptBucket>,
}

/// category → script → pilots, rebuilt from scratch every poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostIndex {
    pub categories: Vec<CategoryBucket>,
}

impl BoostIndex {
    /// An index with one empty bucket per taxonomy script.
    #[must_use]
    pub fn empty(taxonomy: &BoostTaxonomy) -> Self {
        Self {
            categories: taxonomy
                .categories
                .iter()
                .map(|category| CategoryBucket {
                    category: category.name.clone(),
                    scripts: category
                        .scripts
                        .iter()
                        .map(|script| ScriptBucket {
                            script: script.clone(),
                            pilots: Vec::new(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Appends the pilot to every bucket named `script`. Returns how many
    /// buckets received the announcement.
    pub fn record(&mut self, script: &str, pilot: &str, mindlink: bool) -> usize {
        let mut hits = 0;
        for category in &mut self.categories {
            for bucket in category.scripts.iter_mut().filter(|b| b.script == script) {
                bucket.pilots.push(BoostAnnouncement {
                    pilot: pilot.to_string(),
                    mindlink,
                });
                hits += 1;
            }
        }
        hits
    }

    #[must_use]
    pub fn pilots(&self, category: &str, script: &str) -> &[BoostAnnouncement] {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .and_then(|c| c.scripts.iter().find(|s| s.script == script))
            .map_or(&[], |s| s.pilots.as_slice())
    }

    #[must_use]
    pub fn total_announcements(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.scripts.iter())
            .map(|s| s.pilots.len())
            .sum()
    }
}
