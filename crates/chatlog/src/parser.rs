use crate::{ChatLogError, Result};
use fcat_protocol::{BoostTaxonomy, PilotFacts};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

// "[ 2025.06.24 13:23:34 ] Pilot Name > message"
static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\]\s*(?P<pilot>[^>]+?)\s*>\s*(?P<msg>.+)").expect("valid chat line regex")
});

static MINDLINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\+ml\b").expect("valid mindlink regex"));

/// Extracts per-pilot boost announcements from chat log text.
#[derive(Debug, Clone)]
pub struct BoostParser {
    scripts: Vec<(String, Regex)>,
}

impl BoostParser {
    /// Compiles one whole-word, case-insensitive matcher per taxonomy script.
    pub fn new(taxonomy: &BoostTaxonomy) -> Result<Self> {
        let mut scripts = Vec::new();
        for name in taxonomy.scripts() {
            let pattern = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(name)))
                .case_insensitive(true)
                .build()
                .map_err(|source| ChatLogError::Pattern {
                    name: name.to_string(),
                    source,
                })?;
            scripts.push((name.to_string(), pattern));
        }
        Ok(Self { scripts })
    }

    /// Pilots in order of first announcement. A later line from the same
    /// pilot replaces their earlier facts. Lines naming no script and no
    /// mindlink are ignored.
    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<(String, PilotFacts)> {
        let mut pilots: Vec<(String, PilotFacts)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for line in text.lines() {
            let Some(caps) = LINE_RE.captures(line) else {
                continue;
            };
            let pilot = caps["pilot"].trim();
            let msg = caps["msg"].trim();

            let scripts: Vec<String> = self
                .scripts
                .iter()
                .filter(|(_, pattern)| pattern.is_match(msg))
                .map(|(name, _)| name.clone())
                .collect();
            let mindlink = MINDLINK_RE.is_match(msg);
            if scripts.is_empty() && !mindlink {
                continue;
            }

            let facts = PilotFacts { scripts, mindlink };
            match positions.get(pilot) {
                Some(&idx) => pilots[idx].1 = facts,
                None => {
                    positions.insert(pilot.to_string(), pilots.len());
                    pilots.push((pilot.to_string(), facts));
                }
            }
        }
        pilots
    }
}
