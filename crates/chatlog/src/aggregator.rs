use crate::{decode_log_bytes, find_latest_log, BoostParser, Result};
use fcat_protocol::{BoostIndex, BoostTaxonomy, PilotFacts};
use std::path::{Path, PathBuf};

/// Builds a fresh [`BoostIndex`] from the newest log of each channel.
#[derive(Debug, Clone)]
pub struct BoostAggregator {
    log_dir: PathBuf,
    taxonomy: BoostTaxonomy,
    parser: BoostParser,
}

impl BoostAggregator {
    pub fn new(log_dir: impl Into<PathBuf>, taxonomy: BoostTaxonomy) -> Result<Self> {
        let parser = BoostParser::new(&taxonomy)?;
        Ok(Self {
            log_dir: log_dir.into(),
            taxonomy,
            parser,
        })
    }

    #[must_use]
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    #[must_use]
    pub fn taxonomy(&self) -> &BoostTaxonomy {
        &self.taxonomy
    }

    /// Blocking: reads one file per channel. Channels without a readable log
    /// contribute nothing.
    #[must_use]
    pub fn aggregate(&self, channels: &[String]) -> BoostIndex {
        let mut index = BoostIndex::empty(&self.taxonomy);
        for channel in channels {
            let Some(text) = self.read_channel(channel) else {
                continue;
            };
            let facts = self.parser.parse(&text);
            log::debug!("Channel {channel}: {} pilots announced boosts", facts.len());
            merge_facts(&mut index, &facts);
        }
        index
    }

    fn read_channel(&self, channel: &str) -> Option<String> {
        let path = find_latest_log(&self.log_dir, channel)?;
        match std::fs::read(&path) {
            Ok(bytes) => {
                let (text, encoding) = decode_log_bytes(&bytes);
                log::debug!("Read {} as {encoding:?}", path.display());
                Some(text)
            }
            Err(err) => {
                log::warn!("Skipping unreadable chat log {}: {err}", path.display());
                None
            }
        }
    }
}

/// Appends every pilot to the bucket of each script they announced.
pub(crate) fn merge_facts(index: &mut BoostIndex, facts: &[(String, PilotFacts)]) {
    for (pilot, info) in facts {
        for script in &info.scripts {
            index.record(script, pilot, info.mindlink);
        }
    }
}
