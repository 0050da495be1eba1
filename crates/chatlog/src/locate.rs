use regex::RegexBuilder;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// `~/Documents/EVE/logs/Chatlogs`, where the client writes channel logs.
#[must_use]
pub fn default_chatlog_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("EVE")
        .join("logs")
        .join("Chatlogs")
}

/// Newest `<channel>_YYYYMMDD_HHMMSS_<id>.txt` in `dir` by modification time.
///
/// The channel name is matched literally and case-insensitively. A missing
/// directory or no matching file yields `None`.
pub fn find_latest_log(dir: &Path, channel: &str) -> Option<PathBuf> {
    let pattern = RegexBuilder::new(&format!(
        r"^{}_\d{{8}}_\d{{6}}_\d+\.txt$",
        regex::escape(channel)
    ))
    .case_insensitive(true)
    .build()
    .ok()?;

    let read_dir = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(err) => {
            log::debug!("Chat log dir {} unavailable: {err}", dir.display());
            return None;
        }
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in read_dir.flatten() {
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !pattern.is_match(name) {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().map_or(true, |(best, _)| modified > *best) {
            newest = Some((modified, entry.path()));
        }
    }
    newest.map(|(_, path)| path)
}
