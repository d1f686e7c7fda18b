// Last-used entry defaults
//
// Entry surfaces remember the last submitted values to prefill the next
// entry. This is front-end convenience state: it is loaded, passed around and
// saved explicitly by the caller, never held globally.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::entities::{EntryKind, Owner, Payer, SplitMode};
use crate::error::LedgerResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryDefaults {
    pub kind: EntryKind,
    pub owner: Owner,
    pub paid_by: Payer,
    pub split_mode: SplitMode,
    pub account: Option<String>,
    pub category: Option<String>,
    pub card_label: String,
}

impl Default for EntryDefaults {
    fn default() -> Self {
        EntryDefaults {
            kind: EntryKind::Expense,
            owner: Owner::Primary,
            paid_by: Payer::Primary,
            split_mode: SplitMode::None,
            account: None,
            category: None,
            card_label: String::new(),
        }
    }
}

impl EntryDefaults {
    /// Missing file ⇒ defaults. An unreadable file is logged and ignored.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return EntryDefaults::default(),
        };

        match serde_json::from_str(&raw) {
            Ok(defaults) => defaults,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable entry defaults");
                EntryDefaults::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> LedgerResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = EntryDefaults::load(&dir.path().join("nope.json"));
        assert_eq!(loaded, EntryDefaults::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("last_entry.json");

        let defaults = EntryDefaults {
            kind: EntryKind::Income,
            owner: Owner::Both,
            account: Some("Bank".to_string()),
            ..Default::default()
        };
        defaults.save(&path).unwrap();

        assert_eq!(EntryDefaults::load(&path), defaults);
    }

    #[test]
    fn test_garbage_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_entry.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(EntryDefaults::load(&path), EntryDefaults::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_entry.json");
        std::fs::write(&path, r#"{"owner": "partner"}"#).unwrap();

        let loaded = EntryDefaults::load(&path);
        assert_eq!(loaded.owner, Owner::Partner);
        assert_eq!(loaded.kind, EntryKind::Expense);
    }
}
