//! Output-file rotation.
//!
//! Decides, from the current [`FileCursor`], when a flush cycle should start
//! a new output file, and generates the file's name. The check runs exactly
//! once per flush cycle, before the batch is appended, so a batch is never
//! split across two files.
//!
//! Name generation is deterministic given a prefix and a timestamp:
//! `"<prefix>_<%Y-%m-%d_%H-%M-%S>.csv"` for timestamped names,
//! `"<prefix>_<%Y-%m-%d_%H>.csv"` under the hourly strategy.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

const HOUR_KEY_FORMAT: &str = "%Y-%m-%d_%H";

/// When to start a new output file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum RotationPolicy {
    /// Rotate once the file holds this many lines.
    EntryCount {
        /// Line threshold per file.
        max_entries_per_file: usize,
    },
    /// Rotate when the calendar hour changes.
    Hourly,
    /// One file for the lifetime of the session.
    Fixed,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        RotationPolicy::EntryCount {
            max_entries_per_file: 20000,
        }
    }
}

impl RotationPolicy {
    /// The file name this policy produces for `prefix` at time `at`.
    pub fn file_name(&self, prefix: &str, at: DateTime<Local>) -> String {
        match self {
            RotationPolicy::Hourly => {
                format!("{prefix}_{}.csv", at.format(HOUR_KEY_FORMAT))
            }
            RotationPolicy::EntryCount { .. } | RotationPolicy::Fixed => {
                format!("{prefix}_{}.csv", at.format("%Y-%m-%d_%H-%M-%S"))
            }
        }
    }

    /// Whether the file behind `cursor` should be rotated at time `now`.
    pub fn should_rotate(&self, cursor: &FileCursor, now: DateTime<Local>) -> bool {
        match self {
            RotationPolicy::EntryCount {
                max_entries_per_file,
            } => cursor.entry_count >= *max_entries_per_file,
            RotationPolicy::Hourly => {
                now.format(HOUR_KEY_FORMAT).to_string() != cursor.hour_key
            }
            RotationPolicy::Fixed => false,
        }
    }
}

/// The active output file: its name, how many lines it holds, and the
/// rotation key captured when it was opened.
///
/// Touched only by the flush task; producers never read it.
#[derive(Clone, Debug)]
pub struct FileCursor {
    file_name: String,
    entry_count: usize,
    hour_key: String,
}

impl FileCursor {
    /// Open a cursor for a fresh file named by `policy` at time `now`.
    pub fn open(policy: &RotationPolicy, prefix: &str, now: DateTime<Local>) -> Self {
        Self {
            file_name: policy.file_name(prefix, now),
            entry_count: 0,
            hour_key: now.format(HOUR_KEY_FORMAT).to_string(),
        }
    }

    /// Name of the active file.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Lines written to the active file so far.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Record that `lines` more lines were appended.
    pub fn advance(&mut self, lines: usize) {
        self.entry_count += lines;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn entry_count_rotates_at_threshold_only() {
        let policy = RotationPolicy::EntryCount {
            max_entries_per_file: 5,
        };
        let mut cursor = FileCursor::open(&policy, "USB_Data", at(10, 0, 0));

        cursor.advance(4);
        assert!(!policy.should_rotate(&cursor, at(10, 0, 4)));

        cursor.advance(1);
        assert!(policy.should_rotate(&cursor, at(10, 0, 5)));
    }

    #[test]
    fn reopening_resets_entry_count() {
        let policy = RotationPolicy::EntryCount {
            max_entries_per_file: 5,
        };
        let mut cursor = FileCursor::open(&policy, "USB_Data", at(10, 0, 0));
        cursor.advance(5);

        let rotated = FileCursor::open(&policy, "USB_Data", at(10, 0, 7));
        assert_eq!(rotated.entry_count(), 0);
        assert_ne!(rotated.file_name(), cursor.file_name());
    }

    #[test]
    fn timestamped_names_are_deterministic() {
        let policy = RotationPolicy::EntryCount {
            max_entries_per_file: 20000,
        };
        assert_eq!(
            policy.file_name("OpenEarableEEG", at(9, 30, 12)),
            "OpenEarableEEG_2025-03-01_09-30-12.csv"
        );
        assert_eq!(
            policy.file_name("OpenEarableEEG", at(9, 30, 12)),
            policy.file_name("OpenEarableEEG", at(9, 30, 12)),
        );
        assert_ne!(
            policy.file_name("OpenEarableEEG", at(9, 30, 12)),
            policy.file_name("OpenEarableEEG", at(9, 30, 14)),
        );
    }

    #[test]
    fn hourly_name_is_stable_within_the_hour() {
        let policy = RotationPolicy::Hourly;
        assert_eq!(
            policy.file_name("OpenEarableEEG", at(9, 5, 0)),
            policy.file_name("OpenEarableEEG", at(9, 55, 30)),
        );

        let cursor = FileCursor::open(&policy, "OpenEarableEEG", at(9, 5, 0));
        assert!(!policy.should_rotate(&cursor, at(9, 59, 59)));
        assert!(policy.should_rotate(&cursor, at(10, 0, 0)));
    }

    #[test]
    fn fixed_never_rotates() {
        let policy = RotationPolicy::Fixed;
        let mut cursor = FileCursor::open(&policy, "App_Logs", at(9, 0, 0));
        cursor.advance(1_000_000);
        assert!(!policy.should_rotate(&cursor, at(23, 59, 59)));
    }
}
