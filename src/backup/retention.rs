//! Retention policy
//!
//! Deciding which backups to drop is a pure function of the current set;
//! the manager does the deleting.

use super::record::{BackupRecord, BackupSet};

/// How many backups of a world to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum number of backups kept; `0` disables pruning
    pub max_kept: usize,
}

impl RetentionPolicy {
    pub fn new(max_kept: usize) -> Self {
        Self { max_kept }
    }

    /// Keep everything
    pub fn unlimited() -> Self {
        Self { max_kept: 0 }
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_kept == 0
    }

    /// Backups that fall outside the policy, oldest first
    pub fn select_for_deletion(&self, set: &BackupSet) -> Vec<BackupRecord> {
        if self.is_unlimited() || set.len() <= self.max_kept {
            return Vec::new();
        }

        let excess = set.len() - self.max_kept;
        set.oldest_first().take(excess).cloned().collect()
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(7)
    }
}
