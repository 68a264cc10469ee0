//! engine::diff
//!
//! Content diff against the remote tree.
//!
//! A [`ChangeSet`] is the desired state: path to bytes, plus paths to
//! delete. [`compute_diff`] keeps only the entries whose blob hash differs
//! from what the branch currently holds, so an unchanged file never reaches
//! the commit request.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::core::hash::blob_hash;
use crate::forge::{FileAddition, Forge, ForgeError};

/// Desired content: files to write and paths to remove.
///
/// A path is never in both sets. The last operation on a path wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    updates: BTreeMap<String, Vec<u8>>,
    deletions: BTreeSet<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `path` to hold `content`, dropping any pending deletion.
    pub fn upsert(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        let path = path.into();
        self.deletions.remove(&path);
        self.updates.insert(path, content.into());
    }

    /// Queue `path` for deletion, dropping any pending update.
    pub fn delete(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.updates.remove(&path);
        self.deletions.insert(path);
    }

    /// Apply every entry of `other` in order: its updates, then its deletions.
    pub fn extend(&mut self, other: ChangeSet) {
        for (path, content) in other.updates {
            self.upsert(path, content);
        }
        for path in other.deletions {
            self.delete(path);
        }
    }

    pub fn updates(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.updates
    }

    pub fn deletions(&self) -> &BTreeSet<String> {
        &self.deletions
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.deletions.is_empty()
    }
}

/// The part of a [`ChangeSet`] that would actually change the branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentDiff {
    pub additions: Vec<FileAddition>,
    pub deletions: Vec<String>,
}

impl ContentDiff {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }
}

/// Compare `changes` against the head of `branch`.
///
/// An update is kept when the remote blob is absent or hashes differently;
/// a deletion is kept when the path exists remotely. `force` keeps every
/// entry regardless.
pub async fn compute_diff(
    forge: &dyn Forge,
    changes: &ChangeSet,
    branch: &str,
    force: bool,
) -> Result<ContentDiff, ForgeError> {
    let mut diff = ContentDiff::default();

    for (path, content) in changes.updates() {
        let local = blob_hash(content);
        let remote = forge.file_oid(branch, path).await?;
        debug!(
            "{}: local {} remote {}",
            path,
            local.short(7),
            remote.as_ref().map(|o| o.short(7)).unwrap_or("-")
        );

        if force || remote.as_ref() != Some(&local) {
            diff.additions.push(FileAddition {
                path: path.clone(),
                contents: content.clone(),
            });
        }
    }

    for path in changes.deletions() {
        let remote = forge.file_oid(branch, path).await?;
        if force || remote.is_some() {
            diff.deletions.push(path.clone());
        } else {
            debug!("{}: already absent", path);
        }
    }

    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::MockForge;

    mod change_set {
        use super::*;

        #[test]
        fn update_cancels_delete() {
            let mut changes = ChangeSet::new();
            changes.delete("a.txt");
            changes.upsert("a.txt", "new");
            assert!(changes.deletions().is_empty());
            assert_eq!(changes.updates()["a.txt"], b"new");
        }

        #[test]
        fn delete_cancels_update() {
            let mut changes = ChangeSet::new();
            changes.upsert("a.txt", "new");
            changes.delete("a.txt");
            assert!(changes.updates().is_empty());
            assert!(changes.deletions().contains("a.txt"));
        }

        #[test]
        fn extend_applies_in_order() {
            let mut base = ChangeSet::new();
            base.upsert("keep.txt", "1");
            base.delete("gone.txt");

            let mut later = ChangeSet::new();
            later.upsert("gone.txt", "back");
            later.delete("keep.txt");

            base.extend(later);
            assert_eq!(base.updates().keys().collect::<Vec<_>>(), vec!["gone.txt"]);
            assert_eq!(
                base.deletions().iter().collect::<Vec<_>>(),
                vec!["keep.txt"]
            );
        }

        #[test]
        fn empty() {
            assert!(ChangeSet::new().is_empty());
        }
    }

    mod compute {
        use super::*;

        #[tokio::test]
        async fn unchanged_content_is_skipped() {
            let forge = MockForge::new();
            forge.commit_files("main", &[("file1", "file1 content")]);

            let mut changes = ChangeSet::new();
            changes.upsert("file1", "file1 content");
            changes.upsert("file2", "file2 content");

            let diff = compute_diff(&forge, &changes, "main", false).await.unwrap();
            let paths: Vec<_> = diff.additions.iter().map(|a| a.path.as_str()).collect();
            assert_eq!(paths, vec!["file2"]);
        }

        #[tokio::test]
        async fn changed_content_is_included() {
            let forge = MockForge::new();
            forge.commit_files("main", &[("file1", "old")]);

            let mut changes = ChangeSet::new();
            changes.upsert("file1", "file1 content");

            let diff = compute_diff(&forge, &changes, "main", false).await.unwrap();
            assert_eq!(diff.additions.len(), 1);
            assert_eq!(diff.additions[0].contents, b"file1 content");
        }

        #[tokio::test]
        async fn absent_deletion_is_skipped() {
            let forge = MockForge::new();
            forge.commit_files("main", &[("present", "x")]);

            let mut changes = ChangeSet::new();
            changes.delete("present");
            changes.delete("absent");

            let diff = compute_diff(&forge, &changes, "main", false).await.unwrap();
            assert_eq!(diff.deletions, vec!["present"]);
            assert!(diff.additions.is_empty());
        }

        #[tokio::test]
        async fn force_includes_everything() {
            let forge = MockForge::new();
            forge.commit_files("main", &[("file1", "same")]);

            let mut changes = ChangeSet::new();
            changes.upsert("file1", "same");
            changes.delete("absent");

            let diff = compute_diff(&forge, &changes, "main", true).await.unwrap();
            assert_eq!(diff.additions.len(), 1);
            assert_eq!(diff.deletions, vec!["absent"]);
        }

        #[tokio::test]
        async fn diff_is_read_only() {
            let forge = MockForge::new();
            let mut changes = ChangeSet::new();
            changes.upsert("a", "b");

            compute_diff(&forge, &changes, "main", false).await.unwrap();
            assert!(forge.mutations().is_empty());
        }
    }
}
