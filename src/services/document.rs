use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{ColabError, ColabResult};
use crate::models::VersionRecord;
use crate::services::diff::unified_diff;

/// Append-only history of content snapshots for one document.
///
/// Never empty: it is seeded with version 1 and `records[i].version == i + 1` always holds.
#[derive(Debug, Clone)]
pub struct VersionLog {
    records: Vec<VersionRecord>,
}

impl VersionLog {
    pub fn seeded(content: &str, author: &str, at: DateTime<Utc>) -> Self {
        Self {
            records: vec![VersionRecord {
                version: 1,
                content: content.to_string(),
                user_id: author.to_string(),
                timestamp: at,
                restored_from: None,
            }],
        }
    }

    pub fn latest_version(&self) -> u64 {
        self.records.len() as u64
    }

    pub fn get(&self, version: u64) -> Option<&VersionRecord> {
        let idx = usize::try_from(version.checked_sub(1)?).ok()?;
        self.records.get(idx)
    }

    pub fn records(&self) -> &[VersionRecord] {
        &self.records
    }

    fn append(&mut self, content: String, author: &str, at: DateTime<Utc>, restored_from: Option<u64>) -> u64 {
        let version = self.latest_version() + 1;
        self.records.push(VersionRecord {
            version,
            content,
            user_id: author.to_string(),
            timestamp: at,
            restored_from,
        });
        version
    }
}

/// Result of an accepted content mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUpdate {
    pub version: u64,
    pub diff: String,
}

/// Content, metadata and history of one document.
///
/// Callers must hold the owning session's lock for every `&mut self` call.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pub id: String,
    pub title: String,
    pub language: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    content: String,
    collaborators: Vec<String>,
    versions: VersionLog,
}

impl DocumentStore {
    pub fn new(id: &str, title: &str, language: &str, creator: &str, content: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            title: title.to_string(),
            language: language.to_string(),
            created_by: creator.to_string(),
            created_at: now,
            updated_at: now,
            content: content.to_string(),
            collaborators: vec![creator.to_string()],
            versions: VersionLog::seeded(content, creator, now),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn version(&self) -> u64 {
        self.versions.latest_version()
    }

    pub fn versions(&self) -> &[VersionRecord] {
        self.versions.records()
    }

    /// Everyone who has ever joined, in first-join order.
    pub fn collaborators(&self) -> &[String] {
        &self.collaborators
    }

    /// Returns false when the user was already a collaborator.
    pub fn add_collaborator(&mut self, user_id: &str) -> bool {
        if self.collaborators.iter().any(|c| c == user_id) {
            return false;
        }
        self.collaborators.push(user_id.to_string());
        true
    }

    /// Replace the content, appending a new version.
    pub fn update(&mut self, new_content: &str, author: &str) -> ContentUpdate {
        let diff = unified_diff(&self.content, new_content);
        let now = Utc::now();
        let version = self.versions.append(new_content.to_string(), author, now, None);
        self.content = new_content.to_string();
        self.updated_at = now;
        debug!(doc_id = %self.id, version, author, "content updated");
        ContentUpdate { version, diff }
    }

    /// Copy an earlier version's content into a brand new version.
    pub fn restore(&mut self, target: u64, author: &str) -> ColabResult<u64> {
        let content = match self.versions.get(target) {
            Some(record) => record.content.clone(),
            None => {
                return Err(ColabError::NotFound(format!(
                    "Version {} of document '{}'",
                    target, self.id
                )))
            }
        };
        let now = Utc::now();
        let version = self.versions.append(content.clone(), author, now, Some(target));
        self.content = content;
        self.updated_at = now;
        debug!(doc_id = %self.id, version, restored_from = target, author, "version restored");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> DocumentStore {
        DocumentStore::new("d1", "Demo", "text", "u1", "// Start coding here...")
    }

    #[test]
    fn starts_at_version_one() {
        let d = doc();
        assert_eq!(d.version(), 1);
        assert_eq!(d.versions().len(), 1);
        assert_eq!(d.versions()[0].content, "// Start coding here...");
        assert_eq!(d.collaborators(), ["u1".to_string()]);
    }

    #[test]
    fn versions_are_gap_free() {
        let mut d = doc();
        for i in 0..10 {
            d.update(&format!("rev {}", i), "u2");
        }
        d.restore(3, "u1").unwrap();
        let numbers: Vec<u64> = d.versions().iter().map(|v| v.version).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<u64>>());
        assert_eq!(d.version(), 12);
    }

    #[test]
    fn update_reports_diff() {
        let mut d = doc();
        let update = d.update("hello", "u1");
        assert_eq!(update.version, 2);
        assert!(update.diff.contains("+hello\n"));
        assert_eq!(d.content(), "hello");
    }

    #[test]
    fn restore_copies_content_and_keeps_history() {
        let mut d = doc();
        d.update("first", "u1");
        d.update("second", "u2");
        let before: Vec<VersionRecord> = d.versions().to_vec();

        let version = d.restore(2, "u3").unwrap();
        assert_eq!(version, 4);
        assert_eq!(d.content(), "first");
        let restored = d.versions().last().unwrap();
        assert_eq!(restored.content, before[1].content);
        assert_eq!(restored.restored_from, Some(2));
        assert_eq!(restored.user_id, "u3");
        assert_eq!(&d.versions()[..3], &before[..]);
    }

    #[test]
    fn restore_unknown_version_is_not_found() {
        let mut d = doc();
        assert!(matches!(d.restore(0, "u1"), Err(ColabError::NotFound(_))));
        assert!(matches!(d.restore(7, "u1"), Err(ColabError::NotFound(_))));
        assert_eq!(d.version(), 1);
    }

    #[test]
    fn collaborators_stay_unique() {
        let mut d = doc();
        assert!(d.add_collaborator("u2"));
        assert!(!d.add_collaborator("u2"));
        assert!(!d.add_collaborator("u1"));
        assert_eq!(d.collaborators().len(), 2);
    }
}
