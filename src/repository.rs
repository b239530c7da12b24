//! Question repository - keeps rows and content files paired
//!
//! Every write touches the database first and the content file second. There
//! is no transaction spanning both: if the file half fails after the row half
//! committed, the row is left in place and the caller gets
//! [`Error::Inconsistent`] so it can tell "nothing happened" apart from
//! "half of it happened".

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::content::ContentStore;
use crate::paths::{Location, PathResolver};
use crate::question::{QuestionFilter, QuestionInput, QuestionRecord};
use crate::storage::{BankStats, RecordStore, TopicRef, TopicSummary};
use crate::{Error, Result};

/// A question record together with its content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(flatten)]
    pub record: QuestionRecord,
    /// Empty if the content file is missing
    pub content: String,
}

/// Outcome of [`QuestionRepository::add`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Added {
    pub id: i64,
    pub title: String,
    pub content_location: PathBuf,
}

/// Outcome of [`QuestionRepository::update`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Updated {
    pub id: i64,
    /// Where the content file is expected to live after the update
    pub content_location: PathBuf,
    /// The content file was moved because subject, topic or subtopic changed
    pub relocated: bool,
}

/// Outcome of [`QuestionRepository::delete`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deleted {
    pub id: i64,
    pub content_location: PathBuf,
    /// `false` if there was no content file to remove
    pub content_removed: bool,
}

/// Question bank: metadata in SQLite, content as files under a root directory.
pub struct QuestionRepository {
    records: RecordStore,
    paths: PathResolver,
    content: ContentStore,
}

impl QuestionRepository {
    pub fn new(records: RecordStore, root: impl Into<PathBuf>) -> Self {
        Self {
            records,
            paths: PathResolver::new(root),
            content: ContentStore::new(),
        }
    }

    /// Open the database at `database` and use `root` for content files.
    /// The root directory is created if missing.
    pub fn open(database: &Path, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self::new(RecordStore::open(database)?, root))
    }

    /// In-memory database with content files under `root` (for testing)
    pub fn open_in_memory(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self::new(RecordStore::open_in_memory()?, root))
    }

    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Path a record's content file is derived to, whether or not it exists
    pub fn content_path(&self, record: &QuestionRecord) -> PathBuf {
        self.content
            .file_path(&self.paths.locate(&record.location()), record.id)
    }

    /// Add a question. Validation happens before anything is written.
    pub fn add(&self, input: QuestionInput) -> Result<Added> {
        let (question, content) = input.validate()?;
        let id = self.records.insert(&question)?;

        let location = question.location();
        let written = self
            .paths
            .resolve(&location)
            .and_then(|dir| self.content.write(&dir, id, &content));

        match written {
            Ok(content_location) => {
                tracing::info!("Question {} added at {}", id, content_location.display());
                Ok(Added {
                    id,
                    title: question.title,
                    content_location,
                })
            }
            Err(e) => {
                tracing::warn!("Question {} inserted but content write failed: {}", id, e);
                Err(Error::inconsistent(id, e))
            }
        }
    }

    /// Update the fields present in `input`.
    ///
    /// When subject, topic or subtopic change, the content file follows the
    /// record: new content is written at the new location, otherwise the
    /// existing file is moved there. Either way no copy is left at the old
    /// location. An input carrying only `content` rewrites the file and leaves
    /// the row alone.
    pub fn update(&self, id: i64, input: QuestionInput) -> Result<Updated> {
        let (patch, content) = input.into_patch()?;
        if patch.is_empty() && content.is_none() {
            return Err(Error::validation("No valid fields to update"));
        }

        let before = self.records.get(id)?;
        let old_location = before.location();
        let new_location = patch.apply_location(&old_location);

        if !patch.is_empty() {
            self.records.update(id, &patch)?;
        }

        match self.place_content(id, &old_location, &new_location, content.as_deref()) {
            Ok((content_location, relocated)) => {
                tracing::info!("Question {} updated", id);
                Ok(Updated {
                    id,
                    content_location,
                    relocated,
                })
            }
            Err(e) if patch.is_empty() => Err(e),
            Err(e) => {
                tracing::warn!("Question {} updated but content placement failed: {}", id, e);
                Err(Error::inconsistent(id, e))
            }
        }
    }

    fn place_content(
        &self,
        id: i64,
        old_location: &Location,
        new_location: &Location,
        content: Option<&str>,
    ) -> Result<(PathBuf, bool)> {
        let moving = old_location != new_location;
        let old_dir = self.paths.locate(old_location);

        if !moving {
            return match content {
                Some(content) => {
                    let dir = self.paths.resolve(new_location)?;
                    Ok((self.content.write(&dir, id, content)?, false))
                }
                None => Ok((self.content.file_path(&old_dir, id), false)),
            };
        }

        let new_dir = self.paths.resolve(new_location)?;
        // Move first, then overwrite: old and new paths may name the same
        // file on a case-insensitive filesystem
        let moved = self.content.relocate(&old_dir, &new_dir, id)?;
        let relocated = match content {
            Some(content) => {
                self.content.write(&new_dir, id, content)?;
                true
            }
            None => {
                if !moved {
                    tracing::warn!("Question {} had no content file at {}", id, old_dir.display());
                }
                moved
            }
        };

        if relocated {
            tracing::debug!("Question {} content moved from {} to {}", id, old_location, new_location);
        }
        Ok((self.content.file_path(&new_dir, id), relocated))
    }

    /// Delete the row, then the content file. A missing file is not an error.
    pub fn delete(&self, id: i64) -> Result<Deleted> {
        let location = self.records.delete(id)?;
        let dir = self.paths.locate(&location);
        let content_location = self.content.file_path(&dir, id);

        match self.content.delete(&dir, id) {
            Ok(content_removed) => {
                if !content_removed {
                    tracing::warn!("Question {} deleted but had no content file", id);
                }
                tracing::info!("Question {} deleted", id);
                Ok(Deleted {
                    id,
                    content_location,
                    content_removed,
                })
            }
            Err(e) => {
                tracing::warn!("Question {} row deleted but content file remains: {}", id, e);
                Err(Error::inconsistent(id, e))
            }
        }
    }

    /// Fetch a record with its content. Missing content reads as an empty string.
    pub fn get(&self, id: i64) -> Result<Question> {
        let record = self.records.get(id)?;
        self.with_content(record)
    }

    fn with_content(&self, record: QuestionRecord) -> Result<Question> {
        let dir = self.paths.locate(&record.location());
        let content = match self.content.read(&dir, record.id)? {
            Some(content) => content,
            None => {
                tracing::warn!("Question {} has no content file in {}", record.id, dir.display());
                String::new()
            }
        };
        Ok(Question { record, content })
    }

    /// List records (without content), newest first
    pub fn list(&self, filter: &QuestionFilter) -> Result<Vec<QuestionRecord>> {
        self.records.list(filter)
    }

    pub fn statistics(&self) -> Result<BankStats> {
        self.records.stats()
    }

    pub fn topics(&self) -> Result<Vec<TopicSummary>> {
        self.records.topics()
    }

    /// A random question (with content) from the given topics, or from the
    /// whole bank when `topics` is empty
    pub fn random_question(&self, topics: &[TopicRef]) -> Result<Question> {
        let record = self
            .records
            .random(topics)?
            .ok_or_else(|| Error::NoMatch("No questions available for the selected topics".into()))?;
        self.with_content(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{DifficultyLevel, QuestionType};
    use serde_json::json;
    use tempfile::TempDir;

    fn repository() -> (TempDir, QuestionRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = QuestionRepository::open_in_memory(dir.path().join("bank")).unwrap();
        (dir, repo)
    }

    fn input(subject: &str, topic: &str, subtopic: &str, content: &str) -> QuestionInput {
        QuestionInput {
            title: Some("Q1".into()),
            content: Some(content.into()),
            question_type: Some("MCQ".into()),
            subject: Some(subject.into()),
            topic: Some(topic.into()),
            subtopic: Some(subtopic.into()),
            difficulty_level: Some("Easy".into()),
            estimated_time: Some(json!(5)),
            bloom_level: Some("Apply".into()),
            ..Default::default()
        }
    }

    fn file_count(root: &Path) -> usize {
        fn walk(dir: &Path) -> usize {
            std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .filter_map(|e| e.ok())
                        .map(|e| {
                            let path = e.path();
                            if path.is_dir() { walk(&path) } else { 1 }
                        })
                        .sum()
                })
                .unwrap_or(0)
        }
        walk(root)
    }

    #[test]
    fn test_add_then_get_roundtrip() {
        let (_dir, repo) = repository();

        let added = repo.add(input("Math", "Algebra", "Linear", "Solve x + 1 = 2")).unwrap();
        assert_eq!(added.content_location, repo.root().join("Math/Algebra/Linear/1.md"));

        let question = repo.get(added.id).unwrap();
        assert_eq!(question.content, "Solve x + 1 = 2");
        assert_eq!(question.record.title, "Q1");
        assert_eq!(question.record.question_type, QuestionType::Mcq);
        assert_eq!(question.record.difficulty_level, DifficultyLevel::Easy);
        assert_eq!(question.record.subtopic.as_deref(), Some("Linear"));
        assert_eq!(question.record.estimated_time, 5);
    }

    #[test]
    fn test_invalid_add_writes_nothing() {
        let (_dir, repo) = repository();

        let mut bad = input("Math", "Algebra", "", "2+2=?");
        bad.estimated_time = Some(json!(-5));

        assert!(matches!(repo.add(bad), Err(Error::Validation(_))));
        assert_eq!(repo.records().count_questions().unwrap(), 0);
        assert_eq!(file_count(repo.root()), 0);
        assert!(!repo.root().join("Math").exists());
    }

    #[test]
    fn test_scenario_add_move_delete() {
        let (_dir, repo) = repository();

        let added = repo.add(input("Math", "Algebra", "", "2+2=?")).unwrap();
        assert_eq!(added.id, 1);
        let old_path = repo.root().join("Math/Algebra/1.md");
        assert_eq!(std::fs::read_to_string(&old_path).unwrap(), "2+2=?");

        let patch = QuestionInput {
            subject: Some("Science".into()),
            ..Default::default()
        };
        let updated = repo.update(1, patch).unwrap();
        let new_path = repo.root().join("Science/Algebra/1.md");
        assert!(updated.relocated);
        assert_eq!(updated.content_location, new_path);
        assert_eq!(std::fs::read_to_string(&new_path).unwrap(), "2+2=?");
        assert!(!old_path.exists());

        let deleted = repo.delete(1).unwrap();
        assert!(deleted.content_removed);
        assert!(!new_path.exists());
        assert!(matches!(repo.get(1), Err(Error::NotFound(1))));
    }

    #[test]
    fn test_title_update_leaves_everything_else() {
        let (_dir, repo) = repository();
        let id = repo.add(input("Math", "Algebra", "", "body")).unwrap().id;
        let before = repo.get(id).unwrap();

        let patch = QuestionInput {
            title: Some("X".into()),
            ..Default::default()
        };
        let updated = repo.update(id, patch).unwrap();
        assert!(!updated.relocated);

        let after = repo.get(id).unwrap();
        assert_eq!(after.record.title, "X");
        assert_eq!(after.content, before.content);
        assert_eq!(after.record.subject, before.record.subject);
        assert_eq!(after.record.created_at, before.record.created_at);
        assert_eq!(after.record.estimated_time, before.record.estimated_time);
    }

    #[test]
    fn test_update_with_new_content_and_location() {
        let (_dir, repo) = repository();
        let id = repo.add(input("Math", "Algebra", "Linear", "old")).unwrap().id;

        let patch = QuestionInput {
            subtopic: Some("".into()),
            content: Some("new".into()),
            ..Default::default()
        };
        repo.update(id, patch).unwrap();

        assert_eq!(repo.get(id).unwrap().content, "new");
        assert!(!repo.root().join("Math/Algebra/Linear/1.md").exists());
        assert_eq!(file_count(repo.root()), 1);
    }

    #[test]
    fn test_content_only_update() {
        let (_dir, repo) = repository();
        let id = repo.add(input("Math", "Algebra", "", "old")).unwrap().id;

        let patch = QuestionInput {
            content: Some("rewritten".into()),
            ..Default::default()
        };
        repo.update(id, patch).unwrap();
        assert_eq!(repo.get(id).unwrap().content, "rewritten");
    }

    #[test]
    fn test_update_errors() {
        let (_dir, repo) = repository();
        let id = repo.add(input("Math", "Algebra", "", "body")).unwrap().id;

        assert!(matches!(
            repo.update(id, QuestionInput::default()),
            Err(Error::Validation(_))
        ));

        let patch = QuestionInput {
            title: Some("X".into()),
            ..Default::default()
        };
        assert!(matches!(repo.update(404, patch), Err(Error::NotFound(404))));
    }

    #[test]
    fn test_missing_content_reads_empty_and_deletes_cleanly() {
        let (_dir, repo) = repository();
        let id = repo.add(input("Math", "Algebra", "", "body")).unwrap().id;
        std::fs::remove_file(repo.root().join("Math/Algebra/1.md")).unwrap();

        assert_eq!(repo.get(id).unwrap().content, "");

        let deleted = repo.delete(id).unwrap();
        assert!(!deleted.content_removed);
        assert!(matches!(repo.delete(id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_content_failure_after_insert_is_inconsistent() {
        let (_dir, repo) = repository();
        // A plain file where the subject directory should be
        std::fs::write(repo.root().join("Math"), "not a directory").unwrap();

        let err = repo.add(input("Math", "Algebra", "", "body")).unwrap_err();
        assert!(matches!(err, Error::Inconsistent { id: 1, .. }));

        // The row stays behind
        let question = repo.get(1).unwrap();
        assert_eq!(question.content, "");
    }

    #[test]
    fn test_subject_case_change_with_new_content_keeps_file() {
        let (_dir, repo) = repository();
        let id = repo.add(input("Math", "Algebra", "", "old")).unwrap().id;

        let patch = QuestionInput {
            subject: Some("math".into()),
            content: Some("new".into()),
            ..Default::default()
        };
        let updated = repo.update(id, patch).unwrap();
        assert!(updated.relocated);
        assert_eq!(updated.content_location, repo.root().join("math/Algebra/1.md"));

        let question = repo.get(id).unwrap();
        assert_eq!(question.record.subject, "math");
        assert_eq!(question.content, "new");
        assert_eq!(repo.content_path(&question.record), updated.content_location);
        assert_eq!(file_count(repo.root()), 1);
    }

    #[test]
    fn test_move_without_content_file() {
        let (_dir, repo) = repository();
        let id = repo.add(input("Math", "Algebra", "", "body")).unwrap().id;
        std::fs::remove_file(repo.root().join("Math/Algebra/1.md")).unwrap();

        let patch = QuestionInput {
            topic: Some("Geometry".into()),
            ..Default::default()
        };
        let updated = repo.update(id, patch).unwrap();
        assert!(!updated.relocated);
        assert_eq!(updated.content_location, repo.root().join("Math/Geometry/1.md"));
        assert_eq!(repo.records().get(id).unwrap().topic, "Geometry");
        assert_eq!(file_count(repo.root()), 0);
    }

    #[test]
    fn test_content_failure_after_update_is_inconsistent() {
        let (_dir, repo) = repository();
        let id = repo.add(input("Math", "Algebra", "", "body")).unwrap().id;
        // A plain file where the new subject directory should be
        std::fs::write(repo.root().join("Physics"), "not a directory").unwrap();

        let patch = QuestionInput {
            subject: Some("Physics".into()),
            ..Default::default()
        };
        let err = repo.update(id, patch).unwrap_err();
        assert!(matches!(err, Error::Inconsistent { id: 1, .. }));

        // The row was patched, the file never moved
        assert_eq!(repo.records().get(id).unwrap().subject, "Physics");
        assert!(repo.root().join("Math/Algebra/1.md").exists());
    }

    #[test]
    fn test_content_failure_after_delete_is_inconsistent() {
        let (_dir, repo) = repository();
        let id = repo.add(input("Math", "Algebra", "", "body")).unwrap().id;
        // A directory in place of the content file can't be removed as a file
        let path = repo.root().join("Math/Algebra/1.md");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = repo.delete(id).unwrap_err();
        assert!(matches!(err, Error::Inconsistent { id: 1, .. }));

        // The row is gone, the directory stays
        assert!(repo.records().find(id).unwrap().is_none());
        assert!(path.is_dir());
    }

    #[test]
    fn test_list_filter_accepts_lowercase_vocabulary() {
        let (_dir, repo) = repository();
        let id = repo.add(input("Math", "Algebra", "", "a")).unwrap().id;

        let filter = QuestionFilter {
            difficulty_level: Some("easy".into()),
            question_type: Some("mcq".into()),
            ..Default::default()
        };
        let ids: Vec<i64> = repo.list(&filter).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![id]);
    }

    #[test]
    fn test_filtered_list_newest_first() {
        let (_dir, repo) = repository();
        let a = repo.add(input("Math", "Algebra", "", "a")).unwrap().id;
        let mut hard = input("Math", "Geometry", "", "b");
        hard.difficulty_level = Some("Hard".into());
        repo.add(hard).unwrap();
        repo.add(input("Science", "Physics", "", "c")).unwrap();
        let d = repo.add(input("Math", "Calculus", "", "d")).unwrap().id;

        let filter = QuestionFilter {
            subject: Some("Math".into()),
            difficulty_level: Some("Easy".into()),
            ..Default::default()
        };
        let ids: Vec<i64> = repo.list(&filter).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![d, a]);
    }

    #[test]
    fn test_random_question_includes_content() {
        let (_dir, repo) = repository();
        assert!(matches!(repo.random_question(&[]), Err(Error::NoMatch(_))));

        repo.add(input("Math", "Algebra", "", "only one")).unwrap();
        let question = repo.random_question(&[]).unwrap();
        assert_eq!(question.content, "only one");
    }

    #[test]
    fn test_question_serializes_flat() {
        let (_dir, repo) = repository();
        let id = repo.add(input("Math", "Algebra", "", "body")).unwrap().id;

        let value = serde_json::to_value(repo.get(id).unwrap()).unwrap();
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["content"], json!("body"));
        assert_eq!(value["question_type"], json!("MCQ"));
    }
}
