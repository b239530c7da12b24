//! SQLite storage implementation

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use chrono::Utc;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use crate::paths::Location;
use crate::question::{NewQuestion, QuestionField, QuestionFilter, QuestionPatch, QuestionRecord};
use crate::{Error, Result};
use super::schema;

/// Column list shared by every query that materialises a [`QuestionRecord`]
const RECORD_COLUMNS: &str = "id, title, question_type, subject, topic, subtopic, difficulty_level, \
     estimated_time, bloom_level, is_ai_generated, ai_generation_notes, created_at";

/// SQLite-backed storage for question metadata
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Question Operations ==========

    /// Insert a validated question, returning its new id
    pub fn insert(&self, question: &NewQuestion) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO questions (title, question_type, subject, topic, subtopic, difficulty_level,
                                   estimated_time, bloom_level, is_ai_generated, ai_generation_notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                question.title,
                question.question_type.as_str(),
                question.subject,
                question.topic,
                question.subtopic,
                question.difficulty_level.as_str(),
                question.estimated_time,
                question.bloom_level.as_str(),
                question.is_ai_generated,
                question.ai_generation_notes,
                Utc::now(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Apply a partial update. Only the columns set in `patch` are written.
    pub fn update(&self, id: i64, patch: &QuestionPatch) -> Result<()> {
        let assignments = patch_assignments(patch);
        if assignments.is_empty() {
            return Err(Error::validation("No valid fields to update"));
        }

        let set_clause = assignments
            .iter()
            .enumerate()
            .map(|(i, (field, _))| format!("{} = ?{}", field.column(), i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE questions SET {} WHERE id = ?{}",
            set_clause,
            assignments.len() + 1
        );

        let mut values: Vec<Value> = assignments.into_iter().map(|(_, value)| value).collect();
        values.push(Value::Integer(id));

        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    /// Delete a question, returning where its content file lived
    pub fn delete(&self, id: i64) -> Result<Location> {
        let tx = self.conn.unchecked_transaction()?;
        let location = tx
            .query_row(
                "SELECT subject, topic, subtopic FROM questions WHERE id = ?1",
                [id],
                |row| {
                    Ok(Location {
                        subject: row.get(0)?,
                        topic: row.get(1)?,
                        subtopic: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(Error::NotFound(id))?;

        tx.execute("DELETE FROM questions WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(location)
    }

    /// Get a question by id, or `None`
    pub fn find(&self, id: i64) -> Result<Option<QuestionRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM questions WHERE id = ?1", RECORD_COLUMNS),
                [id],
                |row| self.row_to_record(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a question by id
    pub fn get(&self, id: i64) -> Result<QuestionRecord> {
        self.find(id)?.ok_or(Error::NotFound(id))
    }

    /// List questions matching every constraint in `filter`, newest first
    pub fn list(&self, filter: &QuestionFilter) -> Result<Vec<QuestionRecord>> {
        let constraints = filter.constraints();

        let mut sql = format!("SELECT {} FROM questions", RECORD_COLUMNS);
        if !constraints.is_empty() {
            let conditions = constraints
                .iter()
                .enumerate()
                .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
                .collect::<Vec<_>>();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(constraints.iter().map(|(_, value)| *value)), |row| {
                self.row_to_record(row)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Count all questions
    pub fn count_questions(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Helper to convert a row to a QuestionRecord
    fn row_to_record(&self, row: &rusqlite::Row) -> rusqlite::Result<QuestionRecord> {
        Ok(QuestionRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            question_type: parse_column(row, 2)?,
            subject: row.get(3)?,
            topic: row.get(4)?,
            subtopic: row.get(5)?,
            difficulty_level: parse_column(row, 6)?,
            estimated_time: row.get(7)?,
            bloom_level: parse_column(row, 8)?,
            is_ai_generated: row.get(9)?,
            ai_generation_notes: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    // ========== Aggregates ==========

    /// Get question bank statistics
    pub fn stats(&self) -> Result<BankStats> {
        let ai_generated: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM questions WHERE is_ai_generated = 1",
            [],
            |row| row.get(0),
        )?;

        Ok(BankStats {
            total_questions: self.count_questions()?,
            ai_generated: ai_generated as usize,
            by_subject: self.count_by(QuestionField::Subject)?,
            by_difficulty: self.count_by(QuestionField::DifficultyLevel)?,
            by_type: self.count_by(QuestionField::QuestionType)?,
        })
    }

    fn count_by(&self, field: QuestionField) -> Result<BTreeMap<String, usize>> {
        let column = field.column();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {column}, COUNT(*) FROM questions GROUP BY {column}"
        ))?;

        let counts = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok((row.get::<_, String>(0)?, count as usize))
            })?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

        Ok(counts)
    }

    /// Distinct (subject, topic) pairs with their question counts
    pub fn topics(&self) -> Result<Vec<TopicSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT subject, topic, COUNT(*) FROM questions GROUP BY subject, topic ORDER BY subject, topic",
        )?;

        let topics = stmt
            .query_map([], |row| {
                let count: i64 = row.get(2)?;
                Ok(TopicSummary {
                    subject: row.get(0)?,
                    topic: row.get(1)?,
                    question_count: count as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(topics)
    }

    /// Pick one question at random, restricted to `topics` unless it is empty
    pub fn random(&self, topics: &[TopicRef]) -> Result<Option<QuestionRecord>> {
        let mut sql = format!("SELECT {} FROM questions", RECORD_COLUMNS);
        let mut values: Vec<&str> = Vec::with_capacity(topics.len() * 2);

        if !topics.is_empty() {
            let conditions = topics
                .iter()
                .enumerate()
                .map(|(i, topic)| {
                    values.push(&topic.subject);
                    values.push(&topic.topic);
                    format!("(subject = ?{} AND topic = ?{})", 2 * i + 1, 2 * i + 2)
                })
                .collect::<Vec<_>>();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" OR "));
        }
        sql.push_str(" ORDER BY RANDOM() LIMIT 1");

        self.conn
            .query_row(&sql, params_from_iter(values), |row| self.row_to_record(row))
            .optional()
            .map_err(Into::into)
    }
}

fn parse_column<T: FromStr<Err = Error>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: Error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Translate a typed patch into (column, bound value) pairs
fn patch_assignments(patch: &QuestionPatch) -> Vec<(QuestionField, Value)> {
    let text = |s: &str| Value::Text(s.to_string());
    let nullable = |s: &Option<String>| s.clone().map(Value::Text).unwrap_or(Value::Null);

    let mut assignments = Vec::new();
    if let Some(title) = &patch.title {
        assignments.push((QuestionField::Title, text(title)));
    }
    if let Some(question_type) = patch.question_type {
        assignments.push((QuestionField::QuestionType, text(question_type.as_str())));
    }
    if let Some(subject) = &patch.subject {
        assignments.push((QuestionField::Subject, text(subject)));
    }
    if let Some(topic) = &patch.topic {
        assignments.push((QuestionField::Topic, text(topic)));
    }
    if let Some(subtopic) = &patch.subtopic {
        assignments.push((QuestionField::Subtopic, nullable(subtopic)));
    }
    if let Some(difficulty) = patch.difficulty_level {
        assignments.push((QuestionField::DifficultyLevel, text(difficulty.as_str())));
    }
    if let Some(minutes) = patch.estimated_time {
        assignments.push((QuestionField::EstimatedTime, Value::Integer(i64::from(minutes))));
    }
    if let Some(bloom) = patch.bloom_level {
        assignments.push((QuestionField::BloomLevel, text(bloom.as_str())));
    }
    if let Some(flag) = patch.is_ai_generated {
        assignments.push((QuestionField::IsAiGenerated, Value::Integer(i64::from(flag))));
    }
    if let Some(notes) = &patch.ai_generation_notes {
        assignments.push((QuestionField::AiGenerationNotes, nullable(notes)));
    }
    assignments
}

/// A (subject, topic) pair, written `Subject:Topic` on the command line and in
/// query strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRef {
    pub subject: String,
    pub topic: String,
}

impl FromStr for TopicRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((subject, topic)) if !subject.trim().is_empty() && !topic.trim().is_empty() => {
                Ok(TopicRef {
                    subject: subject.trim().to_string(),
                    topic: topic.trim().to_string(),
                })
            }
            _ => Err(Error::Validation(format!(
                "Invalid topic '{}' (expected Subject:Topic)",
                s
            ))),
        }
    }
}

/// A topic and how many questions it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub subject: String,
    pub topic: String,
    pub question_count: usize,
}

/// Question bank statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStats {
    pub total_questions: usize,
    pub ai_generated: usize,
    pub by_subject: BTreeMap<String, usize>,
    pub by_difficulty: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{BloomLevel, DifficultyLevel, QuestionType};

    fn sample_question(subject: &str, topic: &str, difficulty: DifficultyLevel) -> NewQuestion {
        NewQuestion {
            title: format!("{} question", topic),
            question_type: QuestionType::Mcq,
            subject: subject.to_string(),
            topic: topic.to_string(),
            subtopic: None,
            difficulty_level: difficulty,
            estimated_time: 5,
            bloom_level: BloomLevel::Apply,
            is_ai_generated: false,
            ai_generation_notes: None,
        }
    }

    #[test]
    fn test_question_crud() {
        let store = RecordStore::open_in_memory().unwrap();

        let id = store.insert(&sample_question("Math", "Algebra", DifficultyLevel::Easy)).unwrap();
        assert_eq!(id, 1);

        let record = store.get(id).unwrap();
        assert_eq!(record.title, "Algebra question");
        assert_eq!(record.question_type, QuestionType::Mcq);
        assert_eq!(record.estimated_time, 5);
        assert!(!record.is_ai_generated);

        let location = store.delete(id).unwrap();
        assert_eq!(location, Location::new("Math", "Algebra", None).unwrap());
        assert!(matches!(store.get(id), Err(Error::NotFound(1))));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = RecordStore::open_in_memory().unwrap();
        let first = store.insert(&sample_question("Math", "Algebra", DifficultyLevel::Easy)).unwrap();
        store.delete(first).unwrap();

        let second = store.insert(&sample_question("Math", "Algebra", DifficultyLevel::Easy)).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_update_changes_only_patched_fields() {
        let store = RecordStore::open_in_memory().unwrap();
        let id = store.insert(&sample_question("Math", "Algebra", DifficultyLevel::Easy)).unwrap();
        let before = store.get(id).unwrap();

        let patch = QuestionPatch {
            title: Some("X".into()),
            ..Default::default()
        };
        store.update(id, &patch).unwrap();

        let after = store.get(id).unwrap();
        assert_eq!(after.title, "X");
        assert_eq!(QuestionRecord { title: before.title.clone(), ..after }, before);
    }

    #[test]
    fn test_update_clears_nullable_columns() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut question = sample_question("Math", "Algebra", DifficultyLevel::Easy);
        question.subtopic = Some("Linear".into());
        let id = store.insert(&question).unwrap();

        let patch = QuestionPatch {
            subtopic: Some(None),
            is_ai_generated: Some(true),
            ..Default::default()
        };
        store.update(id, &patch).unwrap();

        let record = store.get(id).unwrap();
        assert_eq!(record.subtopic, None);
        assert!(record.is_ai_generated);
    }

    #[test]
    fn test_update_errors() {
        let store = RecordStore::open_in_memory().unwrap();
        let id = store.insert(&sample_question("Math", "Algebra", DifficultyLevel::Easy)).unwrap();

        assert!(matches!(store.update(id, &QuestionPatch::default()), Err(Error::Validation(_))));

        let patch = QuestionPatch {
            estimated_time: Some(10),
            ..Default::default()
        };
        assert!(matches!(store.update(99, &patch), Err(Error::NotFound(99))));
        assert!(matches!(store.delete(99), Err(Error::NotFound(99))));
    }

    #[test]
    fn test_list_filters_and_orders_newest_first() {
        let store = RecordStore::open_in_memory().unwrap();
        let a = store.insert(&sample_question("Math", "Algebra", DifficultyLevel::Easy)).unwrap();
        store.insert(&sample_question("Math", "Geometry", DifficultyLevel::Hard)).unwrap();
        store.insert(&sample_question("Science", "Physics", DifficultyLevel::Easy)).unwrap();
        let d = store.insert(&sample_question("Math", "Calculus", DifficultyLevel::Easy)).unwrap();

        let filter = QuestionFilter {
            subject: Some("Math".into()),
            difficulty_level: Some("Easy".into()),
            ..Default::default()
        };
        let ids: Vec<i64> = store.list(&filter).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![d, a]);

        assert_eq!(store.list(&QuestionFilter::default()).unwrap().len(), 4);
    }

    #[test]
    fn test_stats_and_topics() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert(&sample_question("Math", "Algebra", DifficultyLevel::Easy)).unwrap();
        store.insert(&sample_question("Math", "Algebra", DifficultyLevel::Hard)).unwrap();
        let mut generated = sample_question("Science", "Physics", DifficultyLevel::Easy);
        generated.is_ai_generated = true;
        store.insert(&generated).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_questions, 3);
        assert_eq!(stats.ai_generated, 1);
        assert_eq!(stats.by_subject.get("Math"), Some(&2));
        assert_eq!(stats.by_difficulty.get("Easy"), Some(&2));
        assert_eq!(stats.by_type.get("MCQ"), Some(&3));

        let topics = store.topics().unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].subject, "Math");
        assert_eq!(topics[0].question_count, 2);
    }

    #[test]
    fn test_random_respects_topics() {
        let store = RecordStore::open_in_memory().unwrap();
        assert!(store.random(&[]).unwrap().is_none());

        store.insert(&sample_question("Math", "Algebra", DifficultyLevel::Easy)).unwrap();
        let physics = store.insert(&sample_question("Science", "Physics", DifficultyLevel::Easy)).unwrap();

        let only_physics = [TopicRef::from_str("Science:Physics").unwrap()];
        for _ in 0..5 {
            assert_eq!(store.random(&only_physics).unwrap().unwrap().id, physics);
        }

        let nothing = [TopicRef::from_str("Art:Painting").unwrap()];
        assert!(store.random(&nothing).unwrap().is_none());
    }

    #[test]
    fn test_topic_ref_parsing() {
        let topic: TopicRef = "Math: Algebra".parse().unwrap();
        assert_eq!(topic.topic, "Algebra");
        assert!("Math".parse::<TopicRef>().is_err());
        assert!(":Algebra".parse::<TopicRef>().is_err());
    }
}
