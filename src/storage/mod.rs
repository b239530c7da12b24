//! Storage Layer - SQLite-backed question metadata
//!
//! System of record for question metadata is a single SQLite table:
//! - questions(id, title, question_type, subject, topic, subtopic,
//!   difficulty_level, estimated_time, bloom_level, is_ai_generated,
//!   ai_generation_notes, created_at)
//!
//! Question bodies are not stored here; see [`crate::content`].

pub mod schema;
pub mod sqlite;

pub use sqlite::{BankStats, RecordStore, TopicRef, TopicSummary};
