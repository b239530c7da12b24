//! Database schema definitions

/// SQL to create the questions table.
///
/// `AUTOINCREMENT` keeps ids of deleted questions from being handed out again.
pub const CREATE_QUESTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS questions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    question_type TEXT NOT NULL,
    subject TEXT NOT NULL,
    topic TEXT NOT NULL,
    subtopic TEXT,
    difficulty_level TEXT NOT NULL,
    estimated_time INTEGER NOT NULL CHECK (estimated_time > 0),
    bloom_level TEXT NOT NULL,
    is_ai_generated INTEGER NOT NULL DEFAULT 0,
    ai_generation_notes TEXT,
    created_at TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_questions_subject_topic ON questions(subject, topic)",
    "CREATE INDEX IF NOT EXISTS idx_questions_difficulty ON questions(difficulty_level)",
    "CREATE INDEX IF NOT EXISTS idx_questions_type ON questions(question_type)",
    "CREATE INDEX IF NOT EXISTS idx_questions_created ON questions(created_at)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_QUESTIONS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
