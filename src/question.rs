//! Question types
//!
//! Three layers of question data:
//! - [`QuestionInput`]: the loosely typed mapping callers send (form, JSON, CLI flags)
//! - [`NewQuestion`] / [`QuestionPatch`]: validated, typed values the store accepts
//! - [`QuestionRecord`]: a row as read back from the store
//!
//! The fixed vocabularies (`QuestionType`, `DifficultyLevel`, `BloomLevel`) are
//! stored in their canonical spelling and parsed leniently.

use crate::paths::{self, Location};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of assessment question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "MCQ")]
    Mcq,
    Coding,
    Numerical,
    Descriptive,
    #[serde(rename = "Fill-in-the-blank")]
    FillInTheBlank,
    #[serde(rename = "True/False")]
    TrueFalse,
    #[serde(rename = "Short Answer")]
    ShortAnswer,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "MCQ",
            QuestionType::Coding => "Coding",
            QuestionType::Numerical => "Numerical",
            QuestionType::Descriptive => "Descriptive",
            QuestionType::FillInTheBlank => "Fill-in-the-blank",
            QuestionType::TrueFalse => "True/False",
            QuestionType::ShortAnswer => "Short Answer",
        }
    }

    pub fn all() -> &'static [QuestionType] {
        &[
            QuestionType::Mcq,
            QuestionType::Coding,
            QuestionType::Numerical,
            QuestionType::Descriptive,
            QuestionType::FillInTheBlank,
            QuestionType::TrueFalse,
            QuestionType::ShortAnswer,
        ]
    }
}

impl FromStr for QuestionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mcq" | "multiple choice" | "multiple-choice" => Ok(QuestionType::Mcq),
            "coding" | "code" | "programming" => Ok(QuestionType::Coding),
            "numerical" | "numeric" => Ok(QuestionType::Numerical),
            "descriptive" | "essay" => Ok(QuestionType::Descriptive),
            "fill-in-the-blank" | "fill in the blank" | "fill-in-the-blanks" => {
                Ok(QuestionType::FillInTheBlank)
            }
            "true/false" | "true-false" | "true or false" => Ok(QuestionType::TrueFalse),
            "short answer" | "short-answer" => Ok(QuestionType::ShortAnswer),
            _ => Err(unknown_value("question_type", s, Self::all().iter().map(|t| t.as_str()))),
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "Easy",
            DifficultyLevel::Medium => "Medium",
            DifficultyLevel::Hard => "Hard",
        }
    }

    pub fn all() -> &'static [DifficultyLevel] {
        &[DifficultyLevel::Easy, DifficultyLevel::Medium, DifficultyLevel::Hard]
    }
}

impl FromStr for DifficultyLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(DifficultyLevel::Easy),
            "medium" | "moderate" => Ok(DifficultyLevel::Medium),
            "hard" | "difficult" => Ok(DifficultyLevel::Hard),
            _ => Err(unknown_value("difficulty_level", s, Self::all().iter().map(|d| d.as_str()))),
        }
    }
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bloom's taxonomy level a question targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloomLevel {
    Recall,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl BloomLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BloomLevel::Recall => "Recall",
            BloomLevel::Understand => "Understand",
            BloomLevel::Apply => "Apply",
            BloomLevel::Analyze => "Analyze",
            BloomLevel::Evaluate => "Evaluate",
            BloomLevel::Create => "Create",
        }
    }

    pub fn all() -> &'static [BloomLevel] {
        &[
            BloomLevel::Recall,
            BloomLevel::Understand,
            BloomLevel::Apply,
            BloomLevel::Analyze,
            BloomLevel::Evaluate,
            BloomLevel::Create,
        ]
    }
}

impl FromStr for BloomLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "recall" | "remember" => Ok(BloomLevel::Recall),
            "understand" => Ok(BloomLevel::Understand),
            "apply" => Ok(BloomLevel::Apply),
            "analyze" | "analyse" => Ok(BloomLevel::Analyze),
            "evaluate" => Ok(BloomLevel::Evaluate),
            "create" => Ok(BloomLevel::Create),
            _ => Err(unknown_value("bloom_level", s, Self::all().iter().map(|b| b.as_str()))),
        }
    }
}

impl std::fmt::Display for BloomLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn unknown_value<'a>(field: &str, value: &str, allowed: impl Iterator<Item = &'a str>) -> Error {
    let allowed: Vec<&str> = allowed.collect();
    Error::Validation(format!(
        "Invalid {}: '{}' (expected one of: {})",
        field,
        value,
        allowed.join(", ")
    ))
}

/// A question row as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: i64,
    pub title: String,
    pub question_type: QuestionType,
    pub subject: String,
    pub topic: String,
    pub subtopic: Option<String>,
    pub difficulty_level: DifficultyLevel,
    /// Minutes
    pub estimated_time: u32,
    pub bloom_level: BloomLevel,
    pub is_ai_generated: bool,
    pub ai_generation_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QuestionRecord {
    /// Where this record's content file lives, derived from its current fields.
    pub fn location(&self) -> Location {
        Location {
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            subtopic: self.subtopic.clone(),
        }
    }
}

/// A validated question ready for insertion. `id` and `created_at` are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub title: String,
    pub question_type: QuestionType,
    pub subject: String,
    pub topic: String,
    pub subtopic: Option<String>,
    pub difficulty_level: DifficultyLevel,
    pub estimated_time: u32,
    pub bloom_level: BloomLevel,
    pub is_ai_generated: bool,
    pub ai_generation_notes: Option<String>,
}

impl NewQuestion {
    pub fn location(&self) -> Location {
        Location {
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            subtopic: self.subtopic.clone(),
        }
    }
}

/// The mutable columns of a question row.
///
/// `id` and `created_at` are deliberately absent: they can never be patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionField {
    Title,
    QuestionType,
    Subject,
    Topic,
    Subtopic,
    DifficultyLevel,
    EstimatedTime,
    BloomLevel,
    IsAiGenerated,
    AiGenerationNotes,
}

impl QuestionField {
    /// Column name in the `questions` table
    pub fn column(&self) -> &'static str {
        match self {
            QuestionField::Title => "title",
            QuestionField::QuestionType => "question_type",
            QuestionField::Subject => "subject",
            QuestionField::Topic => "topic",
            QuestionField::Subtopic => "subtopic",
            QuestionField::DifficultyLevel => "difficulty_level",
            QuestionField::EstimatedTime => "estimated_time",
            QuestionField::BloomLevel => "bloom_level",
            QuestionField::IsAiGenerated => "is_ai_generated",
            QuestionField::AiGenerationNotes => "ai_generation_notes",
        }
    }

    pub fn all() -> &'static [QuestionField] {
        &[
            QuestionField::Title,
            QuestionField::QuestionType,
            QuestionField::Subject,
            QuestionField::Topic,
            QuestionField::Subtopic,
            QuestionField::DifficultyLevel,
            QuestionField::EstimatedTime,
            QuestionField::BloomLevel,
            QuestionField::IsAiGenerated,
            QuestionField::AiGenerationNotes,
        ]
    }

    pub fn touches_location(&self) -> bool {
        matches!(
            self,
            QuestionField::Subject | QuestionField::Topic | QuestionField::Subtopic
        )
    }
}

/// A typed partial update. `None` leaves a column untouched; for the nullable
/// columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionPatch {
    pub title: Option<String>,
    pub question_type: Option<QuestionType>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub subtopic: Option<Option<String>>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub estimated_time: Option<u32>,
    pub bloom_level: Option<BloomLevel>,
    pub is_ai_generated: Option<bool>,
    pub ai_generation_notes: Option<Option<String>>,
}

impl QuestionPatch {
    /// Fields this patch sets, in column order
    pub fn fields(&self) -> Vec<QuestionField> {
        QuestionField::all()
            .iter()
            .copied()
            .filter(|field| match field {
                QuestionField::Title => self.title.is_some(),
                QuestionField::QuestionType => self.question_type.is_some(),
                QuestionField::Subject => self.subject.is_some(),
                QuestionField::Topic => self.topic.is_some(),
                QuestionField::Subtopic => self.subtopic.is_some(),
                QuestionField::DifficultyLevel => self.difficulty_level.is_some(),
                QuestionField::EstimatedTime => self.estimated_time.is_some(),
                QuestionField::BloomLevel => self.bloom_level.is_some(),
                QuestionField::IsAiGenerated => self.is_ai_generated.is_some(),
                QuestionField::AiGenerationNotes => self.ai_generation_notes.is_some(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    pub fn touches_location(&self) -> bool {
        self.fields().iter().any(QuestionField::touches_location)
    }

    /// The location a record at `current` ends up at once this patch is applied.
    pub fn apply_location(&self, current: &Location) -> Location {
        Location {
            subject: self.subject.clone().unwrap_or_else(|| current.subject.clone()),
            topic: self.topic.clone().unwrap_or_else(|| current.topic.clone()),
            subtopic: match &self.subtopic {
                Some(subtopic) => subtopic.clone(),
                None => current.subtopic.clone(),
            },
        }
    }
}

/// Filters for listing questions. Every field is an exact match; omitted or
/// blank fields are unconstrained. Unknown keys are ignored on deserialisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionFilter {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub difficulty_level: Option<String>,
    pub question_type: Option<String>,
}

impl QuestionFilter {
    /// (column, value) pairs for the constraints actually in effect.
    ///
    /// Difficulty and question type are matched in their stored spelling, so
    /// `easy` finds `Easy` rows. Values that don't parse are kept as given.
    pub fn constraints(&self) -> Vec<(&'static str, &str)> {
        let difficulty = self
            .difficulty_level
            .as_deref()
            .map(|v| DifficultyLevel::from_str(v).map(|d| d.as_str()).unwrap_or(v));
        let question_type = self
            .question_type
            .as_deref()
            .map(|v| QuestionType::from_str(v).map(|t| t.as_str()).unwrap_or(v));

        [
            ("subject", self.subject.as_deref()),
            ("topic", self.topic.as_deref()),
            ("difficulty_level", difficulty),
            ("question_type", question_type),
        ]
        .into_iter()
        .filter_map(|(column, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (column, v))
        })
        .collect()
    }
}

/// Question data as supplied by a caller.
///
/// Used both for `add` (all required fields must be present) and for
/// `update` (only the fields present are changed). `estimated_time` is kept
/// as a raw JSON value so that both `5` and `"5"` are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub question_type: Option<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub subtopic: Option<String>,
    pub difficulty_level: Option<String>,
    pub estimated_time: Option<serde_json::Value>,
    pub bloom_level: Option<String>,
    pub is_ai_generated: Option<bool>,
    pub ai_generation_notes: Option<String>,
}

const REQUIRED_FIELDS: &[&str] = &[
    "title",
    "content",
    "question_type",
    "subject",
    "topic",
    "difficulty_level",
    "estimated_time",
    "bloom_level",
];

impl QuestionInput {
    fn text_field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "title" => &self.title,
            "content" => &self.content,
            "question_type" => &self.question_type,
            "subject" => &self.subject,
            "topic" => &self.topic,
            "difficulty_level" => &self.difficulty_level,
            "bloom_level" => &self.bloom_level,
            _ => return None,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// Validate a full question for insertion, returning the typed row and its content.
    pub fn validate(&self) -> Result<(NewQuestion, String)> {
        for field in REQUIRED_FIELDS {
            let present = match *field {
                "estimated_time" => self.estimated_time.as_ref().is_some_and(|v| !is_blank(v)),
                name => self.text_field(name).is_some(),
            };
            if !present {
                return Err(Error::Validation(format!("Missing required field: {}", field)));
            }
        }

        let required = |name: &str| -> Result<&str> {
            self.text_field(name)
                .ok_or_else(|| Error::Validation(format!("Missing required field: {}", name)))
        };

        let estimated_time = match &self.estimated_time {
            Some(value) => parse_estimated_time(value)?,
            None => return Err(Error::validation("Missing required field: estimated_time")),
        };

        let location = Location::new(required("subject")?, required("topic")?, self.subtopic.as_deref())?;

        let question = NewQuestion {
            title: required("title")?.trim().to_string(),
            question_type: required("question_type")?.parse()?,
            subject: location.subject,
            topic: location.topic,
            subtopic: location.subtopic,
            difficulty_level: required("difficulty_level")?.parse()?,
            estimated_time,
            bloom_level: required("bloom_level")?.parse()?,
            is_ai_generated: self.is_ai_generated.unwrap_or(false),
            ai_generation_notes: non_blank(self.ai_generation_notes.as_deref()),
        };

        Ok((question, required("content")?.to_string()))
    }

    /// Validate the fields present as a partial update, returning the typed
    /// patch and the new content, if any.
    pub fn into_patch(self) -> Result<(QuestionPatch, Option<String>)> {
        let mut patch = QuestionPatch::default();

        if let Some(title) = &self.title {
            patch.title = Some(not_blank("title", title)?.to_string());
        }
        if let Some(question_type) = &self.question_type {
            patch.question_type = Some(not_blank("question_type", question_type)?.parse()?);
        }
        if let Some(subject) = &self.subject {
            patch.subject = Some(paths::check_component("subject", subject)?);
        }
        if let Some(topic) = &self.topic {
            patch.topic = Some(paths::check_component("topic", topic)?);
        }
        if let Some(subtopic) = &self.subtopic {
            patch.subtopic = Some(match paths::normalize_subtopic(Some(subtopic.as_str())) {
                Some(s) => Some(paths::check_component("subtopic", &s)?),
                None => None,
            });
        }
        if let Some(difficulty) = &self.difficulty_level {
            patch.difficulty_level = Some(not_blank("difficulty_level", difficulty)?.parse()?);
        }
        if let Some(value) = &self.estimated_time {
            patch.estimated_time = Some(parse_estimated_time(value)?);
        }
        if let Some(bloom) = &self.bloom_level {
            patch.bloom_level = Some(not_blank("bloom_level", bloom)?.parse()?);
        }
        patch.is_ai_generated = self.is_ai_generated;
        if let Some(notes) = &self.ai_generation_notes {
            patch.ai_generation_notes = Some(non_blank(Some(notes)));
        }

        Ok((patch, self.content))
    }
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn not_blank<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} cannot be empty", field)));
    }
    Ok(trimmed)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Minutes as a positive integer, from a JSON number or numeric string.
pub fn parse_estimated_time(value: &serde_json::Value) -> Result<u32> {
    let minutes = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match minutes {
        None => Err(Error::validation("Estimated time must be a valid number")),
        Some(m) if m <= 0 => Err(Error::validation("Estimated time must be greater than 0")),
        Some(m) => u32::try_from(m)
            .map_err(|_| Error::validation("Estimated time must be a valid number")),
    }
}
