//! Content path derivation
//!
//! A question's content directory is a pure function of its subject, topic and
//! optional subtopic: `<root>/<subject>/<topic>[/<subtopic>]`. Nothing about
//! the path is stored; it is recomputed from the record every time.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The (subject, topic, subtopic) triple that places a content file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub subject: String,
    pub topic: String,
    pub subtopic: Option<String>,
}

impl Location {
    /// Build a checked location. Components are trimmed; a blank subtopic
    /// means "no subtopic".
    pub fn new(subject: &str, topic: &str, subtopic: Option<&str>) -> Result<Self> {
        let subtopic = match normalize_subtopic(subtopic) {
            Some(s) => Some(check_component("subtopic", &s)?),
            None => None,
        };
        Ok(Self {
            subject: check_component("subject", subject)?,
            topic: check_component("topic", topic)?,
            subtopic,
        })
    }

    /// Path relative to the content root
    pub fn relative_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from(&self.subject);
        dir.push(&self.topic);
        if let Some(subtopic) = &self.subtopic {
            dir.push(subtopic);
        }
        dir
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subtopic {
            Some(subtopic) => write!(f, "{}/{}/{}", self.subject, self.topic, subtopic),
            None => write!(f, "{}/{}", self.subject, self.topic),
        }
    }
}

/// `None` for absent or whitespace-only subtopics
pub fn normalize_subtopic(subtopic: Option<&str>) -> Option<String> {
    subtopic
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Check that a value can be used as a single directory name and return it trimmed.
///
/// Rejects blank values, `.` and `..`, path separators and control characters,
/// so a component can never escape the content root or span several directories.
pub fn check_component(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} cannot be empty", field)));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(Error::Validation(format!(
            "{} '{}' is not a valid folder name",
            field, trimmed
        )));
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| *c == '/' || *c == '\\' || c.is_control())
    {
        return Err(Error::Validation(format!(
            "{} '{}' contains a character not allowed in folder names ({:?})",
            field, trimmed, bad
        )));
    }
    Ok(trimmed.to_string())
}

/// Maps locations to directories under a fixed content root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for `location`, without touching the filesystem
    pub fn locate(&self, location: &Location) -> PathBuf {
        self.root.join(location.relative_dir())
    }

    /// Directory for `location`, created (with all parents) if missing.
    /// Calling this repeatedly is harmless.
    pub fn resolve(&self, location: &Location) -> Result<PathBuf> {
        let dir = self.locate(location);
        std::fs::create_dir_all(&dir)?;
        tracing::debug!("Resolved {} to {}", location, dir.display());
        Ok(dir)
    }
}
