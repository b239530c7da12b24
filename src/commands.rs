use qbank::question::QuestionFilter;
use qbank::server::routes::parse_topics;
use qbank::ui::{self, Icons};
use qbank::{Envelope, Question, QuestionInput, QuestionRepository};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        *self == OutputMode::Human
    }
}

/// Print a successful result: the envelope in JSON mode, `human` otherwise.
/// Failures are returned for `main` to report.
fn emit<T: Serialize>(
    output_mode: OutputMode,
    result: qbank::Result<T>,
    message: impl FnOnce(&T) -> String,
    human: impl FnOnce(&T),
) -> anyhow::Result<()> {
    let data = result?;
    match output_mode {
        OutputMode::Human => human(&data),
        OutputMode::Json => {
            let envelope = Envelope::success(message(&data), &data);
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
    }
    Ok(())
}

pub fn run_add(repo: &QuestionRepository, output_mode: OutputMode, input: QuestionInput) -> anyhow::Result<()> {
    emit(
        output_mode,
        repo.add(input),
        |added| format!("Question added successfully (ID: {})", added.id),
        |added| {
            ui::success(&format!("Question {} added: {}", added.id, added.title));
            ui::question_saved(&added.content_location);
        },
    )
}

pub fn run_get(repo: &QuestionRepository, output_mode: OutputMode, id: i64) -> anyhow::Result<()> {
    emit(
        output_mode,
        repo.get(id),
        |question| format!("Question {}", question.record.id),
        |question| print_question(repo, question),
    )
}

pub fn run_update(
    repo: &QuestionRepository,
    output_mode: OutputMode,
    id: i64,
    input: QuestionInput,
) -> anyhow::Result<()> {
    emit(
        output_mode,
        repo.update(id, input),
        |updated| format!("Question {} updated successfully", updated.id),
        |updated| {
            ui::success(&format!("Question {} updated", updated.id));
            if updated.relocated {
                ui::question_moved(&updated.content_location);
            }
        },
    )
}

pub fn run_delete(repo: &QuestionRepository, output_mode: OutputMode, id: i64) -> anyhow::Result<()> {
    emit(
        output_mode,
        repo.delete(id),
        |deleted| format!("Question {} deleted successfully", deleted.id),
        |deleted| {
            ui::success(&format!("Question {} deleted", deleted.id));
            if deleted.content_removed {
                ui::question_removed(&deleted.content_location);
            } else {
                ui::warn(&format!("No content file at {}", deleted.content_location.display()));
            }
        },
    )
}

pub fn run_list(repo: &QuestionRepository, output_mode: OutputMode, filter: QuestionFilter) -> anyhow::Result<()> {
    emit(
        output_mode,
        repo.list(&filter),
        |records| format!("Found {} questions", records.len()),
        |records| {
            if records.is_empty() {
                ui::info("No questions found.");
            } else {
                println!("{}", ui::questions_table(records));
                println!("{}", ui::muted(&format!("{} questions", records.len())));
            }
        },
    )
}

pub fn run_stats(repo: &QuestionRepository, output_mode: OutputMode) -> anyhow::Result<()> {
    emit(
        output_mode,
        repo.statistics(),
        |stats| format!("{} questions in the bank", stats.total_questions),
        |stats| {
            ui::header(&format!("{} Question Bank Statistics ({})", Icons::STATS, repo.root().display()));
            println!("{}", ui::stats_table(stats));
        },
    )
}

pub fn run_topics(repo: &QuestionRepository, output_mode: OutputMode) -> anyhow::Result<()> {
    emit(
        output_mode,
        repo.topics(),
        |topics| format!("Found {} topics", topics.len()),
        |topics| {
            if topics.is_empty() {
                ui::info("No topics yet.");
            } else {
                println!("{}", ui::topics_table(topics));
            }
        },
    )
}

pub fn run_random(repo: &QuestionRepository, output_mode: OutputMode, topics: &[String]) -> anyhow::Result<()> {
    let topics = parse_topics(Some(topics.join(",").as_str()))?;
    emit(
        output_mode,
        repo.random_question(&topics),
        |question| format!("Question {}", question.record.id),
        |question| {
            println!("{} Random pick", Icons::DICE);
            print_question(repo, question);
        },
    )
}

fn print_question(repo: &QuestionRepository, question: &Question) {
    let record = &question.record;
    ui::header(&format!("#{} {}", record.id, record.title));
    ui::field("Type", record.question_type.as_str());
    ui::field("Location", &record.location().to_string());
    ui::field("Difficulty", record.difficulty_level.as_str());
    ui::field("Bloom level", record.bloom_level.as_str());
    ui::field("Estimated time", &format!("{} {} min", Icons::CLOCK, record.estimated_time));
    if record.is_ai_generated {
        ui::field("AI generated", record.ai_generation_notes.as_deref().unwrap_or("yes"));
    }
    ui::field("Created", &record.created_at.to_rfc3339());
    ui::field("File", &format!("{} {}", Icons::FILE, repo.content_path(record).display()));

    ui::section("Content");
    if question.content.is_empty() {
        println!("{}", ui::muted("(no content file)"));
    } else {
        println!("{}", question.content);
    }
}
