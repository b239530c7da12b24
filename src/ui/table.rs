use tabled::{settings::Style, Table, Tabled};
use crate::question::QuestionRecord;
use crate::storage::{BankStats, TopicSummary};

#[derive(Tabled)]
struct QuestionRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Type")]
    question_type: &'static str,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Difficulty")]
    difficulty: &'static str,
    #[tabled(rename = "Min")]
    minutes: u32,
    #[tabled(rename = "Bloom")]
    bloom: &'static str,
    #[tabled(rename = "Created")]
    created: String,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct TopicRow {
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Topic")]
    topic: String,
    #[tabled(rename = "Questions")]
    questions: usize,
}

fn render<R: Tabled>(rows: Vec<R>) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn questions_table(records: &[QuestionRecord]) -> String {
    render(
        records
            .iter()
            .map(|r| QuestionRow {
                id: r.id,
                title: r.title.clone(),
                question_type: r.question_type.as_str(),
                location: r.location().to_string(),
                difficulty: r.difficulty_level.as_str(),
                minutes: r.estimated_time,
                bloom: r.bloom_level.as_str(),
                created: r.created_at.format("%Y-%m-%d %H:%M").to_string(),
            })
            .collect(),
    )
}

pub fn stats_table(stats: &BankStats) -> String {
    let mut rows = vec![
        CountRow {
            metric: "Questions".into(),
            value: stats.total_questions.to_string(),
        },
        CountRow {
            metric: "AI generated".into(),
            value: stats.ai_generated.to_string(),
        },
    ];
    let groups = [
        ("Subject", &stats.by_subject),
        ("Difficulty", &stats.by_difficulty),
        ("Type", &stats.by_type),
    ];
    for (group, counts) in groups {
        rows.extend(counts.iter().map(|(name, count)| CountRow {
            metric: format!("{}: {}", group, name),
            value: count.to_string(),
        }));
    }
    render(rows)
}

pub fn topics_table(topics: &[TopicSummary]) -> String {
    render(
        topics
            .iter()
            .map(|t| TopicRow {
                subject: t.subject.clone(),
                topic: t.topic.clone(),
                questions: t.question_count,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_empty_tables_render_nothing() {
        assert_eq!(questions_table(&[]), "");
        assert_eq!(topics_table(&[]), "");
    }

    #[test]
    fn test_stats_table_lists_groups() {
        let stats = BankStats {
            total_questions: 2,
            ai_generated: 0,
            by_subject: BTreeMap::from([("Math".to_string(), 2)]),
            by_difficulty: BTreeMap::new(),
            by_type: BTreeMap::new(),
        };
        let rendered = stats_table(&stats);
        assert!(rendered.contains("Subject: Math"));
        assert!(rendered.contains("AI generated"));
    }
}
