use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn header(text: &str) {
    println!("{} {}", Icons::BOOK, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str) {
    println!("{} {}", Icons::INFO, label);
}

/// `  label: value` line, label dimmed
pub fn field(label: &str, value: &str) {
    println!("  {} {}", format!("{}:", label).style(theme().label.clone()), value);
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

pub fn question_saved(path: &Path) {
    println!("{} {}", Icons::NEW.style(theme().success.clone()), path.display());
}

pub fn question_moved(to: &Path) {
    println!("{} moved to {}", Icons::MOVE.style(theme().warn.clone()), to.display());
}

pub fn question_removed(path: &Path) {
    println!("{} {}", Icons::DEL.style(theme().error.clone()), path.display());
}
