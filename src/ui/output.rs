use crate::declaration::Declaration;
use crate::storage::SnapshotStatus;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().header));
}

pub fn status(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, label.style(theme().dim), value);
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn));
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header));
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted).to_string()
}

/// A declaration as `icon kind Qualified.Name`
pub fn declaration(declaration: &Declaration) -> String {
    format!(
        "{} {} {}",
        Icons::for_kind(declaration.kind),
        muted(declaration.kind.as_str()),
        declaration
            .qualified_name
            .to_string()
            .style(theme().for_kind(declaration.kind))
    )
}

pub fn snapshot_status(status: SnapshotStatus, target: &str) {
    match status {
        SnapshotStatus::New => println!("{} {} {}", Icons::NEW.style(theme().success), "stored".style(theme().success), target),
        SnapshotStatus::Modified => println!("{} {} {}", Icons::MOD.style(theme().warn), "updated".style(theme().warn), target),
        SnapshotStatus::Unchanged => println!("  {} {}", "unchanged".style(theme().muted), target),
    }
}

pub fn unresolved(name: &str) {
    println!("  {} {} {}", Icons::CROSS, name.bold(), "unresolved".style(theme().error));
}

