use colored::*;
use jiff::{Timestamp, Zoned, tz::TimeZone};

use taskdeck::models::{
    project::Project,
    task::{Priority, Task, TaskStatus},
};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Get the appropriate status glyph for a task
pub fn get_status_glyph(task: &Task, is_overdue: bool) -> ColoredString {
    match task.status() {
        TaskStatus::Done => "✓".dimmed(),
        _ if is_overdue => "●".red(),
        TaskStatus::InProgress => "◐".yellow(),
        TaskStatus::Todo => "○".normal(),
    }
}

fn priority_label(priority: Priority) -> ColoredString {
    match priority {
        Priority::High => "high".red(),
        Priority::Medium => "medium".normal(),
        Priority::Low => "low".dimmed(),
    }
}

/// Build the right-hand context: priority, due date and project name
pub fn get_task_context(task: &Task, project: Option<&Project>, now: &Zoned) -> String {
    let mut parts = vec![task.priority().as_str().to_string()];
    if let Some(due) = task.due_date() {
        parts.push(format!("due {}", format_due_date(due, now)));
    }
    if let Some(project) = project {
        parts.push(project.name().to_string());
    }
    parts.join("  ·  ")
}

/// Render a single task line with ID, glyph, title, and right-aligned context
pub fn render_task_line(task: &Task, project: Option<&Project>) {
    let terminal_width = get_terminal_width();
    let now = Zoned::now();
    let is_overdue = task.is_overdue_at(now.timestamp());

    let id_str = format!("{:>8}", task.id());
    let glyph = get_status_glyph(task, is_overdue);
    let title = task.title();

    let left_section = format!("  {}  {}  {}", id_str, glyph, title);
    let styled_left = if task.is_done() {
        left_section.dimmed()
    } else {
        left_section.bold()
    };

    let context = get_task_context(task, project, &now);
    let left_visible_len = format!("  {}  {}  {}", id_str, " ", title).chars().count();
    let right_visible_len = context.chars().count();
    let total_content = left_visible_len + right_visible_len;

    if total_content + 4 < terminal_width {
        let padding = terminal_width - total_content - 2;
        println!("{}{}{}", styled_left, " ".repeat(padding), context.dimmed());
    } else {
        // Not enough space for right alignment, just print normally
        println!("{}", styled_left);
    }
}

/// Render the multi-line view of one task
pub fn render_task_detail(task: &Task, project: Option<&Project>) {
    let now = Zoned::now();
    println!("\n  {} {}", task.id().dimmed(), task.title().bold());
    if !task.description().is_empty() {
        println!("    {}", task.description());
    }
    println!("    {} {}", "Status:".dimmed(), task.status());
    println!("    {} {}", "Priority:".dimmed(), priority_label(task.priority()));
    if let Some(due) = task.due_date() {
        let due_text = format_due_date(due, &now);
        if task.is_overdue_at(now.timestamp()) {
            println!("    {} {}", "Due:".dimmed(), due_text.red());
        } else {
            println!("    {} {}", "Due:".dimmed(), due_text);
        }
    }
    if let Some(project) = project {
        println!("    {} {}", "Project:".dimmed(), project.name().blue());
    }
    println!();
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize) {
    let task_word = if count == 1 { "task" } else { "tasks" };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, task_word);
}

/// Render a section header (e.g., "Overdue")
pub fn render_section_header(title: &str) {
    println!("\n  ─── {} ───\n", title.bold());
}

/// Format a due date relative to `now` (e.g., "Today", "Tomorrow", "Feb 17")
pub fn format_due_date(due: Timestamp, now: &Zoned) -> String {
    let date = due.to_zoned(now.time_zone().clone()).date();
    let today = now.date();

    if date == today {
        "Today".to_string()
    } else if today.tomorrow().is_ok_and(|d| d == date) {
        "Tomorrow".to_string()
    } else if today.yesterday().is_ok_and(|d| d == date) {
        "Yesterday".to_string()
    } else if date.year() == today.year() {
        date.strftime("%b %d").to_string()
    } else {
        date.strftime("%b %d %Y").to_string()
    }
}

/// Format a timestamp in UTC for plain listings
pub fn format_timestamp(timestamp: Timestamp) -> String {
    timestamp
        .to_zoned(TimeZone::UTC)
        .strftime("%Y-%m-%d %H:%M")
        .to_string()
}
