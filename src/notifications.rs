//! Channels announcing task lifecycle events.
//!
//! Every channel renders its message into a [`Write`] sink: stdout for the CLI,
//! a buffer in tests, or whatever transport a caller plugs in. A failed write
//! is logged and dropped; notifying never fails from the caller's side.

use std::io::{self, IsTerminal, Stdout, Write};

use colored::Colorize;
use serde_json::json;

use crate::models::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Created,
    Completed,
    Due,
}

impl TaskEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskEvent::Created => "created",
            TaskEvent::Completed => "completed",
            TaskEvent::Due => "due",
        }
    }

    fn headline(&self, task: &Task) -> String {
        match self {
            TaskEvent::Created => format!("Task \"{}\" has been created", task.title()),
            TaskEvent::Completed => format!("Task \"{}\" is complete!", task.title()),
            TaskEvent::Due => format!("Task \"{}\" is due soon!", task.title()),
        }
    }
}

pub trait Notifier {
    /// Delivers one event. The three `notify_*` methods route here.
    fn notify(&mut self, event: TaskEvent, task: &Task);

    fn notify_task_created(&mut self, task: &Task) {
        self.notify(TaskEvent::Created, task);
    }

    fn notify_task_completed(&mut self, task: &Task) {
        self.notify(TaskEvent::Completed, task);
    }

    fn notify_task_due(&mut self, task: &Task) {
        self.notify(TaskEvent::Due, task);
    }
}

fn deliver(channel: &str, sink: &mut impl Write, message: &str, event: TaskEvent, task: &Task) {
    let result = sink
        .write_all(message.as_bytes())
        .and_then(|_| sink.flush());
    match result {
        Ok(()) => tracing::info!(
            channel,
            event = event.as_str(),
            task_id = task.id(),
            "notification sent"
        ),
        Err(e) => tracing::warn!(
            channel,
            event = event.as_str(),
            task_id = task.id(),
            error = %e,
            "notification delivery failed"
        ),
    }
}

pub struct ConsoleNotifier<W = Stdout> {
    sink: W,
    colorize: bool,
}

impl ConsoleNotifier {
    /// Writes to stdout, coloured only when stdout is a terminal.
    pub fn stdout() -> Self {
        let colorize = io::stdout().is_terminal();
        Self {
            sink: io::stdout(),
            colorize,
        }
    }
}

impl<W: Write> ConsoleNotifier<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            colorize: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> Notifier for ConsoleNotifier<W> {
    fn notify(&mut self, event: TaskEvent, task: &Task) {
        let icon = match event {
            TaskEvent::Created => "🔔",
            TaskEvent::Completed => "🎉",
            TaskEvent::Due => "⏰",
        };
        let headline = event.headline(task);
        let line = if self.colorize {
            let styled = match event {
                TaskEvent::Created => headline.cyan(),
                TaskEvent::Completed => headline.green(),
                TaskEvent::Due => headline.yellow().bold(),
            };
            format!("{icon} {styled}\n")
        } else {
            format!("{icon} {headline}\n")
        };
        deliver("console", &mut self.sink, &line, event, task);
    }
}

/// Renders each event as a plain-text mail with `To` and `Subject` headers.
pub struct EmailNotifier<W = Stdout> {
    recipient: String,
    sink: W,
}

impl EmailNotifier {
    pub fn stdout(recipient: impl Into<String>) -> Self {
        Self::new(recipient, io::stdout())
    }
}

impl<W: Write> EmailNotifier<W> {
    pub fn new(recipient: impl Into<String>, sink: W) -> Self {
        Self {
            recipient: recipient.into(),
            sink,
        }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> Notifier for EmailNotifier<W> {
    fn notify(&mut self, event: TaskEvent, task: &Task) {
        let subject = match event {
            TaskEvent::Created => format!("New task: {}", task.title()),
            TaskEvent::Completed => format!("Congrats! Task completed: {}", task.title()),
            TaskEvent::Due => format!("Reminder: {} is due soon", task.title()),
        };
        let mut body = format!(
            "{}\n\nPriority: {}\nStatus: {}\n",
            event.headline(task),
            task.priority(),
            task.status()
        );
        if let Some(due) = task.due_date() {
            body.push_str(&format!("Due: {due}\n"));
        }
        let mail = format!("To: {}\nSubject: {}\n\n{}\n", self.recipient, subject, body);
        deliver("email", &mut self.sink, &mail, event, task);
    }
}

pub const SMS_MAX_CHARS: usize = 160;

/// One line per event, with the text cut to a single SMS segment.
pub struct SmsNotifier<W = Stdout> {
    phone_number: String,
    sink: W,
}

impl SmsNotifier {
    pub fn stdout(phone_number: impl Into<String>) -> Self {
        Self::new(phone_number, io::stdout())
    }
}

impl<W: Write> SmsNotifier<W> {
    pub fn new(phone_number: impl Into<String>, sink: W) -> Self {
        Self {
            phone_number: phone_number.into(),
            sink,
        }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> Notifier for SmsNotifier<W> {
    fn notify(&mut self, event: TaskEvent, task: &Task) {
        let text: String = event.headline(task).chars().take(SMS_MAX_CHARS).collect();
        let line = format!("SMS to {}: {}\n", self.phone_number, text);
        deliver("sms", &mut self.sink, &line, event, task);
    }
}

pub const SLACK_DEFAULT_CHANNEL: &str = "#tasks";

/// Writes the webhook request a Slack incoming-webhook integration expects:
/// the URL, then a `{"channel", "text"}` JSON body.
pub struct SlackNotifier<W = Stdout> {
    webhook_url: String,
    channel: String,
    sink: W,
}

impl SlackNotifier {
    pub fn stdout(webhook_url: impl Into<String>) -> Self {
        Self::new(webhook_url, io::stdout())
    }
}

impl<W: Write> SlackNotifier<W> {
    /// Posts to [`SLACK_DEFAULT_CHANNEL`] until [`SlackNotifier::with_channel`] says otherwise.
    pub fn new(webhook_url: impl Into<String>, sink: W) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            channel: SLACK_DEFAULT_CHANNEL.to_string(),
            sink,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> Notifier for SlackNotifier<W> {
    fn notify(&mut self, event: TaskEvent, task: &Task) {
        let payload = json!({
            "channel": self.channel,
            "text": format!(":bell: {}", event.headline(task)),
        });
        let request = format!("POST {}\n{}\n", self.webhook_url, payload);
        deliver("slack", &mut self.sink, &request, event, task);
    }
}

/// Sends every event to each member in insertion order.
#[derive(Default)]
pub struct NotifierGroup {
    members: Vec<Box<dyn Notifier>>,
}

impl NotifierGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: impl Notifier + 'static) -> Self {
        self.members.push(Box::new(notifier));
        self
    }

    pub fn push(&mut self, notifier: Box<dyn Notifier>) {
        self.members.push(notifier);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Notifier for NotifierGroup {
    fn notify(&mut self, event: TaskEvent, task: &Task) {
        for member in &mut self.members {
            member.notify(event, task);
        }
    }
}
