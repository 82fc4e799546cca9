use std::{fmt, path::PathBuf, str::FromStr};

use thiserror::Error;

use crate::notifications::{
    ConsoleNotifier, EmailNotifier, Notifier, SlackNotifier, SmsNotifier,
};

pub const APP_DIR_NAME: &str = "taskdeck";
pub const TASKS_FILE: &str = "tasks.json";
pub const PROJECTS_FILE: &str = "projects.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown notification channel '{0}' (expected console, email, sms or slack)")]
    UnknownChannel(String),

    #[error("The {0} channel needs a --notify-target")]
    MissingTarget(NotifyChannel),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NotifyChannel {
    #[default]
    Console,
    Email,
    Sms,
    Slack,
}

impl fmt::Display for NotifyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotifyChannel::Console => "console",
            NotifyChannel::Email => "email",
            NotifyChannel::Sms => "sms",
            NotifyChannel::Slack => "slack",
        })
    }
}

impl FromStr for NotifyChannel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(NotifyChannel::Console),
            "email" => Ok(NotifyChannel::Email),
            "sms" => Ok(NotifyChannel::Sms),
            "slack" => Ok(NotifyChannel::Slack),
            _ => Err(ConfigError::UnknownChannel(s.to_string())),
        }
    }
}

/// Where the stores live and how notifications go out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub notify_channel: NotifyChannel,
    /// Address for the channel: mailbox, phone number or webhook URL
    pub notify_target: Option<String>,
    /// Slack channel to post to; the notifier default otherwise
    pub slack_channel: Option<String>,
}

impl Config {
    pub fn new(
        data_dir: Option<PathBuf>,
        notify_channel: NotifyChannel,
        notify_target: Option<String>,
    ) -> Self {
        Self {
            data_dir: data_dir.unwrap_or_else(Self::default_data_dir),
            notify_channel,
            notify_target: notify_target.filter(|t| !t.trim().is_empty()),
            slack_channel: None,
        }
    }

    pub fn with_slack_channel(mut self, channel: Option<String>) -> Self {
        self.slack_channel = channel.filter(|c| !c.trim().is_empty());
        self
    }

    /// `<local data dir>/taskdeck`, or `./taskdeck` when the platform has none
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE)
    }

    pub fn projects_path(&self) -> PathBuf {
        self.data_dir.join(PROJECTS_FILE)
    }

    /// Builds the stdout-backed notifier for the configured channel.
    pub fn notifier(&self) -> Result<Box<dyn Notifier>, ConfigError> {
        let target = || {
            self.notify_target
                .clone()
                .ok_or(ConfigError::MissingTarget(self.notify_channel))
        };
        Ok(match self.notify_channel {
            NotifyChannel::Console => Box::new(ConsoleNotifier::stdout()),
            NotifyChannel::Email => Box::new(EmailNotifier::stdout(target()?)),
            NotifyChannel::Sms => Box::new(SmsNotifier::stdout(target()?)),
            NotifyChannel::Slack => {
                let notifier = SlackNotifier::stdout(target()?);
                match &self.slack_channel {
                    Some(channel) => Box::new(notifier.with_channel(channel.clone())),
                    None => Box::new(notifier),
                }
            }
        })
    }
}
