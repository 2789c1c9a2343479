use crate::i18n::Messages;

/// Outcome of the latest submission. Carried as a tag so presentation never
/// has to inspect the text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DownloadStatus {
    #[default]
    Idle,
    InProgress,
    Success,
    /// Message without the error prefix.
    Failure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Error,
}

impl DownloadStatus {
    /// `None` while idle: nothing is shown before the first submit.
    pub fn tone(&self) -> Option<StatusTone> {
        match self {
            Self::Idle => None,
            Self::InProgress | Self::Success => Some(StatusTone::Success),
            Self::Failure(_) => Some(StatusTone::Error),
        }
    }

    pub fn text(&self, msgs: &Messages) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::InProgress => Some(msgs.status_starting.to_string()),
            Self::Success => Some(msgs.status_completed.to_string()),
            Self::Failure(m) => Some(format!("{}: {}", msgs.error_prefix, m)),
        }
    }
}
