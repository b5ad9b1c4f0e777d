//! Short, transient user-facing messages.

use std::fmt;
use std::path::PathBuf;

/// A message shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoImageSelected,
    Saved(PathBuf),
    SaveFailed,
    StorageUnavailable,
    DecodeFailed,
    ConvertFailed,
}

impl Notice {
    /// Text shown to the user.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::NoImageSelected => "No image selected",
            Self::Saved(_) => "Image saved successfully",
            Self::SaveFailed => "Failed to save image",
            Self::StorageUnavailable => "External storage is not available",
            Self::DecodeFailed => "Failed to load image",
            Self::ConvertFailed => "Failed to cartoonize image",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved(path) => write!(f, "{} ({})", self.message(), path.display()),
            _ => f.write_str(self.message()),
        }
    }
}

/// Receives notices raised at the action boundary.
pub trait Notifier {
    fn notify(&mut self, notice: &Notice);
}

/// Prints notices to stdout.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notice: &Notice) {
        println!("{notice}");
    }
}

/// Keeps every notice, in order.
#[derive(Debug, Default)]
pub struct NoticeLog {
    pub notices: Vec<Notice>,
}

impl Notifier for NoticeLog {
    fn notify(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }
}
