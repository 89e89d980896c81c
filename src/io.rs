//! Status output for long-running operations.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use lazy_static::lazy_static;
use std::fmt;

lazy_static! {
    /// Progress bar style used when no other style is requested.
    pub static ref DEFAULT_PROGRESS_STYLE: ProgressStyle = ProgressStyle::default_bar()
        .template("Progress: {bar:40}  {percent}% | ETA: {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
}

/// How much non-critical status output to produce.
#[derive(Clone)]
pub enum Verbosity {
    Quiet,
    Messages,
    Progress(ProgressStyle),
}

impl Verbosity {
    /// Verbosity showing a progress bar with the default style.
    pub fn progress() -> Self {
        Self::Progress(DEFAULT_PROGRESS_STYLE.clone())
    }

    /// Whether status messages should be printed.
    pub fn print_messages(&self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Whether a progress bar should be shown.
    pub fn show_progress(&self) -> bool {
        matches!(self, Self::Progress(_))
    }

    /// Creates a progress bar of the given length, hidden unless
    /// progress output was requested.
    pub fn create_progress_bar(&self, len: usize) -> ProgressBar {
        match self {
            Self::Progress(style) => {
                let bar = ProgressBar::new(len as u64);
                bar.set_style(style.clone());
                bar
            }
            _ => ProgressBar::with_draw_target(Some(len as u64), ProgressDrawTarget::hidden()),
        }
    }
}

impl fmt::Debug for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "Quiet"),
            Self::Messages => write!(f, "Messages"),
            Self::Progress(_) => write!(f, "Progress"),
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::Quiet
    }
}

impl From<bool> for Verbosity {
    fn from(verbose: bool) -> Self {
        if verbose {
            Self::Messages
        } else {
            Self::Quiet
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn only_quiet_suppresses_messages() {
        assert!(!Verbosity::Quiet.print_messages());
        assert!(Verbosity::Messages.print_messages());
        assert!(Verbosity::progress().print_messages());
        assert!(Verbosity::progress().show_progress());
        assert!(!Verbosity::from(true).show_progress());
    }

    #[test]
    fn hidden_progress_bar_has_requested_length() {
        let bar = Verbosity::Quiet.create_progress_bar(12);
        assert_eq!(bar.length(), Some(12));
    }
}
