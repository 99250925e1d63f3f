use std::io::{self, Write};

use crossterm::{execute, terminal::SetTitle};

/// Raw unread count. Negative when the seen-set outlived removed items.
pub fn unread(total_items: usize, seen_count: usize) -> i64 {
    total_items as i64 - seen_count as i64
}

/// Unread count as shown to the user, never below zero.
pub fn display_unread(total_items: usize, seen_count: usize) -> u64 {
    unread(total_items, seen_count).max(0) as u64
}

pub fn indicator_text(unread: i64) -> String {
    if unread > 0 {
        format!("Unread: {unread}")
    } else {
        "All read".to_string()
    }
}

/// Somewhere the unread indicator is published, e.g. the terminal title.
pub trait IndicatorSink {
    fn set(&mut self, value: &str) -> io::Result<()>;

    /// Put back whatever was shown before the first `set`.
    fn restore(&mut self) -> io::Result<()>;
}

/// Publishes "Unread: N" / "All read" to a sink and restores it on teardown.
pub struct UnreadIndicator {
    sink: Box<dyn IndicatorSink>,
    operands: Option<(usize, usize)>,
    text: Option<String>,
    restored: bool,
}

impl UnreadIndicator {
    pub fn new(sink: Box<dyn IndicatorSink>) -> Self {
        Self {
            sink,
            operands: None,
            text: None,
            restored: false,
        }
    }

    /// Last text handed to the sink.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Recompute when either operand changed. Sink failures are skipped.
    pub fn update(&mut self, total_items: usize, seen_count: usize) {
        if self.restored || self.operands == Some((total_items, seen_count)) {
            return;
        }
        self.operands = Some((total_items, seen_count));

        let text = indicator_text(unread(total_items, seen_count));
        if self.text.as_deref() == Some(text.as_str()) {
            return;
        }
        if let Err(e) = self.sink.set(&text) {
            tracing::debug!(error = %e, "indicator update skipped");
        }
        self.text = Some(text);
    }

    /// Restore the sink's original value. Runs at most once.
    pub fn teardown(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        if let Err(e) = self.sink.restore() {
            tracing::debug!(error = %e, "indicator restore failed");
        }
    }
}

impl Drop for UnreadIndicator {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// The terminal window title.
///
/// Terminals cannot be asked for their title, so the current one is saved on
/// the xterm title stack at the first `set` and popped on `restore`. When a
/// fixed original is configured it is written back instead.
pub struct TerminalTitle<W: Write = io::Stdout> {
    out: W,
    original: Option<String>,
    pushed: bool,
}

const PUSH_TITLE: &str = "\x1b[22;0t";
const POP_TITLE: &str = "\x1b[23;0t";

impl TerminalTitle {
    pub fn stdout(original: Option<String>) -> Self {
        Self::new(io::stdout(), original)
    }
}

impl<W: Write> TerminalTitle<W> {
    pub fn new(out: W, original: Option<String>) -> Self {
        Self {
            out,
            original,
            pushed: false,
        }
    }
}

impl<W: Write> IndicatorSink for TerminalTitle<W> {
    fn set(&mut self, value: &str) -> io::Result<()> {
        if !self.pushed && self.original.is_none() {
            self.out.write_all(PUSH_TITLE.as_bytes())?;
            self.pushed = true;
        }
        execute!(self.out, SetTitle(value))
    }

    fn restore(&mut self) -> io::Result<()> {
        if let Some(original) = &self.original {
            execute!(self.out, SetTitle(original))
        } else if self.pushed {
            self.pushed = false;
            self.out.write_all(POP_TITLE.as_bytes())?;
            self.out.flush()
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingSink;

    #[test]
    fn all_seen_reads_all_read() {
        insta::assert_snapshot!(indicator_text(unread(7, 7)), @"All read");
    }

    #[test]
    fn partially_seen_reads_unread_count() {
        assert_eq!(unread(7, 4), 3);
        insta::assert_snapshot!(indicator_text(unread(7, 4)), @"Unread: 3");
    }

    #[test]
    fn removed_items_clamp_to_zero() {
        assert_eq!(unread(3, 5), -2);
        assert_eq!(display_unread(3, 5), 0);
        assert_eq!(indicator_text(unread(3, 5)), "All read");
    }

    #[test]
    fn update_publishes_only_on_change() {
        let (sink, log) = RecordingSink::new("geo-chat");
        let mut indicator = UnreadIndicator::new(Box::new(sink));

        indicator.update(7, 4);
        indicator.update(7, 4);
        indicator.update(8, 5);
        indicator.update(8, 8);

        assert_eq!(log.borrow().history, vec!["Unread: 3", "All read"]);
        assert_eq!(indicator.text(), Some("All read"));
    }

    #[test]
    fn teardown_restores_original_once() {
        let (sink, log) = RecordingSink::new("my shell");
        let mut indicator = UnreadIndicator::new(Box::new(sink));
        for seen in 0..5 {
            indicator.update(5, seen);
        }
        assert_eq!(log.borrow().current, "Unread: 1");

        indicator.teardown();
        indicator.teardown();
        drop(indicator);

        let log = log.borrow();
        assert_eq!(log.current, "my shell");
        assert_eq!(log.restores, 1);
    }

    #[test]
    fn drop_restores_original() {
        let (sink, log) = RecordingSink::new("before");
        {
            let mut indicator = UnreadIndicator::new(Box::new(sink));
            indicator.update(2, 0);
        }
        assert_eq!(log.borrow().current, "before");
    }

    #[test]
    fn updates_after_teardown_are_ignored() {
        let (sink, log) = RecordingSink::new("before");
        let mut indicator = UnreadIndicator::new(Box::new(sink));
        indicator.teardown();

        indicator.update(4, 1);

        assert_eq!(log.borrow().current, "before");
        assert!(log.borrow().history.is_empty());
    }

    #[test]
    fn failing_sink_is_skipped() {
        let (sink, log) = RecordingSink::new("before");
        log.borrow_mut().fail = true;
        let mut indicator = UnreadIndicator::new(Box::new(sink));

        indicator.update(4, 1);
        indicator.teardown();

        assert_eq!(indicator.text(), Some("Unread: 3"));
    }

    #[test]
    fn terminal_title_uses_title_stack_without_original() {
        let mut title = TerminalTitle::new(Vec::new(), None);
        title.set("Unread: 2").unwrap();
        title.set("All read").unwrap();
        title.restore().unwrap();

        let written = String::from_utf8(title.out).unwrap();
        assert_eq!(written.matches(PUSH_TITLE).count(), 1);
        assert!(written.contains("Unread: 2"));
        assert!(written.ends_with(POP_TITLE));
    }

    #[test]
    fn terminal_title_writes_back_fixed_original() {
        let mut title = TerminalTitle::new(Vec::new(), Some("zsh".to_string()));
        title.set("Unread: 2").unwrap();
        title.restore().unwrap();

        let written = String::from_utf8(title.out).unwrap();
        assert!(!written.contains(PUSH_TITLE));
        assert!(written.ends_with("zsh\x07"));
    }
}
