use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::theme::Theme;

/// Builder for the one-line status bar.
///
/// Layout: `[Label] state | notice | help text`
pub struct StatusBar<'a> {
    theme: &'a Theme,
    label: &'a str,
    state: Option<&'a str>,
    notice: Option<&'a str>,
    help_text: &'a str,
}

impl<'a> StatusBar<'a> {
    pub const fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            label: "",
            state: None,
            notice: None,
            help_text: "",
        }
    }

    pub const fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    pub const fn state(mut self, state: &'a str) -> Self {
        self.state = Some(state);
        self
    }

    pub const fn notice(mut self, notice: Option<&'a str>) -> Self {
        self.notice = notice;
        self
    }

    pub const fn help(mut self, text: &'a str) -> Self {
        self.help_text = text;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(format!(" {} ", self.label), self.theme.status_bar_style()),
            Span::raw(" "),
        ];

        if let Some(state) = self.state {
            spans.push(Span::styled(state, self.theme.text_style()));
            spans.push(Span::raw(" | "));
        }

        if let Some(notice) = self.notice {
            spans.push(Span::styled(notice, self.theme.error_style()));
            spans.push(Span::raw(" | "));
        }

        spans.push(Span::styled(self.help_text, self.theme.dim_style()));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::tests::render_to_string;

    #[test]
    fn test_status_bar_full() {
        let theme = Theme::default();
        let output = render_to_string(70, 1, |frame| {
            StatusBar::new(&theme)
                .label("Unread: 3")
                .state("paused")
                .help("Tab:focus  Esc:quit")
                .render(frame, frame.area());
        });

        insta::assert_snapshot!(output.trim(), @"Unread: 3  paused | Tab:focus  Esc:quit");
    }

    #[test]
    fn test_status_bar_with_notice() {
        let theme = Theme::default();
        let output = render_to_string(70, 1, |frame| {
            StatusBar::new(&theme)
                .label("All read")
                .state("following")
                .notice(Some("Server error. Please try again later."))
                .render(frame, frame.area());
        });

        assert!(output.contains("All read"));
        assert!(output.contains("Server error"));
    }

    #[test]
    fn test_status_bar_minimal() {
        let theme = Theme::default();
        let output = render_to_string(40, 1, |frame| {
            StatusBar::new(&theme)
                .label("All read")
                .help("Esc:quit")
                .render(frame, frame.area());
        });

        assert!(output.contains("All read"));
        assert!(output.contains("Esc:quit"));
    }
}
