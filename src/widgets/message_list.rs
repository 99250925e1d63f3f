//! Draws the rows of the message pane that are inside the window.
//!
//! Wrapping and scrolling already happened in the pane; this widget only
//! styles the `author:` prefix of each message and paints the rows.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::viewport::PaneLine;

pub struct MessageList<'a> {
    lines: &'a [PaneLine],
    own_author: Option<&'a str>,
    block: Option<Block<'a>>,
    text_style: Style,
    author_style: Style,
    own_author_style: Style,
    placeholder: Option<Span<'a>>,
}

impl<'a> MessageList<'a> {
    pub fn new(lines: &'a [PaneLine]) -> Self {
        Self {
            lines,
            own_author: None,
            block: None,
            text_style: Style::default(),
            author_style: Style::default(),
            own_author_style: Style::default(),
            placeholder: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Messages by this name get [`MessageList::own_author_style`].
    pub const fn own_author(mut self, name: Option<&'a str>) -> Self {
        self.own_author = name;
        self
    }

    pub const fn text_style(mut self, style: Style) -> Self {
        self.text_style = style;
        self
    }

    pub const fn author_style(mut self, style: Style) -> Self {
        self.author_style = style;
        self
    }

    pub const fn own_author_style(mut self, style: Style) -> Self {
        self.own_author_style = style;
        self
    }

    /// Shown when there are no rows.
    pub fn placeholder(mut self, placeholder: Span<'a>) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    fn is_own(&self, author: &str) -> bool {
        self.own_author
            .is_some_and(|own| author.strip_suffix(':') == Some(own))
    }

    fn styled<'l>(&self, line: &'l PaneLine) -> Line<'l> {
        if line.author_len == 0 || line.author_len > line.text.len() {
            return Line::from(Span::styled(line.text.as_str(), self.text_style));
        }
        let (author, rest) = line.text.split_at(line.author_len);
        let author_style = if self.is_own(author) {
            self.own_author_style
        } else {
            self.author_style
        };
        Line::from(vec![
            Span::styled(author, author_style),
            Span::styled(rest, self.text_style),
        ])
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.lines.is_empty() {
            if let Some(placeholder) = &self.placeholder {
                buf.set_span(inner.left(), inner.top(), placeholder, inner.width);
            }
            return;
        }

        for (y, line) in (inner.top()..inner.bottom()).zip(self.lines) {
            buf.set_line(inner.left(), y, &self.styled(line), inner.width);
        }
    }
}
