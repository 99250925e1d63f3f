use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use crate::app::{App, Focus};
use crate::channel::ANONYMOUS;
use crate::input::InputField;
use crate::theme::Theme;
use crate::viewport::{ScrollContainer, Stickiness};
use crate::widgets::MessageList;

pub const DEBUG_HEIGHT: u16 = 10;
const HEADER_HEIGHT: u16 = 3;
const INPUT_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 1;

const EMPTY_ROOM: &str = "Nobody has said anything here yet.";
const INPUT_HINT: &str = "Say something, or /loc <lat> <lon> to move";

/// Screen regions of the chat layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regions {
    pub username: Rect,
    pub location: Rect,
    pub messages: Rect,
    pub input: Rect,
    pub status: Rect,
    pub debug: Option<Rect>,
}

pub fn regions(area: Rect, debug_visible: bool) -> Regions {
    let (main, debug) = if debug_visible {
        let [main, debug] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(DEBUG_HEIGHT)]).areas(area);
        (main, Some(debug))
    } else {
        (area, None)
    };

    let [header, messages, input, status] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(INPUT_HEIGHT),
        Constraint::Length(STATUS_HEIGHT),
    ])
    .areas(main);

    let [username, location] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(header);

    Regions {
        username,
        location,
        messages,
        input,
        status,
        debug,
    }
}

fn bordered(title: &str, style: Style) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}

/// The rows available to the message pane inside its border.
pub fn pane_area(area: Rect, debug_visible: bool) -> Rect {
    Block::default()
        .borders(Borders::ALL)
        .inner(regions(area, debug_visible).messages)
}

pub fn render(frame: &mut Frame, app: &App, regions: &Regions) {
    let theme = &app.theme;

    render_input(
        frame,
        theme,
        &app.username,
        " Username ",
        ANONYMOUS,
        app.focus == Focus::Username,
        regions.username,
    );
    render_location(frame, app, regions.location);
    render_messages(frame, app, regions.messages);
    render_input(
        frame,
        theme,
        &app.draft,
        " Message ",
        INPUT_HINT,
        app.focus == Focus::Message,
        regions.input,
    );
}

fn render_input(
    frame: &mut Frame,
    theme: &Theme,
    field: &InputField,
    title: &str,
    hint: &str,
    focused: bool,
    area: Rect,
) {
    let block = bordered(title, theme.border_style(focused));
    let inner = block.inner(area);

    let (visible, column) = field.window(inner.width as usize);
    let content = if field.value().is_empty() {
        Span::styled(hint, theme.dim_style())
    } else {
        Span::styled(visible, theme.text_style())
    };
    frame.render_widget(Paragraph::new(Line::from(content)).block(block), area);

    if focused && inner.width > 0 && inner.height > 0 {
        let x = inner.x + u16::try_from(column).unwrap_or(inner.width - 1);
        frame.set_cursor_position((x, inner.y));
    }
}

fn render_location(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let line = Line::from(vec![
        Span::styled(
            app.location_key.to_string(),
            theme.text_style().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(app.location.to_string(), theme.dim_style()),
    ]);
    let block = bordered(" Room ", theme.border_style(false));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_messages(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let pane = app.chat.pane();

    let mut block = bordered(" Messages ", theme.border_style(false));
    if app.chat.stickiness() == Stickiness::Unstuck {
        block = block.title_bottom(
            Line::from(Span::styled(
                format!(" {} (End to follow) ", Stickiness::Unstuck.label()),
                Style::default().fg(theme.warning),
            ))
            .right_aligned(),
        );
    }

    // Posts sent without a name go out as anonymous.
    let own = match app.username.value() {
        "" => ANONYMOUS,
        name => name,
    };
    let list = MessageList::new(pane.visible_lines())
        .block(block)
        .own_author(Some(own))
        .text_style(theme.text_style())
        .author_style(theme.author_style(false))
        .own_author_style(theme.author_style(true))
        .placeholder(Span::styled(EMPTY_ROOM, theme.dim_style()));
    frame.render_widget(list, area);

    if let Some(geometry) = pane.geometry()
        && geometry.scroll_height > geometry.client_height
    {
        let mut state = ScrollbarState::new(geometry.max_scroll_top() as usize)
            .position(geometry.scroll_top as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None)
                .style(theme.dim_style()),
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut state,
        );
    }
}
