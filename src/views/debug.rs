use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;
use crate::viewport::{ScrollContainer, Stickiness};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let label = Style::default().fg(theme.foreground_dim);
    let value = Style::default().fg(theme.foreground);

    let block = Block::default()
        .title(" Debug ")
        .borders(Borders::ALL)
        .border_style(label);

    let stickiness = app.chat.stickiness();
    let mut lines = vec![Line::from(vec![
        Span::styled("State: ", label),
        Span::styled(
            stickiness.label(),
            Style::default().fg(match stickiness {
                Stickiness::Stuck => theme.foreground,
                Stickiness::Unstuck => theme.warning,
            }),
        ),
        Span::styled("  Seen: ", label),
        Span::styled(
            format!("{}/{}", app.chat.seen().len(), app.chat.total()),
            value,
        ),
        Span::styled("  Unread: ", label),
        Span::styled(app.chat.unread().to_string(), value),
        Span::styled("  Room: ", label),
        Span::styled(app.location_key.to_string(), value),
    ])];

    let geometry = app.chat.pane().geometry().map_or_else(
        || "not laid out".to_string(),
        |g| {
            format!(
                "top {} / window {} / height {}",
                g.scroll_top, g.client_height, g.scroll_height
            )
        },
    );
    lines.push(Line::from(vec![
        Span::styled("Scroll: ", label),
        Span::styled(geometry, value),
    ]));

    // Newest first, as many as fit under the two status lines.
    let log_lines = area.height.saturating_sub(4) as usize;
    for entry in app.debug.log.iter().rev().take(log_lines) {
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", entry.at.format("%H:%M:%S")), label),
            Span::styled(entry.message.as_str(), label),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
