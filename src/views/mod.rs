pub mod chat;
pub mod debug;
pub mod status_bar;


use ratatui::Frame;

use crate::app::App;
use crate::keys;
use status_bar::StatusBar;

pub fn render(frame: &mut Frame, app: &App) {
    let regions = chat::regions(frame.area(), app.debug.visible);

    chat::render(frame, app, &regions);

    let help = keys::help_text();
    StatusBar::new(&app.theme)
        .label(app.chat.indicator_text().unwrap_or_default())
        .state(app.chat.stickiness().label())
        .notice(app.notice.as_deref())
        .help(&help)
        .render(frame, regions.status);

    if let Some(debug_area) = regions.debug {
        debug::render(frame, app, debug_area);
    }
}
