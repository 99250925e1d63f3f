use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub foreground: Color,
    pub foreground_dim: Color,
    pub border: Color,
    pub border_focused: Color,
    pub author: Color,
    pub own_author: Color,
    pub warning: Color,
    pub error: Color,
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_variant(ThemeVariant::Dark)
    }
}

impl Theme {
    pub fn for_variant(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Dark => Self::dark(),
            ThemeVariant::Light => Self::light(),
        }
    }

    fn dark() -> Self {
        Self {
            foreground: Color::White,
            foreground_dim: Color::Rgb(0x6A, 0x9A, 0x9A),
            border: Color::Rgb(0x6A, 0x9A, 0x9A),
            border_focused: Color::Yellow,
            author: Color::Cyan,
            own_author: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
        }
    }

    fn light() -> Self {
        Self {
            foreground: Color::Black,
            foreground_dim: Color::Rgb(0x5C, 0x6A, 0x72),
            border: Color::Rgb(0x93, 0xA1, 0xA1),
            border_focused: Color::Blue,
            author: Color::Blue,
            own_author: Color::Rgb(0x1A, 0x7F, 0x37),
            warning: Color::Rgb(0xB5, 0x89, 0x00),
            error: Color::Red,
            status_bar_bg: Color::Gray,
            status_bar_fg: Color::Black,
        }
    }

    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.foreground_dim)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.foreground)
    }

    pub fn author_style(&self, own: bool) -> Style {
        Style::default()
            .fg(if own { self.own_author } else { self.author })
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .bg(self.status_bar_bg)
            .fg(self.status_bar_fg)
    }
}
