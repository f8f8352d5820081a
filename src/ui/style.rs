//! Theme and highlight rules.
//!
//! A [`Theme`] maps each [`TokenCategory`] to a style, plus the chrome around
//! the text (gutter, active line, border, placeholder). Two themes exist,
//! one per terminal background; both are built once and shared.

use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};

use crate::highlight::TokenCategory;

/// Terminal background brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    #[default]
    Light,
    Dark,
}

/// Guess the background from a `COLORFGBG` value such as `"15;0"`.
///
/// Falls back to [`Background::Light`] when the value is missing or garbled.
pub fn background_from_colorfgbg(colorfgbg: Option<&str>) -> Background {
    let Some(value) = colorfgbg else {
        return Background::Light;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    let Ok(bg) = bg_str.parse::<u8>() else {
        return Background::Light;
    };

    if bg >= 7 {
        Background::Light
    } else {
        Background::Dark
    }
}

/// Styles for every token category and for the editor chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub plain: Style,
    pub delimiter: Style,
    pub keyword: Style,
    pub operator: Style,
    pub string: Style,
    pub escape: Style,
    pub number: Style,
    pub atom: Style,
    pub variable: Style,
    pub filter: Style,
    pub comment: Style,
    pub punctuation: Style,
    /// Line numbers.
    pub gutter: Style,
    /// Line number of the cursor line.
    pub active_gutter: Style,
    /// Background of the cursor line while focused.
    pub active_line: Style,
    pub placeholder: Style,
    /// Applied over both brackets of a matched pair.
    pub matching_bracket: Style,
    pub border_focused: Style,
    pub border_unfocused: Style,
    pub border_readonly: Style,
}

impl Theme {
    /// The shared theme for a background.
    pub fn for_background(background: Background) -> &'static Self {
        static LIGHT: OnceLock<Theme> = OnceLock::new();
        static DARK: OnceLock<Theme> = OnceLock::new();
        match background {
            Background::Light => LIGHT.get_or_init(Self::light),
            Background::Dark => DARK.get_or_init(Self::dark),
        }
    }

    /// Style for a highlighted token.
    pub const fn style_for(&self, category: TokenCategory) -> Style {
        match category {
            TokenCategory::Plain => self.plain,
            TokenCategory::Delimiter => self.delimiter,
            TokenCategory::Keyword => self.keyword,
            TokenCategory::Operator => self.operator,
            TokenCategory::String => self.string,
            TokenCategory::Escape => self.escape,
            TokenCategory::Number => self.number,
            TokenCategory::Atom => self.atom,
            TokenCategory::Variable => self.variable,
            TokenCategory::Filter => self.filter,
            TokenCategory::Comment => self.comment,
            TokenCategory::Punctuation => self.punctuation,
        }
    }

    fn light() -> Self {
        Self {
            plain: Style::default(),
            delimiter: Style::default().fg(rgb(85, 85, 85)),
            keyword: Style::default()
                .fg(rgb(119, 0, 136))
                .add_modifier(Modifier::BOLD),
            operator: Style::default().fg(rgb(153, 153, 119)),
            string: Style::default().fg(rgb(170, 17, 17)),
            escape: Style::default().fg(rgb(255, 85, 0)),
            number: Style::default().fg(rgb(17, 102, 68)),
            atom: Style::default().fg(rgb(34, 17, 153)),
            variable: Style::default().fg(rgb(0, 85, 170)),
            filter: Style::default().fg(rgb(51, 0, 170)),
            comment: Style::default()
                .fg(rgb(170, 85, 0))
                .add_modifier(Modifier::ITALIC),
            punctuation: Style::default().fg(rgb(85, 85, 85)),
            gutter: Style::default().fg(Color::Indexed(245)),
            active_gutter: Style::default().fg(Color::Indexed(236)),
            active_line: Style::default().bg(Color::Indexed(254)),
            placeholder: Style::default()
                .fg(Color::Indexed(246))
                .add_modifier(Modifier::ITALIC),
            matching_bracket: Style::default()
                .fg(rgb(0, 136, 0))
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            border_focused: Style::default().fg(Color::Blue),
            border_unfocused: Style::default().fg(Color::Indexed(248)),
            border_readonly: Style::default()
                .fg(Color::Indexed(248))
                .add_modifier(Modifier::DIM),
        }
    }

    fn dark() -> Self {
        Self {
            plain: Style::default(),
            delimiter: Style::default().fg(rgb(150, 150, 150)),
            keyword: Style::default()
                .fg(rgb(249, 38, 114))
                .add_modifier(Modifier::BOLD),
            operator: Style::default().fg(rgb(249, 38, 114)),
            string: Style::default().fg(rgb(230, 219, 116)),
            escape: Style::default().fg(rgb(174, 129, 255)),
            number: Style::default().fg(rgb(174, 129, 255)),
            atom: Style::default().fg(rgb(174, 129, 255)),
            variable: Style::default().fg(rgb(166, 226, 46)),
            filter: Style::default().fg(rgb(102, 217, 239)),
            comment: Style::default()
                .fg(rgb(117, 113, 94))
                .add_modifier(Modifier::ITALIC),
            punctuation: Style::default().fg(rgb(150, 150, 150)),
            gutter: Style::default().fg(Color::Indexed(240)),
            active_gutter: Style::default().fg(Color::Indexed(250)),
            active_line: Style::default().bg(Color::Indexed(236)),
            placeholder: Style::default()
                .fg(Color::Indexed(242))
                .add_modifier(Modifier::ITALIC),
            matching_bracket: Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            border_focused: Style::default().fg(Color::Cyan),
            border_unfocused: Style::default().fg(Color::Indexed(240)),
            border_readonly: Style::default()
                .fg(Color::Indexed(240))
                .add_modifier(Modifier::DIM),
        }
    }
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    if supports_truecolor() {
        Color::Rgb(r, g, b)
    } else {
        Color::Indexed(rgb_to_xterm_256(r, g, b))
    }
}

fn supports_truecolor() -> bool {
    if let Ok(force) = std::env::var("JINJA_FIELD_TRUECOLOR") {
        let value = force.to_ascii_lowercase();
        return matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    if let Some(ct) = colorterm {
        let lower = ct.to_ascii_lowercase();
        if lower.contains("truecolor") || lower.contains("24bit") {
            return true;
        }
    }
    term.is_some_and(|t| {
        let lower = t.to_ascii_lowercase();
        lower.contains("direct") || lower.contains("truecolor")
    })
}

fn rgb_to_xterm_256(r: u8, g: u8, b: u8) -> u8 {
    // Result is always 0-5, fits in u8
    #[allow(clippy::cast_possible_truncation)]
    let to_cube = |v: u8| ((u16::from(v) * 5) / 255) as u8;
    16 + (36 * to_cube(r)) + (6 * to_cube(g)) + to_cube(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorfgbg_dark_background() {
        assert_eq!(background_from_colorfgbg(Some("15;0")), Background::Dark);
    }

    #[test]
    fn test_colorfgbg_light_background() {
        assert_eq!(background_from_colorfgbg(Some("0;15")), Background::Light);
    }

    #[test]
    fn test_colorfgbg_missing_or_garbled_is_light() {
        assert_eq!(background_from_colorfgbg(None), Background::Light);
        assert_eq!(background_from_colorfgbg(Some("x;y")), Background::Light);
    }

    #[test]
    fn test_themes_are_shared() {
        let a = Theme::for_background(Background::Light);
        let b = Theme::for_background(Background::Light);
        assert!(std::ptr::eq(a, b));
        assert_ne!(a, Theme::for_background(Background::Dark));
    }

    #[test]
    fn test_token_categories_are_distinguished() {
        let theme = Theme::for_background(Background::Light);
        assert_eq!(theme.style_for(TokenCategory::Plain), Style::default());
        assert_ne!(
            theme.style_for(TokenCategory::Keyword),
            theme.style_for(TokenCategory::String)
        );
        assert!(
            theme
                .style_for(TokenCategory::Comment)
                .add_modifier
                .contains(Modifier::ITALIC)
        );
    }

    #[test]
    fn test_truecolor_detection() {
        assert!(supports_truecolor_from_env(Some("truecolor"), None));
        assert!(supports_truecolor_from_env(None, Some("xterm-direct")));
        assert!(!supports_truecolor_from_env(None, Some("xterm-256color")));
    }

    #[test]
    fn test_rgb_to_xterm_cube() {
        assert_eq!(rgb_to_xterm_256(0, 0, 0), 16);
        assert_eq!(rgb_to_xterm_256(255, 255, 255), 231);
    }
}
