use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Theme color palette defining all colors used in the console.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub primary: ColorSpec,
    pub secondary: ColorSpec,
    pub accent: ColorSpec,
    pub banner: ColorSpec,

    pub text: ColorSpec,
    pub text_secondary: ColorSpec,
    pub text_muted: ColorSpec,

    pub success: ColorSpec,
    pub warning: ColorSpec,
    pub error: ColorSpec,
    pub info: ColorSpec,

    pub border_active: ColorSpec,
    pub border_normal: ColorSpec,
    pub highlight_bg: ColorSpec,
    pub highlight_fg: ColorSpec,

    // Footer mode colors
    pub footer_edit: ColorSpec,
    pub footer_confirm: ColorSpec,
    pub footer_picker: ColorSpec,
    pub footer_normal: ColorSpec,
}

/// Color specification that can be serialized/deserialized.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSpec {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorSpec {
    pub fn to_color(&self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}

const fn rgb(r: u8, g: u8, b: u8) -> ColorSpec {
    ColorSpec { r, g, b }
}

impl Default for Theme {
    fn default() -> Self {
        Self::tokyo_night()
    }
}

impl Theme {
    /// Tokyo Night theme.
    ///
    pub fn tokyo_night() -> Self {
        Theme {
            name: "tokyo-night".to_string(),
            primary: rgb(125, 207, 255),
            secondary: rgb(158, 206, 106),
            accent: rgb(255, 159, 196),
            banner: rgb(255, 159, 196),
            text: rgb(169, 177, 214),
            text_secondary: rgb(192, 202, 245),
            text_muted: rgb(117, 121, 148),
            success: rgb(158, 206, 106),
            warning: rgb(255, 202, 40),
            error: rgb(247, 118, 142),
            info: rgb(125, 207, 255),
            border_active: rgb(125, 207, 255),
            border_normal: rgb(117, 121, 148),
            highlight_bg: rgb(125, 207, 255),
            highlight_fg: rgb(26, 27, 38),
            footer_edit: rgb(255, 202, 40),
            footer_confirm: rgb(247, 118, 142),
            footer_picker: rgb(158, 206, 106),
            footer_normal: rgb(0, 0, 0),
        }
    }

    /// Dracula theme.
    ///
    pub fn dracula() -> Self {
        Theme {
            name: "dracula".to_string(),
            primary: rgb(189, 147, 249),
            secondary: rgb(139, 233, 253),
            accent: rgb(255, 121, 198),
            banner: rgb(255, 121, 198),
            text: rgb(248, 248, 242),
            text_secondary: rgb(189, 147, 249),
            text_muted: rgb(98, 114, 164),
            success: rgb(80, 250, 123),
            warning: rgb(255, 184, 108),
            error: rgb(255, 85, 85),
            info: rgb(139, 233, 253),
            border_active: rgb(189, 147, 249),
            border_normal: rgb(98, 114, 164),
            highlight_bg: rgb(139, 233, 253),
            highlight_fg: rgb(40, 42, 54),
            footer_edit: rgb(255, 184, 108),
            footer_confirm: rgb(255, 85, 85),
            footer_picker: rgb(80, 250, 123),
            footer_normal: rgb(0, 0, 0),
        }
    }

    /// Rose Pine Dawn theme.
    ///
    pub fn rose_pine_dawn() -> Self {
        Theme {
            name: "rose-pine-dawn".to_string(),
            primary: rgb(161, 119, 255),
            secondary: rgb(59, 247, 209),
            accent: rgb(255, 109, 146),
            banner: rgb(255, 109, 146),
            text: rgb(88, 82, 96),
            text_secondary: rgb(121, 117, 147),
            text_muted: rgb(152, 147, 165),
            success: rgb(59, 247, 209),
            warning: rgb(255, 210, 0),
            error: rgb(235, 111, 146),
            info: rgb(61, 174, 233),
            border_active: rgb(161, 119, 255),
            border_normal: rgb(88, 82, 96),
            highlight_bg: rgb(61, 174, 233),
            highlight_fg: rgb(0, 0, 0),
            footer_edit: rgb(255, 210, 0),
            footer_confirm: rgb(235, 111, 146),
            footer_picker: rgb(59, 247, 209),
            footer_normal: rgb(0, 0, 0),
        }
    }

    /// Get a theme by name.
    ///
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tokyo-night" => Some(Self::tokyo_night()),
            "dracula" => Some(Self::dracula()),
            "rose-pine-dawn" => Some(Self::rose_pine_dawn()),
            _ => None,
        }
    }

    /// Get list of all available theme names.
    ///
    pub fn available_themes() -> Vec<String> {
        vec![
            "tokyo-night".to_string(),
            "dracula".to_string(),
            "rose-pine-dawn".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_theme_resolves() {
        for name in Theme::available_themes() {
            let theme = Theme::from_name(&name).unwrap();
            assert_eq!(theme.name, name);
        }
    }

    #[test]
    fn test_unknown_theme() {
        assert!(Theme::from_name("solarized").is_none());
        assert_eq!(Theme::default().name, "tokyo-night");
    }

    #[test]
    fn test_color_spec_to_color() {
        assert_eq!(rgb(1, 2, 3).to_color(), Color::Rgb(1, 2, 3));
    }
}
