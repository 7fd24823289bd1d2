//! Colors, spacing and widget styles for the gallery.
//!
//! New components should be built on top of these helpers so the gallery
//! keeps one consistent look.

use iced::widget::{button, container};
use iced::{theme, Background, Border, Color, Theme};

pub struct Palette;

impl Palette {
    pub const PRIMARY: Color = Color { r: 0.15, g: 0.15, b: 0.15, a: 1.0 };
    pub const ON_PRIMARY: Color = Color::WHITE;
    pub const SURFACE: Color = Color { r: 0.98, g: 0.98, b: 0.98, a: 1.0 };
    pub const ON_SURFACE: Color = Color { r: 0.1, g: 0.1, b: 0.1, a: 1.0 };
    pub const MUTED: Color = Color { r: 0.88, g: 0.88, b: 0.88, a: 1.0 };
    pub const ERROR: Color = Color { r: 0.80, g: 0.0, b: 0.0, a: 1.0 };
    pub const BACKDROP: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.92 };

    pub const SPACING: u16 = 16;
    pub const THUMBNAIL: f32 = 220.0;
}

struct FilledButton {
    background: Color,
    text: Color,
}

impl button::StyleSheet for FilledButton {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> button::Appearance {
        button::Appearance {
            background: Some(Background::Color(self.background)),
            text_color: self.text,
            border: Border {
                radius: 4.0.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Style for primary action buttons.
pub fn button_primary() -> theme::Button {
    theme::Button::Custom(Box::new(FilledButton {
        background: Palette::PRIMARY,
        text: Palette::ON_PRIMARY,
    }))
}

/// Filter controls; the active one is filled.
pub fn filter_button(active: bool) -> theme::Button {
    let (background, text) = if active {
        (Palette::PRIMARY, Palette::ON_PRIMARY)
    } else {
        (Palette::MUTED, Palette::ON_SURFACE)
    };
    theme::Button::Custom(Box::new(FilledButton { background, text }))
}

/// Cards are buttons without chrome so the whole thumbnail is clickable.
pub fn card_button() -> theme::Button {
    theme::Button::Custom(Box::new(FilledButton {
        background: Color::TRANSPARENT,
        text: Palette::ON_SURFACE,
    }))
}

struct Panel {
    background: Color,
    text: Color,
    border: Color,
}

impl container::StyleSheet for Panel {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> container::Appearance {
        container::Appearance {
            background: Some(Background::Color(self.background)),
            text_color: Some(self.text),
            border: Border {
                color: self.border,
                width: 1.0,
                radius: 4.0.into(),
            },
            shadow: Default::default(),
        }
    }
}

pub fn card() -> theme::Container {
    theme::Container::Custom(Box::new(Panel {
        background: Palette::SURFACE,
        text: Palette::ON_SURFACE,
        border: Palette::MUTED,
    }))
}

pub fn backdrop() -> theme::Container {
    theme::Container::Custom(Box::new(Panel {
        background: Palette::BACKDROP,
        text: Palette::ON_PRIMARY,
        border: Color::TRANSPARENT,
    }))
}

pub fn error_banner() -> theme::Container {
    theme::Container::Custom(Box::new(Panel {
        background: Color::from_rgb(1.0, 0.9, 0.9),
        text: Palette::ERROR,
        border: Palette::ERROR,
    }))
}
