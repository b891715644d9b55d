use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::internal::theme::ThemePreference;

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeFile {
    pub name: String,
    pub themes: Vec<ThemeVariant>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeVariant {
    pub name: String,
    pub mode: String, // "light" or "dark"
    pub colors: HashMap<String, String>,
}

/// Terminal colours for one theme mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub foreground: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub border: Color,
    pub accent: Color,
    pub muted: Color,
    pub error: Color,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            background: Color::Rgb(0xff, 0xfc, 0xf0),
            foreground: Color::Rgb(0x10, 0x0f, 0x0f),
            selection_bg: Color::Rgb(0x20, 0x5e, 0xa6),
            selection_fg: Color::Rgb(0xff, 0xfc, 0xf0),
            border: Color::Rgb(0xb7, 0xb5, 0xac),
            accent: Color::Rgb(0x66, 0x80, 0x0b),
            muted: Color::Rgb(0x6f, 0x6e, 0x69),
            error: Color::Rgb(0xaf, 0x30, 0x29),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(0x10, 0x0f, 0x0f),
            foreground: Color::Rgb(0xce, 0xcd, 0xc3),
            selection_bg: Color::Rgb(0x43, 0x85, 0xbe),
            selection_fg: Color::Rgb(0x10, 0x0f, 0x0f),
            border: Color::Rgb(0x40, 0x3e, 0x3c),
            accent: Color::Rgb(0x87, 0x9a, 0x39),
            muted: Color::Rgb(0x87, 0x85, 0x80),
            error: Color::Rgb(0xd1, 0x4d, 0x41),
        }
    }

    pub fn for_preference(preference: ThemePreference) -> Self {
        match preference {
            ThemePreference::Light => Self::light(),
            ThemePreference::Dark => Self::dark(),
        }
    }

    /// Built-in palette for `preference`, overridden by `theme_file` when one
    /// is configured and loads cleanly.
    pub fn resolve(
        preference: ThemePreference,
        theme_file: Option<&str>,
        enable_performance_metrics: bool,
    ) -> Self {
        match theme_file {
            Some(path) => load_palette(Path::new(path), preference, enable_performance_metrics)
                .unwrap_or_else(|e| {
                    tracing::error!("Failed to load theme '{}': {:#}", path, e);
                    Self::for_preference(preference)
                }),
            None => Self::for_preference(preference),
        }
    }
}

/// Load the variant matching `preference` from a JSON theme file. Colours the
/// variant does not define keep their built-in values.
#[tracing::instrument(skip(path, preference), fields(path = ?path, mode = %preference))]
pub fn load_palette(
    path: &Path,
    preference: ThemePreference,
    enable_performance_metrics: bool,
) -> Result<Palette> {
    let start = std::time::Instant::now();
    let content = fs::read_to_string(path).context("Failed to read theme file")?;
    let theme_file: ThemeFile =
        serde_json::from_str(&content).context("Failed to parse theme JSON")?;

    let mode = preference.to_string();
    let variant = theme_file
        .themes
        .iter()
        .find(|t| t.mode.eq_ignore_ascii_case(&mode))
        .context("No matching theme variant found")?;

    let base = Palette::for_preference(preference);
    let pick = |keys: &[&str], fallback: Color| {
        keys.iter()
            .find_map(|k| variant.colors.get(*k))
            .and_then(|hex| parse_color(hex))
            .unwrap_or(fallback)
    };

    let palette = Palette {
        background: pick(&["background"], base.background),
        foreground: pick(&["foreground"], base.foreground),
        selection_bg: pick(
            &["selection.background", "list.active.background"],
            base.selection_bg,
        ),
        selection_fg: pick(&["accent.foreground", "foreground"], base.selection_fg),
        border: pick(&["border"], base.border),
        accent: pick(&["base.green", "accent"], base.accent),
        muted: pick(&["muted.foreground"], base.muted),
        error: pick(&["base.red", "danger"], base.error),
    };

    if enable_performance_metrics {
        tracing::debug!(elapsed = ?start.elapsed(), "Loaded theme");
    }

    Ok(palette)
}

fn parse_color(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    // 8-digit hex carries alpha, which terminals cannot use.
    if matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
    }
    value.trim().parse::<Color>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const THEME_JSON: &str = r##"{
        "name": "Test",
        "themes": [
            { "name": "Test Light", "mode": "light", "colors": { "background": "#ffffff", "base.red": "#ff0000" } },
            { "name": "Test Dark", "mode": "dark", "colors": { "background": "#000000ff", "foreground": "white" } }
        ]
    }"##;

    fn write_theme() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.json");
        fs::write(&path, THEME_JSON).unwrap();
        (dir, path)
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#205ea6"), Some(Color::Rgb(0x20, 0x5e, 0xa6)));
        assert_eq!(parse_color("205EA6FF"), Some(Color::Rgb(0x20, 0x5e, 0xa6)));
        assert_eq!(parse_color("red"), Some(Color::Red));
        assert_eq!(parse_color("#12"), None);
    }

    #[test]
    fn test_load_variant_with_fallbacks() {
        let (_dir, path) = write_theme();

        let light = load_palette(&path, ThemePreference::Light, false).unwrap();
        assert_eq!(light.background, Color::Rgb(0xff, 0xff, 0xff));
        assert_eq!(light.error, Color::Rgb(0xff, 0x00, 0x00));
        assert_eq!(light.border, Palette::light().border);

        let dark = load_palette(&path, ThemePreference::Dark, false).unwrap();
        assert_eq!(dark.background, Color::Rgb(0, 0, 0));
        assert_eq!(dark.foreground, Color::White);
        assert_eq!(dark.accent, Palette::dark().accent);
    }

    #[test]
    fn test_resolve_falls_back_to_builtin() {
        let palette = Palette::resolve(ThemePreference::Dark, Some("/nonexistent/theme.json"), false);
        assert_eq!(palette, Palette::dark());
        assert_eq!(Palette::resolve(ThemePreference::Light, None, false), Palette::light());
    }
}
