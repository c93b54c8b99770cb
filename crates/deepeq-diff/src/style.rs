//! Escape sequences interleaved into the rendered report.

use serde::{Deserialize, Serialize};

/// Which palette the reporter writes with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    /// No escape sequences.
    #[default]
    Plain,
    /// 16-colour ANSI escapes for terminals.
    Ansi,
}

impl Style {
    /// The palette this style names.
    pub fn palette(self) -> Palette {
        match self {
            Style::Plain => Palette::plain(),
            Style::Ansi => Palette::ansi(),
        }
    }
}

/// The escape sequences for each part of a report line. Every field is
/// empty in the plain palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Passing leaf values.
    pub reset: &'static str,
    /// `[OK]`/`[FAIL]` markers and leaf kinds.
    pub muted: &'static str,
    /// Failing leaf values.
    pub fail: &'static str,
    /// Composite type labels.
    pub label: &'static str,
    /// Child names.
    pub field: &'static str,
}

impl Palette {
    /// Every escape empty.
    pub const fn plain() -> Self {
        Self {
            reset: "",
            muted: "",
            fail: "",
            label: "",
            field: "",
        }
    }

    /// Grey markers, red failures, yellow labels and cyan names.
    pub const fn ansi() -> Self {
        Self {
            reset: "\x1b[0m",
            muted: "\x1b[90m",
            fail: "\x1b[31m",
            label: "\x1b[33m",
            field: "\x1b[36m",
        }
    }

    /// Returns `true` if rendering with this palette emits no escapes.
    pub fn is_plain(&self) -> bool {
        *self == Self::plain()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::plain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_selects_palette() {
        assert!(Style::Plain.palette().is_plain());
        assert_eq!(Style::Ansi.palette().fail, "\x1b[31m");
        assert!(!Palette::ansi().is_plain());
    }

    #[test]
    fn style_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Doc {
            style: Style,
        }
        let doc: Doc = toml::from_str("style = \"ansi\"").unwrap();
        assert_eq!(doc.style, Style::Ansi);
    }
}
