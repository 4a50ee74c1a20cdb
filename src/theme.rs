use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagram::{AutomataGeometry, SequenceGeometry};
use crate::error::{Error, Result};

const CLASSIC_FONT_FAMILY: &str = "sans-serif";
const CLASSIC_TEXT: &str = "black";
const CLASSIC_LINK_STROKE: &str = "#A5A8FF";
const CLASSIC_STATE_STROKE: &str = "black";
const CLASSIC_PARTICIPANT_FILL: &str = "#ECECFF";
const CLASSIC_PARTICIPANT_STROKE: &str = "#CCCCFF";
const CLASSIC_LIFELINE_STROKE: &str = "grey";
const CLASSIC_CLOSURE_FILL: &str = "#FFECEC";
const CLASSIC_CLOSURE_STROKE: &str = "#FFCCCC";
const CLASSIC_MESSAGE_STROKE: &str = "black";
const CLASSIC_SEQUENCE_NUMBER_FILL: &str = "#FF0000";

/// Upper bound for every geometry value, in pixels. Keeps layout arithmetic
/// well inside `i32` for diagrams with thousands of entities.
const MAX_GEOMETRY: i32 = 10_000;

const BUILTIN_THEMES: &[(&str, &str)] = &[
    ("classic", include_str!("../themes/classic.toml")),
    ("slate", include_str!("../themes/slate.toml")),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// Painted behind the whole diagram; transparent when unset.
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default = "default_text")]
    pub text_color: String,

    #[serde(default)]
    pub automata: AutomataStyle,
    #[serde(default)]
    pub sequence: SequenceStyle,

    #[serde(default)]
    pub automata_layout: AutomataGeometry,
    #[serde(default)]
    pub sequence_layout: SequenceGeometry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomataStyle {
    #[serde(default = "default_link_stroke")]
    pub link_stroke: String,
    #[serde(default = "default_state_stroke")]
    pub state_stroke: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceStyle {
    #[serde(default = "default_participant_fill")]
    pub participant_fill: String,
    #[serde(default = "default_participant_stroke")]
    pub participant_stroke: String,
    #[serde(default = "default_lifeline_stroke")]
    pub lifeline_stroke: String,
    #[serde(default = "default_closure_fill")]
    pub closure_fill: String,
    #[serde(default = "default_closure_stroke")]
    pub closure_stroke: String,
    #[serde(default = "default_message_stroke")]
    pub message_stroke: String,
    #[serde(default = "default_sequence_number_fill")]
    pub sequence_number_fill: String,
}

fn default_font_family() -> String {
    CLASSIC_FONT_FAMILY.to_string()
}
fn default_text() -> String {
    CLASSIC_TEXT.to_string()
}
fn default_link_stroke() -> String {
    CLASSIC_LINK_STROKE.to_string()
}
fn default_state_stroke() -> String {
    CLASSIC_STATE_STROKE.to_string()
}
fn default_participant_fill() -> String {
    CLASSIC_PARTICIPANT_FILL.to_string()
}
fn default_participant_stroke() -> String {
    CLASSIC_PARTICIPANT_STROKE.to_string()
}
fn default_lifeline_stroke() -> String {
    CLASSIC_LIFELINE_STROKE.to_string()
}
fn default_closure_fill() -> String {
    CLASSIC_CLOSURE_FILL.to_string()
}
fn default_closure_stroke() -> String {
    CLASSIC_CLOSURE_STROKE.to_string()
}
fn default_message_stroke() -> String {
    CLASSIC_MESSAGE_STROKE.to_string()
}
fn default_sequence_number_fill() -> String {
    CLASSIC_SEQUENCE_NUMBER_FILL.to_string()
}

impl Default for AutomataStyle {
    fn default() -> Self {
        Self {
            link_stroke: default_link_stroke(),
            state_stroke: default_state_stroke(),
        }
    }
}

impl Default for SequenceStyle {
    fn default() -> Self {
        Self {
            participant_fill: default_participant_fill(),
            participant_stroke: default_participant_stroke(),
            lifeline_stroke: default_lifeline_stroke(),
            closure_fill: default_closure_fill(),
            closure_stroke: default_closure_stroke(),
            message_stroke: default_message_stroke(),
            sequence_number_fill: default_sequence_number_fill(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Pastel strokes on a transparent background, the default look.
    pub fn classic() -> Self {
        Theme {
            font_family: default_font_family(),
            background: None,
            text_color: default_text(),
            automata: AutomataStyle::default(),
            sequence: SequenceStyle::default(),
            automata_layout: AutomataGeometry::default(),
            sequence_layout: SequenceGeometry::default(),
        }
    }

    pub fn from_builtin(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        let content = BUILTIN_THEMES
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, c)| *c)
            .ok_or_else(|| {
                Error::Theme(format!(
                    "unknown built-in theme '{}'. Available: {}",
                    name,
                    Self::list_builtins().join(", ")
                ))
            })?;
        Self::from_toml(content)
    }

    pub fn list_builtins() -> Vec<&'static str> {
        BUILTIN_THEMES.iter().map(|(n, _)| *n).collect()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let theme: Theme = toml::from_str(content)
            .map_err(|e| Error::Theme(format!("failed to parse TOML: {}", e)))?;
        theme.validate()?;
        Ok(theme)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let theme: Theme = serde_yaml::from_str(content)
            .map_err(|e| Error::Theme(format!("failed to parse YAML: {}", e)))?;
        theme.validate()?;
        Ok(theme)
    }

    /// Load a theme file, picking the format from its extension. Files with
    /// any other extension are tried as TOML first, then YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("toml") => Self::from_toml(&content),
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_toml(&content).or_else(|_| Self::from_yaml(&content)),
        }
    }

    /// Reject geometry the layouts cannot work with.
    pub fn validate(&self) -> Result<()> {
        let a = &self.automata_layout;
        let s = &self.sequence_layout;

        let positive = [
            ("automata_layout.state_radius", a.state_radius),
            ("automata_layout.state_spacing", a.state_spacing),
            ("sequence_layout.participant_width", s.participant_width),
            ("sequence_layout.participant_height", s.participant_height),
        ];
        for (field, value) in positive {
            if !(1..=MAX_GEOMETRY).contains(&value) {
                return Err(Error::Theme(format!(
                    "{} must be between 1 and {}, got {}",
                    field, MAX_GEOMETRY, value
                )));
            }
        }

        let non_negative = [
            ("automata_layout.padding", a.padding),
            ("automata_layout.title_height", a.title_height),
            ("automata_layout.note_height", a.note_height),
            ("automata_layout.notes_margin", a.notes_margin),
            ("automata_layout.note_gap", a.note_gap),
            ("sequence_layout.padding", s.padding),
            ("sequence_layout.title_height", s.title_height),
            ("sequence_layout.note_height", s.note_height),
            ("sequence_layout.participant_margin", s.participant_margin),
            ("sequence_layout.closure_margin", s.closure_margin),
            ("sequence_layout.closure_header_height", s.closure_header_height),
            ("sequence_layout.closure_tab_width", s.closure_tab_width),
            ("sequence_layout.message_margin", s.message_margin),
            ("sequence_layout.self_call_width", s.self_call_width),
            ("sequence_layout.self_call_height", s.self_call_height),
            ("sequence_layout.notes_margin", s.notes_margin),
            ("sequence_layout.note_gap", s.note_gap),
        ];
        for (field, value) in non_negative {
            if !(0..=MAX_GEOMETRY).contains(&value) {
                return Err(Error::Theme(format!(
                    "{} must be between 0 and {}, got {}",
                    field, MAX_GEOMETRY, value
                )));
            }
        }

        if self.font_family.trim().is_empty() {
            return Err(Error::Theme("font_family must not be empty".to_string()));
        }

        Ok(())
    }
}
