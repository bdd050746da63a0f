//! Editor configuration.

use kurbo::Size;
use peniko::Color;
use serde::{Deserialize, Serialize};
use stampink_core::TextColor;
use stampink_core::elements::ParseColorError;
use stampink_render::{FontSources, RenderStyle};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid colour for `{field}`: {source}")]
    Color {
        field: &'static str,
        source: ParseColorError,
    },
    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
}

/// Editor configuration. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Area the base image is fitted into (never upscaled).
    pub container_width: f64,
    pub container_height: f64,
    /// Canvas size while no base image is loaded.
    pub placeholder_width: f64,
    pub placeholder_height: f64,
    pub placeholder_background: String,
    pub hint_color: String,
    pub selection_color: String,
    pub selection_width: f64,
    pub show_hints: bool,
    pub load_system_fonts: bool,
    pub font_dirs: Vec<PathBuf>,
    pub placeholder_text: String,
    pub call_to_action_text: String,
    pub add_element_hint_text: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let style = RenderStyle::default();
        Self {
            container_width: 800.0,
            container_height: 600.0,
            placeholder_width: 600.0,
            placeholder_height: 400.0,
            placeholder_background: "#f0f0f0".to_string(),
            hint_color: "#888888".to_string(),
            selection_color: "#6366f1".to_string(),
            selection_width: style.selection_width,
            show_hints: true,
            load_system_fonts: true,
            font_dirs: Vec::new(),
            placeholder_text: style.placeholder_text,
            call_to_action_text: style.call_to_action_text,
            add_element_hint_text: style.add_element_hint_text,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check sizes and colours.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("container_width", self.container_width),
            ("container_height", self.container_height),
            ("placeholder_width", self.placeholder_width),
            ("placeholder_height", self.placeholder_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        self.render_style().map(|_| ())
    }

    pub fn container_size(&self) -> Size {
        Size::new(self.container_width, self.container_height)
    }

    pub fn placeholder_size(&self) -> Size {
        Size::new(self.placeholder_width, self.placeholder_height)
    }

    pub fn font_sources(&self) -> FontSources {
        FontSources {
            load_system_fonts: self.load_system_fonts,
            font_dirs: self.font_dirs.clone(),
        }
    }

    /// Drawing style for the interactive canvas.
    pub fn render_style(&self) -> Result<RenderStyle, ConfigError> {
        Ok(RenderStyle {
            placeholder_background: parse_color(
                "placeholder_background",
                &self.placeholder_background,
            )?,
            hint_color: parse_color("hint_color", &self.hint_color)?,
            selection_color: parse_color("selection_color", &self.selection_color)?,
            selection_width: self.selection_width.max(0.0),
            placeholder_text: self.placeholder_text.clone(),
            call_to_action_text: self.call_to_action_text.clone(),
            add_element_hint_text: self.add_element_hint_text.clone(),
            ..RenderStyle::default()
        })
    }
}

fn parse_color(field: &'static str, value: &str) -> Result<Color, ConfigError> {
    value
        .parse::<TextColor>()
        .map(|c| c.with_opacity(1.0))
        .map_err(|source| ConfigError::Color { field, source })
}
