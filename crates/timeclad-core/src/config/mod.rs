//! Conversion settings, loaded from `option = value` conf files.
//!
//! Parsing works on the JSON shape of [`Config`]: defaults are serialized, every conf line is
//! coerced to the type already present under its key, and the merged object is deserialized back.

use crate::color::Color;
use crate::date::{Calendar, Date};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// What to do when two nodes share a name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateNames {
    /// Log a warning; the last listed node wins parent resolution.
    #[default]
    Warn,
    /// Refuse the input.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub info_box_title: String,
    pub info_box_title_size: i32,
    pub info_box_text: Vec<String>,
    pub info_box_text_size: i32,
    pub info_box_font: String,
    pub info_box_font_color: Color,
    pub info_box_color1: Color,
    pub info_box_color2: Color,
    pub info_box_x: i32,
    pub info_box_y: i32,
    pub info_box_width: i32,
    pub info_box_height: i32,

    /// Name of a node to cut out of the whole forest, together with its descendants.
    pub slice: String,
    pub font_correction_factor: f64,
    /// 0 = left to right, 1 = top to bottom, 2 = right to left, 3 = bottom to top.
    pub orientation: i32,
    /// 0 = branch to both sides, 1 = lower side, 2 = lower side in reverse order.
    pub tree_mode: i32,
    /// 0 = input order, 1 = by name, 2 = by start date.
    pub sort_key: i32,
    /// Tens digit: isolated nodes. Ones digit: trees.
    pub optimise: i32,
    pub strict_overlaps: i32,
    pub tree_spacing: i32,
    pub tree_spacing_bigger_than: i32,
    /// Pads both sides of lanes whose line gets fat from a large subtree; 0 turns it off.
    pub big_parent: f64,

    pub main_background: Color,
    pub ruler_width: i32,
    pub ruler_color: Color,
    pub ruler_month_width: i32,
    pub ruler_month_color: Color,

    pub line_width: i32,
    #[serde(rename = "offsetPX")]
    pub offset_px: i32,
    #[serde(rename = "stopFadeOutPX")]
    pub stop_fade_out_px: i32,
    pub stop_spacing: Date,
    #[serde(rename = "yearPX")]
    pub year_px: i32,

    pub label_font: String,
    pub label_font_size: i32,
    pub label_font_color: Color,
    #[serde(rename = "labelBGOpacity")]
    pub label_bg_opacity: i32,
    pub name_change_type: i32,

    pub deriv_type: i32,
    pub dot_radius: i32,
    pub small_dot_radius: i32,
    pub dot_type: i32,

    pub connector_dots: i32,
    pub connectors_dashed: i32,

    #[serde(rename = "yearLinePX")]
    pub year_line_px: i32,
    pub year_line_color1: Color,
    pub year_line_color2: Color,
    pub year_line_font: String,
    pub year_line_font_size: i32,
    pub year_line_font_color: Color,

    pub months_in_year: i32,
    pub days_in_month: i32,
    pub end_of_time: Date,
    pub description_type: i32,

    #[serde(rename = "dir_showDotFiles")]
    pub dir_show_dot_files: i32,
    #[serde(rename = "dir_colorFile")]
    pub dir_color_file: Color,
    #[serde(rename = "dir_colorDir")]
    pub dir_color_dir: Color,

    pub duplicate_names: DuplicateNames,
    pub debug: i32,
}

const SANS: &str = "Liberation Sans, Arial, Helvetica";

impl Default for Config {
    fn default() -> Self {
        Self {
            info_box_title: "Title".to_string(),
            info_box_title_size: 18,
            info_box_text: Vec::new(),
            info_box_text_size: 12,
            info_box_font: SANS.to_string(),
            info_box_font_color: Color::rgb(0x00, 0x00, 0x00),
            info_box_color1: Color::rgb(0x51, 0xb1, 0xf1),
            info_box_color2: Color::rgb(0x31, 0x81, 0xf1),
            info_box_x: 10,
            info_box_y: 45,
            info_box_width: 166,
            info_box_height: 60,

            slice: String::new(),
            font_correction_factor: 1.0,
            orientation: 0,
            tree_mode: 0,
            sort_key: 0,
            optimise: 99,
            strict_overlaps: 0,
            tree_spacing: 1,
            tree_spacing_bigger_than: 5,
            big_parent: 0.0,

            main_background: Color::rgb(0xff, 0xff, 0xff),
            ruler_width: 2,
            ruler_color: Color::rgb(0xdd, 0xdd, 0xdd),
            ruler_month_width: 1,
            ruler_month_color: Color::rgb(0xee, 0xee, 0xee),

            line_width: 2,
            offset_px: 20,
            stop_fade_out_px: 30,
            stop_spacing: Date::ym(0, 2),
            year_px: 100,

            label_font: SANS.to_string(),
            label_font_size: 16,
            label_font_color: Color::rgb(0x00, 0x00, 0x00),
            label_bg_opacity: 0,
            name_change_type: 0,

            deriv_type: 0,
            dot_radius: 10,
            small_dot_radius: 5,
            dot_type: 0,

            connector_dots: 1,
            connectors_dashed: 1,

            year_line_px: 40,
            year_line_color1: Color::rgb(0x00, 0x33, 0x77),
            year_line_color2: Color::rgb(0x33, 0x77, 0xdd),
            year_line_font: SANS.to_string(),
            year_line_font_size: 28,
            year_line_font_color: Color::rgb(0xff, 0xff, 0xff),

            months_in_year: 12,
            days_in_month: 30,
            end_of_time: Date::today(),
            description_type: 0,

            dir_show_dot_files: 0,
            dir_color_file: Color::rgb(0x00, 0xff, 0xff),
            dir_color_dir: Color::rgb(0x00, 0x00, 0xff),

            duplicate_names: DuplicateNames::Warn,
            debug: 0,
        }
    }
}

impl Config {
    pub fn calendar(&self) -> Calendar {
        Calendar {
            months_in_year: self.months_in_year,
            days_in_month: self.days_in_month,
        }
    }

    /// Parses a conf file on top of the built-in defaults.
    pub fn from_conf_str(text: &str) -> Result<Self> {
        Self::default().merge_conf_str(text)
    }

    /// Reads a conf file. A missing file is not an error: the defaults are used instead.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_conf_str(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "no config file found; using default options"
                );
                Ok(Self::default())
            }
            Err(err) => Err(Error::io(path, err)),
        }
    }

    /// Applies conf-file lines on top of `self`.
    ///
    /// The first `infoBoxText` line replaces the current text block; later ones append to it.
    pub fn merge_conf_str(self, text: &str) -> Result<Self> {
        let mut value = serde_json::to_value(&self)?;
        let Some(map) = value.as_object_mut() else {
            return Ok(self);
        };

        let mut text_block_started = false;
        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (option, val) = match line.split_once('=') {
                Some((option, val)) => (option.trim(), strip_quotes(val.trim())),
                None => (line, ""),
            };

            let Some(slot) = map.get_mut(option) else {
                tracing::warn!(option, "ignoring unrecognised config option");
                continue;
            };

            match coerce_like(slot, val, &mut text_block_started) {
                Some(next) => *slot = next,
                None => return Err(invalid_option(option, val)),
            }
            // Colors, dates and enums are only checked by deserializing.
            if Config::deserialize(&Value::Object(map.clone())).is_err() {
                return Err(invalid_option(option, val));
            }
            tracing::debug!(option, value = val, "config option");
        }

        Ok(Config::deserialize(&value)?)
    }
}

fn invalid_option(option: &str, val: &str) -> Error {
    Error::InvalidOption {
        option: option.to_string(),
        value: val.to_string(),
    }
}

fn strip_quotes(val: &str) -> &str {
    val.trim_start_matches(['"', '\''])
        .trim_end_matches(['"', '\''])
}

/// Builds the JSON value for `raw`, shaped like the value already stored in `slot`.
fn coerce_like(slot: &Value, raw: &str, text_block_started: &mut bool) -> Option<Value> {
    match slot {
        Value::Array(items) => {
            let mut items = if *text_block_started {
                items.clone()
            } else {
                Vec::new()
            };
            *text_block_started = true;
            items.push(Value::String(raw.to_string()));
            Some(Value::Array(items))
        }
        Value::Number(n) if n.is_f64() => raw.parse::<f64>().ok().map(Value::from),
        Value::Number(_) => raw.parse::<i64>().ok().map(Value::from),
        _ => Some(Value::String(raw.to_string())),
    }
}

/// Returns the config as a flat JSON object, keyed like the conf file.
pub fn config_entries(config: &Config) -> Result<Map<String, Value>> {
    match serde_json::to_value(config)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conf_lines_override_defaults() {
        let cfg = Config::from_conf_str(
            "# comment\n\
             \n\
             optimise = 33\n\
             offsetPX=25\n\
             labelFont = 'DejaVu Sans'\n\
             stopSpacing = \"0.3\"\n\
             fontCorrectionFactor = 1.25\n\
             mainBackground = #000\n",
        )
        .unwrap();
        assert_eq!(cfg.optimise, 33);
        assert_eq!(cfg.offset_px, 25);
        assert_eq!(cfg.label_font, "DejaVu Sans");
        assert_eq!(cfg.stop_spacing, Date::ym(0, 3));
        assert_eq!(cfg.font_correction_factor, 1.25);
        assert_eq!(cfg.main_background, Color::rgb(0, 0, 0));
        assert_eq!(cfg.tree_mode, 0);
    }

    #[test]
    fn info_box_text_lines_accumulate() {
        let cfg = Config::from_conf_str("infoBoxText = first\ninfoBoxText = second\n").unwrap();
        assert_eq!(cfg.info_box_text, vec!["first", "second"]);
    }

    #[test]
    fn unknown_options_are_ignored() {
        let cfg = Config::from_conf_str("noSuchOption = 2\ntreeSpacing = 3\n").unwrap();
        assert_eq!(cfg.tree_spacing, 3);
    }

    #[test]
    fn big_parent_takes_fractional_values() {
        let cfg = Config::from_conf_str("bigParent = 1.5\n").unwrap();
        assert_eq!(cfg.big_parent, 1.5);
        let cfg = Config::from_conf_str("bigParent = 2\n").unwrap();
        assert_eq!(cfg.big_parent, 2.0);
    }

    #[test]
    fn bad_values_name_the_option() {
        let err = Config::from_conf_str("treeMode = lots\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config setting for option treeMode: `lots`"
        );

        let err = Config::from_conf_str("rulerColor = #12\n").unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref option, .. } if option == "rulerColor"));

        let err = Config::from_conf_str("duplicateNames = sometimes\n").unwrap_err();
        assert!(matches!(err, Error::InvalidOption { ref option, .. } if option == "duplicateNames"));
    }

    #[test]
    fn duplicate_policy_is_configurable() {
        let cfg = Config::from_conf_str("duplicateNames = error\n").unwrap();
        assert_eq!(cfg.duplicate_names, DuplicateNames::Error);
    }

    #[test]
    fn missing_conf_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("absent.conf")).unwrap();
        assert_eq!(cfg.optimise, Config::default().optimise);
    }
}
