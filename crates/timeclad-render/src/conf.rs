//! Writes the effective configuration as a conf file.

use crate::error::Result;
use serde_json::Value;
use std::fmt::Write as _;
use timeclad_core::Config;
use timeclad_core::config::config_entries;

fn describe(option: &str) -> Option<&'static str> {
    Some(match option {
        "infoBoxTitle" => "Info box. Set both font sizes, the width and the height to 0 to hide it.",
        "fontCorrectionFactor" => "Scales the estimated width and height of all text.",
        "orientation" => "0 = left to right, 1 = top to bottom, 2 = right to left, 3 = bottom to top",
        "treeMode" => "0 = children on both sides, 1 = lower side, 2 = lower side in reverse order",
        "sortKey" => "0 = input order, 1 = by name, 2 = by start date",
        "optimise" => "Tens digit: isolated node injection (0-9). Ones digit: tree compaction (0-9).",
        "strictOverlaps" => "1 = never move a node where its derivation line would cross another line",
        "treeSpacing" => "Empty lanes between trees with more than treeSpacingBiggerThan nodes.",
        "bigParent" => "Empty lanes around lines made fat by big subtrees (0 = off).",
        "mainBackground" => "Colors are #rgb, #rrggbb or none.",
        "stopSpacing" => "Minimum gap between two lineages on one lane, as year.month.day",
        "labelBGOpacity" => "Label background opacity in percent, 0 disables it.",
        "nameChangeType" => "0 = name changes beside the dot, 1 = centered on the dot",
        "derivType" => "0 = vertical derivation lines, 1 = from the parent's start",
        "dotType" => "0 = filled dots, 1 = rings",
        "monthsInYear" => "Calendar granularity.",
        "endOfTime" => "Last date on the timeline.",
        "descriptionType" => "1 = link labels to the node description",
        "dir_showDotFiles" => "Directory input only.",
        "duplicateNames" => "warn = the last node with a name wins, error = refuse the input",
        _ => return None,
    })
}

/// Renders `config` so that parsing the result yields an equal [`Config`].
pub fn render_conf(config: &Config) -> Result<String> {
    let mut out = String::new();
    let _ = write!(
        out,
        "# timeclad config file\n\
         # Generated by timeclad {}\n\
         \n\
         # Commented or missing options use the built-in defaults.\n\
         # Syntax: option = value, optionally quoted with ' or \".\n\
         # Repeat infoBoxText for every line of the info box.\n",
        env!("CARGO_PKG_VERSION")
    );

    for (option, value) in config_entries(config)? {
        if let Some(note) = describe(&option) {
            let _ = write!(out, "\n# {note}\n");
        }
        match value {
            Value::Array(lines) => {
                for line in lines {
                    let _ = writeln!(out, "{option} = {}", scalar(&line));
                }
            }
            other => {
                let _ = writeln!(out, "{option} = {}", scalar(&other));
            }
        }
    }
    Ok(out)
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}
