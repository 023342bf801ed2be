use crate::error::{Error, Result};
use serde::Serialize;
use timeclad_core::{Calendar, Config, Date, DuplicateNames};

/// How the children of a node are spread around it when lanes are first assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeMode {
    /// Odd-indexed children above the parent, even-indexed ones below.
    #[default]
    BothSides,
    /// All children below the parent, earliest first.
    LowerOnly,
    /// All children below the parent, latest first.
    LowerOnlyInverse,
}

/// Optional reordering of the input nodes before anything else happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Input,
    Name,
    Start,
}

/// Shape of the segment that joins a child to its parent's line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DerivationStyle {
    /// Vertical, at the child's start.
    #[default]
    Vertical,
    /// Diagonal, from the parent's start to the child's start.
    FromParentStart,
}

/// Compaction effort, `0` (off) to `9`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Aggressiveness(u8);

impl Aggressiveness {
    pub const OFF: Self = Self(0);
    pub const MAX: Self = Self(9);

    /// Levels above 9 are clamped.
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn is_off(self) -> bool {
        self.0 == 0
    }

    /// Splits the two-digit `optimise` setting into (isolated nodes, trees).
    pub fn split(optimise: i32) -> Result<(Self, Self)> {
        let Ok(value @ 0..=99) = u8::try_from(optimise) else {
            return Err(Error::InvalidOption {
                option: "optimise",
                value: optimise.to_string(),
            });
        };
        Ok((Self(value / 10), Self(value % 10)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutOptions {
    /// Nodes starting later are dropped; open-ended nodes stop here.
    pub end_of_time: Date,
    /// Minimum gap kept after a node's stop before another node may use its lane.
    pub stop_spacing: Date,
    pub calendar: Calendar,
    pub tree_mode: TreeMode,
    /// Single-node injection: merges isolated roots onto shared lanes.
    pub isolated: Aggressiveness,
    /// Gap filling and pulling inside trees.
    pub trees: Aggressiveness,
    /// Padding lanes inserted between neighbouring trees.
    pub tree_spacing: i32,
    /// Only trees with more nodes than this get padded.
    pub tree_spacing_bigger_than: i32,
    /// Weight of the fat-line padding; `0.0` turns it off.
    pub big_parent: f64,
    pub line_width: i32,
    /// Refuse pulls whose derivation segment would cross another line.
    pub strict_overlaps: bool,
    pub derivation: DerivationStyle,
    pub offset_px: i32,
    pub year_px: i32,
    pub sort_key: SortKey,
    pub slice: Option<String>,
    /// Children may start after their parent stopped without a warning.
    pub in_vitro: bool,
    pub duplicate_names: DuplicateNames,
    /// Dump the computed lanes at debug level.
    pub debug: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            end_of_time: Date::today(),
            stop_spacing: Date::ym(0, 2),
            calendar: Calendar::default(),
            tree_mode: TreeMode::BothSides,
            isolated: Aggressiveness::MAX,
            trees: Aggressiveness::MAX,
            tree_spacing: 1,
            tree_spacing_bigger_than: 5,
            big_parent: 0.0,
            line_width: 2,
            strict_overlaps: false,
            derivation: DerivationStyle::Vertical,
            offset_px: 20,
            year_px: 100,
            sort_key: SortKey::Input,
            slice: None,
            in_vitro: false,
            duplicate_names: DuplicateNames::Warn,
            debug: false,
        }
    }
}

impl LayoutOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        let invalid = |option: &'static str, value: i32| Error::InvalidOption {
            option,
            value: value.to_string(),
        };

        let tree_mode = match config.tree_mode {
            0 => TreeMode::BothSides,
            1 => TreeMode::LowerOnly,
            2 => TreeMode::LowerOnlyInverse,
            other => return Err(invalid("treeMode", other)),
        };
        let sort_key = match config.sort_key {
            0 => SortKey::Input,
            1 => SortKey::Name,
            2 => SortKey::Start,
            other => return Err(invalid("sortKey", other)),
        };
        let derivation = match config.deriv_type {
            0 => DerivationStyle::Vertical,
            1 => DerivationStyle::FromParentStart,
            other => return Err(invalid("derivType", other)),
        };
        let (isolated, trees) = Aggressiveness::split(config.optimise)?;
        if config.tree_spacing < 0 {
            return Err(invalid("treeSpacing", config.tree_spacing));
        }
        if !(config.big_parent.is_finite() && config.big_parent >= 0.0) {
            return Err(Error::InvalidOption {
                option: "bigParent",
                value: config.big_parent.to_string(),
            });
        }
        if config.months_in_year < 1 {
            return Err(invalid("monthsInYear", config.months_in_year));
        }
        if config.days_in_month < 1 {
            return Err(invalid("daysInMonth", config.days_in_month));
        }

        Ok(Self {
            end_of_time: config.end_of_time,
            stop_spacing: config.stop_spacing,
            calendar: config.calendar(),
            tree_mode,
            isolated,
            trees,
            tree_spacing: config.tree_spacing,
            tree_spacing_bigger_than: config.tree_spacing_bigger_than,
            big_parent: config.big_parent,
            line_width: config.line_width,
            strict_overlaps: config.strict_overlaps != 0,
            derivation,
            offset_px: config.offset_px,
            year_px: config.year_px,
            sort_key,
            slice: Some(config.slice.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            in_vitro: false,
            duplicate_names: config.duplicate_names,
            debug: config.debug > 0,
        })
    }

    pub fn with_optimise(mut self, isolated: u8, trees: u8) -> Self {
        self.isolated = Aggressiveness::new(isolated);
        self.trees = Aggressiveness::new(trees);
        self
    }

    pub fn with_end_of_time(mut self, end_of_time: Date) -> Self {
        self.end_of_time = end_of_time;
        self
    }

    pub fn with_tree_mode(mut self, tree_mode: TreeMode) -> Self {
        self.tree_mode = tree_mode;
        self
    }
}
