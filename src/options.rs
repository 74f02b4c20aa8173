//! Parameters for a rendered table of contents.
//!
//! Every parameter arrives as a string from an embedded tag or the config
//! file. Nothing here fails: an invalid value falls back to its default.

use crate::html::LevelSet;
use crate::html::text::strip_tags;
use std::collections::BTreeMap;

/// Raw `key => value` parameters, before validation.
pub type Params = BTreeMap<String, String>;

pub const DEFAULT_MIN_HEADINGS: usize = 3;
pub const DEFAULT_TITLE: &str = "Table of Contents";

/// Whether a collapsible table of contents starts out open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToggleState {
    #[default]
    Show,
    Hide,
}

impl ToggleState {
    pub fn parse(s: &str) -> Self {
        match s {
            "hide" => Self::Hide,
            _ => Self::Show,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TocOptions {
    /// Below this many headings, nothing is rendered.
    pub min_headings: usize,
    pub included: LevelSet,
    pub excluded: Vec<String>,
    pub title: String,
    /// Extra CSS class for the wrapper.
    pub class: String,
    pub collapsible: bool,
    pub default_state: ToggleState,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            min_headings: DEFAULT_MIN_HEADINGS,
            included: LevelSet::default(),
            excluded: vec![],
            title: DEFAULT_TITLE.to_string(),
            class: String::new(),
            collapsible: false,
            default_state: ToggleState::Show,
        }
    }
}

impl TocOptions {
    /// Validate raw parameters. Missing keys take their defaults; unknown
    /// keys are ignored.
    pub fn from_params(params: &Params) -> Self {
        let defaults = Self::default();
        let get = |key: &str| params.get(key).map(String::as_str);
        Self {
            min_headings: get("min_headings")
                .and_then(parse_count)
                .unwrap_or(defaults.min_headings),
            included: get("included").map_or(defaults.included, parse_levels),
            excluded: get("excluded").map(parse_excluded).unwrap_or_default(),
            title: get("title").map_or(defaults.title, sanitize_text),
            class: get("class").map(sanitize_class).unwrap_or_default(),
            collapsible: get("toggle").is_some_and(parse_bool),
            default_state: get("default_toggle").map_or(defaults.default_state, ToggleState::parse),
        }
    }
}

/// Parse a comma-separated list of `hN` tokens. Invalid tokens are dropped;
/// if none are left, the result is the default `h2,h3`.
pub fn parse_levels(s: &str) -> LevelSet {
    let levels: LevelSet = s
        .to_lowercase()
        .split(',')
        .filter_map(|token| match token.trim().as_bytes() {
            [b'h', digit @ b'1'..=b'6'] => Some(digit - b'0'),
            _ => None,
        })
        .collect();
    if levels.is_empty() {
        LevelSet::default()
    } else {
        levels
    }
}

/// Parse a comma-separated list of exclusion selectors, dropping empty ones.
pub fn parse_excluded(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Read a leading integer, so `5`, ` 5 ` and `5th` all give 5. Negative
/// counts mean "always render". Returns `None` when there are no digits.
pub fn parse_count(s: &str) -> Option<usize> {
    let s = s.trim_start();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    if negative {
        return Some(0);
    }
    // Overlong numbers saturate.
    Some(rest[..digits].parse().unwrap_or(usize::MAX))
}

/// Truthy strings are `1`, `true`, `on` and `yes`, in any case.
pub fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Strip markup from a line of user text and collapse its whitespace.
pub fn sanitize_text(s: &str) -> String {
    strip_tags(s).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep only the characters allowed in a CSS class name.
pub fn sanitize_class(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
