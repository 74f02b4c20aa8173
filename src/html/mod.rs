//! Heading extraction and table-of-contents construction for HTML pages.
//!
//! Headings are found with lightweight pattern matching rather than a DOM
//! parser, so malformed markup never causes an error: a heading that does not
//! close simply isn't found.

pub mod extract;
pub mod text;
pub mod tree;

pub use extract::{Heading, extract};
pub use tree::{HeadingNode, TocTree, build_tree};

/// A set of heading levels, 1 through 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelSet(u8);

impl LevelSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b111_1110)
    }

    /// Add a level to the set. Anything outside 1..=6 is ignored.
    pub const fn with(self, level: u8) -> Self {
        if level >= 1 && level <= 6 {
            Self(self.0 | (1 << level))
        } else {
            self
        }
    }

    pub const fn contains(self, level: u8) -> bool {
        level >= 1 && level <= 6 && self.0 & (1 << level) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = u8> {
        (1..=6).filter(move |&l| self.contains(l))
    }
}

/// `h2` and `h3`.
impl Default for LevelSet {
    fn default() -> Self {
        Self::empty().with(2).with(3)
    }
}

impl FromIterator<u8> for LevelSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// The result of processing one page: the markup with ids added to its
/// headings, and the table of contents that links to them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocBuild {
    pub markup: String,
    pub tree: TocTree,
}

/// Extract the headings of a page and nest them into a table of contents.
///
/// Blank input is returned as-is with an empty tree.
pub fn build(markup: &str, levels: LevelSet, excluded: &[String]) -> TocBuild {
    if markup.trim().is_empty() {
        return TocBuild {
            markup: markup.to_string(),
            tree: TocTree::default(),
        };
    }

    let (markup, headings) = extract(markup, levels, excluded);
    log::debug!("found {} headings at levels {:?}", headings.len(), levels);
    TocBuild {
        markup,
        tree: build_tree(&headings),
    }
}
