//! Re-entrancy protection for a single page render.
//!
//! The content hook and the embedded-tag renderer both process markup that
//! may, directly or through nested expansion, lead back into themselves. Each
//! render gets its own [`RenderScope`]; entering a hook sets a flag that is
//! cleared when the returned guard is dropped, whichever way the hook exits.

use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// Injecting heading ids into page content.
    HeadingIds,
    /// Rendering an embedded table of contents.
    Shortcode,
}

#[derive(Debug, Default)]
pub struct RenderScope {
    primary: bool,
    heading_ids: Cell<bool>,
    shortcode: Cell<bool>,
}

impl RenderScope {
    /// A scope for the main content of a page.
    pub fn primary() -> Self {
        Self {
            primary: true,
            ..Self::default()
        }
    }

    /// A scope for anything else, such as an excerpt or a sidebar. The content
    /// hook leaves it alone.
    pub fn secondary() -> Self {
        Self::default()
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    fn flag(&self, hook: Hook) -> &Cell<bool> {
        match hook {
            Hook::HeadingIds => &self.heading_ids,
            Hook::Shortcode => &self.shortcode,
        }
    }

    pub fn is_active(&self, hook: Hook) -> bool {
        self.flag(hook).get()
    }

    /// Mark `hook` as running. Returns `None` if it already is.
    pub fn enter(&self, hook: Hook) -> Option<Entered<'_>> {
        let flag = self.flag(hook);
        if flag.replace(true) {
            None
        } else {
            Some(Entered { flag })
        }
    }
}

/// Proof that a hook is running; leaving it clears the flag.
#[must_use]
pub struct Entered<'a> {
    flag: &'a Cell<bool>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
