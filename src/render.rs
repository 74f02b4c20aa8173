use crate::assets::TEMPLATES;
use crate::html::TocTree;
use crate::options::{TocOptions, ToggleState};
use anyhow::Result;
use minijinja::Value;
use once_cell::sync::Lazy;
use regex::Regex;

static CHAR_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);").unwrap());

/// Escape text for use in HTML content or a quoted attribute value. Existing
/// character references are left as they are, so `&amp;` stays `&amp;`.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '&' if CHAR_REF.is_match(&s[i..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_filter(value: String) -> Value {
    Value::from_safe_string(escape_html(&value))
}

/// A fresh id for the element wrapping one rendered table of contents.
pub fn wrapper_id() -> String {
    format!("fyptaco_{:013x}", rand::random::<u64>() >> 12)
}

/// Renders tables of contents as nested lists.
pub struct TocRenderer {
    tmpls: minijinja::Environment<'static>,
}

impl Default for TocRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TocRenderer {
    pub fn new() -> Self {
        let mut tmpls = minijinja::Environment::new();
        tmpls.add_filter("esc_html", escape_filter);
        tmpls.add_filter("esc_attr", escape_filter);

        for (name, source) in TEMPLATES.contents().filter(|(n, _)| n.ends_with(".html")) {
            tmpls
                .add_template(name, source)
                .expect("error in embedded template");
        }

        Self { tmpls }
    }

    /// Render a table of contents inside its `<nav>` wrapper.
    ///
    /// Produces an empty string when the tree is empty or holds fewer than
    /// `options.min_headings` headings.
    pub fn render(&self, tree: &TocTree, options: &TocOptions, wrapper_id: &str) -> Result<String> {
        if tree.is_empty() || tree.count < options.min_headings {
            log::debug!(
                "not rendering a table of contents for {} headings (minimum {})",
                tree.count,
                options.min_headings
            );
            return Ok(String::new());
        }

        let tmpl = self.tmpls.get_template("toc.html")?;
        let out = tmpl.render(minijinja::context! {
            wrapper_id => wrapper_id,
            class => options.class,
            title => options.title,
            collapsible => options.collapsible,
            expanded => options.default_state == ToggleState::Show,
            nodes => tree.roots,
        })?;
        Ok(out)
    }
}
