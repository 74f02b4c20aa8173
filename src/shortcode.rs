//! Embedded table-of-contents tags, written in a page as
//! `[fyplugins_table_of_contents title="On this page" toggle=yes]`.

use crate::options::Params;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const TAG_NAME: &str = "fyplugins_table_of_contents";

static SHORTCODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\[{TAG_NAME}((?:\s[^\]]*?)?)\s*/?\]")).unwrap()
});
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([\w-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"']+))"#).unwrap()
});

/// Parse the attribute string of a tag. Keys are lowercased; a repeated key
/// keeps its last value.
pub fn parse_attributes(s: &str) -> Params {
    ATTRIBUTE
        .captures_iter(s)
        .map(|caps| {
            let value = (2..=4)
                .find_map(|i| caps.get(i))
                .map_or("", |m| m.as_str());
            (caps[1].to_lowercase(), value.to_string())
        })
        .collect()
}

/// Replace every embedded tag in `content` with the output of `render`.
pub fn expand<F>(content: &str, mut render: F) -> String
where
    F: FnMut(&Params) -> String,
{
    SHORTCODE
        .replace_all(content, |caps: &Captures| render(&parse_attributes(&caps[1])))
        .into_owned()
}
