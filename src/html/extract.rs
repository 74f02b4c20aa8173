use super::LevelSet;
use super::text::{slug, strip_tags};
use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix shared by every generated heading id.
pub const ID_PREFIX: &str = "fyptaco-heading-";

static OPEN_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<h([1-6])([^>]*)>").unwrap());
static CLOSE_TAGS: Lazy<[Regex; 6]> = Lazy::new(|| {
    std::array::from_fn(|i| Regex::new(&format!("(?i)</h{}>", i + 1)).unwrap())
});
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#).unwrap()
});

/// A heading accepted from a page, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    /// Position among *all* heading elements found in the page, including
    /// ones that were filtered out.
    pub occurrence: usize,
    pub raw_attributes: String,
    pub text: String,
    /// The anchor the table of contents links to.
    pub id: String,
}

/// One `<hN ...>...</hN>` element found in the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingMatch<'a> {
    pub whole: &'a str,
    pub level: u8,
    pub attributes: &'a str,
    pub inner: &'a str,
}

/// An iterator over the heading elements of a string of markup.
///
/// The inner content runs to the first closing tag of the *same* level,
/// without regard to nesting. An opening tag that is never closed produces no
/// match and scanning resumes one character after it.
pub struct HeadingMatches<'a> {
    markup: &'a str,
    pos: usize,
    /// Per level, an offset past which that level's closing tag is known not
    /// to occur.
    unclosed_from: [usize; 6],
}

impl<'a> HeadingMatches<'a> {
    pub fn new(markup: &'a str) -> Self {
        Self {
            markup,
            pos: 0,
            unclosed_from: [usize::MAX; 6],
        }
    }
}

impl<'a> Iterator for HeadingMatches<'a> {
    type Item = HeadingMatch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let markup = self.markup;
        while self.pos <= markup.len() {
            let open = OPEN_TAG.captures_at(markup, self.pos)?;
            let tag = open.get_match();
            let level = open[1].as_bytes()[0] - b'0';
            let attributes = open.get(2).map_or("", |m| m.as_str());

            let slot = usize::from(level - 1);
            let close = if tag.end() >= self.unclosed_from[slot] {
                None
            } else {
                CLOSE_TAGS[slot].find_at(markup, tag.end())
            };
            match close {
                Some(close) => {
                    self.pos = close.end();
                    return Some(HeadingMatch {
                        whole: &markup[tag.start()..close.end()],
                        level,
                        attributes,
                        inner: &markup[tag.end()..close.start()],
                    });
                }
                None => {
                    self.unclosed_from[slot] = self.unclosed_from[slot].min(tag.end());
                    // The tag starts with `<`, so one byte on is a char boundary.
                    self.pos = tag.start() + 1;
                }
            }
        }
        None
    }
}

/// Get the value of the `id` attribute in a raw attribute string, if there is
/// one. Attributes are read as a sequence of `name=value` pairs, so an `id=`
/// inside another attribute's quoted value does not count. A bare `id` gives
/// an empty value.
pub fn existing_id(attributes: &str) -> Option<&str> {
    ATTRIBUTE
        .captures_iter(attributes)
        .find(|caps| caps[1].eq_ignore_ascii_case("id"))
        .map(|caps| (2..=4).find_map(|i| caps.get(i)).map_or("", |m| m.as_str()))
}

/// Find the first exclusion selector that matches a heading, ignoring case.
/// Empty selectors never match.
fn excluded_by<'s>(excluded: &'s [String], attributes: &str, text: &str) -> Option<&'s str> {
    let attributes = attributes.to_lowercase();
    let text = text.to_lowercase();
    excluded
        .iter()
        .filter(|s| !s.is_empty())
        .find(|s| {
            let needle = s.to_lowercase();
            attributes.contains(&needle) || text.contains(&needle)
        })
        .map(String::as_str)
}

/// Extract the headings of a page and add ids to the ones that lack them.
///
/// Returns the rewritten markup along with the accepted headings. Headings at
/// levels outside `levels`, or matched by one of the `excluded` selectors, are
/// skipped but still advance the occurrence index, so the ids of the
/// remaining headings do not depend on the filter.
pub fn extract(markup: &str, levels: LevelSet, excluded: &[String]) -> (String, Vec<Heading>) {
    let mut rewritten = markup.to_string();
    let mut headings = vec![];

    for (occurrence, found) in HeadingMatches::new(markup).enumerate() {
        if !levels.contains(found.level) {
            continue;
        }

        let text = strip_tags(found.inner);
        if let Some(selector) = excluded_by(excluded, found.attributes, &text) {
            log::debug!("heading {occurrence} ({text:?}) excluded by {selector:?}");
            continue;
        }

        let generated = format!("{ID_PREFIX}{occurrence}-{}", slug(&text));
        let id = match existing_id(found.attributes) {
            Some(id) if !id.is_empty() => id.to_string(),
            // An empty `id=""` is left alone; the link target stays unresolved.
            Some(_) => generated,
            None => {
                let level = found.level;
                let tagged = format!(
                    "<h{level}{} id=\"{generated}\">{}</h{level}>",
                    found.attributes, found.inner
                );
                rewritten = rewritten.replacen(found.whole, &tagged, 1);
                generated
            }
        };

        headings.push(Heading {
            level: found.level,
            occurrence,
            raw_attributes: found.attributes.to_string(),
            text,
            id,
        });
    }

    (rewritten, headings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h23() -> LevelSet {
        LevelSet::default()
    }

    fn ids(headings: &[Heading]) -> Vec<&str> {
        headings.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn no_headings() {
        let (out, headings) = extract("<p>hi</p>", h23(), &[]);
        assert_eq!(out, "<p>hi</p>");
        assert!(headings.is_empty());
    }

    #[test]
    fn simple_heading() {
        let (out, headings) = extract("<h2>Hello World</h2>", h23(), &[]);
        assert_eq!(
            out,
            "<h2 id=\"fyptaco-heading-0-hello-world\">Hello World</h2>"
        );
        assert_eq!(
            headings,
            &[Heading {
                level: 2,
                occurrence: 0,
                raw_attributes: String::new(),
                text: "Hello World".to_string(),
                id: "fyptaco-heading-0-hello-world".to_string(),
            }]
        );
    }

    #[test]
    fn heading_with_id() {
        let src = "<h2 id=\"x\">A</h2>";
        let (out, headings) = extract(src, h23(), &[]);
        assert_eq!(out, src);
        assert_eq!(ids(&headings), &["x"]);
    }

    #[test]
    fn data_id_is_not_an_id() {
        let (out, headings) = extract("<h2 data-id=\"x\">A</h2>", h23(), &[]);
        assert_eq!(
            out,
            "<h2 data-id=\"x\" id=\"fyptaco-heading-0-a\">A</h2>"
        );
        assert_eq!(ids(&headings), &["fyptaco-heading-0-a"]);
    }

    #[test]
    fn single_quoted_and_bare_ids() {
        assert_eq!(existing_id(" id='a'"), Some("a"));
        assert_eq!(existing_id(" class=\"c\" ID=b"), Some("b"));
        assert_eq!(existing_id(" class=\"c\""), None);
        assert_eq!(existing_id(" hidden id"), Some(""));
    }

    #[test]
    fn id_inside_quoted_value() {
        assert_eq!(existing_id(" title=\"see id=foo\""), None);
        assert_eq!(existing_id(" title='x id=\"y\"' id=\"z\""), Some("z"));

        let (out, headings) = extract("<h2 title=\"see id=foo\">A</h2>", h23(), &[]);
        assert_eq!(
            out,
            "<h2 title=\"see id=foo\" id=\"fyptaco-heading-0-a\">A</h2>"
        );
        assert_eq!(ids(&headings), &["fyptaco-heading-0-a"]);
    }

    #[test]
    fn long_run_of_unclosed_headings() {
        let src = "<h2>".repeat(50_000) + "<h3>x</h3>";
        let matches: Vec<_> = HeadingMatches::new(&src).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].whole, "<h3>x</h3>");

        let (_, headings) = extract(&src, h23(), &[]);
        assert_eq!(ids(&headings), &["fyptaco-heading-0-x"]);
    }

    #[test]
    fn unclosed_level_does_not_hide_later_levels() {
        let src = "<h2>a <h3>b<h2>c</h3> <h4>d</h4>";
        let matches: Vec<_> = HeadingMatches::new(src).map(|m| m.inner).collect();
        assert_eq!(matches, &["b<h2>c", "d"]);
    }

    #[test]
    fn inline_markup_kept() {
        let src = "<h3 class=\"t\">An <em>emphatic</em> one</h3>";
        let (out, headings) = extract(src, h23(), &[]);
        assert_eq!(
            out,
            "<h3 class=\"t\" id=\"fyptaco-heading-0-an-emphatic-one\">An <em>emphatic</em> one</h3>"
        );
        assert_eq!(headings[0].text, "An emphatic one");
        assert_eq!(headings[0].raw_attributes, " class=\"t\"");
    }

    #[test]
    fn case_and_newlines() {
        let (_, headings) = extract("<H2>multi\nline</H2>", h23(), &[]);
        assert_eq!(headings[0].level, 2);
        assert_eq!(headings[0].text, "multi\nline");
    }

    #[test]
    fn occurrence_counts_skipped_levels() {
        let (_, headings) = extract("<h1>T</h1><h2>A</h2><h4>x</h4><h3>B</h3>", h23(), &[]);
        assert_eq!(
            ids(&headings),
            &["fyptaco-heading-1-a", "fyptaco-heading-3-b"]
        );
    }

    #[test]
    fn exclusion_by_text_and_attributes() {
        let src = "<h2>Keep</h2><h2 class=\"No-Toc\">Hidden</h2><h2>Skip ME</h2><h3>Last</h3>";
        let excluded = vec!["no-toc".to_string(), String::new(), "skip me".to_string()];
        let (out, headings) = extract(src, h23(), &excluded);
        assert_eq!(
            ids(&headings),
            &["fyptaco-heading-0-keep", "fyptaco-heading-3-last"]
        );
        // Excluded headings are not rewritten.
        assert!(out.contains("<h2 class=\"No-Toc\">Hidden</h2>"));
        assert!(out.contains("<h2>Skip ME</h2>"));
    }

    #[test]
    fn unclosed_heading() {
        let src = "<h2>never closed <h3>B</h3>";
        let (out, headings) = extract(src, h23(), &[]);
        assert_eq!(ids(&headings), &["fyptaco-heading-0-b"]);
        assert_eq!(out, "<h2>never closed <h3 id=\"fyptaco-heading-0-b\">B</h3>");
    }

    #[test]
    fn mismatched_close_runs_to_same_level() {
        let matches: Vec<_> = HeadingMatches::new("<h2>a</h3>b</h2>").collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].inner, "a</h3>b");
    }

    #[test]
    fn identical_headings() {
        let (out, headings) = extract("<h2>Same</h2><p></p><h2>Same</h2>", h23(), &[]);
        assert_eq!(
            out,
            concat!(
                "<h2 id=\"fyptaco-heading-0-same\">Same</h2><p></p>",
                "<h2 id=\"fyptaco-heading-1-same\">Same</h2>"
            )
        );
        assert_eq!(headings.len(), 2);
    }

    #[test]
    fn rewrite_hits_first_identical_text() {
        // The `h2` inside the `h3` is never scanned on its own, but it is the
        // first place the later heading's text appears.
        let src = "<h3>x<h2>A</h2></h3><h2>A</h2>";
        let (out, headings) = extract(src, LevelSet::empty().with(2), &[]);
        assert_eq!(ids(&headings), &["fyptaco-heading-1-a"]);
        assert_eq!(
            out,
            "<h3>x<h2 id=\"fyptaco-heading-1-a\">A</h2></h3><h2>A</h2>"
        );
    }

    #[test]
    fn rerun_is_stable() {
        let src = "<h2>A</h2><h3>B <b>b</b></h3><h4>C</h4><h3>D</h3>";
        let (once, first) = extract(src, h23(), &[]);
        let (twice, second) = extract(&once, h23(), &[]);
        assert_eq!(once, twice);
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn total_over_junk() {
        for src in ["", "<", "<h", "<h7>x</h7>", "<h2", "</h2>", "<h2>", "é<h2>é"] {
            let (out, headings) = extract(src, LevelSet::all(), &[]);
            assert_eq!(out, src);
            assert!(headings.is_empty());
        }
    }
}
