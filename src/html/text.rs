use once_cell::sync::Lazy;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;

static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>").unwrap()
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&[^\s&;]+;").unwrap());

/// Remove all markup from a fragment, including the contents of `script` and
/// `style` elements, and trim the result.
pub fn strip_tags(markup: &str) -> String {
    let without_code = SCRIPT_OR_STYLE.replace_all(markup, "");
    TAG.replace_all(&without_code, "").trim().to_string()
}

/// Turn heading text into a URL-safe id fragment.
///
/// ASCII letters and digits are lowercased and kept, as is `_`. Runs of
/// whitespace, `-` and `.` become a single hyphen. Other punctuation and
/// character references are dropped outright, so `h'i` becomes `hi`. Accented
/// Latin letters fold to their plain spelling (`Été` becomes `ete`). Other
/// letters outside ASCII survive as lowercase percent-encoded UTF-8.
pub fn slug(text: &str) -> String {
    let text = ENTITY.replace_all(text, "");
    let mut buf = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_whitespace() || c == '-' || c == '.' {
            pending_dash = true;
            continue;
        }
        if !(c.is_alphanumeric() || c == '_') {
            continue;
        }

        // Separators only go between two kept characters.
        if pending_dash && !buf.is_empty() {
            buf.push('-');
        }
        pending_dash = false;

        if c.is_ascii() {
            buf.push(c.to_ascii_lowercase());
        } else if let Some(folded) = fold_latin(c) {
            buf.push_str(&folded);
        } else {
            let lower: String = c.to_lowercase().collect();
            for part in utf8_percent_encode(&lower, NON_ALPHANUMERIC) {
                buf.push_str(&part.to_ascii_lowercase());
            }
        }
    }

    buf
}

/// The plain spelling of an accented Latin letter, like `é` to `e` or `ß` to
/// `ss`.
fn fold_latin(c: char) -> Option<String> {
    let latin = matches!(c, '\u{c0}'..='\u{24f}' | '\u{1e00}'..='\u{1eff}');
    if !latin {
        return None;
    }
    let folded = ::slug::slugify(c.to_string());
    (!folded.is_empty()).then_some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_plain() {
        assert_eq!(strip_tags("hi"), "hi");
    }

    #[test]
    fn strip_inline_markup() {
        assert_eq!(strip_tags("<em>h</em>i <a href=\"#\">there</a>"), "hi there");
    }

    #[test]
    fn strip_script_contents() {
        assert_eq!(strip_tags("a<script>var x = '<b>';</script>b"), "ab");
        assert_eq!(strip_tags("a<STYLE type=\"x\">p {}</STYLE>b"), "ab");
    }

    #[test]
    fn strip_trims() {
        assert_eq!(strip_tags("\n  <span> hi </span>\n"), "hi");
    }

    #[test]
    fn simple_slug() {
        assert_eq!(slug("hi"), "hi");
    }

    #[test]
    fn space() {
        assert_eq!(slug("H i"), "h-i");
    }

    #[test]
    fn punctuation() {
        assert_eq!(slug("h'i"), "hi");
    }

    #[test]
    fn multi_gap() {
        assert_eq!(slug("h ' i"), "h-i");
    }

    #[test]
    fn edges_trimmed() {
        assert_eq!(slug("  -- Intro! --  "), "intro");
    }

    #[test]
    fn dots_and_underscores() {
        assert_eq!(slug("v1.2 snake_case"), "v1-2-snake_case");
    }

    #[test]
    fn entities_dropped() {
        assert_eq!(slug("Fish &amp; Chips"), "fish-chips");
    }

    #[test]
    fn accents_folded() {
        assert_eq!(slug("Été"), "ete");
        assert_eq!(slug("Été à Paris"), "ete-a-paris");
        assert_eq!(slug("Straße Œuvre"), "strasse-oeuvre");
    }

    #[test]
    fn other_scripts_encoded() {
        assert_eq!(slug("Ω"), "%cf%89");
        assert_eq!(slug("café Ω"), "cafe-%cf%89");
    }

    #[test]
    fn empty() {
        assert_eq!(slug("?!"), "");
    }
}
