//! Card description extraction
//!
//! Press releases open with a dateline paragraph ("CITY, Month DD, YYYY -- ...")
//! that makes a better card teaser than the short description field.

use lazy_static::lazy_static;
use newsroom_index::ArticleRecord;
use regex::Regex;
use scraper::{ElementRef, Html};

pub const DEFAULT_MAX_DESCRIPTION_CHARS: usize = 800;

lazy_static! {
    /// Dateline at the start of a paragraph, e.g. "KENILWORTH, N.J., Jan. 5, 2023"
    static ref ABSTRACT_PATTERN: Option<Regex> = Regex::new(concat!(
        r"^\s*[A-Z][A-Za-z.'\-]*(?:\s+[A-Za-z.'\-]+)*,\s*",
        r"(?:[A-Z][A-Za-z. ]*,\s*)?",
        r"(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?",
        r"|Sept?(?:ember)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?",
        r"\s+\d{1,2},\s+\d{4}",
    ))
    .ok();
}

/// Whether `text` opens with a press-release dateline
pub fn is_abstract(text: &str) -> bool {
    ABSTRACT_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(text))
}

/// Card description HTML for `record`
///
/// Picks the first long-description paragraph that opens with a dateline
/// (minus its first line break). The short description wins when it is
/// longer; a paragraph over `max_chars` is cut and suffixed with `...`. The
/// result is always well-formed markup.
pub fn extract_description(record: &ArticleRecord, max_chars: usize) -> String {
    let paragraph = abstract_paragraph(&record.long_description_html);
    let outer_len = paragraph
        .as_ref()
        .map_or(0, |(outer, _)| outer.chars().count());

    let html = if record.description.chars().count() > outer_len {
        format!("<p>{}</p>", record.description)
    } else {
        match paragraph {
            Some((_, inner)) if outer_len > max_chars => {
                let cut: String = inner.chars().take(max_chars).collect();
                format!("<p>{}...</p>", cut)
            }
            Some((outer, _)) => outer,
            None => String::new(),
        }
    };

    normalize(&html)
}

/// Outer and inner HTML of the dateline paragraph
fn abstract_paragraph(long_description_html: &str) -> Option<(String, String)> {
    let mut fragment = Html::parse_fragment(long_description_html);

    let (paragraph_id, br_id) = {
        let paragraph = fragment
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "p")
            .find(|p| is_abstract(&p.text().collect::<String>()))?;
        let br = paragraph
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "br")
            .map(|el| el.id());
        (paragraph.id(), br)
    };

    if let Some(mut br) = br_id.and_then(|id| fragment.tree.get_mut(id)) {
        br.detach();
    }

    let paragraph = fragment.tree.get(paragraph_id).and_then(ElementRef::wrap)?;
    Some((paragraph.html(), paragraph.inner_html()))
}

/// Parse and re-serialize so unbalanced markup is closed
fn normalize(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    Html::parse_fragment(html).root_element().inner_html()
}
