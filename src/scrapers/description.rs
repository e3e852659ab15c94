//! Qualifications-section extraction from free-form posting HTML.
//!
//! Postings mix narrative paragraphs, bullet lists and headers with no
//! machine-readable section markers. The [`Segmenter`] makes a single pass
//! over the description container:
//!
//! 1. The container is flattened into [`Block`]s in document order.
//! 2. A non-bullet text block or a list item matching one of the section
//!    keywords ("Requirements:", "Minimum Qualifications", ...) starts
//!    capturing. The header itself is not emitted.
//! 3. While capturing, list items are always emitted, paragraphs only when
//!    they start with a bullet glyph. The first plain paragraph ends the
//!    section.
//!
//! When nothing is captured the result is [`DESCRIPTION_NOT_AVAILABLE`].

use crate::models::DESCRIPTION_NOT_AVAILABLE;
use crate::scrapers::locator::element_text;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use scraper::ElementRef;
use tracing::debug;

/// Terms that open a qualifications/requirements section.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "qualifications",
    "qualification",
    "minimum qualifications",
    "preferred qualifications",
    "requirements",
    "requirement",
    "position requirements",
    "recruitment requirements",
    "responsibilities",
    "desired skills",
    "required skills",
    "skills",
    "experience",
    "required experience",
    "certification",
    "certifications",
];

/// Leading characters that make a paragraph read as a bullet point.
pub const DEFAULT_BULLETS: &[&str] = &["-", "•", "*", "·", "–", "▪", "◦"];

static DEFAULT_SEGMENTER: Lazy<Segmenter> = Lazy::new(|| {
    Segmenter::new(DEFAULT_KEYWORDS, DEFAULT_BULLETS)
        .expect("default description keywords form a valid pattern")
});

/// A unit of description content, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    /// Paragraph, heading or bold/emphasis run.
    Text(String),
    /// A list item found outside of any list container.
    Item(String),
    /// A `ul`/`ol` with the text of each of its items.
    List(Vec<String>),
}

/// Flatten the descendants of `container` into blocks.
///
/// Text and list blocks are leaves: their own descendants are not visited
/// again, so nested emphasis inside a paragraph is never emitted twice.
fn flatten(container: ElementRef<'_>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut stack: Vec<ElementRef<'_>> = children_of(container);
    stack.reverse();

    while let Some(element) = stack.pop() {
        match element.value().name() {
            "p" | "b" | "strong" | "em" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                blocks.push(Block::Text(element_text(element)));
            }
            "li" => blocks.push(Block::Item(element_text(element))),
            "ul" | "ol" => blocks.push(Block::List(list_items(element))),
            "script" | "style" | "noscript" | "template" => {}
            _ => {
                let mut children = children_of(element);
                children.reverse();
                stack.extend(children);
            }
        }
    }
    blocks
}

/// Text of the outermost `li` descendants of `list`, in document order.
///
/// Items wrapped in other elements are still found. Lists nested inside an
/// item belong to that item's text.
fn list_items(list: ElementRef<'_>) -> Vec<String> {
    let mut items = Vec::new();
    let mut stack = children_of(list);
    stack.reverse();

    while let Some(element) = stack.pop() {
        match element.value().name() {
            "li" => items.push(element_text(element)),
            "script" | "style" | "noscript" | "template" => {}
            _ => {
                let mut children = children_of(element);
                children.reverse();
                stack.extend(children);
            }
        }
    }
    items
}

fn children_of(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap).collect()
}

/// Keyword-anchored extractor for the qualifications part of a posting.
#[derive(Debug, Clone)]
pub struct Segmenter {
    keywords: Regex,
    bullets: Vec<String>,
}

impl Default for Segmenter {
    fn default() -> Self {
        DEFAULT_SEGMENTER.clone()
    }
}

impl Segmenter {
    /// Build a segmenter from section keywords and bullet glyphs.
    ///
    /// Keywords match case-insensitively on word boundaries, so
    /// "Qualifications:" and "MINIMUM QUALIFICATIONS" both open a section
    /// while "unqualified" does not.
    pub fn new<K, B>(keywords: &[K], bullets: &[B]) -> Result<Self, regex::Error>
    where
        K: AsRef<str>,
        B: AsRef<str>,
    {
        let alternatives = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(|k| regex::escape(k).replace(' ', r"\s+"))
            .collect::<Vec<_>>();

        // An empty keyword set must never match.
        let pattern = if alternatives.is_empty() {
            r"[^\s\S]".to_string()
        } else {
            format!(r"\b(?:{})\b", alternatives.join("|"))
        };

        let keywords = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
        let bullets = bullets
            .iter()
            .map(|b| b.as_ref().trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();

        Ok(Self { keywords, bullets })
    }

    /// Whether `text` starts with one of the bullet glyphs.
    pub fn looks_like_bullet(&self, text: &str) -> bool {
        self.bullets.iter().any(|bullet| text.starts_with(bullet.as_str()))
    }

    /// Whether `text` is a section header rather than content.
    pub fn is_section_header(&self, text: &str) -> bool {
        !self.looks_like_bullet(text) && self.keywords.is_match(text)
    }

    /// Extract the qualifications lines from a description container.
    pub fn segment(&self, container: ElementRef<'_>) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut capturing = false;

        for block in flatten(container) {
            match block {
                Block::Text(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    if self.is_section_header(&text) {
                        debug!(header = %text, "Section keyword found; capturing");
                        capturing = true;
                    } else if capturing {
                        if self.looks_like_bullet(&text) {
                            lines.push(text);
                        } else {
                            debug!("Narrative paragraph ends captured section");
                            capturing = false;
                        }
                    }
                }
                Block::Item(text) => self.take_item(text, &mut capturing, &mut lines),
                Block::List(items) => {
                    for item in items {
                        self.take_item(item, &mut capturing, &mut lines);
                    }
                }
            }
        }

        let joined = lines.join("\n");
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            DESCRIPTION_NOT_AVAILABLE.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// List items are content while capturing, and may open a section
    /// otherwise.
    fn take_item(&self, text: String, capturing: &mut bool, lines: &mut Vec<String>) {
        if text.is_empty() {
            return;
        }
        if *capturing {
            lines.push(text);
        } else if self.is_section_header(&text) {
            debug!(header = %text, "Section keyword found in list item; capturing");
            *capturing = true;
        }
    }

    #[cfg(test)]
    pub fn segment_html(&self, html: &str) -> String {
        let fragment = scraper::Html::parse_fragment(html);
        self.segment(fragment.root_element())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn paragraphs(lines: &[&str]) -> String {
        lines.iter().map(|l| format!("<p>{l}</p>")).collect()
    }

    #[test]
    fn test_requirements_section_between_narrative_paragraphs() {
        let html = paragraphs(&[
            "Intro text.",
            "Requirements:",
            "- 5 years experience",
            "- Strong communication",
            "We are an equal opportunity employer.",
        ]);
        let out = Segmenter::default().segment_html(&html);
        assert_eq!(out, "- 5 years experience\n- Strong communication");
    }

    #[test]
    fn test_list_items_are_captured_after_header() {
        let html = r#"
            <div id="jobDescriptionText">
              <p>About the team</p>
              <p><b>Qualifications:</b></p>
              <ul>
                <li>BSN required</li>
                <li>  Current PA license </li>
              </ul>
              <p>Benefits include dental.</p>
              <ul><li>401k</li></ul>
            </div>
        "#;
        let out = Segmenter::default().segment_html(html);
        assert_eq!(out, "BSN required\nCurrent PA license");
    }

    #[test]
    fn test_list_does_not_end_capture() {
        let html = r#"
            <h3>Responsibilities</h3>
            <ul><li>Triage patients</li></ul>
            <p>• Chart accurately</p>
            <ol><li>Mentor staff</li></ol>
            <p>Apply today.</p>
        "#;
        let out = Segmenter::default().segment_html(html);
        assert_eq!(out, "Triage patients\n• Chart accurately\nMentor staff");
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let html = paragraphs(&["MINIMUM QUALIFICATIONS", "* Python", "Thanks."]);
        assert_eq!(Segmenter::default().segment_html(&html), "* Python");
    }

    #[test]
    fn test_second_header_keeps_capturing() {
        let html = paragraphs(&[
            "Requirements:",
            "- SQL",
            "Desired Skills:",
            "- Rust",
            "Closing remarks.",
        ]);
        assert_eq!(Segmenter::default().segment_html(&html), "- SQL\n- Rust");
    }

    #[test]
    fn test_bullet_with_keyword_is_content_not_header() {
        let html = paragraphs(&["- 3 years experience", "Skills", "- Excel"]);
        assert_eq!(Segmenter::default().segment_html(&html), "- Excel");
    }

    #[test]
    fn test_empty_paragraph_does_not_end_capture() {
        let html = "<p>Requirements:</p><p> </p><p>- Forklift certified</p>";
        assert_eq!(Segmenter::default().segment_html(html), "- Forklift certified");
    }

    #[test]
    fn test_items_before_any_header_are_ignored() {
        let html = "<ul><li>Free snacks</li></ul><p>Great culture.</p>";
        assert_eq!(Segmenter::default().segment_html(html), DESCRIPTION_NOT_AVAILABLE);
    }

    #[test]
    fn test_nested_list_items_are_not_duplicated() {
        let html = r#"<p>Requirements</p><div><ul><li>A <ul><li>A.1</li></ul></li><li>B</li></ul></div>"#;
        assert_eq!(Segmenter::default().segment_html(html), "A A.1\nB");
    }

    #[test]
    fn test_header_inside_list_opens_section() {
        let html = "<p>About us.</p><ul><li><strong>Qualifications:</strong></li><li>BSN required</li><li>PA license</li></ul>";
        assert_eq!(Segmenter::default().segment_html(html), "BSN required\nPA license");
    }

    #[test]
    fn test_orphan_item_header_opens_section() {
        let html = "<li>Requirements</li><li>Forklift certified</li>";
        assert_eq!(Segmenter::default().segment_html(html), "Forklift certified");
    }

    #[test]
    fn test_items_with_keywords_are_content_while_capturing() {
        let html = "<p>Requirements:</p><ul><li>5 years experience</li><li>Excel skills</li></ul>";
        assert_eq!(
            Segmenter::default().segment_html(html),
            "5 years experience\nExcel skills"
        );
    }

    #[test]
    fn test_wrapped_list_items_are_kept() {
        let html = "<p>Requirements</p><ul><div><li>Go</li><li>Rust</li></div><li>SQL</li></ul>";
        assert_eq!(Segmenter::default().segment_html(html), "Go\nRust\nSQL");
    }

    #[test]
    fn test_scripts_are_ignored() {
        let html = "<p>Requirements</p><script>var x = '- not content';</script><li>Real item</li>";
        assert_eq!(Segmenter::default().segment_html(html), "Real item");
    }

    #[test]
    fn test_no_keywords_yields_not_available() {
        let html = paragraphs(&["We are hiring.", "- Free lunch"]);
        assert_eq!(Segmenter::default().segment_html(&html), DESCRIPTION_NOT_AVAILABLE);
    }

    #[test]
    fn test_malformed_input_yields_not_available() {
        for html in ["", "<<<>>>", "<p", "</ul></li>", "\u{0}\u{1}"] {
            assert_eq!(Segmenter::default().segment_html(html), DESCRIPTION_NOT_AVAILABLE);
        }
    }

    #[test]
    fn test_segment_is_idempotent() {
        let document = Html::parse_document(
            "<div id='d'><p>Skills:</p><ul><li>Go</li><li>Rust</li></ul></div>",
        );
        let container = document.root_element();
        let segmenter = Segmenter::default();
        let first = segmenter.segment(container);
        let second = segmenter.segment(container);
        assert_eq!(first, "Go\nRust");
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_keywords_and_bullets() {
        let segmenter = Segmenter::new(&["what you bring"], &["+"]).unwrap();
        let html = paragraphs(&["What you bring", "+ Curiosity", "- Not a bullet here"]);
        assert_eq!(segmenter.segment_html(&html), "+ Curiosity");
    }

    #[test]
    fn test_empty_keyword_set_never_captures() {
        let segmenter = Segmenter::new::<&str, &str>(&[], &["-"]).unwrap();
        let html = paragraphs(&["Requirements:", "- SQL"]);
        assert_eq!(segmenter.segment_html(&html), DESCRIPTION_NOT_AVAILABLE);
    }

    #[test]
    fn test_keyword_requires_word_boundary() {
        let segmenter = Segmenter::default();
        assert!(segmenter.is_section_header("Required Experience:"));
        assert!(segmenter.is_section_header("Desired   skills"));
        assert!(!segmenter.is_section_header("Unskilled labor welcome"));
        assert!(!segmenter.is_section_header("- 5 years experience"));
    }
}
