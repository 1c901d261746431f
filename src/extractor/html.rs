use super::text::{decode_text, tidy};
use super::{ExtractError, Extracted, Extractor};
use scraper::{ElementRef, Html, Selector};

/// Elements whose text never reaches the output
const SKIPPED: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe"];

/// Elements set off from their neighbours by a blank line
const PARAGRAPHS: &[&str] = &[
    "article", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "ol", "p", "pre", "section",
    "table", "ul",
];

/// Elements that start and end a line of their own
const LINES: &[&str] = &[
    "address", "aside", "br", "dd", "div", "dl", "dt", "figcaption", "figure", "footer", "form",
    "header", "li", "main", "nav", "title", "tr",
];

/// HTML pages, reduced to their visible text
pub struct HtmlExtractor;

impl Extractor for HtmlExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let html =
            decode_text(bytes).unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned());
        let document = Html::parse_document(&html);

        let mut extracted = Extracted::new(document_text(&document));
        if let Some(title) = page_title(&document) {
            extracted = extracted.with("title", title);
        }
        Ok(extracted)
    }

    fn name(&self) -> &'static str {
        "html"
    }
}

/// Visible text of an HTML string, one block element per line
pub(crate) fn html_to_text(html: &str) -> String {
    document_text(&Html::parse_document(html))
}

fn document_text(document: &Html) -> String {
    let mut raw = String::new();
    walk(document.root_element(), &mut raw);
    tidy(&raw)
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            push_collapsed(out, text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };

        let name = child.value().name();
        if SKIPPED.contains(&name) {
            continue;
        }

        let breaks = if PARAGRAPHS.contains(&name) {
            2
        } else if LINES.contains(&name) {
            1
        } else {
            0
        };
        break_lines(out, breaks);
        walk(child, out);
        break_lines(out, breaks);
        if name == "td" || name == "th" {
            push_collapsed(out, " ");
        }
    }
}

/// Append text with whitespace runs collapsed to one space, as a browser
/// renders it
fn push_collapsed(out: &mut String, text: &str) {
    let mut last_space = out.is_empty() || out.ends_with([' ', '\n']);
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(c);
            last_space = false;
        }
    }
}

/// Make `out` end in at least `count` newlines
fn break_lines(out: &mut String, count: usize) {
    if count == 0 {
        return;
    }
    out.truncate(out.trim_end_matches(' ').len());
    if out.is_empty() {
        return;
    }
    let have = out.len() - out.trim_end_matches('\n').len();
    for _ in have..count {
        out.push('\n');
    }
}

fn page_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

#[cfg(test)]
mod html_tests {
    use super::*;

    #[test]
    fn test_blocks_become_lines() {
        let html = "<html><body><h1>Title</h1><p>First <b>bold</b> para.</p><p>Second</p></body></html>";
        assert_eq!(html_to_text(html), "Title\n\nFirst bold para.\n\nSecond");
    }

    #[test]
    fn test_list_items_stay_on_adjacent_lines() {
        let html = "<ul>\n  <li>one</li>\n  <li>two</li>\n</ul>";
        assert_eq!(html_to_text(html), "one\ntwo");
    }

    #[test]
    fn test_scripts_and_styles_skipped() {
        let html = "<html><head><style>p{}</style><script>var x = 1;</script></head><body><p>Shown</p></body></html>";
        assert_eq!(html_to_text(html), "Shown");
    }

    #[test]
    fn test_title_metadata() {
        let html = b"<html><head><title> My  Page </title></head><body>Hi</body></html>";
        let extracted = HtmlExtractor.extract("page.html", html).unwrap();
        assert_eq!(extracted.metadata.get("title").map(String::as_str), Some("My Page"));
        assert_eq!(extracted.text, "My Page\nHi");
    }
}
