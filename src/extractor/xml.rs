use super::text::tidy;
use super::{ExtractError, Extracted, Extractor};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// How text is pulled out of a markup dialect (WordprocessingML, DrawingML,
/// OpenDocument). Tag names are local names, without namespace prefix.
pub(crate) struct MarkupRules<'a> {
    /// Only text inside these elements is kept; empty keeps all text
    pub text_tags: &'a [&'a str],
    /// Elements that end a line when they close
    pub line_tags: &'a [&'a str],
    /// Empty elements standing for a tab
    pub tab_tags: &'a [&'a str],
    /// Empty elements standing for a line break
    pub break_tags: &'a [&'a str],
    /// Empty elements standing for a space
    pub space_tags: &'a [&'a str],
}

pub(crate) fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

/// Walk `xml` and collect its text according to `rules`
pub(crate) fn markup_text(xml: &str, rules: &MarkupRules<'_>) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut out = String::new();
    let mut text_depth = 0usize;
    let keep_all = rules.text_tags.is_empty();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if rules.text_tags.contains(&local_name(&e).as_str()) {
                    text_depth += 1;
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if rules.text_tags.contains(&name.as_str()) {
                    text_depth = text_depth.saturating_sub(1);
                }
                if rules.line_tags.contains(&name.as_str()) {
                    out.push('\n');
                }
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                let name = name.as_str();
                if rules.tab_tags.contains(&name) {
                    out.push('\t');
                } else if rules.break_tags.contains(&name) || rules.line_tags.contains(&name) {
                    out.push('\n');
                } else if rules.space_tags.contains(&name) {
                    out.push(' ');
                }
            }
            Event::Text(e) if keep_all || text_depth > 0 => {
                out.push_str(&e.unescape()?);
            }
            Event::CData(e) if keep_all || text_depth > 0 => {
                out.push_str(&String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}

/// Generic XML: every non-blank text node on its own line
pub struct XmlExtractor;

impl Extractor for XmlExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let xml = String::from_utf8_lossy(bytes);
        let mut reader = Reader::from_str(&xml);
        reader.config_mut().trim_text(true);

        let mut lines = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|e| ExtractError::malformed("xml", e))?;
                    lines.push(text.into_owned());
                }
                Ok(Event::CData(e)) => lines.push(String::from_utf8_lossy(&e).into_owned()),
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(ExtractError::malformed(
                        "xml",
                        format!("error at position {}: {}", reader.buffer_position(), e),
                    ))
                }
            }
        }

        Ok(Extracted::new(tidy(&lines.join("\n"))))
    }

    fn name(&self) -> &'static str {
        "xml"
    }
}
