use super::html::html_to_text;
use super::xml::local_name;
use super::{ExtractError, Extracted, Extractor};
use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Default)]
struct Note {
    title: String,
    content: String,
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    None,
    Title,
    Content,
}

/// Evernote exports: each note's title followed by its ENML body as text
pub struct EnexExtractor;

impl Extractor for EnexExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let xml = String::from_utf8_lossy(bytes);
        let notes = read_notes(&xml).map_err(|e| ExtractError::malformed("enex", e))?;
        if notes.is_empty() {
            return Err(ExtractError::malformed("enex", "no notes found"));
        }

        let sections: Vec<String> = notes
            .iter()
            .map(|note| {
                let body = html_to_text(&note.content);
                match (note.title.trim(), body.is_empty()) {
                    ("", _) => body,
                    (title, true) => title.to_string(),
                    (title, false) => format!("{}\n\n{}", title, body),
                }
            })
            .filter(|section| !section.is_empty())
            .collect();

        Ok(Extracted::new(sections.join("\n\n")).with("notes", notes.len()))
    }

    fn name(&self) -> &'static str {
        "enex"
    }
}

fn read_notes(xml: &str) -> Result<Vec<Note>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut notes = Vec::new();
    let mut current: Option<Note> = None;
    let mut field = Field::None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(&e).as_str() {
                "note" => current = Some(Note::default()),
                "title" if current.is_some() => field = Field::Title,
                "content" if current.is_some() => field = Field::Content,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"note" => notes.extend(current.take()),
                b"title" | b"content" => field = Field::None,
                _ => {}
            },
            Event::Text(e) if field != Field::None => {
                let text = e.unescape()?;
                push_field(&mut current, field, &text);
            }
            Event::CData(e) if field != Field::None => {
                push_field(&mut current, field, &String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(notes)
}

fn push_field(note: &mut Option<Note>, field: Field, text: &str) {
    if let Some(note) = note {
        match field {
            Field::Title => note.title.push_str(text),
            Field::Content => note.content.push_str(text),
            Field::None => {}
        }
    }
}

#[cfg(test)]
mod evernote_tests {
    use super::*;

    #[test]
    fn test_notes_with_cdata_content() {
        let enex = br#"<?xml version="1.0" encoding="UTF-8"?>
<en-export>
  <note>
    <title>Groceries</title>
    <content><![CDATA[<?xml version="1.0"?><en-note><div>Milk</div><div>Eggs &amp; bread</div></en-note>]]></content>
  </note>
  <note>
    <title>Empty</title>
    <content></content>
  </note>
</en-export>"#;
        let extracted = EnexExtractor.extract("notes.enex", enex).unwrap();
        assert_eq!(extracted.text, "Groceries\n\nMilk\nEggs & bread\n\nEmpty");
        assert_eq!(extracted.metadata.get("notes").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_no_notes() {
        assert!(EnexExtractor.extract("x.enex", b"<en-export/>").is_err());
    }
}
