use super::html::html_to_text;
use super::office::{open_archive, read_entry, Archive};
use super::xml::local_name;
use super::{ExtractError, Extracted, Extractor};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use tracing::debug;

/// Reading order and title from the package document
#[derive(Debug, Default, PartialEq)]
struct Package {
    title: Option<String>,
    /// Chapter paths relative to the archive root, in spine order
    chapters: Vec<String>,
}

/// EPUB books: chapter text in spine order
pub struct EpubExtractor;

impl Extractor for EpubExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let mut archive = open_archive(bytes, "epub")?;

        let package = match package_path(&mut archive)? {
            Some(opf_path) => {
                let opf = read_entry(&mut archive, &opf_path, "epub")?.ok_or_else(|| {
                    ExtractError::malformed("epub", format!("missing package {}", opf_path))
                })?;
                parse_package(&opf, &opf_path).map_err(|e| ExtractError::malformed("epub", e))?
            }
            None => {
                debug!("EPUB has no container.xml, reading HTML members in name order");
                let mut chapters: Vec<String> = archive
                    .file_names()
                    .filter(|name| is_html(name))
                    .map(str::to_string)
                    .collect();
                chapters.sort();
                Package {
                    title: None,
                    chapters,
                }
            }
        };

        let mut sections = Vec::new();
        for chapter in &package.chapters {
            match read_entry(&mut archive, chapter, "epub")? {
                Some(html) => {
                    let text = html_to_text(&html);
                    if !text.is_empty() {
                        sections.push(text);
                    }
                }
                None => debug!(chapter = %chapter, "Spine item missing from archive"),
            }
        }

        if sections.is_empty() {
            return Err(ExtractError::malformed("epub", "no readable chapters"));
        }

        let mut extracted =
            Extracted::new(sections.join("\n\n")).with("chapters", package.chapters.len());
        if let Some(title) = package.title {
            extracted = extracted.with("title", title);
        }
        Ok(extracted)
    }

    fn name(&self) -> &'static str {
        "epub"
    }
}

fn is_html(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    lowered.ends_with(".xhtml") || lowered.ends_with(".html") || lowered.ends_with(".htm")
}

/// Location of the package document named by META-INF/container.xml
fn package_path(archive: &mut Archive<'_>) -> Result<Option<String>, ExtractError> {
    let Some(container) = read_entry(archive, "META-INF/container.xml", "epub")? else {
        return Ok(None);
    };

    let mut reader = Reader::from_str(&container);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if local_name(&e) == "rootfile" => {
                return Ok(attribute(&e, "full-path"));
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => {}
            Err(e) => return Err(ExtractError::malformed("epub", e)),
        }
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name.as_bytes())
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

/// Read the manifest and spine of an OPF package document
fn parse_package(opf: &str, opf_path: &str) -> Result<Package, quick_xml::Error> {
    let base = match opf_path.rfind('/') {
        Some(pos) => &opf_path[..=pos],
        None => "",
    };

    let mut reader = Reader::from_str(opf);
    reader.config_mut().trim_text(true);

    let mut manifest: HashMap<String, String> = HashMap::new();
    let mut spine: Vec<String> = Vec::new();
    let mut title: Option<String> = None;
    let mut in_title = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match local_name(&e).as_str() {
                "item" => {
                    if let (Some(id), Some(href)) = (attribute(&e, "id"), attribute(&e, "href")) {
                        manifest.insert(id, href);
                    }
                }
                "itemref" => spine.extend(attribute(&e, "idref")),
                "title" if title.is_none() => in_title = true,
                _ => {}
            },
            Event::Text(e) if in_title => {
                title = Some(e.unescape()?.into_owned());
                in_title = false;
            }
            Event::End(_) => in_title = false,
            Event::Eof => break,
            _ => {}
        }
    }

    let chapters = spine
        .iter()
        .filter_map(|idref| manifest.get(idref))
        .map(|href| format!("{}{}", base, href.replace("%20", " ")))
        .collect();

    Ok(Package { title, chapters })
}

#[cfg(test)]
mod epub_tests {
    use super::*;

    #[test]
    fn test_package_spine_order() {
        let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <metadata><dc:title>The Book</dc:title></metadata>
  <manifest>
    <item id="c2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="c1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="c1"/><itemref idref="c2"/></spine>
</package>"#;
        let package = parse_package(opf, "OEBPS/content.opf").unwrap();
        assert_eq!(package.title.as_deref(), Some("The Book"));
        assert_eq!(
            package.chapters,
            vec!["OEBPS/text/ch1.xhtml", "OEBPS/text/ch2.xhtml"]
        );
    }

    #[test]
    fn test_not_an_archive() {
        let err = EpubExtractor.extract("book.epub", b"plain").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { format: "epub", .. }));
    }
}
