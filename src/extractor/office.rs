use super::text::tidy;
use super::xml::{markup_text, MarkupRules};
use super::{ExtractError, Extracted, Extractor};
use std::io::{Cursor, Read};
use zip::ZipArchive;

const WORD_RULES: MarkupRules<'static> = MarkupRules {
    text_tags: &["t"],
    line_tags: &["p"],
    tab_tags: &["tab"],
    break_tags: &["br", "cr"],
    space_tags: &[],
};

const SLIDE_RULES: MarkupRules<'static> = MarkupRules {
    text_tags: &["t"],
    line_tags: &["p"],
    tab_tags: &[],
    break_tags: &["br"],
    space_tags: &[],
};

const ODF_RULES: MarkupRules<'static> = MarkupRules {
    text_tags: &[],
    line_tags: &["p", "h"],
    tab_tags: &["tab"],
    break_tags: &["line-break"],
    space_tags: &["s"],
};

pub(crate) type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

pub(crate) fn open_archive<'a>(
    bytes: &'a [u8],
    format: &'static str,
) -> Result<Archive<'a>, ExtractError> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::malformed(format, format!("not a valid archive: {}", e)))
}

/// Read one archive member as UTF-8, `None` when it does not exist
pub(crate) fn read_entry(
    archive: &mut Archive<'_>,
    path: &str,
    format: &'static str,
) -> Result<Option<String>, ExtractError> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ExtractError::malformed(format, e)),
    };
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ExtractError::malformed(format, format!("{}: {}", path, e)))?;
    Ok(Some(contents))
}

/// Word documents (Office Open XML)
pub struct DocxExtractor;

impl Extractor for DocxExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let mut archive = open_archive(bytes, "docx")?;
        let body = read_entry(&mut archive, "word/document.xml", "docx")?
            .ok_or_else(|| ExtractError::malformed("docx", "missing word/document.xml"))?;

        let text = markup_text(&body, &WORD_RULES).map_err(|e| ExtractError::malformed("docx", e))?;
        Ok(Extracted::new(tidy(&text)))
    }

    fn name(&self) -> &'static str {
        "docx"
    }
}

/// PowerPoint decks (Office Open XML), one section per slide
pub struct PptxExtractor;

impl Extractor for PptxExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let mut archive = open_archive(bytes, "pptx")?;

        let mut slides: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|path| {
                let number = path
                    .strip_prefix("ppt/slides/slide")?
                    .strip_suffix(".xml")?
                    .parse()
                    .ok()?;
                Some((number, path.to_string()))
            })
            .collect();
        slides.sort_unstable();

        if slides.is_empty() {
            return Err(ExtractError::malformed("pptx", "no slides found"));
        }

        let mut sections = Vec::with_capacity(slides.len());
        for (number, path) in &slides {
            let Some(xml) = read_entry(&mut archive, path, "pptx")? else {
                continue;
            };
            let text = markup_text(&xml, &SLIDE_RULES)
                .map_err(|e| ExtractError::malformed("pptx", format!("{}: {}", path, e)))?;
            let text = tidy(&text);
            if !text.is_empty() {
                sections.push(format!("Slide {}:\n{}", number, text));
            }
        }

        Ok(Extracted::new(sections.join("\n\n")).with("slides", slides.len()))
    }

    fn name(&self) -> &'static str {
        "pptx"
    }
}

/// OpenDocument text files
pub struct OdtExtractor;

impl Extractor for OdtExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let mut archive = open_archive(bytes, "odt")?;
        let content = read_entry(&mut archive, "content.xml", "odt")?
            .ok_or_else(|| ExtractError::malformed("odt", "missing content.xml"))?;

        let text = markup_text(&content, &ODF_RULES).map_err(|e| ExtractError::malformed("odt", e))?;
        Ok(Extracted::new(tidy(&text)))
    }

    fn name(&self) -> &'static str {
        "odt"
    }
}
