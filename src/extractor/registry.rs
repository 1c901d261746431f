use super::{
    ChatGptExtractor, CsvExtractor, DocxExtractor, EmailExtractor, EnexExtractor, EpubExtractor,
    ExtractError, Extracted, Extractor, FallbackExtractor, HtmlExtractor, MessagesJsonExtractor,
    MhtmlExtractor, NotebookExtractor, OdtExtractor, PdfExtractor, PptxExtractor,
    SpreadsheetExtractor, TextArrayExtractor, TextExtractor, XmlExtractor,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Metadata key naming the document a chunk came from
pub const SOURCE_KEY: &str = "source";

/// Dynamic dispatch table from file names to extractors
pub struct ExtractorRegistry {
    /// Used for unknown extensions and when a specific extractor fails
    fallback: Box<dyn Extractor>,
    /// Extension -> Extractor mapping
    map: HashMap<String, Box<dyn Extractor>>,
    /// File-name suffix rules, checked before extensions
    suffixes: Vec<(String, Box<dyn Extractor>)>,
}

impl ExtractorRegistry {
    /// Create an empty registry with FallbackExtractor as fallback
    pub fn new() -> Self {
        Self {
            fallback: Box::new(FallbackExtractor),
            map: HashMap::new(),
            suffixes: Vec::new(),
        }
    }

    /// Registry covering every supported upload format
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register("pdf", PdfExtractor);
        registry.register("docx", DocxExtractor);
        registry.register("doc", DocxExtractor);
        registry.register("pptx", PptxExtractor);
        registry.register("ppt", PptxExtractor);
        for ext in ["xlsx", "xls", "xlsm", "xlsb", "ods"] {
            registry.register(ext, SpreadsheetExtractor);
        }
        registry.register("csv", CsvExtractor);
        for ext in ["txt", "text", "md", "markdown", "srt"] {
            registry.register(ext, TextExtractor);
        }
        for ext in ["html", "htm", "xhtml"] {
            registry.register(ext, HtmlExtractor);
        }
        registry.register("json", MessagesJsonExtractor);
        registry.register("eml", EmailExtractor);
        registry.register("mht", MhtmlExtractor);
        registry.register("mhtml", MhtmlExtractor);
        registry.register("xml", XmlExtractor);
        registry.register("odt", OdtExtractor);
        registry.register("epub", EpubExtractor);
        registry.register("enex", EnexExtractor);
        registry.register("ipynb", NotebookExtractor);

        registry.register_suffix("text_array.json", TextArrayExtractor);
        registry.register_suffix("fake_conversations.json", ChatGptExtractor);

        registry
    }

    /// Register an extractor for a specific file extension
    ///
    /// # Arguments
    /// * `extension` - File extension without dot (e.g., "pdf", "docx")
    /// * `extractor` - Extractor implementation
    pub fn register(&mut self, extension: impl Into<String>, extractor: impl Extractor + 'static) {
        self.map
            .insert(extension.into().to_lowercase(), Box::new(extractor));
    }

    /// Register an extractor for file names ending in `suffix`.
    ///
    /// Suffix rules win over extension rules and are checked in registration
    /// order.
    pub fn register_suffix(&mut self, suffix: impl Into<String>, extractor: impl Extractor + 'static) {
        self.suffixes
            .push((suffix.into().to_lowercase(), Box::new(extractor)));
    }

    /// Select the extractor for a file name, falling back to
    /// FallbackExtractor if no rule matches
    pub fn select(&self, name: &str) -> &dyn Extractor {
        self.lookup(name).unwrap_or(&*self.fallback)
    }

    /// Extract text from an upload.
    ///
    /// When the selected extractor fails, the fallback gets a chance before
    /// the upload is reported as unsupported. The `source` metadata entry is
    /// always set to `name`.
    pub fn extract(&self, name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let mut extracted = match self.lookup(name) {
            Some(extractor) => {
                debug!(name, extractor = extractor.name(), "Extracting upload");
                match extractor.extract(name, bytes) {
                    Ok(extracted) => stamp(extracted, extractor.name()),
                    Err(err) => {
                        warn!(
                            name,
                            extractor = extractor.name(),
                            error = %err,
                            "Extractor failed, trying fallback"
                        );
                        self.run_fallback(name, bytes)
                            .map_err(|fallback_err| ExtractError::UnsupportedFormat {
                                name: name.to_string(),
                                reason: format!("{}; fallback: {}", err, fallback_err),
                            })?
                    }
                }
            }
            None => {
                debug!(name, "No extractor registered, using fallback");
                self.run_fallback(name, bytes)?
            }
        };

        extracted
            .metadata
            .insert(SOURCE_KEY.to_string(), name.to_string());
        Ok(extracted)
    }

    /// Get the number of registered extension rules (excluding fallback)
    pub fn extractor_count(&self) -> usize {
        self.map.len()
    }

    /// List all registered extensions, sorted
    pub fn registered_extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.map.keys().map(|s| s.as_str()).collect();
        extensions.sort_unstable();
        extensions
    }

    /// List registered file-name suffix rules in match order
    pub fn registered_suffixes(&self) -> Vec<&str> {
        self.suffixes.iter().map(|(s, _)| s.as_str()).collect()
    }

    fn lookup(&self, name: &str) -> Option<&dyn Extractor> {
        let lowered = name.to_lowercase();
        if let Some((_, extractor)) = self
            .suffixes
            .iter()
            .find(|(suffix, _)| lowered.ends_with(suffix.as_str()))
        {
            return Some(&**extractor);
        }

        let ext = Path::new(&lowered)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        self.map.get(ext).map(|e| &**e)
    }

    fn run_fallback(&self, name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let extracted = self.fallback.extract(name, bytes)?;
        Ok(stamp(extracted, self.fallback.name()))
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn stamp(mut extracted: Extracted, extractor: &'static str) -> Extracted {
    extracted.extractor = extractor;
    extracted
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[test]
    fn test_fallback_for_unknown_extension() {
        let registry = ExtractorRegistry::new();
        let extractor = registry.select("notes.xyz");
        assert_eq!(extractor.name(), "fallback");
    }

    #[test]
    fn test_extension_selection_is_case_insensitive() {
        let registry = ExtractorRegistry::with_defaults();
        assert_eq!(registry.select("REPORT.PDF").name(), "pdf");
        assert_eq!(registry.select("deck.pptx").name(), "pptx");
    }

    #[test]
    fn test_suffix_rules_win_over_extension() {
        let registry = ExtractorRegistry::with_defaults();
        assert_eq!(registry.select("my_text_array.json").name(), "text-array-json");
        assert_eq!(
            registry.select("fake_conversations.json").name(),
            "chatgpt-json"
        );
        assert_eq!(registry.select("chat.json").name(), "messages-json");
    }

    #[test]
    fn test_register_counts() {
        let mut registry = ExtractorRegistry::new();
        registry.register("Test", TextExtractor);

        assert_eq!(registry.extractor_count(), 1);
        assert_eq!(registry.registered_extensions(), vec!["test"]);
    }
}
