use super::{ExtractError, Extracted, Extractor};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct Notebook {
    #[serde(default)]
    cells: Vec<Cell>,
    #[serde(default)]
    metadata: Value,
}

#[derive(Deserialize)]
struct Cell {
    cell_type: String,
    #[serde(default)]
    source: Source,
}

/// Cell source is either one string or a list of lines
#[derive(Deserialize, Default)]
#[serde(untagged)]
enum Source {
    Text(String),
    Lines(Vec<String>),
    #[default]
    Missing,
}

impl Source {
    fn text(&self) -> String {
        match self {
            Source::Text(text) => text.clone(),
            Source::Lines(lines) => lines.concat(),
            Source::Missing => String::new(),
        }
    }
}

/// Jupyter notebooks: markdown cells as-is, code cells fenced
pub struct NotebookExtractor;

impl Extractor for NotebookExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let notebook: Notebook =
            serde_json::from_slice(bytes).map_err(|e| ExtractError::malformed("ipynb", e))?;

        let language = notebook
            .metadata
            .pointer("/kernelspec/language")
            .or_else(|| notebook.metadata.pointer("/language_info/name"))
            .and_then(Value::as_str)
            .unwrap_or("python")
            .to_string();

        let blocks: Vec<String> = notebook
            .cells
            .iter()
            .filter_map(|cell| {
                let source = cell.source.text();
                let source = source.trim_end();
                if source.trim().is_empty() {
                    return None;
                }
                Some(match cell.cell_type.as_str() {
                    "code" => format!("```{}\n{}\n```", language, source),
                    _ => source.to_string(),
                })
            })
            .collect();

        Ok(Extracted::new(blocks.join("\n\n"))
            .with("cells", notebook.cells.len())
            .with("language", language))
    }

    fn name(&self) -> &'static str {
        "ipynb"
    }
}
