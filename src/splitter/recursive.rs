use super::chunk::{Chunk, Document};
use super::config::{ConfigError, SplitConfig};
use super::START_INDEX_KEY;
use std::collections::VecDeque;

/// Byte range of the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

/// A fragment sitting in the merge window
#[derive(Debug, Clone, Copy)]
struct Piece {
    span: Span,
    /// Measured length of the fragment itself
    len: usize,
    /// Measured length of the text between this fragment and the previous one
    gap: usize,
}

/// Splits text by trying separators from coarsest to finest.
///
/// Fragments produced by the current separator are merged greedily up to
/// `chunk_size`; a fragment that is still too long is split again with the
/// remaining, finer separators. Every chunk is a contiguous slice of the
/// input, so chunk offsets always point back into the source.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    config: SplitConfig,
}

impl RecursiveSplitter {
    /// Create a splitter, validating the configuration up front
    pub fn new(config: SplitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Split a string into chunks with empty metadata
    pub fn split_text(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return vec![];
        }

        let mut spans = Vec::new();
        let whole = Span {
            start: 0,
            end: text.len(),
        };
        self.split_span(text, whole, self.config.separators(), &mut spans);

        spans
            .into_iter()
            .map(|span| Chunk::new(&text[span.start..span.end], span.start))
            .collect()
    }

    /// Split each document, copying its metadata onto every chunk
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut result = Vec::new();
        for document in documents {
            for mut chunk in self.split_text(&document.text) {
                chunk.metadata = document.metadata.clone();
                if self.config.add_start_index() {
                    chunk
                        .metadata
                        .insert(START_INDEX_KEY.to_string(), chunk.start_offset.to_string());
                }
                result.push(chunk);
            }
        }
        result
    }

    /// Recursive step: split `span` with the first separator that applies and
    /// push finished chunk spans onto `out`
    fn split_span(&self, text: &str, span: Span, separators: &[String], out: &mut Vec<Span>) {
        let (separator, finer) = select_separator(&text[span.start..span.end], separators);
        let fragments = fragment(text, span, separator, self.config.keep_separator());

        let mut pending: Vec<Span> = Vec::new();
        for frag in fragments {
            if self.config.measure(&text[frag.start..frag.end]) <= self.config.chunk_size() {
                pending.push(frag);
                continue;
            }

            if !pending.is_empty() {
                self.merge(text, &pending, out);
                pending.clear();
            }

            if finer.is_empty() {
                // Nothing left to split on; emit the oversized unit whole
                out.push(frag);
            } else {
                self.split_span(text, frag, finer, out);
            }
        }

        if !pending.is_empty() {
            self.merge(text, &pending, out);
        }
    }

    /// Greedily merge fragments into chunks no longer than `chunk_size`,
    /// carrying at most `chunk_overlap` of each chunk's tail into the next
    fn merge(&self, text: &str, fragments: &[Span], out: &mut Vec<Span>) {
        let size = self.config.chunk_size();
        let overlap = self.config.chunk_overlap();

        let mut window: VecDeque<Piece> = VecDeque::new();
        let mut total = 0usize;

        for &frag in fragments {
            let len = self.config.measure(&text[frag.start..frag.end]);
            let gap = match window.back() {
                Some(last) => self.measure_gap(text, last.span.end, frag.start),
                None => 0,
            };
            let mut extended = self.window_len(text, &window, frag.end, total + gap + len);

            if extended > size {
                if let Some(span) = window_span(&window) {
                    out.push(span);

                    loop {
                        let end = window.back().map_or(frag.start, |p| p.span.end);
                        let current = self.window_len(text, &window, end, total);
                        if !(current > overlap || (current > 0 && extended > size)) {
                            break;
                        }
                        let Some(front) = window.pop_front() else {
                            break;
                        };
                        total = total.saturating_sub(front.len);
                        if let Some(next) = window.front_mut() {
                            total = total.saturating_sub(next.gap);
                            next.gap = 0;
                        }
                        extended = self.window_len(text, &window, frag.end, total + gap + len);
                    }
                }
            }

            let gap = if window.is_empty() { 0 } else { gap };
            total += gap + len;
            window.push_back(Piece {
                span: frag,
                len,
                gap,
            });
        }

        if let Some(span) = window_span(&window) {
            out.push(span);
        }
    }

    /// Length of the window text running up to `end`. Additive measures use
    /// the running `sum`; anything else is measured over the joined slice.
    fn window_len(&self, text: &str, window: &VecDeque<Piece>, end: usize, sum: usize) -> usize {
        match window.front() {
            Some(first) if !self.config.additive_length() => {
                self.config.measure(&text[first.span.start..end])
            }
            _ => sum,
        }
    }

    fn measure_gap(&self, text: &str, from: usize, to: usize) -> usize {
        if from >= to {
            0
        } else {
            self.config.measure(&text[from..to])
        }
    }
}

/// Pick the first separator present in `text`, returning it together with the
/// finer separators left for recursion. The empty separator always applies and
/// ends the list; if nothing matches, the last separator is used with nothing
/// finer remaining.
fn select_separator<'a>(text: &str, separators: &'a [String]) -> (&'a str, &'a [String]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return (separator.as_str(), &[]);
        }
        if text.contains(separator.as_str()) {
            return (separator.as_str(), &separators[i + 1..]);
        }
    }
    (separators.last().map(String::as_str).unwrap_or(""), &[])
}

/// Partition `span` on `separator`. Kept separators lead the fragment that
/// follows them; dropped separators leave a gap between fragments. Empty
/// fragments are discarded.
fn fragment(text: &str, span: Span, separator: &str, keep_separator: bool) -> Vec<Span> {
    let slice = &text[span.start..span.end];

    if separator.is_empty() {
        return slice
            .char_indices()
            .map(|(i, c)| Span {
                start: span.start + i,
                end: span.start + i + c.len_utf8(),
            })
            .collect();
    }

    let mut fragments = Vec::new();
    let mut cursor = 0;
    for (pos, _) in slice.match_indices(separator) {
        fragments.push(Span {
            start: span.start + cursor,
            end: span.start + pos,
        });
        cursor = if keep_separator {
            pos
        } else {
            pos + separator.len()
        };
    }
    fragments.push(Span {
        start: span.start + cursor,
        end: span.end,
    });

    fragments.retain(|f| f.start < f.end);
    fragments
}

fn window_span(window: &VecDeque<Piece>) -> Option<Span> {
    match (window.front(), window.back()) {
        (Some(first), Some(last)) => Some(Span {
            start: first.span.start,
            end: last.span.end,
        }),
        _ => None,
    }
}
