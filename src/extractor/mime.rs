use super::html::html_to_text;
use super::text::{normalize_newlines, tidy};
use super::{ExtractError, Extracted, Extractor};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Headers copied into the text of an email
const EMAIL_HEADERS: &[&str] = &["Subject", "From", "To", "Cc", "Date"];

/// One MIME entity: unfolded headers plus the raw body
#[derive(Debug, Clone)]
struct Part {
    headers: Vec<(String, String)>,
    body: String,
}

impl Part {
    fn parse(raw: &str) -> Self {
        let raw = normalize_newlines(raw);
        let (head, body) = match raw.find("\n\n") {
            Some(pos) => (&raw[..pos], &raw[pos + 2..]),
            None if looks_like_header(&raw) => (raw.as_str(), ""),
            None => ("", raw.as_str()),
        };

        let mut headers: Vec<(String, String)> = Vec::new();
        for line in head.lines() {
            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = headers.last_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        Self {
            headers,
            body: body.to_string(),
        }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Lowercased media type, defaulting to `text/plain`
    fn media_type(&self) -> String {
        self.header("Content-Type")
            .and_then(|value| value.split(';').next())
            .map(|media| media.trim().to_ascii_lowercase())
            .filter(|media| !media.is_empty())
            .unwrap_or_else(|| "text/plain".to_string())
    }

    fn content_type_param(&self, param: &str) -> Option<String> {
        let value = self.header("Content-Type")?;
        value.split(';').skip(1).find_map(|pair| {
            let (key, val) = pair.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case(param)
                .then(|| val.trim().trim_matches('"').to_string())
        })
    }

    fn is_attachment(&self) -> bool {
        self.header("Content-Disposition")
            .is_some_and(|d| d.trim().to_ascii_lowercase().starts_with("attachment"))
    }

    /// Body with its transfer encoding undone
    fn decoded_body(&self) -> String {
        let encoding = self
            .header("Content-Transfer-Encoding")
            .map(|e| e.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match encoding.as_str() {
            "base64" => {
                let compact: String = self.body.split_whitespace().collect();
                match STANDARD.decode(compact.as_bytes()) {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(_) => self.body.clone(),
                }
            }
            "quoted-printable" => {
                String::from_utf8_lossy(&decode_quoted_printable(&self.body)).into_owned()
            }
            _ => self.body.clone(),
        }
    }

    /// Leaf parts in document order, descending into multipart bodies
    fn leaves(&self) -> Vec<Part> {
        if !self.media_type().starts_with("multipart/") {
            return vec![self.clone()];
        }
        let Some(boundary) = self.content_type_param("boundary") else {
            return vec![self.clone()];
        };

        let delimiter = format!("--{}", boundary);
        let mut leaves = Vec::new();
        for segment in self.body.split(delimiter.as_str()).skip(1) {
            if segment.starts_with("--") {
                break;
            }
            let segment = segment.strip_prefix('\n').unwrap_or(segment);
            leaves.extend(Part::parse(segment).leaves());
        }
        leaves
    }

    /// First inline part of `media_type`, decoded
    fn find_text(&self, media_type: &str) -> Option<String> {
        self.leaves()
            .into_iter()
            .find(|part| !part.is_attachment() && part.media_type() == media_type)
            .map(|part| part.decoded_body())
    }
}

fn looks_like_header(raw: &str) -> bool {
    raw.lines()
        .next()
        .and_then(|line| line.split_once(':'))
        .is_some_and(|(name, _)| !name.is_empty() && !name.contains(' '))
}

fn decode_quoted_printable(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'=' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        // Soft line break
        if bytes.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }
        let hex = bytes.get(i + 1..i + 3).and_then(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
        });
        match hex {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(b'=');
                i += 1;
            }
        }
    }
    out
}

/// Decode RFC 2047 encoded words (`=?utf-8?B?...?=`) in a header value
fn decode_header(value: &str) -> String {
    let mut out = String::new();
    let mut rest = value;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let before = &rest[..start];
        match decode_word(&rest[start..]) {
            Some((decoded, consumed)) => {
                // Whitespace between adjacent encoded words is dropped
                if !(after_word && before.trim().is_empty()) {
                    out.push_str(before);
                }
                out.push_str(&decoded);
                rest = &rest[start + consumed..];
                after_word = true;
            }
            None => {
                out.push_str(&rest[..start + 2]);
                rest = &rest[start + 2..];
                after_word = false;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode one encoded word at the start of `word`, returning the text and the
/// number of bytes consumed
fn decode_word(word: &str) -> Option<(String, usize)> {
    let inner = word.strip_prefix("=?")?;
    let mut fields = inner.splitn(3, '?');
    let _charset = fields.next()?;
    let encoding = fields.next()?;
    let remainder = fields.next()?;
    let end = remainder.find("?=")?;
    let payload = &remainder[..end];

    let bytes = match encoding.to_ascii_uppercase().as_str() {
        "B" => STANDARD.decode(payload).ok()?,
        "Q" => decode_quoted_printable(&payload.replace('_', " ")),
        _ => return None,
    };

    let consumed = word.len() - remainder.len() + end + 2;
    Some((String::from_utf8_lossy(&bytes).into_owned(), consumed))
}

fn message_text(bytes: &[u8]) -> Part {
    Part::parse(&String::from_utf8_lossy(bytes))
}

/// RFC 822 email messages: key headers followed by the body text
pub struct EmailExtractor;

impl Extractor for EmailExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let message = message_text(bytes);
        if message.headers.is_empty() {
            return Err(ExtractError::malformed("eml", "no message headers found"));
        }

        let body = match message.find_text("text/plain") {
            Some(text) => normalize_newlines(&text),
            None => message
                .find_text("text/html")
                .map(|html| html_to_text(&html))
                .unwrap_or_default(),
        };

        let mut extracted = Extracted::new("");
        let mut lines = Vec::new();
        for name in EMAIL_HEADERS {
            if let Some(value) = message.header(name) {
                let value = decode_header(value);
                lines.push(format!("{}: {}", name, value));
                extracted = extracted.with(&name.to_ascii_lowercase(), value);
            }
        }

        extracted.text = format!("{}\n\n{}", lines.join("\n"), body.trim())
            .trim()
            .to_string();
        Ok(extracted)
    }

    fn name(&self) -> &'static str {
        "eml"
    }
}

/// MHTML web archives: the text of the main HTML document
pub struct MhtmlExtractor;

impl Extractor for MhtmlExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let archive = message_text(bytes);

        let text = match archive.find_text("text/html") {
            Some(html) => html_to_text(&html),
            None => archive
                .find_text("text/plain")
                .map(|text| tidy(&text))
                .ok_or_else(|| ExtractError::malformed("mhtml", "no HTML document found"))?,
        };

        let mut extracted = Extracted::new(text);
        if let Some(url) = archive.header("Snapshot-Content-Location") {
            extracted = extracted.with("url", url);
        }
        if let Some(subject) = archive.header("Subject") {
            extracted = extracted.with("title", decode_header(subject));
        }
        Ok(extracted)
    }

    fn name(&self) -> &'static str {
        "mhtml"
    }
}

#[cfg(test)]
mod mime_tests {
    use super::*;

    #[test]
    fn test_quoted_printable() {
        let decoded = decode_quoted_printable("caf=C3=A9 =\nau lait =3D good");
        assert_eq!(String::from_utf8(decoded).unwrap(), "café au lait = good");
    }

    #[test]
    fn test_encoded_word_header() {
        assert_eq!(decode_header("=?UTF-8?B?SGVsbG8=?= world"), "Hello world");
        assert_eq!(decode_header("=?utf-8?Q?caf=C3=A9_time?="), "café time");
        assert_eq!(decode_header("plain subject"), "plain subject");
    }

    #[test]
    fn test_plain_email() {
        let eml = b"From: a@example.com\r\nTo: b@example.com\r\nSubject: Lunch\r\n \
                    plans\r\n\r\nSee you at noon.\r\n";
        let extracted = EmailExtractor.extract("mail.eml", eml).unwrap();
        assert_eq!(
            extracted.text,
            "Subject: Lunch plans\nFrom: a@example.com\nTo: b@example.com\n\nSee you at noon."
        );
        assert_eq!(extracted.metadata.get("subject").map(String::as_str), Some("Lunch plans"));
    }

    #[test]
    fn test_multipart_prefers_plain_text() {
        let eml = "Subject: Hi\n\
                   Content-Type: multipart/alternative; boundary=\"XYZ\"\n\
                   \n\
                   preamble\n\
                   --XYZ\n\
                   Content-Type: text/html\n\
                   \n\
                   <p>html body</p>\n\
                   --XYZ\n\
                   Content-Type: text/plain; charset=utf-8\n\
                   Content-Transfer-Encoding: base64\n\
                   \n\
                   cGxhaW4gYm9keQ==\n\
                   --XYZ--\n";
        let extracted = EmailExtractor.extract("mail.eml", eml.as_bytes()).unwrap();
        assert_eq!(extracted.text, "Subject: Hi\n\nplain body");
    }

    #[test]
    fn test_mhtml_uses_html_part() {
        let mht = "From: <Saved by Blink>\n\
                   Snapshot-Content-Location: https://example.com/\n\
                   Subject: Example\n\
                   Content-Type: multipart/related; type=\"text/html\"; boundary=\"B\"\n\
                   \n\
                   --B\n\
                   Content-Type: text/html\n\
                   Content-Transfer-Encoding: quoted-printable\n\
                   \n\
                   <html><body><h1>Head=\nline</h1><p>Body</p></body></html>\n\
                   --B\n\
                   Content-Type: image/png\n\
                   \n\
                   xxxx\n\
                   --B--\n";
        let extracted = MhtmlExtractor.extract("page.mht", mht.as_bytes()).unwrap();
        assert_eq!(extracted.text, "Headline\n\nBody");
        assert_eq!(
            extracted.metadata.get("url").map(String::as_str),
            Some("https://example.com/")
        );
    }

    #[test]
    fn test_email_without_headers_rejected() {
        assert!(EmailExtractor.extract("x.eml", b"just some words").is_err());
    }
}
