//! Plain-text document codec
//!
//! The default `DocumentCodec`. Real PDF extraction binds a different
//! implementation behind the same trait; this one accepts UTF-8 payloads
//! and renders generated documents as markdown bytes.

use crate::{DocumentCodec, StoreError, StoreResult};

pub struct PlainTextCodec;

impl DocumentCodec for PlainTextCodec {
    fn extract_text(&self, bytes: &[u8]) -> StoreResult<String> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| StoreError::Backend(format!("document is not valid UTF-8: {}", e)))?;
        if text.trim().is_empty() {
            return Err(StoreError::Backend("document contains no text".into()));
        }
        Ok(text.to_string())
    }

    fn render(&self, title: &str, content: &str) -> Vec<u8> {
        format!("# {}\n\n{}\n", title, content).into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_utf8_text() {
        let codec = PlainTextCodec;
        let text = codec.extract_text(b"Section 1. Liability.").unwrap();
        assert_eq!(text, "Section 1. Liability.");
    }

    #[test]
    fn rejects_binary_and_empty() {
        let codec = PlainTextCodec;
        assert!(codec.extract_text(&[0xff, 0xfe, 0x00]).is_err());
        assert!(codec.extract_text(b"   ").is_err());
    }

    #[test]
    fn render_includes_title() {
        let codec = PlainTextCodec;
        let bytes = codec.render("Legal Memo", "Body text");
        let s = String::from_utf8(bytes).unwrap();
        assert!(s.starts_with("# Legal Memo"));
        assert!(s.contains("Body text"));
    }
}
