//! XML Reader Module
//!
//! Turns document bytes into a stream of [`XmlHandler`] events. Any other
//! scanner can drive the tree builder through the same trait.

pub mod entities;
pub mod scanner;

use std::borrow::Cow;

use crate::error::ParseError;
use scanner::Scanner;

/// Receiver of tokenizer events
///
/// Names and text arrive decoded (entity references resolved); CDATA
/// arrives as raw bytes.
pub trait XmlHandler {
    /// Called when an element starts. A self-closing tag produces a start
    /// event immediately followed by an end event.
    fn start_element(&mut self, name: &str, attributes: &[(&str, &str)]);

    /// Called for character data between tags
    fn characters(&mut self, text: &str);

    /// Called for the content of a CDATA section
    fn cdata(&mut self, data: &[u8]);

    /// Called when an element ends
    fn end_element(&mut self, name: &str);

    /// Called for the XML declaration (optional, default does nothing)
    fn xml_declaration(&mut self, _encoding: Option<&str>) {}

    /// Called once after the last event
    fn end_document(&mut self) {}
}

/// Scan a UTF-8 document, calling handler methods for each token
pub fn scan<H: XmlHandler>(input: &[u8], handler: &mut H) -> Result<(), ParseError> {
    let input = input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input);
    let text = std::str::from_utf8(input).map_err(|e| ParseError::InvalidUtf8 {
        offset: e.valid_up_to(),
    })?;
    Reader::new(text).run(handler)?;
    handler.end_document();
    Ok(())
}

struct Reader<'a> {
    input: &'a str,
    scanner: Scanner<'a>,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Reader {
            input,
            scanner: Scanner::new(input.as_bytes()),
        }
    }

    /// Slice of the input; all cut points sit next to ASCII delimiters
    fn text(&self, start: usize, end: usize) -> &'a str {
        self.input.get(start..end).unwrap_or_default()
    }

    fn run<H: XmlHandler>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        while !self.scanner.is_eof() {
            if self.scanner.peek() == Some(b'<') {
                self.scan_markup(handler)?;
            } else {
                self.scan_text(handler);
            }
        }
        Ok(())
    }

    fn scan_text<H: XmlHandler>(&mut self, handler: &mut H) {
        let start = self.scanner.position();
        let end = self.scanner.find_byte(b'<').unwrap_or(self.input.len());
        handler.characters(&entities::decode(self.text(start, end)));
        self.scanner.set_position(end);
    }

    /// Scan markup starting with '<'
    fn scan_markup<H: XmlHandler>(&mut self, handler: &mut H) -> Result<(), ParseError> {
        let start = self.scanner.position();

        if self.scanner.starts_with(b"<?") {
            let content = self.delimited(start, 2, b"?>", "processing instruction")?;
            if let Some(declaration) = content.strip_prefix("xml") {
                if declaration.is_empty() || declaration.starts_with(char::is_whitespace) {
                    handler.xml_declaration(pseudo_attribute(declaration, "encoding"));
                }
            }
        } else if self.scanner.starts_with(b"<!--") {
            self.delimited(start, 4, b"-->", "comment")?;
        } else if self.scanner.starts_with(b"<![CDATA[") {
            let content = self.delimited(start, 9, b"]]>", "CDATA section")?;
            handler.cdata(content.as_bytes());
        } else if self.scanner.starts_with(b"<!") {
            self.skip_doctype(start)?;
        } else if self.scanner.starts_with(b"</") {
            self.scanner.advance(2);
            self.scan_end_tag(start, handler)?;
        } else {
            self.scanner.advance(1);
            self.scan_start_tag(start, handler)?;
        }
        Ok(())
    }

    /// Skip an opening of `open` bytes, return the content up to `close`
    /// and move past it
    fn delimited(
        &mut self,
        start: usize,
        open: usize,
        close: &[u8],
        construct: &'static str,
    ) -> Result<&'a str, ParseError> {
        self.scanner.advance(open);
        let end = self
            .scanner
            .find(close)
            .ok_or(ParseError::Unterminated { construct, offset: start })?;
        let content = self.text(start + open, end);
        self.scanner.set_position(end + close.len());
        Ok(content)
    }

    /// Skip `<!DOCTYPE ...>`, including a bracketed internal subset
    fn skip_doctype(&mut self, start: usize) -> Result<(), ParseError> {
        let mut depth = 0usize;
        let mut quote = None;
        self.scanner.advance(2);
        while let Some(b) = self.scanner.peek() {
            self.scanner.advance(1);
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(ParseError::Unterminated {
            construct: "DOCTYPE",
            offset: start,
        })
    }

    fn scan_end_tag<H: XmlHandler>(&mut self, start: usize, handler: &mut H) -> Result<(), ParseError> {
        let name_start = self.scanner.position();
        self.scanner
            .read_name()
            .ok_or(ParseError::MalformedTag { offset: start })?;
        let name = self.text(name_start, self.scanner.position());
        self.scanner.skip_whitespace();
        match self.scanner.peek() {
            Some(b'>') => self.scanner.advance(1),
            Some(_) => return Err(ParseError::MalformedTag { offset: start }),
            None => {
                return Err(ParseError::Unterminated {
                    construct: "end tag",
                    offset: start,
                })
            }
        }
        handler.end_element(name);
        Ok(())
    }

    fn scan_start_tag<H: XmlHandler>(&mut self, start: usize, handler: &mut H) -> Result<(), ParseError> {
        let name_start = self.scanner.position();
        self.scanner
            .read_name()
            .ok_or(ParseError::MalformedTag { offset: start })?;
        let name = self.text(name_start, self.scanner.position());

        let mut attributes: Vec<(&str, Cow<'_, str>)> = Vec::new();
        let self_closing = loop {
            let before = self.scanner.position();
            self.scanner.skip_whitespace();
            if self.scanner.starts_with(b"/>") {
                self.scanner.advance(2);
                break true;
            }
            match self.scanner.peek() {
                Some(b'>') => {
                    self.scanner.advance(1);
                    break false;
                }
                None => {
                    return Err(ParseError::Unterminated {
                        construct: "start tag",
                        offset: start,
                    })
                }
                // Attributes must be separated from the name and each other
                Some(_) if before == self.scanner.position() => {
                    return Err(ParseError::MalformedTag { offset: start })
                }
                Some(_) => attributes.push(self.scan_attribute(start)?),
            }
        };

        let borrowed: Vec<(&str, &str)> = attributes
            .iter()
            .map(|(key, value)| (*key, value.as_ref()))
            .collect();
        handler.start_element(name, &borrowed);
        if self_closing {
            handler.end_element(name);
        }
        Ok(())
    }

    /// Scan `key="value"` or `key='value'`
    fn scan_attribute(&mut self, start: usize) -> Result<(&'a str, Cow<'a, str>), ParseError> {
        let malformed = ParseError::MalformedTag { offset: start };
        let key_start = self.scanner.position();
        self.scanner.read_name().ok_or_else(|| malformed.clone())?;
        let key = self.text(key_start, self.scanner.position());

        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'=') {
            return Err(malformed);
        }
        self.scanner.advance(1);
        self.scanner.skip_whitespace();

        let quote = match self.scanner.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(malformed),
        };
        self.scanner.advance(1);
        let value_start = self.scanner.position();
        let value_end = self.scanner.find_byte(quote).ok_or(ParseError::Unterminated {
            construct: "attribute value",
            offset: value_start,
        })?;
        self.scanner.set_position(value_end + 1);

        Ok((key, entities::decode(self.text(value_start, value_end))))
    }
}

/// Value of a `key="value"` pair inside an XML declaration
fn pseudo_attribute<'a>(declaration: &'a str, key: &str) -> Option<&'a str> {
    let at = declaration.find(key)?;
    let rest = declaration[at + key.len()..].trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let value = &rest[1..];
    value.find(quote).map(|end| &value[..end])
}
