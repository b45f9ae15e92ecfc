//! Positional decoding of a buffered document array.
//!
//! A page keeps its `docs` array as raw JSON text. `PageDecoder` walks that
//! text element by element, remembering only a byte offset and where it is
//! relative to the array brackets. Each element is located with
//! `serde_json`'s streaming deserializer (skipping the value without building
//! it) and deserialized into the caller's type only when asked.

use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::value::RawValue;
use std::ops::Range;

use crate::error::CouchError;

/// Where the walker stands relative to the array brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayPosition {
    BeforeArray,
    InArray { seen_element: bool },
    AfterArray,
}

#[derive(Debug, Clone, Copy)]
struct ArrayWalker {
    offset: usize,
    position: ArrayPosition,
}

impl ArrayWalker {
    fn new() -> Self {
        Self {
            offset: 0,
            position: ArrayPosition::BeforeArray,
        }
    }

    fn skip_whitespace(&mut self, text: &str) {
        let bytes = text.as_bytes();
        while bytes
            .get(self.offset)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.offset += 1;
        }
    }

    fn open(&mut self, text: &str) -> Result<(), CouchError> {
        self.skip_whitespace(text);
        match text.as_bytes().get(self.offset) {
            Some(b'[') => {
                self.offset += 1;
                self.position = ArrayPosition::InArray {
                    seen_element: false,
                };
                Ok(())
            }
            Some(other) => Err(CouchError::Decode(format!(
                "expected '[' at offset {}, found '{}'",
                self.offset, *other as char
            ))),
            None => Err(CouchError::Decode("empty document array".into())),
        }
    }

    /// Locate the next element, returning its byte range in `text`.
    fn next_element(&mut self, text: &str) -> Result<Option<Range<usize>>, CouchError> {
        let seen_element = match self.position {
            ArrayPosition::AfterArray => return Ok(None),
            ArrayPosition::BeforeArray => {
                self.open(text)?;
                false
            }
            ArrayPosition::InArray { seen_element } => seen_element,
        };

        self.skip_whitespace(text);
        match text.as_bytes().get(self.offset) {
            Some(b']') => {
                self.offset += 1;
                self.position = ArrayPosition::AfterArray;
                return Ok(None);
            }
            Some(b',') if seen_element => {
                self.offset += 1;
                self.skip_whitespace(text);
            }
            Some(_) if !seen_element => {}
            Some(other) => {
                return Err(CouchError::Decode(format!(
                    "expected ',' or ']' at offset {}, found '{}'",
                    self.offset, *other as char
                )));
            }
            None => return Err(CouchError::Decode("unterminated document array".into())),
        }

        let start = self.offset;
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<IgnoredAny>();
        match values.next() {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                return Err(CouchError::Decode(format!(
                    "malformed document at offset {start}: {e}"
                )));
            }
            None => return Err(CouchError::Decode("unterminated document array".into())),
        }
        let end = start + values.byte_offset();

        self.offset = end;
        self.position = ArrayPosition::InArray { seen_element: true };
        Ok(Some(start..end))
    }
}

/// Decoder over one page of raw documents.
#[derive(Debug)]
pub struct PageDecoder {
    raw: Box<RawValue>,
    walker: ArrayWalker,
    current: Option<Range<usize>>,
}

impl PageDecoder {
    /// Consume the opening bracket right away so that an invalid page is
    /// rejected before any document is requested.
    pub fn new(raw: Box<RawValue>) -> Result<Self, CouchError> {
        let mut walker = ArrayWalker::new();
        walker.open(raw.get())?;
        Ok(Self {
            raw,
            walker,
            current: None,
        })
    }

    pub fn position(&self) -> ArrayPosition {
        self.walker.position
    }

    /// Move to the next document. Returns `false` once the closing bracket is
    /// reached; later calls keep returning `false`.
    pub fn advance(&mut self) -> Result<bool, CouchError> {
        self.current = None;
        self.current = self.walker.next_element(self.raw.get())?;
        Ok(self.current.is_some())
    }

    /// Raw JSON of the document under the decoder.
    pub fn current(&self) -> Option<&str> {
        self.current.clone().map(|range| &self.raw.get()[range])
    }

    /// Deserialize the document under the decoder. Does not move the decoder,
    /// so a failed attempt can be retried with another type.
    pub fn decode<'a, T: Deserialize<'a>>(&'a self) -> Result<T, CouchError> {
        let raw = self.current().ok_or(CouchError::NoCurrentDocument)?;
        serde_json::from_str(raw).map_err(|e| CouchError::Decode(e.to_string()))
    }

    /// Number of documents not yet visited, without moving the decoder.
    pub fn remaining(&self) -> Result<usize, CouchError> {
        let mut walker = self.walker;
        let mut count = 0;
        while walker.next_element(self.raw.get())?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}
