//! Streaming case source
//!
//! A suite is a top-level JSON array of cases. The array framing (`[`, `,`,
//! `]`) is scanned by hand and each element is decoded with `serde_json`, so
//! cases reach the run loop while the rest of the file is still unread.
//!
//! Decoding runs on the blocking pool and hands cases over a bounded channel.
//! The channel carries at most one error, always the last item.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::common::{Error, Result};

use super::model::Case;

/// Number of decoded cases buffered ahead of the consumer by default
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Consumer side of a streamed case suite
pub struct CaseSource {
    rx: mpsc::Receiver<Result<Case>>,
}

impl CaseSource {
    /// Start decoding cases from `reader`
    ///
    /// Must be called from within a tokio runtime. At most `capacity` cases
    /// (minimum 1) are decoded ahead of [`CaseSource::next`].
    pub fn from_reader<R>(reader: R, capacity: usize) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::task::spawn_blocking(move || produce(BufReader::new(reader), &tx));
        Self { rx }
    }

    /// Open a suite file and start decoding it
    pub fn open(path: &Path, capacity: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
        tracing::debug!("Streaming cases from {}", path.display());
        Ok(Self::from_reader(file, capacity))
    }

    /// Fetch the next case
    ///
    /// Returns `Ok(None)` once the suite is exhausted, and on every call
    /// after that. A decode error is returned once and ends the suite.
    pub async fn next(&mut self) -> Result<Option<Case>> {
        match self.rx.recv().await {
            Some(Ok(case)) => Ok(Some(case)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

/// Producer loop: decode the array and push elements until it ends or breaks
fn produce<R: BufRead>(mut reader: R, tx: &mpsc::Sender<Result<Case>>) {
    if let Err(e) = open_array(&mut reader) {
        let _ = tx.blocking_send(Err(e));
        return;
    }

    let mut count = 0usize;
    loop {
        match next_element(&mut reader, count == 0) {
            Ok(Some(case)) => {
                count += 1;
                // A closed channel means the consumer is gone
                if tx.blocking_send(Ok(case)).is_err() {
                    tracing::debug!("Case source dropped after {} case(s)", count);
                    return;
                }
            }
            Ok(None) => {
                tracing::debug!("Case suite exhausted after {} case(s)", count);
                return;
            }
            Err(e) => {
                tracing::debug!("Case suite aborted after {} case(s): {}", count, e);
                let _ = tx.blocking_send(Err(e));
                return;
            }
        }
    }
}

/// Consume the opening `[` of the suite
fn open_array<R: BufRead>(reader: &mut R) -> Result<()> {
    match peek_token(reader) {
        Ok(Some(b'[')) => {
            reader.consume(1);
            Ok(())
        }
        Ok(Some(other)) => Err(Error::InvalidToken(format!(
            "expected '[' at start of case suite, found '{}'",
            char::from(other)
        ))),
        Ok(None) => Err(Error::InvalidToken(
            "expected '[' at start of case suite, found end of input".to_string(),
        )),
        Err(e) => Err(Error::InvalidToken(e.to_string())),
    }
}

/// Decode the next array element, or `None` at the closing `]`
fn next_element<R: BufRead>(reader: &mut R, first: bool) -> Result<Option<Case>> {
    let token = peek_token(reader).map_err(|e| Error::MalformedElement(e.to_string()))?;
    match token {
        Some(b']') => {
            reader.consume(1);
            return Ok(None);
        }
        Some(b',') if !first => reader.consume(1),
        Some(_) if first => {}
        Some(other) => {
            return Err(Error::MalformedElement(format!(
                "expected ',' or ']' after case, found '{}'",
                char::from(other)
            )))
        }
        None => {
            return Err(Error::MalformedElement(
                "unexpected end of input inside case suite".to_string(),
            ))
        }
    }

    // Serde would also accept a case written as an array
    match peek_token(reader).map_err(|e| Error::MalformedElement(e.to_string()))? {
        Some(b'{') => {}
        Some(other) => {
            return Err(Error::MalformedElement(format!(
                "expected '{{' at start of case, found '{}'",
                char::from(other)
            )))
        }
        None => {
            return Err(Error::MalformedElement(
                "unexpected end of input inside case suite".to_string(),
            ))
        }
    }

    // The deserializer stops right after the element's closing delimiter,
    // leaving the separator in `reader`.
    let mut de = serde_json::Deserializer::from_reader(&mut *reader);
    Case::deserialize(&mut de)
        .map(Some)
        .map_err(|e| Error::MalformedElement(e.to_string()))
}

/// Skip JSON whitespace and peek the next byte without consuming it
fn peek_token<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        match buf
            .iter()
            .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
        {
            Some(pos) => {
                let byte = buf[pos];
                reader.consume(pos);
                return Ok(Some(byte));
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}
