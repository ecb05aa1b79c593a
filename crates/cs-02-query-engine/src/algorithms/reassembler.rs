//! # Chunk Reassembler
//!
//! Turns the chunks of one or more query pages into a single JSON array of
//! documents, emitting bytes as soon as they are known to lie inside a
//! `Documents` array.
//!
//! ## Per page
//!
//! ```text
//! SeekingStart --marker found--> Streaming --end_page--> Idle
//!      |                            |
//!      | buffer head                | emit all but the trailing window
//! ```
//!
//! - The head of a page is buffered until the documents marker is seen, so
//!   a marker split across chunks is still found. The search is bounded by
//!   [`DOCUMENTS_SEARCH_LIMIT`].
//! - Once inside the array, every byte except the last `TRAILING_WINDOW + 1`
//!   is emitted as it arrives. The retained tail is where the count marker
//!   and the closing `]` live; it is resolved when the page ends.
//!
//! ## Across pages
//!
//! `[` is emitted once, on the first page. A `,` is emitted before a page's
//! first document when an earlier page already produced one, so pages with
//! empty `Documents` contribute nothing. `]` is emitted when the last page
//! ends.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use tracing::trace;

use super::scanner::{
    locate_count_field, ScanOutcome, WindowScanner, DOCUMENTS_SEARCH_LIMIT, TRAILING_WINDOW,
};
use crate::domain::ReassemblyError;

const OPEN: Bytes = Bytes::from_static(b"[");
const CLOSE: Bytes = Bytes::from_static(b"]");
const SEPARATOR: Bytes = Bytes::from_static(b",");

/// Bytes kept back while streaming: the count window plus the `]` before it.
const RETAINED: usize = TRAILING_WINDOW + 1;

#[derive(Debug)]
enum Phase {
    Idle,
    SeekingStart {
        head: BytesMut,
    },
    Streaming {
        tail: VecDeque<Bytes>,
        tail_len: usize,
        page_has_documents: bool,
    },
}

/// Streaming reassembler for the `Documents` arrays of consecutive pages.
///
/// Drive it with [`begin_page`](Self::begin_page), any number of
/// [`push_chunk`](Self::push_chunk) calls, and [`end_page`](Self::end_page).
/// Output fragments are appended to the caller's buffer in order; their
/// concatenation is the result.
#[derive(Debug)]
pub struct ChunkReassembler {
    phase: Phase,
    opened: bool,
    has_documents: bool,
    pages: usize,
}

impl Default for ChunkReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkReassembler {
    /// Reassembler with no pages seen.
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            opened: false,
            has_documents: false,
            pages: 0,
        }
    }

    /// Pages completed so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Whether the opening `[` has been emitted.
    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Start a new page. Any partial state of an unfinished page is dropped.
    pub fn begin_page(&mut self) {
        self.phase = Phase::SeekingStart {
            head: BytesMut::new(),
        };
    }

    /// Feed the next chunk of the current page.
    pub fn push_chunk(&mut self, chunk: Bytes, out: &mut Vec<Bytes>) -> Result<(), ReassemblyError> {
        match &mut self.phase {
            Phase::Idle => Err(ReassemblyError::PageNotStarted),
            Phase::SeekingStart { head } => {
                head.extend_from_slice(&chunk);
                match WindowScanner::documents().scan_forward(&head[..]) {
                    ScanOutcome::Found(pos) => {
                        let content_start = pos + WindowScanner::documents().marker().len();
                        let rest = head.split_off(content_start).freeze();
                        trace!(page = self.pages, offset = pos, "[cs-02] documents array opened");
                        if !self.opened {
                            out.push(OPEN);
                            self.opened = true;
                        }
                        self.phase = Phase::Streaming {
                            tail: VecDeque::new(),
                            tail_len: 0,
                            page_has_documents: false,
                        };
                        self.stream(rest, out);
                        Ok(())
                    }
                    ScanOutcome::NeedMore => Ok(()),
                    ScanOutcome::Exhausted => Err(ReassemblyError::DocumentsMarkerMissing {
                        scanned: DOCUMENTS_SEARCH_LIMIT,
                    }),
                }
            }
            Phase::Streaming { .. } => {
                self.stream(chunk, out);
                Ok(())
            }
        }
    }

    /// Finish the current page. On the last page the array is closed.
    pub fn end_page(&mut self, is_last: bool, out: &mut Vec<Bytes>) -> Result<(), ReassemblyError> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => Err(ReassemblyError::PageNotStarted),
            Phase::SeekingStart { head } => Err(ReassemblyError::DocumentsMarkerMissing {
                scanned: head.len().min(DOCUMENTS_SEARCH_LIMIT),
            }),
            Phase::Streaming {
                tail,
                tail_len,
                mut page_has_documents,
            } => {
                let mut buffer = BytesMut::with_capacity(tail_len);
                for part in tail {
                    buffer.extend_from_slice(&part);
                }
                let count_at = locate_count_field(&buffer)?;
                if count_at == 0 || buffer[count_at - 1] != b']' {
                    return Err(ReassemblyError::UnterminatedDocuments);
                }
                buffer.truncate(count_at - 1);
                self.emit(buffer.freeze(), &mut page_has_documents, out);

                if is_last {
                    out.push(CLOSE);
                }
                self.pages += 1;
                trace!(page = self.pages, is_last, "[cs-02] page reassembled");
                Ok(())
            }
        }
    }

    fn stream(&mut self, chunk: Bytes, out: &mut Vec<Bytes>) {
        if chunk.is_empty() {
            return;
        }
        let Phase::Streaming {
            tail,
            tail_len,
            page_has_documents,
        } = &mut self.phase
        else {
            return;
        };

        *tail_len += chunk.len();
        tail.push_back(chunk);

        while *tail_len > RETAINED {
            let excess = *tail_len - RETAINED;
            let Some(front) = tail.front_mut() else {
                break;
            };
            let fragment = if front.len() <= excess {
                match tail.pop_front() {
                    Some(front) => front,
                    None => break,
                }
            } else {
                front.split_to(excess)
            };
            *tail_len -= fragment.len();
            emit_fragment(fragment, &mut self.has_documents, page_has_documents, out);
        }
    }

    fn emit(&mut self, fragment: Bytes, page_has_documents: &mut bool, out: &mut Vec<Bytes>) {
        emit_fragment(fragment, &mut self.has_documents, page_has_documents, out);
    }
}

/// Push a fragment of array content, preceded by `,` if it carries the
/// page's first document and an earlier page already produced one.
fn emit_fragment(
    fragment: Bytes,
    has_documents: &mut bool,
    page_has_documents: &mut bool,
    out: &mut Vec<Bytes>,
) {
    if fragment.is_empty() {
        return;
    }
    if !*page_has_documents && fragment.iter().any(|b| !b.is_ascii_whitespace()) {
        if *has_documents {
            out.push(SEPARATOR);
        }
        *page_has_documents = true;
        *has_documents = true;
    }
    out.push(fragment);
}

/// Reassemble complete page bodies into one JSON array.
pub fn stitch_pages<P: AsRef<[u8]>>(pages: &[P]) -> Result<Vec<u8>, ReassemblyError> {
    let mut reassembler = ChunkReassembler::new();
    let mut out = Vec::new();
    for (index, page) in pages.iter().enumerate() {
        reassembler.begin_page();
        reassembler.push_chunk(Bytes::copy_from_slice(page.as_ref()), &mut out)?;
        reassembler.end_page(index + 1 == pages.len(), &mut out)?;
    }
    Ok(out.concat())
}
