//! # Window Scanner
//!
//! Bounded marker search over raw bytes. Used instead of a JSON parse to
//! find where the `Documents` array starts and where it ends.
//!
//! ```text
//! {"_rid":"x","Documents":[{...},{...}],"_count":2}
//!                         ^ start        ^ end (count marker)
//! ```
//!
//! Both markers are ASCII, so searching bytes is equivalent to searching
//! the UTF-8 text.
//!
//! The backward search assumes `_count` immediately follows the array, as
//! the service serializes it today. If that field order changes the search
//! fails with [`ReassemblyError::CountMarkerMissing`] rather than guessing.

use crate::domain::ReassemblyError;

/// Marker that opens the documents array; its last byte is the `[`.
pub const DOCUMENTS_MARKER: &[u8] = br#"Documents":["#;

/// Marker that introduces the trailing count field.
pub const COUNT_MARKER: &[u8] = br#","_count""#;

/// First forward window size.
pub const INITIAL_WINDOW: usize = 50;

/// The documents marker must end within this many leading bytes.
pub const DOCUMENTS_SEARCH_LIMIT: usize = 512;

/// Size of the trailing window searched for the count marker.
pub const TRAILING_WINDOW: usize = 64;

/// Result of a forward scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Marker starts at this offset.
    Found(usize),
    /// Not found yet; the buffer ends before the limit.
    NeedMore,
    /// Not found within the limit.
    Exhausted,
}

/// Searches for one marker within a bounded region of a buffer.
///
/// Forward scans grow a window from the front in marker-sized increments;
/// consecutive windows overlap by `marker.len() - 1` bytes so a marker split
/// across two windows is still seen. Backward scans look only at the last
/// `limit` bytes.
#[derive(Debug, Clone, Copy)]
pub struct WindowScanner {
    marker: &'static [u8],
    initial_window: usize,
    limit: usize,
}

impl WindowScanner {
    /// Scanner for `marker` with an explicit window and bound.
    pub const fn new(marker: &'static [u8], initial_window: usize, limit: usize) -> Self {
        Self {
            marker,
            initial_window,
            limit,
        }
    }

    /// Forward scanner for the documents marker.
    pub const fn documents() -> Self {
        Self::new(DOCUMENTS_MARKER, INITIAL_WINDOW, DOCUMENTS_SEARCH_LIMIT)
    }

    /// Backward scanner for the count marker.
    pub const fn count() -> Self {
        Self::new(COUNT_MARKER, TRAILING_WINDOW, TRAILING_WINDOW)
    }

    /// The marker being searched for.
    pub fn marker(&self) -> &'static [u8] {
        self.marker
    }

    /// Upper bound of the scanned region.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Find the first occurrence of the marker within the first `limit` bytes.
    pub fn scan_forward(&self, buffer: &[u8]) -> ScanOutcome {
        let marker_len = self.marker.len();
        if marker_len == 0 {
            return ScanOutcome::Found(0);
        }

        let bound = buffer.len().min(self.limit);
        let mut start = 0usize;
        let mut size = self.initial_window.max(marker_len);

        loop {
            let end = (start + size).min(bound);
            if let Some(pos) = find(&buffer[start..end], self.marker) {
                return ScanOutcome::Found(start + pos);
            }
            if end == bound {
                return if bound == self.limit {
                    ScanOutcome::Exhausted
                } else {
                    ScanOutcome::NeedMore
                };
            }
            start = end + 1 - marker_len;
            size += marker_len;
        }
    }

    /// Find the last occurrence of the marker within the trailing `limit`
    /// bytes, scanning from the end.
    pub fn scan_backward(&self, buffer: &[u8]) -> Option<usize> {
        let marker_len = self.marker.len();
        let window_start = buffer.len().saturating_sub(self.limit);
        let window = &buffer[window_start..];
        if window.len() < marker_len {
            return None;
        }
        window
            .windows(marker_len)
            .rposition(|candidate| candidate == self.marker)
            .map(|pos| window_start + pos)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Offset of the `[` that opens the documents array in a complete page.
pub fn locate_documents_start(buffer: &[u8]) -> Result<usize, ReassemblyError> {
    match WindowScanner::documents().scan_forward(buffer) {
        ScanOutcome::Found(pos) => Ok(pos + DOCUMENTS_MARKER.len() - 1),
        ScanOutcome::NeedMore | ScanOutcome::Exhausted => {
            Err(ReassemblyError::DocumentsMarkerMissing {
                scanned: buffer.len().min(DOCUMENTS_SEARCH_LIMIT),
            })
        }
    }
}

/// Offset where the count marker begins; the documents array ends just
/// before it.
pub fn locate_count_field(buffer: &[u8]) -> Result<usize, ReassemblyError> {
    WindowScanner::count()
        .scan_backward(buffer)
        .ok_or(ReassemblyError::CountMarkerMissing {
            window: TRAILING_WINDOW,
        })
}

/// The documents array (brackets included) of a complete page body.
pub fn extract_documents(body: &[u8]) -> Result<&[u8], ReassemblyError> {
    let start = locate_documents_start(body)?;
    let end = locate_count_field(body)?;
    if end <= start || body[end - 1] != b']' {
        return Err(ReassemblyError::UnterminatedDocuments);
    }
    Ok(&body[start..end])
}
