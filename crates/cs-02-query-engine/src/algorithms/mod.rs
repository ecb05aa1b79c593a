//! # Algorithms
//!
//! Byte-level work on response bodies: bounded marker scans and the
//! streaming reassembly of `Documents` arrays across pages.

pub mod reassembler;
pub mod scanner;

pub use reassembler::{stitch_pages, ChunkReassembler};
pub use scanner::{
    extract_documents, locate_count_field, locate_documents_start, ScanOutcome, WindowScanner,
    COUNT_MARKER, DOCUMENTS_MARKER, DOCUMENTS_SEARCH_LIMIT, INITIAL_WINDOW, TRAILING_WINDOW,
};
