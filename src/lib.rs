//! pdfbind - document serialization engine
//!
//! Turns a graph of numbered objects plus buffered stream content into a
//! single randomly-addressable binary file: header, indirect objects,
//! cross-reference table, trailer. Stream content can pass through chains
//! of streaming filters (ASCII85, ASCII-Hex, run-length, Flate), each with
//! a byte-exact inverse decoder.
//!
//! # Example
//!
//! ```
//! use pdfbind::{Dict, Document, FilterType, Name, Object, StreamKind, write_to_vec};
//!
//! let mut doc = Document::new();
//! let content = doc.add_stream(Dict::new(), StreamKind::Content);
//! {
//!     let s = doc.stream_mut(content).unwrap();
//!     s.add_filter(FilterType::ASCII85Decode).unwrap();
//!     s.append(b"0 0 m 612 792 l S\n").unwrap();
//! }
//!
//! let mut catalog = Dict::new();
//! catalog.insert(Name::new("Type"), Object::Name(Name::new("Catalog")));
//! let root = doc.add_object(Object::Dict(catalog));
//! doc.set_root(root);
//!
//! let bytes = write_to_vec(&mut doc).unwrap();
//! assert!(bytes.starts_with(b"%PDF-1.4\n"));
//! assert!(bytes.ends_with(b"%%EOF\n"));
//! ```

pub mod buffer;
pub mod document;
pub mod error;
pub mod filter;
pub mod object;
pub mod writer;

pub use buffer::StreamBuffer;
pub use document::{Document, DocumentOptions, Stream, StreamKind, StreamState};
pub use error::{Error, Result};
pub use filter::{FilterChain, FilterParams, FilterType};
pub use object::{Array, Dict, Name, ObjRef, Object, PdfString};
pub use writer::{write_document, write_to_vec};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version_set() {
        assert!(!super::VERSION.is_empty());
    }
}
