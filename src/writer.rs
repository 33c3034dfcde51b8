//! File serialization
//!
//! One linear pass over any `Write` target: header, every object in
//! allocation order, the cross-reference table, then the trailer. Offsets
//! are tracked by counting bytes as they leave, so the target needs no
//! `Seek`. The whole object graph is validated before the first byte goes
//! out; a dangling reference or an unfilled reservation means nothing is
//! written at all.

use crate::document::{Document, Slot, Stream};
use crate::error::{Error, Result};
use crate::object::{Name, Object};
use std::io::Write;
use tracing::debug;

/// Serialize a document into `writer`
pub fn write_document<W: Write>(doc: &mut Document, writer: W) -> Result<()> {
    validate(doc)?;

    // Run every filter chain before emitting anything; /Length needs the
    // exact filtered byte count up front.
    for slot in doc.slots_mut() {
        if let Slot::Stream(s) = slot {
            s.finalize()?;
        }
    }

    let mut out = CountingWriter::new(writer);
    let (major, minor) = doc.options().version;
    out.write_all(format!("%PDF-{}.{}\n", major, minor).as_bytes())?;
    out.write_all(b"%\xE2\xE3\xCF\xD3\n")?; // binary comment

    let mut offsets = Vec::with_capacity(doc.slots().len());
    let root = doc.root().ok_or_else(|| Error::structure("no root object set"))?;

    for (idx, slot) in doc.slots_mut().iter_mut().enumerate() {
        let num = idx + 1;
        offsets.push(out.position());
        out.write_all(format!("{} 0 obj\n", num).as_bytes())?;
        match slot {
            Slot::Body(obj) => write_object(&mut out, obj)?,
            Slot::Stream(s) => {
                write_stream(&mut out, s)?;
                s.mark_written();
            }
            // validate() rejects reservations before any byte is written
            Slot::Reserved => unreachable!(),
        }
        out.write_all(b"\nendobj\n")?;
    }

    let xref_offset = out.position();
    out.write_all(b"xref\n")?;
    out.write_all(format!("0 {}\n", offsets.len() + 1).as_bytes())?;
    out.write_all(b"0000000000 65535 f \n")?;
    for offset in &offsets {
        out.write_all(format!("{:010} 00000 n \n", offset).as_bytes())?;
    }

    out.write_all(b"trailer\n")?;
    out.write_all(b"<<\n")?;
    out.write_all(format!("/Size {}\n", offsets.len() + 1).as_bytes())?;
    out.write_all(format!("/Root {} 0 R\n", root.num).as_bytes())?;
    out.write_all(b">>\n")?;
    out.write_all(b"startxref\n")?;
    out.write_all(format!("{}\n", xref_offset).as_bytes())?;
    out.write_all(b"%%EOF\n")?;
    out.flush()?;

    debug!(
        objects = offsets.len(),
        bytes = out.position(),
        "document serialized"
    );
    Ok(())
}

/// Serialize a document into a byte vector
pub fn write_to_vec(doc: &mut Document) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_document(doc, &mut out)?;
    Ok(out)
}

/// Check every reference in the document before anything is emitted
fn validate(doc: &Document) -> Result<()> {
    let root = doc.root().ok_or_else(|| Error::structure("no root object set"))?;
    let high = doc.high_water();

    check_ref(root.num, high, doc)?;
    for (idx, slot) in doc.slots().iter().enumerate() {
        match slot {
            Slot::Reserved => {
                return Err(Error::structure(format!(
                    "object {} was allocated but never filled",
                    idx + 1
                )));
            }
            Slot::Body(obj) => check_object(obj, high, doc)?,
            Slot::Stream(s) => {
                for (_, value) in s.dict().iter() {
                    check_object(value, high, doc)?;
                }
            }
        }
    }
    Ok(())
}

fn check_object(obj: &Object, high: i32, doc: &Document) -> Result<()> {
    match obj {
        Object::Ref(r) => check_ref(r.num, high, doc),
        Object::Array(items) => {
            for item in items {
                check_object(item, high, doc)?;
            }
            Ok(())
        }
        Object::Dict(dict) => {
            for (_, value) in dict.iter() {
                check_object(value, high, doc)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_ref(num: i32, high: i32, doc: &Document) -> Result<()> {
    if num < 1 || num > high {
        return Err(Error::structure(format!(
            "reference to object {} which was never allocated",
            num
        )));
    }
    if matches!(doc.slots()[(num - 1) as usize], Slot::Reserved) {
        return Err(Error::structure(format!(
            "reference to object {} which was allocated but never filled",
            num
        )));
    }
    Ok(())
}

/// Write a stream entity: descriptive dictionary, then the filtered payload
fn write_stream<W: Write>(out: &mut W, s: &Stream) -> Result<()> {
    let payload = s
        .payload()
        .ok_or_else(|| Error::structure("stream was not finalized"))?;

    let mut dict = s.dict().clone();
    if !s.filters().is_empty() {
        let mut names: Vec<Object> = s
            .filters()
            .names()
            .map(|n| Object::Name(Name::new(n)))
            .collect();
        let filter = if names.len() == 1 {
            names.pop().unwrap()
        } else {
            Object::Array(names)
        };
        dict.insert(Name::new("Filter"), filter);
    }
    dict.insert(Name::new("Length"), Object::Int(payload.len() as i64));

    write_object(out, &Object::Dict(dict))?;
    out.write_all(b"\nstream\n")?;
    out.write_all(payload)?;
    out.write_all(b"\nendstream")?;
    Ok(())
}

/// Write one object body
fn write_object<W: Write>(writer: &mut W, obj: &Object) -> Result<()> {
    match obj {
        Object::Null => writer.write_all(b"null")?,
        Object::Bool(b) => writer.write_all(if *b { b"true" } else { b"false" })?,
        Object::Int(i) => writer.write_all(i.to_string().as_bytes())?,
        Object::Real(r) => {
            let s = format!("{:.6}", r)
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string();
            writer.write_all(s.as_bytes())?;
        }
        Object::String(s) => {
            writer.write_all(b"(")?;
            for &byte in s.as_bytes() {
                match byte {
                    b'(' | b')' | b'\\' => {
                        writer.write_all(b"\\")?;
                        writer.write_all(&[byte])?;
                    }
                    b'\n' => writer.write_all(b"\\n")?,
                    b'\r' => writer.write_all(b"\\r")?,
                    b'\t' => writer.write_all(b"\\t")?,
                    _ if (32..=126).contains(&byte) => writer.write_all(&[byte])?,
                    _ => writer.write_all(format!("\\{:03o}", byte).as_bytes())?,
                }
            }
            writer.write_all(b")")?;
        }
        Object::Name(n) => writer.write_all(format!("/{}", n.as_str()).as_bytes())?,
        Object::Array(arr) => {
            writer.write_all(b"[")?;
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    writer.write_all(b" ")?;
                }
                write_object(writer, item)?;
            }
            writer.write_all(b"]")?;
        }
        Object::Dict(dict) => {
            writer.write_all(b"<<\n")?;
            for (key, value) in dict.iter() {
                writer.write_all(format!("/{} ", key.as_str()).as_bytes())?;
                write_object(writer, value)?;
                writer.write_all(b"\n")?;
            }
            writer.write_all(b">>")?;
        }
        Object::Ref(r) => {
            writer.write_all(format!("{} {} R", r.num, r.generation).as_bytes())?;
        }
    }
    Ok(())
}

struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    fn position(&self) -> u64 {
        self.written
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentOptions, StreamKind};
    use crate::filter::{FilterType, decode_ascii85, decode_run_length};
    use crate::object::{Dict, ObjRef, PdfString};

    fn minimal_doc() -> Document {
        let mut doc = Document::new();
        let pages_ref = doc.alloc();

        let content_ref = doc.add_stream(Dict::new(), StreamKind::Content);
        doc.stream_mut(content_ref)
            .unwrap()
            .append(b"BT /F1 12 Tf 72 720 Td (Hi) Tj ET\n")
            .unwrap();

        let mut page = Dict::new();
        page.insert(Name::new("Type"), Object::Name(Name::new("Page")));
        page.insert(Name::new("Parent"), Object::Ref(pages_ref));
        page.insert(Name::new("Contents"), Object::Ref(content_ref));
        let page_ref = doc.add_object(Object::Dict(page));

        let mut pages = Dict::new();
        pages.insert(Name::new("Type"), Object::Name(Name::new("Pages")));
        pages.insert(Name::new("Kids"), Object::Array(vec![Object::Ref(page_ref)]));
        pages.insert(Name::new("Count"), Object::Int(1));
        doc.fill(pages_ref, Object::Dict(pages)).unwrap();

        let mut catalog = Dict::new();
        catalog.insert(Name::new("Type"), Object::Name(Name::new("Catalog")));
        catalog.insert(Name::new("Pages"), Object::Ref(pages_ref));
        let root = doc.add_object(Object::Dict(catalog));
        doc.set_root(root);
        doc
    }

    /// Pull the xref offsets back out of a finished file
    fn parse_xref(bytes: &[u8]) -> Vec<usize> {
        let text = String::from_utf8_lossy(bytes);
        let start = text.find("xref\n0 ").expect("xref section");
        let rest = &text[start..];
        let mut lines = rest.lines();
        lines.next(); // "xref"
        let count: usize = lines
            .next()
            .unwrap()
            .split_whitespace()
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();
        let free = lines.next().unwrap();
        assert_eq!(free, "0000000000 65535 f ");
        (1..count)
            .map(|_| {
                let line = lines.next().unwrap();
                assert_eq!(line.len(), 19); // 20 bytes with the \n
                assert!(line.ends_with(" 00000 n "));
                line[..10].parse().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_header_and_eof() {
        let mut doc = minimal_doc();
        let bytes = write_to_vec(&mut doc).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_custom_version_in_header() {
        let mut doc = Document::with_options(DocumentOptions {
            version: (1, 7),
            ..Default::default()
        });
        let root = doc.add_object(Object::Dict(Dict::new()));
        doc.set_root(root);
        let bytes = write_to_vec(&mut doc).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7\n"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut doc = minimal_doc();
        let bytes = write_to_vec(&mut doc).unwrap();
        let offsets = parse_xref(&bytes);
        assert_eq!(offsets.len(), doc.high_water() as usize);
        for (i, &offset) in offsets.iter().enumerate() {
            let expected = format!("{} 0 obj\n", i + 1);
            assert_eq!(
                &bytes[offset..offset + expected.len()],
                expected.as_bytes(),
                "offset of object {}",
                i + 1
            );
        }
    }

    #[test]
    fn test_trailer_size_and_startxref() {
        let mut doc = minimal_doc();
        let bytes = write_to_vec(&mut doc).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        let size = doc.high_water() + 1;
        assert!(text.contains(&format!("/Size {}\n", size)));
        assert!(text.contains(&format!("/Root {} 0 R\n", doc.root().unwrap().num)));

        let startxref: usize = text
            .split("startxref\n")
            .nth(1)
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(&bytes[startxref..startxref + 5], b"xref\n");
    }

    #[test]
    fn test_stream_length_is_exact_filtered_count() {
        let mut doc = Document::new();
        let r = doc.add_stream(Dict::new(), StreamKind::Content);
        {
            let s = doc.stream_mut(r).unwrap();
            s.add_filter(FilterType::ASCII85Decode).unwrap();
            s.append(&[0, 0, 0, 0]).unwrap();
        }
        let root = doc.add_object(Object::Dict(Dict::new()));
        doc.set_root(root);
        let bytes = write_to_vec(&mut doc).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        // all-zero group shortcut plus the end marker: 3 payload bytes
        assert!(text.contains("/Filter /ASCII85Decode\n"));
        assert!(text.contains("/Length 3\n"));
        assert!(text.contains("stream\nz~>\nendstream"));
    }

    #[test]
    fn test_chained_filters_write_array_in_attach_order() {
        let mut doc = Document::new();
        let r = doc.add_stream(Dict::new(), StreamKind::Content);
        let raw = vec![b'W'; 300];
        {
            let s = doc.stream_mut(r).unwrap();
            s.add_filter(FilterType::RunLengthDecode).unwrap();
            s.add_filter(FilterType::ASCII85Decode).unwrap();
            s.append(&raw).unwrap();
        }
        let root = doc.add_object(Object::Dict(Dict::new()));
        doc.set_root(root);
        let bytes = write_to_vec(&mut doc).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Filter [/RunLengthDecode /ASCII85Decode]\n"));

        // payload decodes back through the inverse chain
        let start = bytes.windows(7).position(|w| w == b"stream\n").unwrap() + 7;
        let end = bytes.windows(10).position(|w| w == b"\nendstream").unwrap();
        let inner = decode_ascii85(&bytes[start..end]).unwrap();
        assert_eq!(decode_run_length(&inner).unwrap(), raw);
    }

    #[test]
    fn test_unset_root_writes_nothing() {
        let mut doc = Document::new();
        doc.add_object(Object::Int(1));
        let mut out = Vec::new();
        let err = write_document(&mut doc, &mut out);
        assert!(matches!(err, Err(Error::Structure(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_dangling_reference_writes_nothing() {
        let mut doc = Document::new();
        let mut d = Dict::new();
        d.insert(Name::new("Next"), Object::Ref(ObjRef::new(42, 0)));
        let root = doc.add_object(Object::Dict(d));
        doc.set_root(root);
        let mut out = Vec::new();
        let err = write_document(&mut doc, &mut out);
        assert!(matches!(err, Err(Error::Structure(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unfilled_reservation_writes_nothing() {
        let mut doc = Document::new();
        let root = doc.add_object(Object::Dict(Dict::new()));
        doc.set_root(root);
        doc.alloc(); // reserved, never filled
        let mut out = Vec::new();
        let err = write_document(&mut doc, &mut out);
        assert!(matches!(err, Err(Error::Structure(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_append_after_write_fails() {
        let mut doc = Document::new();
        let r = doc.add_stream(Dict::new(), StreamKind::Content);
        doc.stream_mut(r).unwrap().append(b"x").unwrap();
        let root = doc.add_object(Object::Dict(Dict::new()));
        doc.set_root(root);
        write_to_vec(&mut doc).unwrap();
        assert!(doc.stream_mut(r).unwrap().append(b"y").is_err());
    }

    #[test]
    fn test_forward_references_match_direct_build() {
        // same graph, one built with alloc + fill, one built in order
        let build = |forward: bool| {
            let mut doc = Document::new();
            let (a, b) = if forward {
                let a = doc.alloc();
                let mut d = Dict::new();
                d.insert(Name::new("Other"), Object::Ref(ObjRef::new(2, 0)));
                doc.fill(a, Object::Dict(d)).unwrap();
                let b = doc.add_object(Object::Int(5));
                (a, b)
            } else {
                let mut d = Dict::new();
                d.insert(Name::new("Other"), Object::Ref(ObjRef::new(2, 0)));
                let a = doc.add_object(Object::Dict(d));
                let b = doc.add_object(Object::Int(5));
                (a, b)
            };
            let _ = b;
            doc.set_root(a);
            write_to_vec(&mut doc).unwrap()
        };
        assert_eq!(build(true), build(false));
    }

    #[test]
    fn test_scalar_formatting() {
        let mut out = Vec::new();
        write_object(&mut out, &Object::Real(2.5)).unwrap();
        out.push(b' ');
        write_object(&mut out, &Object::Real(3.0)).unwrap();
        out.push(b' ');
        write_object(&mut out, &Object::Int(-7)).unwrap();
        assert_eq!(out, b"2.5 3 -7");
    }

    #[test]
    fn test_string_escaping() {
        let mut out = Vec::new();
        let s = PdfString::new(b"a(b)\\\n\x01".to_vec());
        write_object(&mut out, &Object::String(s)).unwrap();
        assert_eq!(out, b"(a\\(b\\)\\\\\\n\\001)");
    }
}
