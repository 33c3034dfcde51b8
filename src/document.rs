//! Document assembly
//!
//! A [`Document`] owns the object number allocator and every entity that
//! will land in the output file. Numbers are handed out monotonically
//! starting at 1 and never reused; a number can be reserved before its body
//! exists so objects may reference each other forward. Stream entities pair
//! a descriptive dictionary with buffered content and a filter chain, and
//! move through a one-way lifecycle from buffering to written.

use crate::buffer::{DEFAULT_SPOOL_THRESHOLD, StreamBuffer};
use crate::error::{Error, Result};
use crate::filter::{FilterChain, FilterParams, FilterType};
use crate::object::{Dict, Name, ObjRef, Object};
use bytes::Bytes;
use tracing::debug;

/// Document-level options
#[derive(Debug, Clone, Copy)]
pub struct DocumentOptions {
    /// Bytes of stream content kept in memory before spilling to a temp file
    pub spool_threshold: usize,
    /// File format version written into the header
    pub version: (u8, u8),
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            spool_threshold: DEFAULT_SPOOL_THRESHOLD,
            version: (1, 4),
        }
    }
}

/// Where a stream entity is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StreamState {
    /// Accepting content
    Buffering,
    /// Filter chain has run; content is frozen
    Finalized,
    /// Bytes are in the output file
    Written,
}

/// Type-specific stream metadata
///
/// Added to the descriptive dictionary when the stream finalizes.
#[derive(Debug, Clone)]
pub enum StreamKind {
    /// Plain content (page operators and the like)
    Content,
    /// Image XObject
    Image {
        width: i64,
        height: i64,
        bits_per_component: i64,
    },
    /// Embedded font program
    FontFile,
}

/// A stream entity: dictionary, buffered content, filter chain, lifecycle
pub struct Stream {
    dict: Dict,
    kind: StreamKind,
    content: StreamBuffer,
    filters: FilterChain,
    state: StreamState,
    output: Option<Bytes>,
}

impl Stream {
    fn new(dict: Dict, kind: StreamKind, spool_threshold: usize) -> Self {
        Self {
            dict,
            kind,
            content: StreamBuffer::with_spool_threshold(spool_threshold),
            filters: FilterChain::new(),
            state: StreamState::Buffering,
            output: None,
        }
    }

    /// Append raw content bytes
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        if self.state != StreamState::Buffering {
            return Err(Error::argument(format!(
                "cannot append to a {:?} stream",
                self.state
            )));
        }
        self.content.append(data)
    }

    /// Attach a filter with default parameters
    pub fn add_filter(&mut self, filter: FilterType) -> Result<()> {
        self.add_filter_with_params(filter, FilterParams::default())
    }

    /// Attach a filter, validating its parameters first.
    ///
    /// Filters apply to the content in the order they are attached.
    pub fn add_filter_with_params(
        &mut self,
        filter: FilterType,
        params: FilterParams,
    ) -> Result<()> {
        if self.state != StreamState::Buffering {
            return Err(Error::argument(format!(
                "cannot attach a filter to a {:?} stream",
                self.state
            )));
        }
        filter.validate_params(&params)?;
        self.filters.add(filter);
        Ok(())
    }

    pub fn dict(&self) -> &Dict {
        &self.dict
    }

    pub fn dict_mut(&mut self) -> &mut Dict {
        &mut self.dict
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Raw content length so far
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// Run the filter chain and freeze the stream.
    ///
    /// Records the exact filtered byte count and the type-specific entries
    /// in the dictionary. Calling this again is a no-op.
    pub fn finalize(&mut self) -> Result<()> {
        if self.state != StreamState::Buffering {
            return Ok(());
        }
        let raw = self.content.to_vec()?;
        let raw_len = raw.len();
        let encoded = self.filters.encode(&raw)?;
        debug!(
            raw = raw_len,
            encoded = encoded.len(),
            filters = self.filters.len(),
            "stream finalized"
        );

        match self.kind {
            StreamKind::Content => {}
            StreamKind::Image {
                width,
                height,
                bits_per_component,
            } => {
                self.dict.insert(Name::new("Type"), Object::Name(Name::new("XObject")));
                self.dict
                    .insert(Name::new("Subtype"), Object::Name(Name::new("Image")));
                self.dict.insert(Name::new("Width"), Object::Int(width));
                self.dict.insert(Name::new("Height"), Object::Int(height));
                self.dict
                    .insert(Name::new("BitsPerComponent"), Object::Int(bits_per_component));
            }
            StreamKind::FontFile => {
                // Length1 is the size of the font program before filtering
                self.dict
                    .insert(Name::new("Length1"), Object::Int(raw_len as i64));
            }
        }

        self.output = Some(Bytes::from(encoded));
        self.state = StreamState::Finalized;
        Ok(())
    }

    /// Filtered payload; only present once finalized
    pub fn payload(&self) -> Option<&Bytes> {
        self.output.as_ref()
    }

    pub(crate) fn mark_written(&mut self) {
        self.state = StreamState::Written;
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("state", &self.state)
            .field("content_len", &self.content.len())
            .field("filters", &self.filters.len())
            .finish()
    }
}

/// What occupies an allocated object number
#[derive(Debug)]
pub enum Slot {
    /// Number handed out, body not yet provided
    Reserved,
    /// A plain body object
    Body(Object),
    /// A stream entity
    Stream(Stream),
}

/// The object registry and allocator
///
/// One document, one counter: numbers come from this instance only and are
/// never shared with another document.
#[derive(Debug)]
pub struct Document {
    options: DocumentOptions,
    // slot i holds object number i + 1
    slots: Vec<Slot>,
    root: Option<ObjRef>,
}

impl Document {
    pub fn new() -> Self {
        Self::with_options(DocumentOptions::default())
    }

    pub fn with_options(options: DocumentOptions) -> Self {
        Self {
            options,
            slots: Vec::new(),
            root: None,
        }
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Highest object number allocated so far
    pub fn high_water(&self) -> i32 {
        self.slots.len() as i32
    }

    /// Reserve the next object number with no body yet.
    ///
    /// The returned reference may be embedded in other objects immediately;
    /// the body must arrive via [`fill`](Self::fill) before serialization.
    pub fn alloc(&mut self) -> ObjRef {
        self.slots.push(Slot::Reserved);
        let num = self.slots.len() as i32;
        debug!(num, "object number reserved");
        ObjRef::new(num, 0)
    }

    /// Provide the body for a previously reserved number
    pub fn fill(&mut self, r: ObjRef, body: Object) -> Result<()> {
        let slot = self.slot_mut(r)?;
        match slot {
            Slot::Reserved => {
                *slot = Slot::Body(body);
                Ok(())
            }
            _ => Err(Error::argument(format!(
                "object {} already has a body",
                r.num
            ))),
        }
    }

    /// Allocate a number and store the body in one step
    pub fn add_object(&mut self, body: Object) -> ObjRef {
        let r = self.alloc();
        self.slots[(r.num - 1) as usize] = Slot::Body(body);
        r
    }

    /// Allocate a number for a new stream with the given dictionary entries
    pub fn add_stream(&mut self, dict: Dict, kind: StreamKind) -> ObjRef {
        let r = self.alloc();
        let stream = Stream::new(dict, kind, self.options.spool_threshold);
        self.slots[(r.num - 1) as usize] = Slot::Stream(stream);
        r
    }

    /// Mutable access to a stream entity by reference
    pub fn stream_mut(&mut self, r: ObjRef) -> Result<&mut Stream> {
        match self.slot_mut(r)? {
            Slot::Stream(s) => Ok(s),
            _ => Err(Error::argument(format!("object {} is not a stream", r.num))),
        }
    }

    pub fn set_root(&mut self, r: ObjRef) {
        self.root = Some(r);
    }

    pub fn root(&self) -> Option<ObjRef> {
        self.root
    }

    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    fn slot_mut(&mut self, r: ObjRef) -> Result<&mut Slot> {
        if r.num < 1 || r.num > self.slots.len() as i32 {
            return Err(Error::argument(format!(
                "object number {} was never allocated",
                r.num
            )));
        }
        Ok(&mut self.slots[(r.num - 1) as usize])
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
