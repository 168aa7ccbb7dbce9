//! Operation request fragments.
//!
//! Requests are built from fixed element templates with the argument values
//! interpolated in order. All text values are XML-escaped; element names and
//! ordering are part of the wire protocol and must not change.
use std::fmt::Write;

use quick_xml::escape::escape;

/// Builder for a single operation fragment, e.g. `<ns:logon>...</ns:logon>`.
pub(crate) struct OperationRequest {
    name: &'static str,
    buf: String,
}

impl OperationRequest {
    pub fn new(name: &'static str) -> Self {
        let mut buf = String::with_capacity(256);
        let _ = write!(buf, "<ns:{name}>");
        OperationRequest { name, buf }
    }

    /// An element carrying escaped text content.
    pub fn text(mut self, element: &str, value: &str) -> Self {
        let _ = write!(self.buf, "<{element}>{}</{element}>", escape(value));
        self
    }

    /// An element carrying a decimal number.
    pub fn uint(mut self, element: &str, value: u64) -> Self {
        let _ = write!(self.buf, "<{element}>{value}</{element}>");
        self
    }

    /// A self-closing empty element.
    pub fn empty(mut self, element: &str) -> Self {
        let _ = write!(self.buf, "<{element}/>");
        self
    }

    /// Open a container element, for array-valued arguments.
    pub fn begin(mut self, element: &str) -> Self {
        let _ = write!(self.buf, "<{element}>");
        self
    }

    /// Close a container element opened with [`OperationRequest::begin`].
    pub fn end(mut self, element: &str) -> Self {
        let _ = write!(self.buf, "</{element}>");
        self
    }

    pub fn finish(mut self) -> String {
        let _ = write!(self.buf, "</ns:{}>", self.name);
        self.buf
    }
}
