//! Minimal PDF 1.4 writer: text in the two base Helvetica faces and straight lines.
//!
//! No compression, no embedded fonts, no images. Coordinates are given from
//! the top-left corner like a canvas and flipped on output.

use std::fmt::Write as _;

/// One of the two standard fonts every reader ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Drawing operations for a single page.
#[derive(Debug, Default, Clone)]
pub struct Page {
    ops: String,
}

impl Page {
    /// Raw content stream, mostly for inspection in tests.
    pub fn content(&self) -> &str {
        &self.ops
    }
}

/// A document of equally sized pages.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    width: f32,
    height: f32,
    pages: Vec<Page>,
}

impl PdfDocument {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pages: Vec::new(),
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Starts a new page; later drawing calls go to it.
    pub fn start_page(&mut self) {
        self.pages.push(Page::default());
    }

    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Draws `text` with its baseline at `(x, y)`.
    pub fn text(&mut self, x: f32, y: f32, size: f32, font: Font, text: &str) {
        let y = self.height - y;
        let escaped = escape(text);
        let page = self.current();
        // Writing into a String cannot fail.
        let _ = writeln!(
            page.ops,
            "BT /{} {} Tf {} {} Td ({}) Tj ET",
            font.resource(),
            size,
            x,
            y,
            escaped
        );
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let (y1, y2) = (self.height - y1, self.height - y2);
        let page = self.current();
        let _ = writeln!(page.ops, "{} {} m {} {} l S", x1, y1, x2, y2);
    }

    /// Serializes the document, cross-reference table included.
    pub fn to_bytes(&self) -> Vec<u8> {
        let page_count = self.pages.len().max(1);
        let empty = [Page::default()];
        let pages: &[Page] = if self.pages.is_empty() {
            &empty
        } else {
            &self.pages
        };

        // 1 catalog, 2 page tree, 3-4 fonts, then a page and its content per page.
        let first_page_obj = 5;
        let kids: Vec<String> = (0..page_count)
            .map(|i| format!("{} 0 R", first_page_obj + i * 2))
            .collect();

        let mut objects: Vec<Vec<u8>> = vec![
            b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} /MediaBox [0 0 {} {}] >>",
                kids.join(" "),
                page_count,
                self.width,
                self.height
            )
            .into_bytes(),
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_vec(),
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        ];

        for (i, page) in pages.iter().enumerate() {
            let content_obj = first_page_obj + i * 2 + 1;
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                    content_obj
                )
                .into_bytes(),
            );

            let mut stream = format!("<< /Length {} >>\nstream\n", page.ops.len()).into_bytes();
            stream.extend_from_slice(page.ops.as_bytes());
            stream.extend_from_slice(b"\nendstream");
            objects.push(stream);
        }

        let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_at = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            let _ = writeln!(xref, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        );
        out.extend_from_slice(xref.as_bytes());
        out
    }
}

/// Escapes a string literal; characters outside printable ASCII become `?`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}
