//! A small cell-flow PDF composer.
//!
//! Content is laid out in millimetres on an A4 portrait page, cell by cell,
//! with a cursor that moves right after each cell or down to the next line.
//! Headers and footers are plain callbacks handed to [`DocumentComposer::new`];
//! the composer runs them whenever a page opens or closes, including pages
//! opened by an automatic break.

use std::fmt::Write as _;

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use super::fonts::{FontStyle, encode_win_ansi};
use crate::error::PayslipError;

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;

const PT_PER_MM: f32 = 72.0 / 25.4;
const MARGIN: f32 = 10.0;
const BREAK_MARGIN: f32 = 20.0;
const CELL_PADDING: f32 = 1.0;
const LINE_WIDTH: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// How a cell is drawn and where the cursor goes afterwards.
#[derive(Debug, Clone, Copy)]
pub struct CellStyle {
    border: bool,
    align: Align,
    line_break: bool,
}

impl CellStyle {
    pub fn plain() -> Self {
        Self {
            border: false,
            align: Align::Left,
            line_break: false,
        }
    }

    pub fn bordered() -> Self {
        Self {
            border: true,
            ..Self::plain()
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Move to the left margin below the cell instead of to its right.
    pub fn line_break(mut self) -> Self {
        self.line_break = true;
        self
    }
}

/// Drawing surface handed to page hooks. It never breaks pages by itself.
#[derive(Debug)]
pub struct PageCanvas {
    pages: Vec<Vec<u8>>,
    x: f32,
    y: f32,
    last_height: f32,
    font: FontStyle,
    font_size: f32,
}

impl PageCanvas {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            x: MARGIN,
            y: MARGIN,
            last_height: 0.0,
            font: FontStyle::Regular,
            font_size: 12.0,
        }
    }

    /// 1-based number of the page being drawn.
    pub fn page_no(&self) -> usize {
        self.pages.len()
    }

    #[cfg(test)]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[cfg(test)]
    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn font(&self) -> (FontStyle, f32) {
        (self.font, self.font_size)
    }

    /// Select the face and its size in points.
    pub fn set_font(&mut self, style: FontStyle, size: f32) {
        self.font = style;
        self.font_size = size;
    }

    /// Jump to `y` at the left margin; negative values count from the bottom edge.
    pub fn set_y(&mut self, y: f32) {
        self.x = MARGIN;
        self.y = if y >= 0.0 { y } else { PAGE_HEIGHT + y };
    }

    pub fn ln(&mut self, h: f32) {
        self.x = MARGIN;
        self.y += h;
    }

    /// Line break by the height of the last cell.
    pub fn newline(&mut self) {
        self.ln(self.last_height);
    }

    #[cfg(test)]
    /// Width of `text` in millimetres in the current font.
    pub fn text_width(&self, text: &str) -> f32 {
        self.font.text_width(&encode_win_ansi(text), self.font_size) / PT_PER_MM
    }

    /// Draw a `w`×`h` cell at the cursor. A width of zero runs to the right margin.
    pub fn cell(&mut self, w: f32, h: f32, text: &str, style: CellStyle) {
        let w = if w == 0.0 {
            PAGE_WIDTH - MARGIN - self.x
        } else {
            w
        };

        let mut ops = String::new();
        if style.border {
            let _ = writeln!(
                ops,
                "{:.2} {:.2} {:.2} {:.2} re S",
                self.x * PT_PER_MM,
                (PAGE_HEIGHT - self.y - h) * PT_PER_MM,
                w * PT_PER_MM,
                h * PT_PER_MM,
            );
        }

        let mut bytes = ops.into_bytes();
        if !text.is_empty() {
            let encoded = encode_win_ansi(text);
            let text_w = self.font.text_width(&encoded, self.font_size) / PT_PER_MM;
            let dx = match style.align {
                Align::Left => CELL_PADDING,
                Align::Center => (w - text_w) / 2.0,
                Align::Right => w - CELL_PADDING - text_w,
            };
            let baseline = self.y + 0.5 * h + 0.3 * (self.font_size / PT_PER_MM);

            bytes.extend_from_slice(
                format!(
                    "BT /{} {:.2} Tf {:.2} {:.2} Td (",
                    self.font.resource_name(),
                    self.font_size,
                    (self.x + dx) * PT_PER_MM,
                    (PAGE_HEIGHT - baseline) * PT_PER_MM,
                )
                .as_bytes(),
            );
            escape_literal(&encoded, &mut bytes);
            bytes.extend_from_slice(b") Tj ET\n");
        }
        self.emit(&bytes);

        self.last_height = h;
        if style.line_break {
            self.x = MARGIN;
            self.y += h;
        } else {
            self.x += w;
        }
    }

    fn begin_page(&mut self) {
        self.pages.push(Vec::new());
        self.x = MARGIN;
        self.y = MARGIN;
        self.emit(format!("{:.2} w\n", LINE_WIDTH * PT_PER_MM).as_bytes());
    }

    fn fits(&self, h: f32) -> bool {
        self.y + h <= PAGE_HEIGHT - BREAK_MARGIN
    }

    fn emit(&mut self, bytes: &[u8]) {
        if let Some(page) = self.pages.last_mut() {
            page.extend_from_slice(bytes);
        }
    }
}

fn escape_literal(text: &[u8], out: &mut Vec<u8>) {
    for &b in text {
        if matches!(b, b'\\' | b'(' | b')') {
            out.push(b'\\');
        }
        out.push(b);
    }
}

pub type PageHook = Box<dyn Fn(&mut PageCanvas)>;

/// Builds a multi-page document, running the header hook at the top of every
/// page and the footer hook before every page is closed.
pub struct DocumentComposer {
    canvas: PageCanvas,
    header: Option<PageHook>,
    footer: Option<PageHook>,
}

impl DocumentComposer {
    pub fn new(header: PageHook, footer: PageHook) -> Self {
        Self {
            canvas: PageCanvas::new(),
            header: Some(header),
            footer: Some(footer),
        }
    }

    #[cfg(test)]
    /// A composer with neither header nor footer.
    pub fn bare() -> Self {
        Self {
            canvas: PageCanvas::new(),
            header: None,
            footer: None,
        }
    }

    #[cfg(test)]
    pub fn page_count(&self) -> usize {
        self.canvas.page_no()
    }

    #[cfg(test)]
    pub fn canvas(&self) -> &PageCanvas {
        &self.canvas
    }

    pub fn add_page(&mut self) {
        if self.canvas.page_no() > 0 {
            self.run_footer();
        }

        let (font, size) = self.canvas.font();
        self.canvas.begin_page();
        if let Some(header) = &self.header {
            header(&mut self.canvas);
        }
        self.canvas.set_font(font, size);
    }

    fn run_footer(&mut self) {
        let (font, size) = self.canvas.font();
        if let Some(footer) = &self.footer {
            footer(&mut self.canvas);
        }
        self.canvas.set_font(font, size);
    }

    pub fn set_font(&mut self, style: FontStyle, size: f32) {
        self.canvas.set_font(style, size);
    }

    pub fn ln(&mut self, h: f32) {
        self.canvas.ln(h);
    }

    pub fn newline(&mut self) {
        self.canvas.newline();
    }

    /// Draw a cell, first opening a new page if it would cross the break line.
    pub fn cell(&mut self, w: f32, h: f32, text: &str, style: CellStyle) {
        if self.canvas.page_no() == 0 {
            self.add_page();
        }
        if !self.canvas.fits(h) {
            let x = self.canvas.x;
            self.add_page();
            self.canvas.x = x;
        }
        self.canvas.cell(w, h, text, style);
    }

    /// Close the last page and serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>, PayslipError> {
        if self.canvas.page_no() == 0 {
            self.add_page();
        }
        self.run_footer();
        write_document(&self.canvas.pages)
    }
}

fn render_error(e: impl std::fmt::Display) -> PayslipError {
    PayslipError::Render {
        reason: e.to_string(),
    }
}

fn write_document(pages: &[Vec<u8>]) -> Result<Vec<u8>, PayslipError> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for style in FontStyle::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => style.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(style.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids = Vec::with_capacity(pages.len());
    for content in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.clone()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = Object::Integer(kids.len() as i64);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            // A4 in points
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(595.28),
                Object::Real(841.89),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(render_error)?;
    Ok(out)
}
