//! PDF content streams to positioned page layouts
//!
//! Interprets the text and path operators of each page's content stream with
//! `lopdf`. Strings are decoded through the font set by `Tf` and advanced by
//! its glyph widths, so words land where the page draws them.

use super::fonts::{page_fonts, Font, Glyph};
use super::layout::{BBox, PageLayout, Ruling, Word};
use crate::error::{DocRagError, Result};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Segments closer to axis-aligned than this count as rulings
const AXIS_TOLERANCE: f64 = 1.0;

/// US Letter, used when a page has no usable MediaBox
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `a` applied first, then `b`
fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn transform(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn translation(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn numbers(operands: &[Object]) -> Vec<f64> {
    operands.iter().filter_map(number).collect()
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Vec<u8>,
    font_size: f64,
    leading: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
}

/// Content-stream interpreter for one page
struct PageInterpreter<'a> {
    fonts: HashMap<Vec<u8>, Font<'a>>,
    fallback_font: Font<'a>,
    height: f64,
    origin: (f64, f64),
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    path: Vec<((f64, f64), (f64, f64))>,
    rects: Vec<[(f64, f64); 4]>,
    subpath_start: Option<(f64, f64)>,
    current: Option<(f64, f64)>,
    words: Vec<Word>,
    rulings: Vec<Ruling>,
}

impl<'a> PageInterpreter<'a> {
    fn new(media_box: [f64; 4]) -> Self {
        Self {
            fonts: HashMap::new(),
            fallback_font: Font::default(),
            height: media_box[3] - media_box[1],
            origin: (media_box[0], media_box[1]),
            state: GraphicsState {
                ctm: IDENTITY,
                font: Vec::new(),
                font_size: 12.0,
                leading: 0.0,
                char_spacing: 0.0,
                word_spacing: 0.0,
                horizontal_scale: 1.0,
            },
            stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            path: Vec::new(),
            rects: Vec::new(),
            subpath_start: None,
            current: None,
            words: Vec::new(),
            rulings: Vec::new(),
        }
    }

    fn with_fonts(mut self, fonts: HashMap<Vec<u8>, Font<'a>>) -> Self {
        self.fonts = fonts;
        self
    }

    fn current_font(&self) -> &Font<'a> {
        self.fonts.get(&self.state.font).unwrap_or(&self.fallback_font)
    }

    /// Device space to top-left page coordinates
    fn to_page(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.origin.0, self.height - (y - self.origin.1))
    }

    fn user_point(&self, x: f64, y: f64) -> (f64, f64) {
        transform(&self.state.ctm, x, y)
    }

    fn move_text(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.move_text(0.0, -leading);
    }

    /// Place the words of a shown string at the current text position and advance it
    fn show_text(&mut self, bytes: &[u8]) {
        let glyphs = self.current_font().glyphs(bytes);
        let rendering = multiply(&self.text_matrix, &self.state.ctm);
        let y_scale = (rendering[2].powi(2) + rendering[3].powi(2)).sqrt();
        let size = self.state.font_size * y_scale;

        let mut advance = 0.0;
        let mut word = String::new();
        let mut word_start = 0.0;
        for glyph in &glyphs {
            let breaks = !glyph.text.is_empty()
                && glyph.text.chars().all(|c| c.is_whitespace() || c.is_control());
            if breaks {
                self.push_word(&mut word, &rendering, word_start, advance, size);
            } else if !glyph.text.is_empty() {
                if word.is_empty() {
                    word_start = advance;
                }
                word.extend(glyph.text.chars().filter(|c| !c.is_control()));
            }
            advance += self.glyph_advance(glyph);
        }
        self.push_word(&mut word, &rendering, word_start, advance, size);

        self.text_matrix = multiply(&translation(advance, 0.0), &self.text_matrix);
    }

    /// Horizontal displacement in text space
    fn glyph_advance(&self, glyph: &Glyph) -> f64 {
        let mut spacing = self.state.char_spacing;
        if glyph.is_space {
            spacing += self.state.word_spacing;
        }
        (glyph.width * self.state.font_size + spacing) * self.state.horizontal_scale
    }

    /// `start` and `end` are text-space offsets along the baseline
    fn push_word(
        &mut self,
        word: &mut String,
        rendering: &Matrix,
        start: f64,
        end: f64,
        size: f64,
    ) {
        if word.is_empty() {
            return;
        }
        let (sx, sy) = transform(rendering, start, 0.0);
        let (ex, ey) = transform(rendering, end, 0.0);
        let (x0, baseline) = self.to_page(sx, sy);
        let (x1, _) = self.to_page(ex, ey);
        self.words.push(Word::new(
            std::mem::take(word),
            BBox::new(x0.min(x1), baseline - size, x0.max(x1), baseline),
        ));
    }

    fn show_array(&mut self, items: &[Object]) {
        for item in items {
            match item {
                Object::String(bytes, _) => self.show_text(bytes),
                other => {
                    // Kerning in thousandths of an em; each string starts its
                    // own word and close neighbours are glued on extraction
                    if let Some(adjust) = number(other) {
                        let shift =
                            -adjust / 1000.0 * self.state.font_size * self.state.horizontal_scale;
                        self.text_matrix = multiply(&translation(shift, 0.0), &self.text_matrix);
                    }
                }
            }
        }
    }

    fn add_segment(&mut self, to: (f64, f64)) {
        if let Some(from) = self.current {
            self.path.push((from, to));
        }
        self.current = Some(to);
    }

    fn paint(&mut self, stroke: bool) {
        let mut segments: Vec<((f64, f64), (f64, f64))> = Vec::new();
        for rect in &self.rects {
            for i in 0..4 {
                segments.push((rect[i], rect[(i + 1) % 4]));
            }
        }
        if stroke {
            segments.extend(self.path.iter().copied());
        }

        for ((x0, y0), (x1, y1)) in segments {
            let (px0, py0) = self.to_page(x0, y0);
            let (px1, py1) = self.to_page(x1, y1);
            if (py0 - py1).abs() <= AXIS_TOLERANCE || (px0 - px1).abs() <= AXIS_TOLERANCE {
                self.rulings.push(Ruling::new(px0, py0, px1, py1));
            }
        }
        self.clear_path();
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.rects.clear();
        self.subpath_start = None;
        self.current = None;
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        let n = numbers(operands);
        match operator {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
            "cm" if n.len() == 6 => {
                let m = [n[0], n[1], n[2], n[3], n[4], n[5]];
                self.state.ctm = multiply(&m, &self.state.ctm);
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.state.font = name.clone();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.state.font_size = size;
                }
            }
            "Tc" if !n.is_empty() => self.state.char_spacing = n[0],
            "Tw" if !n.is_empty() => self.state.word_spacing = n[0],
            "Tz" if !n.is_empty() => self.state.horizontal_scale = n[0] / 100.0,
            "TL" if !n.is_empty() => self.state.leading = n[0],
            "Td" if n.len() == 2 => self.move_text(n[0], n[1]),
            "TD" if n.len() == 2 => {
                self.state.leading = -n[1];
                self.move_text(n[0], n[1]);
            }
            "Tm" if n.len() == 6 => {
                self.line_matrix = [n[0], n[1], n[2], n[3], n[4], n[5]];
                self.text_matrix = self.line_matrix;
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show_text(bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show_text(bytes);
                }
            }
            "\"" => {
                if n.len() >= 2 {
                    self.state.word_spacing = n[0];
                    self.state.char_spacing = n[1];
                }
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show_text(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    self.show_array(items);
                }
            }
            "m" if n.len() == 2 => {
                let p = self.user_point(n[0], n[1]);
                self.subpath_start = Some(p);
                self.current = Some(p);
            }
            "l" if n.len() == 2 => {
                let p = self.user_point(n[0], n[1]);
                self.add_segment(p);
            }
            "c" if n.len() == 6 => {
                let p = self.user_point(n[4], n[5]);
                self.current = Some(p);
            }
            "v" | "y" if n.len() == 4 => {
                let p = self.user_point(n[2], n[3]);
                self.current = Some(p);
            }
            "h" => {
                if let Some(start) = self.subpath_start {
                    self.add_segment(start);
                }
            }
            "re" if n.len() == 4 => {
                let (x, y, w, h) = (n[0], n[1], n[2], n[3]);
                let corners = [
                    self.user_point(x, y),
                    self.user_point(x + w, y),
                    self.user_point(x + w, y + h),
                    self.user_point(x, y + h),
                ];
                self.rects.push(corners);
                self.subpath_start = Some(corners[0]);
                self.current = Some(corners[0]);
            }
            "S" | "s" | "B" | "B*" | "b" | "b*" => self.paint(true),
            "f" | "F" | "f*" => self.paint(false),
            "n" => self.clear_path(),
            _ => {}
        }
    }

    fn finish(self, page_number: usize, width: f64) -> PageLayout {
        PageLayout::new(page_number, width, self.height)
            .with_words(self.words)
            .with_rulings(self.rulings)
    }
}

/// Look up a page attribute, following the `Parent` chain for inherited keys
fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut dict = page;
    for _ in 0..32 {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

fn media_box(doc: &Document, page_id: ObjectId) -> [f64; 4] {
    let lookup = || -> Option<[f64; 4]> {
        let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
        let mut value = inherited(doc, page, b"MediaBox")?;
        if let Object::Reference(id) = value {
            value = doc.get_object(*id).ok()?;
        }
        let coords = numbers(value.as_array().ok()?);
        if coords.len() != 4 {
            return None;
        }
        Some([
            coords[0].min(coords[2]),
            coords[1].min(coords[3]),
            coords[0].max(coords[2]),
            coords[1].max(coords[3]),
        ])
    };
    lookup().unwrap_or(DEFAULT_MEDIA_BOX)
}

/// Parse every page of a PDF into positioned words and rulings
pub fn parse_pdf_layouts(bytes: &[u8]) -> Result<Vec<PageLayout>> {
    let doc = Document::load_mem(bytes)?;
    let mut pages = Vec::new();

    for (page_number, page_id) in doc.get_pages() {
        let bounds = media_box(&doc, page_id);
        let mut interpreter = PageInterpreter::new(bounds).with_fonts(page_fonts(&doc, page_id));

        match doc.get_page_content(page_id) {
            Ok(content) => match Content::decode(&content) {
                Ok(content) => {
                    for op in &content.operations {
                        interpreter.apply(&op.operator, &op.operands);
                    }
                }
                Err(e) => warn!("Page {}: undecodable content stream: {}", page_number, e),
            },
            Err(e) => warn!("Page {}: no content stream: {}", page_number, e),
        }

        let layout = interpreter.finish(page_number as usize, bounds[2] - bounds[0]);
        debug!(
            "Page {}: {} words, {} rulings",
            page_number,
            layout.words.len(),
            layout.rulings.len()
        );
        pages.push(layout);
    }

    if pages.is_empty() {
        return Err(DocRagError::Pdf("PDF has no pages".to_string()));
    }
    Ok(pages)
}
