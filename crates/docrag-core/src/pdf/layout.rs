//! Positioned page content and text extraction from it
//!
//! Coordinates use a top-left origin: `top` grows downward, like a rendered
//! page.

use serde::Serialize;

/// Horizontal grid resolution for layout-preserving extraction (points per char)
const LAYOUT_X_DENSITY: f64 = 7.25;

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// A run of non-whitespace text with its bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
}

impl Word {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// A drawn horizontal or vertical line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ruling {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl Ruling {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0: x0.min(x1),
            top: top.min(bottom),
            x1: x0.max(x1),
            bottom: top.max(bottom),
        }
    }

    pub fn horizontal(x0: f64, x1: f64, y: f64) -> Self {
        Self::new(x0, y, x1, y)
    }

    pub fn vertical(x: f64, top: f64, bottom: f64) -> Self {
        Self::new(x, top, x, bottom)
    }

    pub fn is_horizontal(&self) -> bool {
        self.height() <= self.width()
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Everything the router and page strategies need from one page
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    /// 1-based
    pub page_number: usize,
    pub width: f64,
    pub height: f64,
    pub words: Vec<Word>,
    pub rulings: Vec<Ruling>,
}

impl PageLayout {
    pub fn new(page_number: usize, width: f64, height: f64) -> Self {
        Self {
            page_number,
            width,
            height,
            words: Vec::new(),
            rulings: Vec::new(),
        }
    }

    pub fn with_words(mut self, words: Vec<Word>) -> Self {
        self.words = words;
        self
    }

    pub fn with_rulings(mut self, rulings: Vec<Ruling>) -> Self {
        self.rulings = rulings;
        self
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Words whose vertical centre lies in `[top, bottom)`
    pub fn words_in_band(&self, top: f64, bottom: f64) -> Vec<&Word> {
        self.words
            .iter()
            .filter(|w| {
                let (_, cy) = w.bbox.center();
                cy >= top && cy < bottom
            })
            .collect()
    }

    /// Words whose centre lies inside `bbox`
    pub fn words_in(&self, bbox: &BBox) -> Vec<&Word> {
        self.words
            .iter()
            .filter(|w| {
                let (cx, cy) = w.bbox.center();
                bbox.contains_point(cx, cy)
            })
            .collect()
    }

    /// Reading-order text of the whole page
    pub fn extract_text(&self, x_tolerance: f64, y_tolerance: f64) -> String {
        let words: Vec<&Word> = self.words.iter().collect();
        extract_text(&words, x_tolerance, y_tolerance)
    }

    /// Layout-preserving text: each line is laid out on a character grid
    /// proportional to the page width, so separate columns stay apart
    pub fn extract_text_layout(&self, y_tolerance: f64) -> String {
        let words: Vec<&Word> = self.words.iter().collect();
        let mut lines = Vec::new();

        for line in cluster_lines(&words, y_tolerance) {
            let mut out = String::new();
            for word in line {
                let column = (word.bbox.x0 / LAYOUT_X_DENSITY).round().max(0.0) as usize;
                let current = out.chars().count();
                if current < column {
                    out.push_str(&" ".repeat(column - current));
                } else if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&word.text);
            }
            lines.push(out);
        }

        lines.join("\n")
    }
}

/// Simple reading-order extraction.
///
/// Words are grouped into lines by `top` within `y_tolerance`, sorted left to
/// right, and glued without a space when the horizontal gap is within
/// `x_tolerance`.
pub fn extract_text(words: &[&Word], x_tolerance: f64, y_tolerance: f64) -> String {
    cluster_lines(words, y_tolerance)
        .into_iter()
        .map(|line| {
            let mut out = String::new();
            let mut prev_x1: Option<f64> = None;
            for word in line {
                if let Some(x1) = prev_x1 {
                    if word.bbox.x0 - x1 > x_tolerance {
                        out.push(' ');
                    }
                }
                out.push_str(&word.text);
                prev_x1 = Some(word.bbox.x1);
            }
            out
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Group words into lines top to bottom, each line sorted left to right
fn cluster_lines<'a>(words: &[&'a Word], y_tolerance: f64) -> Vec<Vec<&'a Word>> {
    let mut sorted: Vec<&Word> = words.to_vec();
    sorted.sort_by(|a, b| a.bbox.top.total_cmp(&b.bbox.top));

    let mut lines: Vec<Vec<&Word>> = Vec::new();
    let mut line_top = f64::NEG_INFINITY;
    for word in sorted {
        match lines.last_mut() {
            Some(line) if word.bbox.top - line_top <= y_tolerance => line.push(word),
            _ => {
                line_top = word.bbox.top;
                lines.push(vec![word]);
            }
        }
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    }
    lines
}
