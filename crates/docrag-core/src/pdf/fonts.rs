//! Page font resources
//!
//! Each font named by `Tf` decodes shown strings into text and gives every
//! glyph its advance. Encodings and ToUnicode maps are resolved by `lopdf`;
//! fonts it cannot map fall back to [`decode_pdf_string`].

use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Glyph advance in em units when a font carries no widths
pub(crate) const DEFAULT_GLYPH_WIDTH: f64 = 0.5;

/// Windows-1252 characters at 0x80..=0x9F, where Latin-1 has C1 controls.
/// Unused codes map to the bullet, as WinAnsiEncoding does.
const WIN_ANSI_HIGH: [char; 32] = [
    '€', '•', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '•', 'Ž', '•', //
    '•', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '•', 'ž', 'Ÿ',
];

fn single_byte_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => WIN_ANSI_HIGH[(byte - 0x80) as usize],
        _ => byte as char,
    }
}

/// Decode a PDF string: UTF-16BE with BOM, else UTF-8, else WinAnsi
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().copied().map(single_byte_char).collect(),
    }
}

/// One shown glyph with its advance in em units
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Glyph {
    pub text: String,
    pub width: f64,
    /// Single-byte code 32, the only code word spacing applies to
    pub is_space: bool,
}

#[derive(Debug, Default)]
enum Widths {
    #[default]
    Unknown,
    Simple {
        first: u32,
        widths: Vec<f64>,
        missing: Option<f64>,
    },
    Cid {
        default: f64,
        widths: HashMap<u32, f64>,
    },
}

/// A font resource as used by the content-stream interpreter
#[derive(Debug)]
pub(crate) struct Font<'a> {
    encoding: Option<Encoding<'a>>,
    code_len: usize,
    widths: Widths,
}

impl Default for Font<'_> {
    fn default() -> Self {
        Self {
            encoding: None,
            code_len: 1,
            widths: Widths::Unknown,
        }
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    doc.dereference(obj).map(|(_, o)| o).unwrap_or(obj)
}

fn number(doc: &Document, obj: &Object) -> Option<f64> {
    resolve(doc, obj).as_float().ok().map(f64::from)
}

fn array<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Vec<Object>> {
    dict.get(key).ok().map(|o| resolve(doc, o)).and_then(|o| o.as_array().ok())
}

impl<'a> Font<'a> {
    pub fn from_dict(doc: &'a Document, dict: &'a Dictionary) -> Self {
        let composite = matches!(dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Type0"));
        let widths = if composite {
            descendant_font(doc, dict)
                .map(|cid_font| cid_widths(doc, cid_font))
                .unwrap_or_default()
        } else {
            simple_widths(doc, dict)
        };

        Self {
            encoding: font_encoding(doc, dict),
            code_len: if composite { 2 } else { 1 },
            widths,
        }
    }

    fn width(&self, code: u32) -> f64 {
        match &self.widths {
            Widths::Unknown => DEFAULT_GLYPH_WIDTH,
            Widths::Simple {
                first,
                widths,
                missing,
            } => code
                .checked_sub(*first)
                .and_then(|i| widths.get(i as usize).copied())
                .or(*missing)
                .unwrap_or(DEFAULT_GLYPH_WIDTH),
            Widths::Cid { default, widths } => widths.get(&code).copied().unwrap_or(*default),
        }
    }

    /// Split a shown string into glyphs
    pub fn glyphs(&self, bytes: &[u8]) -> Vec<Glyph> {
        match &self.encoding {
            Some(encoding) => bytes
                .chunks(self.code_len)
                .map(|code_bytes| {
                    let code = code_bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
                    let text = encoding
                        .bytes_to_string(code_bytes)
                        .unwrap_or_default()
                        .replace('\u{FFFD}', "");
                    Glyph {
                        text,
                        width: self.width(code),
                        is_space: self.code_len == 1 && code == 32,
                    }
                })
                .collect(),
            // CIDs without a Unicode map are glyph ids, not text
            None if self.code_len > 1 => bytes
                .chunks(self.code_len)
                .map(|code_bytes| {
                    let code = code_bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
                    Glyph {
                        text: String::new(),
                        width: self.width(code),
                        is_space: false,
                    }
                })
                .collect(),
            None => {
                let text = decode_pdf_string(bytes);
                if text.chars().count() == bytes.len() {
                    bytes
                        .iter()
                        .zip(text.chars())
                        .map(|(&b, ch)| Glyph {
                            text: ch.to_string(),
                            width: self.width(b as u32),
                            is_space: b == b' ',
                        })
                        .collect()
                } else {
                    text.chars()
                        .map(|ch| Glyph {
                            text: ch.to_string(),
                            width: DEFAULT_GLYPH_WIDTH,
                            is_space: ch == ' ',
                        })
                        .collect()
                }
            }
        }
    }
}

/// Encodings `lopdf` can decode; `None` when the font names none or an unsupported CMap
fn font_encoding<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<Encoding<'a>> {
    let named = matches!(dict.get(b"Encoding"), Ok(Object::Name(_)));
    if !named && !dict.has(b"ToUnicode") {
        return None;
    }
    match dict.get_font_encoding(doc) {
        Ok(encoding) if encoding.bytes_to_string(&[]).is_ok() => Some(encoding),
        Ok(encoding) => {
            debug!("Unsupported font encoding {:?}", encoding);
            None
        }
        Err(e) => {
            warn!("Font encoding unavailable: {}", e);
            None
        }
    }
}

fn descendant_font<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<&'a Dictionary> {
    let first = array(doc, dict, b"DescendantFonts")?.first()?;
    resolve(doc, first).as_dict().ok()
}

fn simple_widths(doc: &Document, dict: &Dictionary) -> Widths {
    let first = dict.get(b"FirstChar").ok().and_then(|o| number(doc, o));
    let list = array(doc, dict, b"Widths");
    match (first, list) {
        (Some(first), Some(list)) if first >= 0.0 => {
            let missing = dict
                .get_deref(b"FontDescriptor", doc)
                .and_then(Object::as_dict)
                .ok()
                .and_then(|d| d.get(b"MissingWidth").ok())
                .and_then(|o| number(doc, o))
                .map(|w| w / 1000.0);
            Widths::Simple {
                first: first as u32,
                widths: list
                    .iter()
                    .map(|o| number(doc, o).map_or(DEFAULT_GLYPH_WIDTH, |w| w / 1000.0))
                    .collect(),
                missing,
            }
        }
        _ => Widths::Unknown,
    }
}

/// `/W` holds `c [w1 w2 ...]` and `c_first c_last w` runs
fn cid_widths(doc: &Document, cid_font: &Dictionary) -> Widths {
    let default = cid_font
        .get(b"DW")
        .ok()
        .and_then(|o| number(doc, o))
        .unwrap_or(1000.0)
        / 1000.0;
    let mut widths = HashMap::new();

    if let Some(items) = array(doc, cid_font, b"W") {
        let mut i = 0;
        while i < items.len() {
            let first = match number(doc, &items[i]) {
                Some(first) if first >= 0.0 => first as u32,
                _ => break,
            };
            match items.get(i + 1).map(|o| resolve(doc, o)) {
                Some(Object::Array(list)) => {
                    for (k, w) in list.iter().enumerate() {
                        if let Some(w) = number(doc, w) {
                            widths.insert(first + k as u32, w / 1000.0);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let last = number(doc, last).map(|l| (l as u32).min(0xFFFF));
                    let w = items.get(i + 2).and_then(|o| number(doc, o));
                    if let (Some(last), Some(w)) = (last, w) {
                        for code in first..=last {
                            widths.insert(code, w / 1000.0);
                        }
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    Widths::Cid { default, widths }
}

/// Fonts of a page by resource name, inherited resources included
pub(crate) fn page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<Vec<u8>, Font<'_>> {
    match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts
            .into_iter()
            .map(|(name, dict)| (name, Font::from_dict(doc, dict)))
            .collect(),
        Err(e) => {
            warn!("Page fonts unavailable: {}", e);
            HashMap::new()
        }
    }
}
