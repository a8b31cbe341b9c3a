//! Appearance stream content builders
//!
//! Every builder works in the widget's own coordinate space: origin at the
//! lower-left corner of the box, `width` x `height` in size.

use super::da::{Color, DefaultAppearance};
use super::FONT_RESOURCE;
use crate::fonts::EmbeddedFont;
use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

pub const MIN_FONT_SIZE: f64 = 4.0;
pub const MAX_FONT_SIZE: f64 = 500.0;
/// Size used for auto-sized multiline and list content before shrinking.
const PREFERRED_FONT_SIZE: f64 = 12.0;

const SELECTION_COLOR: Color = Color::Rgb(153.0 / 255.0, 193.0 / 255.0, 218.0 / 255.0);

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn rect_op(x: f64, y: f64, w: f64, h: f64) -> Operation {
    op("re", vec![real(x), real(y), real(w), real(h)])
}

/// Widget box with its `/MK` colours and `/BS` border width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub border_width: f64,
    pub background: Option<Color>,
    pub border: Option<Color>,
}

impl Frame {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            border_width: 0.0,
            background: None,
            border: None,
        }
    }

    fn effective_border(&self) -> f64 {
        if self.border.is_some() {
            self.border_width
        } else {
            0.0
        }
    }

    /// Content box inside the border, shrunk by `padding` on each side.
    fn inner(&self, padding: f64) -> (f64, f64, f64, f64) {
        let inset = self.effective_border() + padding;
        (
            inset,
            inset,
            (self.width - 2.0 * inset).max(0.0),
            (self.height - 2.0 * inset).max(0.0),
        )
    }
}

/// Background fill and border stroke.
pub fn frame_ops(frame: &Frame) -> Vec<Operation> {
    let mut ops = Vec::new();
    if let Some(background) = frame.background {
        ops.push(background.fill());
        ops.push(rect_op(0.0, 0.0, frame.width, frame.height));
        ops.push(op("f", vec![]));
    }
    let bw = frame.effective_border();
    if let (Some(border), true) = (frame.border, bw > 0.0) {
        ops.push(border.stroke());
        ops.push(op("w", vec![real(bw)]));
        ops.push(rect_op(bw / 2.0, bw / 2.0, frame.width - bw, frame.height - bw));
        ops.push(op("S", vec![]));
    }
    ops
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// From a `/Q` quadding value.
    pub fn from_quadding(q: i64) -> Self {
        match q {
            1 => Alignment::Center,
            2 => Alignment::Right,
            _ => Alignment::Left,
        }
    }

    fn offset(self, available: f64, used: f64) -> f64 {
        match self {
            Alignment::Left => 0.0,
            Alignment::Center => (available - used) / 2.0,
            Alignment::Right => available - used,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextLayout {
    pub alignment: Alignment,
    pub multiline: bool,
    /// Number of comb cells, when the field is combed.
    pub comb: Option<usize>,
}

fn clamp_size(size: f64) -> f64 {
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Greedy word wrap. Words longer than a line are broken by character.
pub fn wrap_lines(font: &EmbeddedFont, text: &str, size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split(['\n', '\r']) {
        let mut line = String::new();
        for word in paragraph.split(' ') {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if font.width_of(&candidate, size) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            for ch in word.chars() {
                line.push(ch);
                if font.width_of(&line, size) > max_width && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::replace(&mut line, ch.to_string()));
                }
            }
        }
        lines.push(line);
    }
    lines
}

fn show_text(font: &EmbeddedFont, text: &str, x: f64, y: f64) -> [Operation; 2] {
    [
        op("Tm", vec![real(1.0), real(0.0), real(0.0), real(1.0), real(x), real(y)]),
        op(
            "Tj",
            vec![Object::String(font.encode(text), StringFormat::Hexadecimal)],
        ),
    ]
}

fn begin_text(font_size: f64, color: Color) -> Vec<Operation> {
    vec![
        op("BT", vec![]),
        op(
            "Tf",
            vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), real(font_size)],
        ),
        color.fill(),
    ]
}

/// Baseline that centres one line of `size` vertically in a box.
fn centred_baseline(font: &EmbeddedFont, size: f64, y: f64, height: f64) -> f64 {
    y + (height - font.height_at_size(size)) / 2.0 - font.descent_at_size(size)
}

/// Marked, clipped text content for a text or combo box.
pub fn text_ops(
    font: &EmbeddedFont,
    frame: &Frame,
    da: &DefaultAppearance,
    text: &str,
    layout: TextLayout,
) -> Vec<Operation> {
    let padding = if layout.comb.is_some() { 0.0 } else { 1.0 };
    let (x, y, w, h) = frame.inner(padding);
    let text_padding = if layout.comb.is_some() { 0.0 } else { 1.0 };

    let mut ops = frame_ops(frame);
    ops.push(op("BMC", vec![Object::Name(b"Tx".to_vec())]));
    ops.push(op("q", vec![]));
    ops.push(rect_op(x, y, w, h));
    ops.push(op("W", vec![]));
    ops.push(op("n", vec![]));

    if !text.is_empty() {
        match (layout.comb, layout.multiline) {
            (Some(cells), _) if cells > 0 => {
                let cell_width = w / cells as f64;
                let size = if da.is_auto_size() {
                    let widest = text
                        .chars()
                        .map(|c| font.width_of(&c.to_string(), 1.0))
                        .fold(0.0, f64::max);
                    let by_width = if widest > 0.0 { cell_width / widest } else { MAX_FONT_SIZE };
                    clamp_size(font.size_for_height(h).min(by_width))
                } else {
                    da.font_size
                };
                let baseline = centred_baseline(font, size, y, h);
                ops.extend(begin_text(size, da.color));
                for (i, ch) in text.chars().take(cells).enumerate() {
                    let glyph = ch.to_string();
                    let gx = x + i as f64 * cell_width + (cell_width - font.width_of(&glyph, size)) / 2.0;
                    ops.extend(show_text(font, &glyph, gx, baseline));
                }
                ops.push(op("ET", vec![]));
            }
            (_, true) => {
                let usable = (w - 2.0 * text_padding).max(0.0);
                let mut size = if da.is_auto_size() {
                    clamp_size(PREFERRED_FONT_SIZE.min(font.size_for_height(h)))
                } else {
                    da.font_size
                };
                let mut lines = wrap_lines(font, text, size, usable);
                if da.is_auto_size() {
                    while size > MIN_FONT_SIZE && lines.len() as f64 * font.height_at_size(size) > h {
                        size = (size - 1.0).max(MIN_FONT_SIZE);
                        lines = wrap_lines(font, text, size, usable);
                    }
                }
                let line_height = font.height_at_size(size);
                ops.extend(begin_text(size, da.color));
                let mut top = y + h;
                for line in &lines {
                    let baseline = top - font.ascent_at_size(size);
                    let lx = x + text_padding + layout.alignment.offset(usable, font.width_of(line, size));
                    ops.extend(show_text(font, line, lx, baseline));
                    top -= line_height;
                }
                ops.push(op("ET", vec![]));
            }
            _ => {
                let line: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
                let usable = (w - 2.0 * text_padding).max(0.0);
                let size = if da.is_auto_size() {
                    let unit_width = font.width_of(&line, 1.0);
                    let by_width = if unit_width > 0.0 { usable / unit_width } else { MAX_FONT_SIZE };
                    clamp_size(font.size_for_height(h).min(by_width))
                } else {
                    da.font_size
                };
                let baseline = centred_baseline(font, size, y, h);
                let lx = x + text_padding + layout.alignment.offset(usable, font.width_of(&line, size));
                ops.extend(begin_text(size, da.color));
                ops.extend(show_text(font, &line, lx, baseline));
                ops.push(op("ET", vec![]));
            }
        }
    }

    ops.push(op("Q", vec![]));
    ops.push(op("EMC", vec![]));
    ops
}

/// List box rows starting at `top_index`, selected rows highlighted.
pub fn list_ops(
    font: &EmbeddedFont,
    frame: &Frame,
    da: &DefaultAppearance,
    options: &[String],
    selected: &[usize],
    top_index: usize,
) -> Vec<Operation> {
    let (x, y, w, h) = frame.inner(1.0);
    let size = if da.is_auto_size() {
        let widest = options
            .iter()
            .map(|o| font.width_of(o, 1.0))
            .fold(0.0, f64::max);
        let by_width = if widest > 0.0 { (w - 2.0) / widest } else { PREFERRED_FONT_SIZE };
        clamp_size(PREFERRED_FONT_SIZE.min(by_width))
    } else {
        da.font_size
    };
    let line_height = font.height_at_size(size);

    let mut ops = frame_ops(frame);
    ops.push(op("BMC", vec![Object::Name(b"Tx".to_vec())]));
    ops.push(op("q", vec![]));
    ops.push(rect_op(x, y, w, h));
    ops.push(op("W", vec![]));
    ops.push(op("n", vec![]));

    let visible: Vec<(usize, &String)> = options
        .iter()
        .enumerate()
        .skip(top_index)
        .take_while(|(i, _)| (*i - top_index) as f64 * line_height < h)
        .collect();

    let top = y + h;
    for (i, _) in &visible {
        if selected.contains(i) {
            let row_top = top - (*i - top_index) as f64 * line_height;
            ops.push(SELECTION_COLOR.fill());
            ops.push(rect_op(x, row_top - line_height, w, line_height));
            ops.push(op("f", vec![]));
        }
    }

    if !visible.is_empty() {
        ops.extend(begin_text(size, da.color));
        for (i, option) in &visible {
            let row_top = top - (*i - top_index) as f64 * line_height;
            ops.extend(show_text(font, option, x + 1.0, row_top - font.ascent_at_size(size)));
        }
        ops.push(op("ET", vec![]));
    }

    ops.push(op("Q", vec![]));
    ops.push(op("EMC", vec![]));
    ops
}

/// Check mark polyline in the DA colour.
pub fn check_ops(frame: &Frame, color: Color) -> Vec<Operation> {
    let (x, y, w, h) = frame.inner(0.0);
    let mut ops = frame_ops(frame);
    ops.push(op("q", vec![]));
    ops.push(color.stroke());
    ops.push(op("w", vec![real((w.min(h) * 0.1).max(0.5))]));
    ops.push(op("m", vec![real(x + w * 0.2), real(y + h * 0.5)]));
    ops.push(op("l", vec![real(x + w * 0.4), real(y + h * 0.2)]));
    ops.push(op("l", vec![real(x + w * 0.8), real(y + h * 0.8)]));
    ops.push(op("S", vec![]));
    ops.push(op("Q", vec![]));
    ops
}

/// Four Bezier segments approximating a circle.
fn circle_path(cx: f64, cy: f64, r: f64) -> Vec<Operation> {
    let k = 0.552_284_7 * r;
    let point = |x: f64, y: f64| vec![real(x), real(y)];
    let curve = |pts: [f64; 6]| op("c", pts.iter().map(|v| real(*v)).collect());
    vec![
        op("m", point(cx + r, cy)),
        curve([cx + r, cy + k, cx + k, cy + r, cx, cy + r]),
        curve([cx - k, cy + r, cx - r, cy + k, cx - r, cy]),
        curve([cx - r, cy - k, cx - k, cy - r, cx, cy - r]),
        curve([cx + k, cy - r, cx + r, cy - k, cx + r, cy]),
    ]
}

/// Round frame for radio widgets.
fn round_frame_ops(frame: &Frame) -> Vec<Operation> {
    let cx = frame.width / 2.0;
    let cy = frame.height / 2.0;
    let bw = frame.effective_border();
    let radius = (frame.width.min(frame.height) / 2.0 - bw / 2.0).max(0.0);

    let mut ops = Vec::new();
    if let Some(background) = frame.background {
        ops.push(background.fill());
        ops.extend(circle_path(cx, cy, radius));
        ops.push(op("f", vec![]));
    }
    if let (Some(border), true) = (frame.border, bw > 0.0) {
        ops.push(border.stroke());
        ops.push(op("w", vec![real(bw)]));
        ops.extend(circle_path(cx, cy, radius));
        ops.push(op("S", vec![]));
    }
    ops
}

/// Filled dot for a selected radio widget.
pub fn radio_on_ops(frame: &Frame, color: Color) -> Vec<Operation> {
    let mut ops = round_frame_ops(frame);
    let (_, _, w, h) = frame.inner(0.0);
    let radius = w.min(h) / 4.0;
    ops.push(op("q", vec![]));
    ops.push(color.fill());
    ops.extend(circle_path(frame.width / 2.0, frame.height / 2.0, radius));
    ops.push(op("f", vec![]));
    ops.push(op("Q", vec![]));
    ops
}

pub fn radio_off_ops(frame: &Frame) -> Vec<Operation> {
    round_frame_ops(frame)
}

/// Push button face with a centred caption.
pub fn button_ops(font: &EmbeddedFont, frame: &Frame, da: &DefaultAppearance, caption: &str) -> Vec<Operation> {
    let (x, y, w, h) = frame.inner(1.0);
    let mut ops = frame_ops(frame);
    if caption.is_empty() {
        return ops;
    }
    let size = if da.is_auto_size() {
        let unit_width = font.width_of(caption, 1.0);
        let by_width = if unit_width > 0.0 { w / unit_width } else { MAX_FONT_SIZE };
        clamp_size(PREFERRED_FONT_SIZE.min(font.size_for_height(h)).min(by_width))
    } else {
        da.font_size
    };
    let tx = x + Alignment::Center.offset(w, font.width_of(caption, size));
    let baseline = centred_baseline(font, size, y, h);
    ops.push(op("q", vec![]));
    ops.extend(begin_text(size, da.color));
    ops.extend(show_text(font, caption, tx, baseline));
    ops.push(op("ET", vec![]));
    ops.push(op("Q", vec![]));
    ops
}
