//! Text layout engine: places parsed markdown lines inside a layer region.
//!
//! Layout is pure: [`layout`] turns lines into positioned [`Item`]s using a
//! [`Measure`] implementation, and [`draw`] paints them. Paragraphs are
//! wrapped once and the same wrapped lines drive both the height used for
//! vertical centering and the drawing, so the block is exactly centered.
//!
//! Vertical advance per line:
//!
//! | Line            | Advance                         |
//! |-----------------|---------------------------------|
//! | header level n  | `base * (2.0 - 0.2n) * 1.4`     |
//! | rule            | `base * 0.5`                    |
//! | blank           | `base * 1.2 * 0.5`              |
//! | wrapped line    | `base * 1.5`                    |

use image::Rgba;

use super::canvas::Canvas;
use super::font::{FontFace, TextStyle};
use super::markdown::{Line, LineKind};
use crate::cardstyle::{Align, Region};

const HEADER_ADVANCE: f32 = 1.4;
const RULE_ADVANCE: f32 = 0.5;
const RULE_OFFSET: f32 = 0.25;
const LINE_HEIGHT: f32 = 1.2;
const WRAPPED_ADVANCE: f32 = 1.5;

/// Rules are drawn in this gray regardless of the text color.
pub const RULE_COLOR: Rgba<u8> = Rgba([128, 128, 128, 255]);

/// Width measurement used for wrapping and alignment.
pub trait Measure {
    fn text_width(&self, text: &str, style: TextStyle) -> f32;
}

impl Measure for FontFace {
    fn text_width(&self, text: &str, style: TextStyle) -> f32 {
        FontFace::text_width(self, text, style)
    }
}

/// A positioned drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Text whose top-left corner is at `(x, y)`.
    Text {
        text: String,
        x: f32,
        y: f32,
        style: TextStyle,
    },
    /// Horizontal rule from `x0` to `x1` at height `y`.
    Rule { x0: f32, x1: f32, y: f32 },
}

/// Result of laying out a block of lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayout {
    pub items: Vec<Item>,
    /// Total block height, before centering.
    pub height: f32,
}

impl TextLayout {
    pub fn text_items(&self) -> impl Iterator<Item = (&str, f32, f32, TextStyle)> {
        self.items.iter().filter_map(|item| match item {
            Item::Text { text, x, y, style } => Some((text.as_str(), *x, *y, *style)),
            Item::Rule { .. } => None,
        })
    }
}

/// One styled piece of a wrapped line.
#[derive(Debug, Clone, PartialEq)]
struct Segment {
    text: String,
    style: TextStyle,
}

/// Laid-out form of a single input line, relative to its slot top.
enum Block {
    Header { text: String, style: TextStyle },
    Rule,
    Blank,
    Paragraph(Vec<Vec<Segment>>),
}

impl Block {
    fn advance(&self, base: f32) -> f32 {
        match self {
            Block::Header { style, .. } => style.size * HEADER_ADVANCE,
            Block::Rule => base * RULE_ADVANCE,
            Block::Blank => base * LINE_HEIGHT * 0.5,
            Block::Paragraph(lines) => lines.len() as f32 * base * WRAPPED_ADVANCE,
        }
    }
}

/// Lay out `lines` inside `region`, vertically centered.
///
/// `base` carries the layer font size plus its base weight and slant; run
/// styles add to it, never remove from it.
pub fn layout(
    lines: &[Line],
    region: &Region,
    align: Align,
    base: TextStyle,
    measure: &impl Measure,
) -> TextLayout {
    let width = region.width as f32;
    let blocks: Vec<Block> = lines
        .iter()
        .map(|line| build_block(line, width, base, measure))
        .collect();

    let height: f32 = blocks.iter().map(|b| b.advance(base.size)).sum();
    let x = region.x as f32;
    let mut y = region.y as f32 + (region.height as f32 - height) / 2.0;

    let mut items = Vec::new();
    for block in &blocks {
        match block {
            Block::Header { text, style } => {
                let line_width = measure.text_width(text, *style);
                items.push(Item::Text {
                    text: text.clone(),
                    x: aligned_x(x, width, line_width, align),
                    y,
                    style: *style,
                });
            }
            Block::Rule => items.push(Item::Rule {
                x0: x + width * 0.1,
                x1: x + width * 0.9,
                y: y + base.size * RULE_OFFSET,
            }),
            Block::Blank => {}
            Block::Paragraph(wrapped) => {
                let mut line_y = y;
                for segments in wrapped {
                    let line_width: f32 = segments
                        .iter()
                        .map(|s| measure.text_width(&s.text, s.style))
                        .sum();
                    let mut seg_x = aligned_x(x, width, line_width, align);
                    for seg in segments {
                        items.push(Item::Text {
                            text: seg.text.clone(),
                            x: seg_x,
                            y: line_y,
                            style: seg.style,
                        });
                        seg_x += measure.text_width(&seg.text, seg.style);
                    }
                    line_y += base.size * WRAPPED_ADVANCE;
                }
            }
        }
        y += block.advance(base.size);
    }

    TextLayout { items, height }
}

fn build_block(line: &Line, width: f32, base: TextStyle, measure: &impl Measure) -> Block {
    match line.kind {
        LineKind::Header(level) => Block::Header {
            text: line.runs.iter().map(|r| r.text.as_str()).collect(),
            style: TextStyle {
                size: base.size * (2.0 - level as f32 * 0.2),
                bold: true,
                italic: base.italic,
            },
        },
        LineKind::Rule => Block::Rule,
        LineKind::Normal if line.is_blank() => Block::Blank,
        LineKind::Normal => {
            let wrapped = wrap(line, width, base, measure);
            if wrapped.is_empty() {
                Block::Blank
            } else {
                Block::Paragraph(wrapped)
            }
        }
    }
}

/// Greedy word wrap across runs.
///
/// A word joins the current line (with a leading space) unless that would
/// overflow `width` and the line already has content. Adjacent words of the
/// same style are merged into one segment.
fn wrap(line: &Line, width: f32, base: TextStyle, measure: &impl Measure) -> Vec<Vec<Segment>> {
    let mut lines: Vec<Vec<Segment>> = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    let mut current_width = 0.0;

    for run in &line.runs {
        let style = TextStyle {
            size: base.size,
            bold: base.bold || run.bold,
            italic: base.italic || run.italic,
        };
        for word in run.text.split_whitespace() {
            let spaced = format!(" {}", word);
            let piece = if current.is_empty() { word } else { spaced.as_str() };
            let piece_width = measure.text_width(piece, style);

            if current_width + piece_width > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = measure.text_width(word, style);
                current.push(Segment {
                    text: word.to_string(),
                    style,
                });
                continue;
            }

            current_width += piece_width;
            match current.last_mut() {
                Some(last) if last.style == style => last.text.push_str(piece),
                _ => current.push(Segment {
                    text: piece.to_string(),
                    style,
                }),
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn aligned_x(x: f32, width: f32, line_width: f32, align: Align) -> f32 {
    match align {
        Align::Left => x,
        Align::Center => x + (width - line_width) / 2.0,
        Align::Right => x + width - line_width,
    }
}

/// Paint a layout onto the canvas.
///
/// Returns the number of text items drawn.
pub fn draw(canvas: &mut Canvas, layout: &TextLayout, face: &FontFace, color: Rgba<u8>) -> usize {
    let mut drawn = 0;
    for item in &layout.items {
        match item {
            Item::Text { text, x, y, style } => {
                let mask = face.rasterize(text, *style);
                canvas.draw_mask(&mask, x.round() as i32, y.round() as i32, color);
                drawn += 1;
            }
            Item::Rule { x0, x1, y } => {
                canvas.hline(x0.round() as i32, x1.round() as i32, y.round() as i32, 1, RULE_COLOR);
            }
        }
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::{BLACK, WHITE};
    use crate::render::markdown::parse;

    /// Every character is 10px wide, bold adds 1px per string.
    struct Fixed;

    impl Measure for Fixed {
        fn text_width(&self, text: &str, style: TextStyle) -> f32 {
            text.chars().count() as f32 * 10.0 + if style.bold { 1.0 } else { 0.0 }
        }
    }

    fn region(width: u32, height: u32) -> Region {
        Region {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    fn texts(layout: &TextLayout) -> Vec<(&str, f32, f32)> {
        layout.text_items().map(|(t, x, y, _)| (t, x, y)).collect()
    }

    #[test]
    fn test_single_line_centered() {
        let out = layout(
            &parse("abcd"),
            &region(100, 100),
            Align::Center,
            TextStyle::regular(20.0),
            &Fixed,
        );
        assert_eq!(out.height, 30.0);
        assert_eq!(texts(&out), vec![("abcd", 30.0, 35.0)]);
    }

    #[test]
    fn test_greedy_wrap() {
        // "aaa bbb" = 70px, " ccc" would make 110px > 100.
        let out = layout(
            &parse("aaa bbb ccc"),
            &region(100, 200),
            Align::Left,
            TextStyle::regular(10.0),
            &Fixed,
        );
        let t = texts(&out);
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].0, "aaa bbb");
        assert_eq!(t[1].0, "ccc");
        assert_eq!(t[1].2 - t[0].2, 15.0);
        assert_eq!(out.height, 30.0);
    }

    #[test]
    fn test_overlong_word_gets_own_line() {
        let out = layout(
            &parse("a verylongword b"),
            &region(50, 200),
            Align::Left,
            TextStyle::regular(10.0),
            &Fixed,
        );
        let lines: Vec<&str> = out.text_items().map(|(t, ..)| t).collect();
        assert_eq!(lines, vec!["a", "verylongword", "b"]);
    }

    #[test]
    fn test_styles_become_segments() {
        let out = layout(
            &parse("deal **3** damage"),
            &region(1000, 100),
            Align::Left,
            TextStyle::regular(10.0),
            &Fixed,
        );
        let items: Vec<(&str, f32, bool)> = out
            .text_items()
            .map(|(t, x, _, s)| (t, x, s.bold))
            .collect();
        assert_eq!(
            items,
            vec![("deal", 0.0, false), (" 3", 40.0, true), (" damage", 61.0, false)]
        );
    }

    #[test]
    fn test_right_align() {
        let out = layout(
            &parse("ab"),
            &region(100, 20),
            Align::Right,
            TextStyle::regular(10.0),
            &Fixed,
        );
        assert_eq!(texts(&out)[0].1, 80.0);
    }

    #[test]
    fn test_block_heights() {
        let base = 10.0;
        let out = layout(
            &parse("# Head\n\n---\ntext"),
            &region(500, 500),
            Align::Left,
            TextStyle::regular(base),
            &Fixed,
        );
        let expected = base * 1.8 * 1.4 + base * 0.6 + base * 0.5 + base * 1.5;
        assert!((out.height - expected).abs() < 1e-4);

        let header_style = out.text_items().next().map(|(_, _, _, s)| s);
        assert_eq!(header_style.map(|s| s.bold), Some(true));
        assert!(header_style.is_some_and(|s| (s.size - 18.0).abs() < 1e-4));

        let rule = out.items.iter().find_map(|i| match i {
            Item::Rule { x0, x1, .. } => Some((*x0, *x1)),
            _ => None,
        });
        assert_eq!(rule, Some((50.0, 450.0)));
    }

    #[test]
    fn test_empty_content_has_no_items() {
        let out = layout(
            &parse(""),
            &region(100, 100),
            Align::Left,
            TextStyle::regular(10.0),
            &Fixed,
        );
        assert!(out.text_items().next().is_none());
    }

    #[test]
    fn test_draw_counts_text_items() {
        let face = FontFace::Bitmap;
        let out = layout(
            &parse("hello\n---\nworld"),
            &region(200, 100),
            Align::Left,
            TextStyle::regular(12.0),
            &face,
        );
        let mut canvas = Canvas::new(200, 100, WHITE);
        assert_eq!(draw(&mut canvas, &out, &face, BLACK), 2);
    }
}
