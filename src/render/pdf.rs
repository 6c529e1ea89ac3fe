use super::{PdfRenderer, RenderStatus};
use printpdf::lopdf::Document;
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use std::io::{BufWriter, Write};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LAYER_NAME: &str = "Layer 1";
const TEXT_ENCODING: &str = "WinAnsiEncoding";
const PT_TO_MM: f32 = 0.352_778;
const LINE_SPACING: f32 = 1.35;
const BODY_SIZE: f32 = 11.0;
const CODE_SIZE: f32 = 9.0;
const HEADING_SIZES: [f32; 6] = [20.0, 16.0, 14.0, 12.0, 12.0, 12.0];
const LIST_INDENT: f32 = 6.0;
const CODE_INDENT: f32 = 4.0;
const RULE_GAP: f32 = 6.0;
// average glyph advance as a fraction of the font size
const PROPORTIONAL_ADVANCE: f32 = 0.5;
const MONOSPACE_ADVANCE: f32 = 0.6;

/// Lays out HTML produced from Markdown onto A4 pages with the PDF builtin
/// Helvetica and Courier fonts.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlPdfRenderer;

impl PdfRenderer for HtmlPdfRenderer {
    fn render(&self, html: &str, sink: &mut dyn Write) -> RenderStatus {
        let mut status = RenderStatus::default();
        let blocks = html_blocks(html);
        let title = blocks
            .iter()
            .find(|block| matches!(block.kind, BlockKind::Heading(_)))
            .map(|block| win_ansi(&block.text))
            .unwrap_or_else(|| "Document".to_string());

        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
        let fonts = match Fonts::load(&doc) {
            Ok(fonts) => fonts,
            Err(err) => {
                status.push_error(format!("failed to load builtin font: {err}"));
                return status;
            }
        };

        {
            let mut pages = PageWriter {
                doc: &doc,
                layer: doc.get_page(page).get_layer(layer),
                cursor: PAGE_HEIGHT - MARGIN,
            };
            for block in &blocks {
                pages.block(block, &fonts);
            }
        }

        let mut writer = BufWriter::new(sink);
        if let Err(err) = doc.save(&mut writer) {
            status.push_error(format!("failed to write pdf: {err}"));
        } else if let Err(err) = writer.flush() {
            status.push_error(format!("failed to flush pdf: {err}"));
        }
        status
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, String> {
        let load = |font: BuiltinFont| doc.add_builtin_font(font).map_err(|err| err.to_string());
        Ok(Self {
            regular: load(BuiltinFont::Helvetica)?,
            bold: load(BuiltinFont::HelveticaBold)?,
            mono: load(BuiltinFont::Courier)?,
        })
    }
}

struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    /// Baseline of the last written line, in mm from the page bottom.
    cursor: f32,
}

impl PageWriter<'_> {
    fn block(&mut self, block: &Block, fonts: &Fonts) {
        let (font, size, indent, gap) = match block.kind {
            BlockKind::Heading(level) => {
                let index = usize::from(level).clamp(1, HEADING_SIZES.len()) - 1;
                (&fonts.bold, HEADING_SIZES[index], 0.0, 3.0)
            }
            BlockKind::Paragraph => (&fonts.regular, BODY_SIZE, 0.0, 2.5),
            BlockKind::ListItem(depth) => {
                (&fonts.regular, BODY_SIZE, LIST_INDENT * depth as f32, 1.0)
            }
            BlockKind::Code => (&fonts.mono, CODE_SIZE, CODE_INDENT, 2.5),
            BlockKind::TableHeader => (&fonts.bold, BODY_SIZE, 0.0, 0.5),
            BlockKind::TableRow => (&fonts.regular, BODY_SIZE, 0.0, 0.5),
            BlockKind::Rule => {
                self.advance(RULE_GAP);
                return;
            }
        };

        let monospace = block.kind == BlockKind::Code;
        let advance = if monospace {
            MONOSPACE_ADVANCE
        } else {
            PROPORTIONAL_ADVANCE
        };
        let width_pt = (PAGE_WIDTH - 2.0 * MARGIN - indent) / PT_TO_MM;
        let max_chars = (width_pt / (size * advance)).floor().max(1.0) as usize;
        let lines = if monospace {
            wrap_preformatted(&block.text, max_chars)
        } else {
            wrap(&block.text, max_chars)
        };

        for line in lines {
            self.line(&line, font, size, indent);
        }
        self.cursor -= gap;
    }

    fn line(&mut self, text: &str, font: &IndirectFontRef, size: f32, indent: f32) {
        self.advance(size * LINE_SPACING * PT_TO_MM);
        if !text.is_empty() {
            self.layer
                .use_text(win_ansi(text), size, Mm(MARGIN + indent), Mm(self.cursor), font);
        }
    }

    fn advance(&mut self, height: f32) {
        if self.cursor - height < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.cursor = PAGE_HEIGHT - MARGIN;
        }
        self.cursor -= height;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Heading(u8),
    Paragraph,
    ListItem(usize),
    Code,
    TableHeader,
    TableRow,
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    kind: BlockKind,
    text: String,
}

impl Block {
    fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            text: String::new(),
        }
    }
}

/// Splits HTML into the block-level runs of text the layout understands.
fn html_blocks(html: &str) -> Vec<Block> {
    let mut reader = BlockReader::default();
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        reader.text(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('>') else {
            reader.text(&rest[start..]);
            rest = "";
            break;
        };
        reader.tag(&after[..end]);
        rest = &after[end + 1..];
    }
    reader.text(rest);
    reader.finish()
}

#[derive(Default)]
struct BlockReader {
    blocks: Vec<Block>,
    current: Option<Block>,
    lists: Vec<Option<u64>>,
    in_pre: bool,
    in_thead: bool,
}

impl BlockReader {
    fn tag(&mut self, raw: &str) {
        let closing = raw.starts_with('/');
        let name: String = raw
            .trim_start_matches('/')
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        if closing {
            self.close(&name);
        } else {
            self.open(&name, raw);
        }
    }

    fn open(&mut self, name: &str, raw: &str) {
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                let level = name[1..].parse().unwrap_or(1);
                self.current = Some(Block::new(BlockKind::Heading(level)));
            }
            "p" => {
                // stray text before a paragraph (raw HTML blocks) is its own block
                if self
                    .current
                    .as_ref()
                    .is_some_and(|block| block.kind == BlockKind::Paragraph)
                {
                    self.flush();
                }
                if self.current.is_none() {
                    self.current = Some(Block::new(BlockKind::Paragraph));
                }
            }
            "ul" => {
                self.flush();
                self.lists.push(None);
            }
            "ol" => {
                self.flush();
                let start = attribute(raw, "start")
                    .and_then(|value| value.parse().ok())
                    .unwrap_or(1);
                self.lists.push(Some(start));
            }
            "li" => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                let mut block = Block::new(BlockKind::ListItem(self.lists.len().max(1)));
                block.text.push_str(&marker);
                self.current = Some(block);
            }
            "pre" => {
                self.flush();
                self.in_pre = true;
                self.current = Some(Block::new(BlockKind::Code));
            }
            "thead" => self.in_thead = true,
            "tbody" => self.in_thead = false,
            "tr" => {
                self.flush();
                let kind = if self.in_thead {
                    BlockKind::TableHeader
                } else {
                    BlockKind::TableRow
                };
                self.current = Some(Block::new(kind));
            }
            "td" | "th" => {
                if let Some(block) = self.current.as_mut()
                    && !block.text.trim().is_empty()
                {
                    block.text.push_str(" | ");
                }
            }
            "hr" => {
                self.flush();
                self.blocks.push(Block::new(BlockKind::Rule));
            }
            "br" => {
                if let Some(block) = self.current.as_mut() {
                    block.text.push('\n');
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "li" | "tr" => self.flush(),
            "pre" => {
                self.flush();
                self.in_pre = false;
            }
            "ul" | "ol" => {
                self.flush();
                self.lists.pop();
            }
            "thead" => self.in_thead = false,
            _ => {}
        }
    }

    fn text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let decoded = decode_entities(raw);
        if self.in_pre {
            self.current
                .get_or_insert_with(|| Block::new(BlockKind::Code))
                .text
                .push_str(&decoded);
            return;
        }

        let flattened = decoded.replace('\n', " ");
        if self.current.is_none() {
            if flattened.trim().is_empty() {
                return;
            }
            self.current = Some(Block::new(BlockKind::Paragraph));
        }
        if let Some(block) = self.current.as_mut() {
            block.text.push_str(&flattened);
        }
    }

    fn flush(&mut self) {
        let Some(mut block) = self.current.take() else {
            return;
        };
        block.text = if block.kind == BlockKind::Code {
            block.text.trim_end_matches('\n').to_string()
        } else {
            block
                .text
                .split('\n')
                .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>()
                .join("\n")
        };
        if !block.text.trim().is_empty() {
            self.blocks.push(block);
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

fn attribute<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=\"");
    let start = raw.find(&needle)? + needle.len();
    let len = raw[start..].find('"')?;
    Some(&raw[start..start + len])
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        output.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = tail
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                output.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                output.push('&');
                rest = &tail[1..];
            }
        }
    }
    output.push_str(rest);
    output
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Replaces characters the builtin fonts' WinAnsi encoding cannot represent.
fn win_ansi(text: &str) -> String {
    text.chars()
        .map(|ch| {
            let mut buf = [0; 4];
            if ch.is_ascii()
                || !Document::encode_text(Some(TEXT_ENCODING), ch.encode_utf8(&mut buf)).is_empty()
            {
                ch
            } else {
                '?'
            }
        })
        .collect()
}

fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;
        for word in raw.split_whitespace() {
            for piece in chunk(word, max_chars) {
                let piece_len = piece.chars().count();
                if line_len > 0 && line_len + 1 + piece_len > max_chars {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                if line_len > 0 {
                    line.push(' ');
                    line_len += 1;
                }
                line.push_str(&piece);
                line_len += piece_len;
            }
        }
        lines.push(line);
    }
    lines
}

fn wrap_preformatted(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        if raw.is_empty() {
            lines.push(String::new());
        } else {
            lines.extend(chunk(raw, max_chars));
        }
    }
    lines
}

fn chunk(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars.max(1))
        .map(|piece| piece.iter().collect())
        .collect()
}
