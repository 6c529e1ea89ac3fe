use super::{DocxRenderer, RenderError};
use docx_rs::{
    AlignmentType, BreakType, Docx, Paragraph, Run, RunFonts, Style, StyleType, Table, TableCell,
    TableRow,
};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::fs::File;
use std::path::Path;

const MONO_FONT: &str = "Courier New";
const CODE_SIZE: usize = 20;
const LIST_INDENT: i32 = 360;
const LINK_COLOR: &str = "0563C1";
/// Half-points, H1 through H6.
const HEADING_SIZES: [usize; 6] = [40, 32, 28, 24, 22, 22];

/// Renders Markdown into a Word document using `docx-rs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownDocxRenderer;

impl DocxRenderer for MarkdownDocxRenderer {
    fn render(&self, markdown: &str, output: &Path) -> Result<(), RenderError> {
        let docx = build_docx(markdown);
        let file = File::create(output).map_err(|err| {
            RenderError::new("create docx", format!("{}: {err}", output.display()))
        })?;
        docx.build()
            .pack(file)
            .map_err(|err| RenderError::new("write docx", err.to_string()))
    }
}

fn build_docx(markdown: &str) -> Docx {
    let mut writer = DocxWriter::default();
    for event in Parser::new_ext(markdown, Options::ENABLE_TABLES) {
        writer.handle(event);
    }
    writer.finish()
}

enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Default)]
struct TableState {
    rows: Vec<TableRow>,
    cells: Vec<TableCell>,
    in_head: bool,
}

#[derive(Default)]
struct DocxWriter {
    blocks: Vec<Block>,
    paragraph: Option<Paragraph>,
    bold: usize,
    italic: usize,
    link: usize,
    code_block: bool,
    pending_breaks: usize,
    lists: Vec<Option<u64>>,
    table: Option<TableState>,
}

impl DocxWriter {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.code_block => self.code_text(&text),
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => self.text(&text),
            Event::Code(code) => {
                let run = self.styled_run(&code).fonts(mono_fonts());
                self.push_run(run);
            }
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.push_run(Run::new().add_break(BreakType::TextWrapping)),
            Event::Rule => {
                self.close_paragraph();
                self.blocks.push(Block::Paragraph(
                    Paragraph::new()
                        .align(AlignmentType::Center)
                        .add_run(Run::new().add_text("* * *")),
                ));
            }
            Event::TaskListMarker(checked) => self.text(if checked { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                // list items already opened their paragraph with the marker
                if self.paragraph.is_none() {
                    self.paragraph = Some(self.body_paragraph());
                }
            }
            Tag::Heading { level, .. } => {
                self.close_paragraph();
                let style = format!("Heading{}", heading_number(level));
                self.paragraph = Some(Paragraph::new().style(&style));
            }
            Tag::CodeBlock(_) => {
                self.close_paragraph();
                self.code_block = true;
                self.pending_breaks = 0;
                self.paragraph = Some(self.body_paragraph());
            }
            Tag::List(start) => {
                self.close_paragraph();
                self.lists.push(start);
            }
            Tag::Item => {
                self.close_paragraph();
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "\u{2022} ".to_string(),
                };
                let paragraph = self.body_paragraph().add_run(Run::new().add_text(marker));
                self.paragraph = Some(paragraph);
            }
            Tag::Emphasis => self.italic += 1,
            Tag::Strong => self.bold += 1,
            Tag::Link { .. } => self.link += 1,
            Tag::Table(_) => {
                self.close_paragraph();
                self.table = Some(TableState::default());
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                }
            }
            Tag::TableCell => self.paragraph = Some(Paragraph::new()),
            Tag::HtmlBlock => self.close_paragraph(),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::HtmlBlock => {
                self.close_paragraph()
            }
            TagEnd::CodeBlock => {
                self.close_paragraph();
                self.code_block = false;
                self.pending_breaks = 0;
            }
            TagEnd::List(_) => {
                self.close_paragraph();
                self.lists.pop();
            }
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Link => self.link = self.link.saturating_sub(1),
            TagEnd::TableCell => {
                let paragraph = self.paragraph.take().unwrap_or_else(Paragraph::new);
                if let Some(table) = self.table.as_mut() {
                    table.cells.push(TableCell::new().add_paragraph(paragraph));
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let cells = std::mem::take(&mut table.cells);
                    table.rows.push(TableRow::new(cells));
                    table.in_head = false;
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.blocks.push(Block::Table(Table::new(table.rows)));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let run = self.styled_run(text);
        self.push_run(run);
    }

    fn code_text(&mut self, text: &str) {
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.pending_breaks += 1;
            }
            if line.is_empty() {
                continue;
            }
            let mut run = Run::new();
            for _ in 0..std::mem::take(&mut self.pending_breaks) {
                run = run.add_break(BreakType::TextWrapping);
            }
            let run = run.add_text(line).fonts(mono_fonts()).size(CODE_SIZE);
            self.push_run(run);
        }
    }

    fn styled_run(&self, text: &str) -> Run {
        let mut run = Run::new().add_text(text);
        let in_table_head = self.table.as_ref().is_some_and(|table| table.in_head);
        if self.bold > 0 || in_table_head {
            run = run.bold();
        }
        if self.italic > 0 {
            run = run.italic();
        }
        if self.link > 0 {
            run = run.underline("single").color(LINK_COLOR);
        }
        run
    }

    fn push_run(&mut self, run: Run) {
        let paragraph = match self.paragraph.take() {
            Some(paragraph) => paragraph,
            None => self.body_paragraph(),
        };
        self.paragraph = Some(paragraph.add_run(run));
    }

    fn body_paragraph(&self) -> Paragraph {
        let depth = self.lists.len() as i32;
        if depth == 0 {
            Paragraph::new()
        } else {
            Paragraph::new().indent(Some(LIST_INDENT * depth), None, None, None)
        }
    }

    fn close_paragraph(&mut self) {
        if self.table.is_some() {
            return;
        }
        if let Some(paragraph) = self.paragraph.take() {
            self.blocks.push(Block::Paragraph(paragraph));
        }
    }

    fn finish(mut self) -> Docx {
        self.close_paragraph();
        let mut docx = Docx::new();
        for (index, size) in HEADING_SIZES.iter().enumerate() {
            let level = index + 1;
            docx = docx.add_style(
                Style::new(&format!("Heading{level}"), StyleType::Paragraph)
                    .name(&format!("Heading {level}"))
                    .size(*size)
                    .bold(),
            );
        }
        for block in self.blocks {
            docx = match block {
                Block::Paragraph(paragraph) => docx.add_paragraph(paragraph),
                Block::Table(table) => docx.add_table(table),
            };
        }
        docx
    }
}

fn mono_fonts() -> RunFonts {
    RunFonts::new().ascii(MONO_FONT).hi_ansi(MONO_FONT)
}

fn heading_number(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn blocks_for(markdown: &str) -> Vec<Block> {
        let mut writer = DocxWriter::default();
        for event in Parser::new_ext(markdown, Options::ENABLE_TABLES) {
            writer.handle(event);
        }
        writer.close_paragraph();
        writer.blocks
    }

    #[test]
    fn one_block_per_heading_paragraph_and_item() {
        let blocks = blocks_for("# Title\n\nBody text\n\n- one\n- two\n");
        assert_eq!(blocks.len(), 4);
        assert!(blocks.iter().all(|block| matches!(block, Block::Paragraph(_))));
    }

    #[test]
    fn tables_become_a_single_block() {
        let blocks = blocks_for("| a | b |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n");
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks[0], Block::Table(_)));
    }

    #[test]
    fn fenced_code_is_one_paragraph() {
        let blocks = blocks_for("```\nfirst\nsecond\n```\n\nafter\n");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn loose_list_items_do_not_duplicate_paragraphs() {
        let blocks = blocks_for("1. first\n\n2. second\n");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn raw_html_blocks_do_not_absorb_the_next_paragraph() {
        let blocks = blocks_for("Intro\n\n<div>note</div>\n\nBody para\n");
        assert_eq!(blocks.len(), 3);
        let blocks = blocks_for("<div>note</div>\n\nBody para\n");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn writes_a_zip_container() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("out.docx");
        MarkdownDocxRenderer
            .render("# Title\n\nSome **bold** and *italic* `code`.", &path)
            .expect("render");
        let bytes = fs::read(&path).expect("read");
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_markdown_still_produces_a_document() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("empty.docx");
        MarkdownDocxRenderer.render("", &path).expect("render");
        assert!(fs::metadata(&path).expect("metadata").len() > 0);
    }

    #[test]
    fn missing_parent_directory_is_a_render_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("out.docx");
        let err = MarkdownDocxRenderer
            .render("text", &path)
            .expect_err("error");
        assert_eq!(err.stage, "create docx");
    }
}
