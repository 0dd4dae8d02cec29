//! Canonical markup emission.

use crate::document::Document;
use crate::markup::{
    INDENT_STEP_PX, PAGE_BREAK_CLASS, RESIZABLE_IMG_CLASS, SPELL_MARK_CLASS, escape_attr,
    escape_text,
};
use crate::node::{Block, BlockBody, ImageNode, Inline, ListKind, Run, TableGrid, TextKind};
use crate::style::{Alignment, Style};

/// Serialize the document to its canonical markup string.
///
/// Marker runs are dropped, equal adjacent runs are assumed already
/// coalesced, and list items group under one `<ul>`/`<ol>` per unbroken
/// same-kind sequence. Parsing the result yields an equal document.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    write_blocks(&mut out, &doc.blocks);
    tracing::trace!(target: "quire::markup", bytes = out.len(), "serialized document");
    out
}

fn write_blocks(out: &mut String, blocks: &[Block]) {
    let mut index = 0;
    while index < blocks.len() {
        match blocks[index].text_kind() {
            Some(TextKind::ListItem(kind)) => {
                let wrapper = list_tag(kind);
                out.push('<');
                out.push_str(wrapper);
                out.push('>');
                while index < blocks.len()
                    && blocks[index].text_kind() == Some(TextKind::ListItem(kind))
                {
                    write_text_block(out, &blocks[index], "li");
                    index += 1;
                }
                out.push_str("</");
                out.push_str(wrapper);
                out.push('>');
            }
            _ => {
                write_block(out, &blocks[index]);
                index += 1;
            }
        }
    }
}

fn write_block(out: &mut String, block: &Block) {
    match &block.body {
        BlockBody::Text { kind, .. } => match kind {
            TextKind::Paragraph => write_text_block(out, block, "p"),
            TextKind::Heading(level) => write_text_block(out, block, &format!("h{level}")),
            TextKind::ListItem(_) => write_text_block(out, block, "li"),
        },
        BlockBody::Table(grid) => write_table(out, block, grid),
        BlockBody::PageBreak => {
            out.push_str(&format!("<div class=\"{PAGE_BREAK_CLASS}\"></div>"));
        }
    }
}

fn list_tag(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Unordered => "ul",
        ListKind::Ordered => "ol",
    }
}

fn write_text_block(out: &mut String, block: &Block, tag: &str) {
    out.push('<');
    out.push_str(tag);
    out.push_str(&block_style_attr(block));
    out.push('>');
    let inner = inline_markup(block.inlines().unwrap_or(&[]));
    if inner.is_empty() {
        // An empty paragraph still needs height in the surface.
        out.push_str("<br>");
    } else {
        out.push_str(&inner);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_table(out: &mut String, block: &Block, grid: &TableGrid) {
    out.push_str("<table");
    out.push_str(&block_style_attr(block));
    out.push('>');
    for row in 0..grid.rows {
        out.push_str("<tr>");
        for col in 0..grid.cols {
            out.push_str("<td>");
            if let Some(cell) = grid.cell(row, col) {
                write_blocks(out, &cell.blocks);
            }
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
}

fn inline_markup(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Run(run) => {
                if !run.is_marker() {
                    write_run(&mut out, run);
                }
            }
            Inline::Image(image) => write_image(&mut out, image),
        }
    }
    out
}

fn write_run(out: &mut String, run: &Run) {
    let mut tags: Vec<(String, &'static str)> = Vec::new();
    if let Some(word) = &run.mark {
        tags.push((
            format!(
                "<mark class=\"{SPELL_MARK_CLASS}\" data-word=\"{}\">",
                escape_attr(word)
            ),
            "</mark>",
        ));
    }
    if run.style.bold {
        tags.push(("<strong>".to_owned(), "</strong>"));
    }
    if run.style.italic {
        tags.push(("<em>".to_owned(), "</em>"));
    }
    if run.style.underline {
        tags.push(("<u>".to_owned(), "</u>"));
    }
    if run.style.strikethrough {
        tags.push(("<s>".to_owned(), "</s>"));
    }
    if run.style.has_span_attrs() {
        tags.push((
            format!("<span{}>", style_attr(span_css(&run.style))),
            "</span>",
        ));
    }
    for (open, _) in &tags {
        out.push_str(open);
    }
    let mut first = true;
    for line in run.text.split('\n') {
        if !first {
            out.push_str("<br>");
        }
        out.push_str(&escape_text(line));
        first = false;
    }
    for (_, close) in tags.iter().rev() {
        out.push_str(close);
    }
}

fn write_image(out: &mut String, image: &ImageNode) {
    out.push_str(&format!(
        "<img src=\"{}\" class=\"{RESIZABLE_IMG_CLASS}\" tabindex=\"0\"",
        escape_attr(&image.src)
    ));
    if let Some(handle) = image.handle {
        out.push_str(&format!(" data-handle=\"{handle}\""));
    }
    let mut parts = Vec::new();
    if let Some(width) = image.width {
        parts.push(format!("width: {width}px"));
    }
    // Sizing is style-only; unset height stays automatic.
    match image.height {
        Some(height) => parts.push(format!("height: {height}px")),
        None => parts.push("height: auto".to_owned()),
    }
    out.push_str(&style_attr(parts));
    out.push('>');
}

fn block_style_attr(block: &Block) -> String {
    let mut parts = Vec::new();
    if block.align != Alignment::Left {
        parts.push(format!("text-align: {}", block.align.as_css()));
    }
    if block.indent > 0 {
        parts.push(format!(
            "margin-left: {}px",
            u32::from(block.indent) * INDENT_STEP_PX
        ));
    }
    style_attr(parts)
}

/// Span attribute order is fixed so emission is canonical.
fn span_css(style: &Style) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(family) = &style.font_family {
        parts.push(format!("font-family: {family}"));
    }
    if let Some(size) = style.font_size {
        parts.push(format!("font-size: {size}px"));
    }
    if let Some(color) = &style.color {
        parts.push(format!("color: {color}"));
    }
    if let Some(highlight) = &style.highlight {
        parts.push(format!("background-color: {highlight}"));
    }
    parts
}

fn style_attr(parts: Vec<String>) -> String {
    if parts.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_attr(&parts.join("; ")))
    }
}
