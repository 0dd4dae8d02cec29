//! Markup parsing: a lenient tokenizer pass building an element tree, then
//! a conversion pass producing the block tree.
//!
//! The tokenizer accepts alias tags, attribute quoting variants, comments,
//! and unclosed inline formatting, but reports structural damage as a
//! [`MarkupError`] with the offending span: unclosed block elements at end
//! of input, closing tags that match nothing, closes that would swallow an
//! open block element, and table cell content outside a row.

use std::mem;

use smol_str::SmolStr;

use crate::document::Document;
use crate::error::{MarkupError, MarkupErrorKind};
use crate::format::coalesce_runs;
use crate::markup::{INDENT_STEP_PX, PAGE_BREAK_CLASS, decode_entities};
use crate::node::{Block, Cell, ImageNode, Inline, ListKind, MARKER_CHAR, Run, TableGrid, TextKind};
use crate::style::{Alignment, Style};

/// Parse a markup string into a normalized document.
pub fn parse(src: &str) -> Result<Document, MarkupError> {
    let nodes = tokenize(src).map_err(|fault| fault.into_error(src))?;
    let mut blocks = Vec::new();
    convert_children(&nodes, &mut blocks).map_err(|fault| fault.into_error(src))?;
    Ok(Document::from_blocks(blocks))
}

/// A parse failure before it is bound to the source text.
struct Fault {
    kind: MarkupErrorKind,
    offset: usize,
    len: usize,
}

impl Fault {
    fn into_error(self, src: &str) -> MarkupError {
        MarkupError::new(self.kind, src, self.offset, self.len)
    }
}

fn malformed(offset: usize, len: usize) -> Fault {
    Fault {
        kind: MarkupErrorKind::MalformedTag,
        offset,
        len: len.max(1),
    }
}

enum DomNode {
    Element(DomElement),
    Text(String),
}

struct DomElement {
    name: SmolStr,
    attrs: Vec<(SmolStr, String)>,
    children: Vec<DomNode>,
    /// Byte span of the opening tag, for error reporting.
    span_offset: usize,
    span_len: usize,
}

fn is_void_tag(name: &str) -> bool {
    matches!(name, "img" | "br" | "hr")
}

fn is_block_tag(name: &str) -> bool {
    matches!(
        name,
        "p" | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "li"
            | "table"
            | "tbody"
            | "thead"
            | "tfoot"
            | "tr"
            | "td"
            | "th"
            | "div"
    )
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn tokenize(src: &str) -> Result<Vec<DomNode>, Fault> {
    let mut roots = Vec::new();
    let mut stack: Vec<DomElement> = Vec::new();
    let mut pos = 0;
    while pos < src.len() {
        let rest = &src[pos..];
        if rest.starts_with("<!--") {
            pos = match src[pos + 4..].find("-->") {
                Some(end) => pos + 4 + end + 3,
                None => src.len(),
            };
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            pos = match rest.find('>') {
                Some(end) => pos + end + 1,
                None => src.len(),
            };
        } else if rest.starts_with("</") {
            pos = close_tag(src, pos, &mut stack, &mut roots)?;
        } else if rest.starts_with('<') {
            pos = open_tag(src, pos, &mut stack, &mut roots)?;
        } else {
            let end = rest.find('<').map_or(src.len(), |at| pos + at);
            append(
                &mut stack,
                &mut roots,
                DomNode::Text(decode_entities(&src[pos..end])),
            );
            pos = end;
        }
    }
    if let Some(open) = stack.last() {
        return Err(Fault {
            kind: MarkupErrorKind::UnexpectedEof {
                tag: open.name.clone(),
            },
            offset: open.span_offset,
            len: open.span_len,
        });
    }
    Ok(roots)
}

fn append(stack: &mut Vec<DomElement>, roots: &mut Vec<DomNode>, node: DomNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

fn open_tag(
    src: &str,
    start: usize,
    stack: &mut Vec<DomElement>,
    roots: &mut Vec<DomNode>,
) -> Result<usize, Fault> {
    let name_start = start + 1;
    let name_end = scan_name(src, name_start);
    if name_end == name_start {
        return Err(malformed(start, 1));
    }
    let name: SmolStr = src[name_start..name_end].to_ascii_lowercase().into();
    let mut attrs = Vec::new();
    let mut pos = name_end;
    let mut self_closing = false;
    loop {
        pos = skip_whitespace(src, pos);
        let Some(ch) = src[pos..].chars().next() else {
            return Err(malformed(start, src.len() - start));
        };
        match ch {
            '>' => {
                pos += 1;
                break;
            }
            '/' => {
                if src[pos..].starts_with("/>") {
                    self_closing = true;
                    pos += 2;
                    break;
                }
                pos += 1;
            }
            _ => {
                let (attr, next) = scan_attr(src, start, pos)?;
                if let Some(attr) = attr {
                    attrs.push(attr);
                }
                pos = next;
            }
        }
    }
    let element = DomElement {
        name: name.clone(),
        attrs,
        children: Vec::new(),
        span_offset: start,
        span_len: pos - start,
    };
    if self_closing || is_void_tag(&name) {
        append(stack, roots, DomNode::Element(element));
    } else {
        stack.push(element);
    }
    Ok(pos)
}

fn close_tag(
    src: &str,
    start: usize,
    stack: &mut Vec<DomElement>,
    roots: &mut Vec<DomNode>,
) -> Result<usize, Fault> {
    let name_start = start + 2;
    let name_end = scan_name(src, name_start);
    if name_end == name_start {
        return Err(malformed(start, 2));
    }
    let name: SmolStr = src[name_start..name_end].to_ascii_lowercase().into();
    let pos = skip_whitespace(src, name_end);
    if !src[pos..].starts_with('>') {
        return Err(malformed(start, (pos + 1).min(src.len()) - start));
    }
    let end = pos + 1;
    let Some(depth) = stack.iter().rposition(|el| el.name == name) else {
        let expected = stack
            .last()
            .map_or_else(|| SmolStr::new("body"), |el| el.name.clone());
        return Err(Fault {
            kind: MarkupErrorKind::MismatchedClose {
                expected,
                found: name,
            },
            offset: start,
            len: end - start,
        });
    };
    // Unclosed inline formatting closes silently; an unclosed block element
    // in the way is structural damage.
    for open in stack[depth + 1..].iter().rev() {
        if is_block_tag(&open.name) {
            return Err(Fault {
                kind: MarkupErrorKind::MismatchedClose {
                    expected: open.name.clone(),
                    found: name,
                },
                offset: start,
                len: end - start,
            });
        }
    }
    while stack.len() > depth {
        if let Some(open) = stack.pop() {
            append(stack, roots, DomNode::Element(open));
        }
    }
    Ok(end)
}

fn scan_name(src: &str, from: usize) -> usize {
    let bytes = src.as_bytes();
    let mut pos = from;
    while pos < bytes.len() && bytes[pos].is_ascii_alphanumeric() {
        pos += 1;
    }
    pos
}

fn skip_whitespace(src: &str, from: usize) -> usize {
    let bytes = src.as_bytes();
    let mut pos = from;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn char_width(src: &str, at: usize) -> usize {
    src[at..].chars().next().map_or(1, char::len_utf8)
}

type Attr = (SmolStr, String);

fn scan_attr(src: &str, tag_start: usize, from: usize) -> Result<(Option<Attr>, usize), Fault> {
    let bytes = src.as_bytes();
    let mut pos = from;
    while pos < bytes.len()
        && !bytes[pos].is_ascii_whitespace()
        && !matches!(bytes[pos], b'=' | b'>' | b'/')
    {
        pos += 1;
    }
    if pos == from {
        // Lone junk byte; consume it so the scan advances.
        return Ok((None, from + char_width(src, from)));
    }
    let name: SmolStr = src[from..pos].to_ascii_lowercase().into();
    pos = skip_whitespace(src, pos);
    if !src[pos..].starts_with('=') {
        return Ok((Some((name, String::new())), pos));
    }
    pos = skip_whitespace(src, pos + 1);
    let Some(quote) = src[pos..].chars().next() else {
        return Err(malformed(tag_start, src.len() - tag_start));
    };
    if quote == '"' || quote == '\'' {
        let value_start = pos + 1;
        match src[value_start..].find(quote) {
            Some(len) => {
                let value = decode_entities(&src[value_start..value_start + len]);
                Ok((Some((name, value)), value_start + len + 1))
            }
            None => Err(malformed(tag_start, src.len() - tag_start)),
        }
    } else {
        let mut end = pos;
        while end < bytes.len()
            && !bytes[end].is_ascii_whitespace()
            && !matches!(bytes[end], b'>' | b'/')
        {
            end += 1;
        }
        Ok((Some((name, decode_entities(&src[pos..end]))), end))
    }
}

fn attr_value<'a>(el: &'a DomElement, key: &str) -> Option<&'a str> {
    el.attrs
        .iter()
        .find(|(name, _)| name.as_str() == key)
        .map(|(_, value)| value.as_str())
}

fn has_class(el: &DomElement, class: &str) -> bool {
    attr_value(el, "class").is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

fn stray_cell(el: &DomElement) -> Fault {
    Fault {
        kind: MarkupErrorKind::StrayCell,
        offset: el.span_offset,
        len: el.span_len,
    }
}

fn convert_children(nodes: &[DomNode], blocks: &mut Vec<Block>) -> Result<(), Fault> {
    let mut builder = BlockBuilder {
        blocks,
        pending: Vec::new(),
    };
    for node in nodes {
        builder.node(node)?;
    }
    builder.flush();
    Ok(())
}

/// Accumulates blocks from a node sequence. Inline content found at block
/// level collects in `pending` and wraps into an implicit paragraph.
struct BlockBuilder<'a> {
    blocks: &'a mut Vec<Block>,
    pending: Vec<Inline>,
}

impl BlockBuilder<'_> {
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let inlines = finish_inlines(mem::take(&mut self.pending));
        if !inlines.is_empty() {
            self.blocks.push(Block::text(TextKind::Paragraph, inlines));
        }
    }

    fn node(&mut self, node: &DomNode) -> Result<(), Fault> {
        match node {
            DomNode::Text(text) => {
                // Whitespace between block elements is formatting noise.
                if !text.trim().is_empty() {
                    push_text(&mut self.pending, text, &Style::default(), None);
                }
                Ok(())
            }
            DomNode::Element(el) => self.element(el),
        }
    }

    fn element(&mut self, el: &DomElement) -> Result<(), Fault> {
        if let Some(level) = heading_level(&el.name) {
            self.flush();
            let block = convert_text_block(el, TextKind::Heading(level))?;
            self.blocks.push(block);
            return Ok(());
        }
        match el.name.as_str() {
            "p" => {
                self.flush();
                let block = convert_text_block(el, TextKind::Paragraph)?;
                self.blocks.push(block);
            }
            "ul" => self.list(el, ListKind::Unordered)?,
            "ol" => self.list(el, ListKind::Ordered)?,
            // A list item adrift of any list keeps its bullet.
            "li" => {
                self.flush();
                let block = convert_text_block(el, TextKind::ListItem(ListKind::Unordered))?;
                self.blocks.push(block);
            }
            "table" => self.table(el)?,
            "div" => {
                if has_class(el, PAGE_BREAK_CLASS) {
                    self.flush();
                    self.blocks.push(Block::page_break());
                } else {
                    for child in &el.children {
                        self.node(child)?;
                    }
                }
            }
            "tr" | "td" | "th" => return Err(stray_cell(el)),
            "strong" | "b" | "em" | "i" | "u" | "s" | "strike" | "del" | "span" | "mark"
            | "br" | "img" => {
                collect_inline_element(el, &Style::default(), None, &mut self.pending)?;
            }
            _ => {
                tracing::warn!(
                    target: "quire::markup",
                    tag = %el.name,
                    "unknown tag dropped, children kept"
                );
                for child in &el.children {
                    self.node(child)?;
                }
            }
        }
        Ok(())
    }

    fn list(&mut self, el: &DomElement, kind: ListKind) -> Result<(), Fault> {
        self.flush();
        for child in &el.children {
            match child {
                DomNode::Element(item) if item.name == "li" => {
                    self.flush();
                    let block = convert_text_block(item, TextKind::ListItem(kind))?;
                    self.blocks.push(block);
                }
                other => self.node(other)?,
            }
        }
        Ok(())
    }

    fn table(&mut self, el: &DomElement) -> Result<(), Fault> {
        self.flush();
        let mut rows: Vec<Vec<Cell>> = Vec::new();
        collect_rows(&el.children, &mut rows)?;
        if rows.is_empty() {
            return Ok(());
        }
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let mut grid = TableGrid::new(rows.len(), cols);
        for (row, cells) in rows.into_iter().enumerate() {
            for (col, cell) in cells.into_iter().enumerate() {
                if let Some(slot) = grid.cell_mut(row, col) {
                    *slot = cell;
                }
            }
        }
        let (align, indent) = block_presentation(el);
        let mut block = Block::table(grid);
        block.align = align;
        block.indent = indent;
        self.blocks.push(block);
        Ok(())
    }
}

fn collect_rows(nodes: &[DomNode], rows: &mut Vec<Vec<Cell>>) -> Result<(), Fault> {
    for node in nodes {
        let DomNode::Element(el) = node else {
            continue;
        };
        match el.name.as_str() {
            "tr" => {
                let mut cells = Vec::new();
                for child in &el.children {
                    if let DomNode::Element(cell_el) = child {
                        if matches!(cell_el.name.as_str(), "td" | "th") {
                            let mut blocks = Vec::new();
                            convert_children(&cell_el.children, &mut blocks)?;
                            if blocks.is_empty() {
                                cells.push(Cell::empty());
                            } else {
                                cells.push(Cell { blocks });
                            }
                        }
                    }
                }
                rows.push(cells);
            }
            "td" | "th" => return Err(stray_cell(el)),
            "tbody" | "thead" | "tfoot" => collect_rows(&el.children, rows)?,
            _ => {}
        }
    }
    Ok(())
}

fn convert_text_block(el: &DomElement, kind: TextKind) -> Result<Block, Fault> {
    let (align, indent) = block_presentation(el);
    let mut inlines = Vec::new();
    collect_inlines(&el.children, &Style::default(), None, &mut inlines)?;
    let mut block = Block::text(kind, finish_inlines(inlines));
    block.align = align;
    block.indent = indent;
    Ok(block)
}

fn collect_inlines(
    nodes: &[DomNode],
    style: &Style,
    mark: Option<&SmolStr>,
    out: &mut Vec<Inline>,
) -> Result<(), Fault> {
    for node in nodes {
        match node {
            DomNode::Text(text) => push_text(out, text, style, mark),
            DomNode::Element(el) => collect_inline_element(el, style, mark, out)?,
        }
    }
    Ok(())
}

fn collect_inline_element(
    el: &DomElement,
    style: &Style,
    mark: Option<&SmolStr>,
    out: &mut Vec<Inline>,
) -> Result<(), Fault> {
    match el.name.as_str() {
        "strong" | "b" => {
            let mut inner = style.clone();
            inner.bold = true;
            collect_inlines(&el.children, &inner, mark, out)
        }
        "em" | "i" => {
            let mut inner = style.clone();
            inner.italic = true;
            collect_inlines(&el.children, &inner, mark, out)
        }
        "u" => {
            let mut inner = style.clone();
            inner.underline = true;
            collect_inlines(&el.children, &inner, mark, out)
        }
        "s" | "strike" | "del" => {
            let mut inner = style.clone();
            inner.strikethrough = true;
            collect_inlines(&el.children, &inner, mark, out)
        }
        "span" => {
            let inner = styled_span(style, el);
            collect_inlines(&el.children, &inner, mark, out)
        }
        "mark" => match attr_value(el, "data-word") {
            Some(word) if !word.is_empty() => {
                let word: SmolStr = word.to_lowercase().into();
                collect_inlines(&el.children, style, Some(&word), out)
            }
            _ => collect_inlines(&el.children, style, mark, out),
        },
        "br" => {
            push_text(out, "\n", style, mark);
            Ok(())
        }
        "img" => {
            out.push(Inline::Image(convert_image(el)));
            Ok(())
        }
        "tr" | "td" | "th" => Err(stray_cell(el)),
        _ => {
            tracing::warn!(
                target: "quire::markup",
                tag = %el.name,
                "unknown tag dropped, children kept"
            );
            collect_inlines(&el.children, style, mark, out)
        }
    }
}

fn push_text(out: &mut Vec<Inline>, text: &str, style: &Style, mark: Option<&SmolStr>) {
    // Stray zero-width markers in saved content never survive a reload.
    let text: String = text.chars().filter(|&ch| ch != MARKER_CHAR).collect();
    if text.is_empty() {
        return;
    }
    let mut run = Run::styled(text, style.clone());
    run.mark = mark.cloned();
    out.push(Inline::Run(run));
}

/// Coalesce the collected runs and collapse the writer's `<br>`
/// empty-block placeholder back to no content.
fn finish_inlines(mut inlines: Vec<Inline>) -> Vec<Inline> {
    coalesce_runs(&mut inlines);
    let placeholder = inlines.len() == 1
        && inlines[0]
            .as_run()
            .is_some_and(|run| run.text == "\n" && run.style.is_plain() && run.mark.is_none());
    if placeholder {
        inlines.clear();
    }
    inlines
}

fn convert_image(el: &DomElement) -> ImageNode {
    let mut image = ImageNode::new(attr_value(el, "src").unwrap_or_default());
    for (name, value) in &el.attrs {
        match name.as_str() {
            "width" => image.attr_width = value.trim().parse().ok(),
            "height" => image.attr_height = value.trim().parse().ok(),
            "data-handle" => image.handle = value.trim().parse().ok(),
            "style" => {
                for (prop, value) in css_declarations(value) {
                    match prop.to_ascii_lowercase().as_str() {
                        "width" => image.width = parse_px(value),
                        "height" => image.height = parse_px(value),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    image
}

fn block_presentation(el: &DomElement) -> (Alignment, u8) {
    let mut align = Alignment::default();
    let mut indent = 0u8;
    if let Some(css) = attr_value(el, "style") {
        for (prop, value) in css_declarations(css) {
            match prop.to_ascii_lowercase().as_str() {
                "text-align" => {
                    if let Some(parsed) = Alignment::from_css(value) {
                        align = parsed;
                    }
                }
                "margin-left" => {
                    if let Some(px) = parse_px(value) {
                        indent = (px / INDENT_STEP_PX).min(u32::from(u8::MAX)) as u8;
                    }
                }
                _ => {}
            }
        }
    }
    (align, indent)
}

fn styled_span(base: &Style, el: &DomElement) -> Style {
    let mut style = base.clone();
    if let Some(css) = attr_value(el, "style") {
        for (prop, value) in css_declarations(css) {
            match prop.to_ascii_lowercase().as_str() {
                "font-family" => style.font_family = Some(unquote(value).into()),
                "font-size" => {
                    if let Some(px) = parse_px(value) {
                        style.font_size = Some(px.min(u32::from(u8::MAX)) as u8);
                    }
                }
                "color" => style.color = Some(value.into()),
                "background-color" => style.highlight = Some(value.into()),
                _ => {}
            }
        }
    }
    style
}

fn css_declarations(css: &str) -> impl Iterator<Item = (&str, &str)> {
    css.split(';').filter_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        Some((prop.trim(), value.trim()))
    })
}

fn parse_px(value: &str) -> Option<u32> {
    let value = value.trim();
    let digits = value.strip_suffix("px").unwrap_or(value);
    digits.trim().parse().ok()
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| {
            value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
        })
        .unwrap_or(value)
}
