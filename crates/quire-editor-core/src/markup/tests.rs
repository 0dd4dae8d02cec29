use super::{parse, serialize};
use crate::document::Document;
use crate::error::MarkupErrorKind;
use crate::node::{Block, BlockBody, ImageNode, Inline, ListKind, Run, TableGrid, TextKind};
use crate::style::{Alignment, Style};

fn run(text: &str) -> Inline {
    Inline::Run(Run::new(text))
}

fn styled(text: &str, build: impl FnOnce(&mut Style)) -> Inline {
    let mut style = Style::default();
    build(&mut style);
    Inline::Run(Run::styled(text, style))
}

fn para(inlines: Vec<Inline>) -> Block {
    Block::text(TextKind::Paragraph, inlines)
}

#[test]
fn test_empty_document_serializes_as_placeholder_paragraph() {
    insta::assert_snapshot!(serialize(&Document::new()), @"<p><br></p>");
}

#[test]
fn test_parse_of_empty_input_yields_empty_document() {
    assert_eq!(parse("").unwrap(), Document::new());
    assert_eq!(parse("<p><br></p>").unwrap(), Document::new());
}

#[test]
fn test_canonical_inline_nesting_order() {
    let mut style = Style::default();
    style.bold = true;
    style.italic = true;
    style.font_size = Some(18);
    let mut flagged = Run::styled("Teh", style);
    flagged.mark = Some("teh".into());
    let doc = Document::from_blocks(vec![para(vec![Inline::Run(flagged)])]);
    insta::assert_snapshot!(
        serialize(&doc),
        @r#"<p><mark class="spelling-error" data-word="teh"><strong><em><span style="font-size: 18px">Teh</span></em></strong></mark></p>"#
    );
}

#[test]
fn test_block_presentation_attributes() {
    let mut block = para(vec![run("x")]);
    block.align = Alignment::Center;
    block.indent = 2;
    let doc = Document::from_blocks(vec![block]);
    let markup = serialize(&doc);
    insta::assert_snapshot!(
        markup,
        @r#"<p style="text-align: center; margin-left: 80px">x</p>"#
    );
    assert_eq!(parse(&markup).unwrap(), doc);
}

#[test]
fn test_list_items_group_by_kind() {
    let doc = Document::from_blocks(vec![
        Block::text(TextKind::ListItem(ListKind::Unordered), vec![run("a")]),
        Block::text(TextKind::ListItem(ListKind::Unordered), vec![run("b")]),
        Block::text(TextKind::ListItem(ListKind::Ordered), vec![run("c")]),
    ]);
    let markup = serialize(&doc);
    insta::assert_snapshot!(
        markup,
        @"<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol>"
    );
    assert_eq!(parse(&markup).unwrap(), doc);
}

#[test]
fn test_full_document_round_trip() {
    let mut image = ImageNode::new("chart.png");
    image.width = Some(320);
    image.height = Some(200);
    image.handle = Some(3);
    let mut grid = TableGrid::new(1, 2);
    grid.cell_mut(0, 0).unwrap().blocks = vec![para(vec![run("cell")])];
    let mut aligned = para(vec![
        run("plain "),
        styled("loud", |s| s.bold = true),
        Inline::Image(image),
    ]);
    aligned.align = Alignment::Right;
    aligned.indent = 1;
    let doc = Document::from_blocks(vec![
        Block::text(TextKind::Heading(2), vec![run("Title")]),
        aligned,
        Block::table(grid),
        Block::page_break(),
        para(vec![run("end")]),
    ]);
    assert_eq!(parse(&serialize(&doc)).unwrap(), doc);
}

#[test]
fn test_heading_round_trip_keeps_level_and_alignment() {
    let mut heading = Block::text(TextKind::Heading(1), vec![run("TITLE")]);
    heading.align = Alignment::Center;
    let doc = Document::from_blocks(vec![heading]);
    let markup = serialize(&doc);
    assert_eq!(markup, "<h1 style=\"text-align: center\">TITLE</h1>");
    assert_eq!(parse(&markup).unwrap(), doc);
}

#[test]
fn test_line_breaks_round_trip_as_br() {
    let doc = Document::from_blocks(vec![para(vec![run("a\nb")])]);
    let markup = serialize(&doc);
    assert_eq!(markup, "<p>a<br>b</p>");
    assert_eq!(parse(&markup).unwrap(), doc);
}

#[test]
fn test_text_escaping_round_trip() {
    let doc = Document::from_blocks(vec![para(vec![run("a & b < c\"")])]);
    let markup = serialize(&doc);
    assert_eq!(markup, "<p>a &amp; b &lt; c\"</p>");
    assert_eq!(parse(&markup).unwrap(), doc);
}

#[test]
fn test_entity_decoding() {
    let doc = parse("<p>&#65;&#x42;&nbsp;&amp; &nope;</p>").unwrap();
    assert_eq!(doc.blocks[0].plain_text(), "AB\u{a0}& &nope;");
}

#[test]
fn test_marker_runs_are_not_serialized() {
    let mut style = Style::default();
    style.bold = true;
    let doc = Document::from_blocks(vec![para(vec![
        run("a"),
        Inline::Run(Run::marker(style)),
        run("b"),
    ])]);
    let markup = serialize(&doc);
    assert_eq!(markup, "<p>ab</p>");
    assert!(!markup.contains('\u{200B}'));
}

#[test]
fn test_parse_strips_stray_markers() {
    let doc = parse("<p>a\u{200B}b</p>").unwrap();
    assert_eq!(doc.blocks[0].inlines().unwrap().len(), 1);
    assert_eq!(doc.blocks[0].plain_text(), "ab");
}

#[test]
fn test_alias_tags_parse_to_styles() {
    let doc = parse("<p><b>a</b><i>b</i><strike>c</strike></p>").unwrap();
    let inlines = doc.blocks[0].inlines().unwrap();
    assert!(inlines[0].as_run().unwrap().style.bold);
    assert!(inlines[1].as_run().unwrap().style.italic);
    assert!(inlines[2].as_run().unwrap().style.strikethrough);
    assert_eq!(serialize(&doc), "<p><strong>a</strong><em>b</em><s>c</s></p>");
}

#[test]
fn test_legacy_image_attributes_stay_separate_from_style_sizing() {
    let doc = parse("<p><img src=\"x.png\" width=\"320\" height=\"200\"></p>").unwrap();
    let Some(Inline::Image(image)) = doc.blocks[0].inlines().map(|i| &i[0]) else {
        panic!("expected an image inline");
    };
    assert_eq!(image.attr_width, Some(320));
    assert_eq!(image.attr_height, Some(200));
    assert_eq!(image.width, None);
    assert_eq!(image.height, None);
    assert_eq!(image.handle, None);
}

#[test]
fn test_image_serializes_with_style_only_sizing() {
    let mut image = ImageNode::new("pic.png");
    image.width = Some(320);
    image.handle = Some(7);
    let doc = Document::from_blocks(vec![para(vec![Inline::Image(image)])]);
    let markup = serialize(&doc);
    insta::assert_snapshot!(
        markup,
        @r#"<p><img src="pic.png" class="resizable-img" tabindex="0" data-handle="7" style="width: 320px; height: auto"></p>"#
    );
    assert_eq!(parse(&markup).unwrap(), doc);
}

#[test]
fn test_spelling_marks_parse_lowercased() {
    let doc = parse(
        "<p><mark class=\"spelling-error\" data-word=\"TEH\">Teh</mark> rest</p>",
    )
    .unwrap();
    let inlines = doc.blocks[0].inlines().unwrap();
    assert_eq!(inlines[0].as_run().unwrap().mark.as_deref(), Some("teh"));
    assert_eq!(inlines[1].as_run().unwrap().mark, None);
}

#[test]
fn test_stray_inline_content_wraps_into_paragraph() {
    let doc = parse("go <strong>fast</strong> now").unwrap();
    assert_eq!(doc.blocks.len(), 1);
    let inlines = doc.blocks[0].inlines().unwrap();
    assert_eq!(inlines.len(), 3);
    assert!(inlines[1].as_run().unwrap().style.bold);
    assert_eq!(serialize(&doc), "<p>go <strong>fast</strong> now</p>");
}

#[test]
fn test_unknown_elements_are_transparent() {
    let doc = parse("<section><p><a href=\"x\">hi</a></p><footer>bye</footer></section>").unwrap();
    assert_eq!(doc.blocks.len(), 2);
    assert_eq!(doc.blocks[0].plain_text(), "hi");
    assert!(doc.blocks[0].inlines().unwrap()[0]
        .as_run()
        .unwrap()
        .style
        .is_plain());
    assert_eq!(doc.blocks[1].plain_text(), "bye");
}

#[test]
fn test_tbody_rows_are_table_rows() {
    let doc = parse("<table><tbody><tr><td>a</td></tr></tbody></table>").unwrap();
    let BlockBody::Table(grid) = &doc.blocks[0].body else {
        panic!("expected a table block");
    };
    assert_eq!((grid.rows, grid.cols), (1, 1));
    assert_eq!(grid.cell(0, 0).unwrap().blocks[0].plain_text(), "a");
}

#[test]
fn test_ragged_table_rows_pad_with_empty_cells() {
    let doc =
        parse("<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>").unwrap();
    let BlockBody::Table(grid) = &doc.blocks[0].body else {
        panic!("expected a table block");
    };
    assert_eq!((grid.rows, grid.cols), (2, 2));
    assert_eq!(grid.cell(1, 0).unwrap().blocks[0].plain_text(), "c");
    assert_eq!(grid.cell(1, 1).unwrap().blocks[0].plain_text(), "");
}

#[test]
fn test_page_break_div_round_trip() {
    let markup = "<div class=\"page-break\"></div><p>x</p>";
    let doc = parse(markup).unwrap();
    assert!(matches!(doc.blocks[0].body, BlockBody::PageBreak));
    assert_eq!(serialize(&doc), markup);
}

#[test]
fn test_unclosed_block_reports_eof_with_span() {
    let err = parse("<p><strong>hi").unwrap_err();
    assert!(matches!(
        err.kind(),
        MarkupErrorKind::UnexpectedEof { tag } if tag == "strong"
    ));
    assert_eq!(err.location().offset(), 3);
    assert_eq!(err.location().len(), 8);
}

#[test]
fn test_close_matching_nothing_is_mismatched() {
    let err = parse("<p>a</em>").unwrap_err();
    assert!(matches!(
        err.kind(),
        MarkupErrorKind::MismatchedClose { expected, found }
            if expected == "p" && found == "em"
    ));
}

#[test]
fn test_close_swallowing_open_block_is_mismatched() {
    let err = parse("<table><tr><td>x</table>").unwrap_err();
    assert!(matches!(
        err.kind(),
        MarkupErrorKind::MismatchedClose { expected, found }
            if expected == "td" && found == "table"
    ));
    assert_eq!(err.location().offset(), 16);
}

#[test]
fn test_unclosed_inline_closes_silently() {
    let doc = parse("<p><em>a</p>").unwrap();
    assert!(doc.blocks[0].inlines().unwrap()[0].as_run().unwrap().style.italic);
}

#[test]
fn test_unescaped_angle_bracket_is_malformed() {
    let err = parse("<p>a < b</p>").unwrap_err();
    assert!(matches!(err.kind(), MarkupErrorKind::MalformedTag));
    assert_eq!(err.location().offset(), 5);
}

#[test]
fn test_cell_outside_row_is_stray() {
    let err = parse("<td>hello</td>").unwrap_err();
    assert!(matches!(err.kind(), MarkupErrorKind::StrayCell));
    assert_eq!(err.location().offset(), 0);
    assert_eq!(err.location().len(), 4);
}

#[test]
fn test_comments_are_skipped() {
    let doc = parse("<!-- note --><p>a<!-- mid -->b</p>").unwrap();
    assert_eq!(doc.blocks[0].plain_text(), "ab");
}

#[test]
fn test_indent_parses_in_step_units() {
    let doc = parse("<p style=\"margin-left: 120px\">x</p>").unwrap();
    assert_eq!(doc.blocks[0].indent, 3);
}

#[test]
fn test_span_css_parses_with_quoted_family() {
    let doc = parse(
        "<p><span style=\"font-family: 'Courier New'; font-size: 14px; color: #ff0000\">x</span></p>",
    )
    .unwrap();
    let style = &doc.blocks[0].inlines().unwrap()[0].as_run().unwrap().style;
    assert_eq!(style.font_family.as_deref(), Some("Courier New"));
    assert_eq!(style.font_size, Some(14));
    assert_eq!(style.color.as_deref(), Some("#ff0000"));
}
