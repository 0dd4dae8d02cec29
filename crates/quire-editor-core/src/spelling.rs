//! Correction reconciliation: marking, replacing and clearing flagged words.
//!
//! Marks live on the runs themselves, anchored to real tree positions by
//! scanning each block's own text rather than its serialized form. A
//! reported error blankets every case-insensitive whole-word occurrence of
//! the word, not just the reported position.

use std::collections::BTreeSet;

use smol_str::SmolStr;

use crate::document::Document;
use crate::format::{coalesce_runs, split_inline_at};
use crate::node::{Inline, Run};

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Mark every whole-word occurrence of the given lowercased words. Returns
/// the number of occurrences marked.
pub fn mark_errors(doc: &mut Document, words: &BTreeSet<SmolStr>) -> usize {
    if words.is_empty() {
        return 0;
    }
    let mut marked = 0usize;
    doc.for_each_text_block_mut(&mut |block| {
        let Some(inlines) = block.inlines_mut() else {
            return;
        };
        // Chars with their inline offsets; images count one non-word unit.
        let mut units: Vec<(usize, char)> = Vec::new();
        let mut offset = 0usize;
        for inline in inlines.iter() {
            match inline {
                Inline::Run(run) => {
                    for ch in run.text.chars() {
                        units.push((offset, ch));
                        offset += 1;
                    }
                }
                Inline::Image(_) => {
                    units.push((offset, '\u{FFFC}'));
                    offset += 1;
                }
            }
        }

        let mut ranges: Vec<(usize, usize, SmolStr)> = Vec::new();
        let mut index = 0;
        while index < units.len() {
            if !is_word_char(units[index].1) {
                index += 1;
                continue;
            }
            let start = index;
            while index < units.len() && is_word_char(units[index].1) {
                index += 1;
            }
            let token: String = units[start..index]
                .iter()
                .flat_map(|(_, c)| c.to_lowercase())
                .collect();
            if words.contains(token.as_str()) {
                let from = units[start].0;
                ranges.push((from, from + (index - start), SmolStr::new(token)));
            }
        }

        // Splitting never changes inline offsets, so ranges stay valid.
        for (from, to, word) in ranges {
            let first = split_inline_at(inlines, from);
            let last = split_inline_at(inlines, to);
            for inline in &mut inlines[first..last] {
                if let Inline::Run(run) = inline {
                    if !run.is_marker() {
                        run.mark = Some(word.clone());
                    }
                }
            }
            marked += 1;
        }
        coalesce_runs(inlines);
    });
    marked
}

/// Replace every marked occurrence of `word` with plain replacement text.
/// Returns the number of occurrences replaced.
pub fn apply_suggestion(doc: &mut Document, word: &str, suggestion: &str) -> usize {
    let word = word.to_lowercase();
    let mut replaced = 0usize;
    doc.for_each_text_block_mut(&mut |block| {
        let Some(inlines) = block.inlines_mut() else {
            return;
        };
        let mut index = 0;
        while index < inlines.len() {
            if !run_marked_with(&inlines[index], &word) {
                index += 1;
                continue;
            }
            let mut end = index + 1;
            while end < inlines.len() && run_marked_with(&inlines[end], &word) {
                end += 1;
            }
            inlines.splice(index..end, [Inline::Run(Run::new(suggestion))]);
            replaced += 1;
            index += 1;
        }
        coalesce_runs(inlines);
    });
    replaced
}

/// Unmark every occurrence of `word`, keeping the text. Returns the number
/// of runs cleared.
pub fn clear_marks(doc: &mut Document, word: &str) -> usize {
    let word = word.to_lowercase();
    let mut cleared = 0usize;
    doc.for_each_text_block_mut(&mut |block| {
        let Some(inlines) = block.inlines_mut() else {
            return;
        };
        let mut touched = false;
        for inline in inlines.iter_mut() {
            if let Inline::Run(run) = inline {
                if run.mark.as_deref() == Some(word.as_str()) {
                    run.mark = None;
                    cleared += 1;
                    touched = true;
                }
            }
        }
        if touched {
            coalesce_runs(inlines);
        }
    });
    cleared
}

/// Drop any mark whose word is no longer in the active error set.
pub fn sweep_marks(doc: &mut Document, active: &BTreeSet<SmolStr>) {
    doc.for_each_text_block_mut(&mut |block| {
        let Some(inlines) = block.inlines_mut() else {
            return;
        };
        let mut touched = false;
        for inline in inlines.iter_mut() {
            if let Inline::Run(run) = inline {
                if let Some(mark) = &run.mark {
                    if !active.contains(mark.as_str()) {
                        run.mark = None;
                        touched = true;
                    }
                }
            }
        }
        if touched {
            coalesce_runs(inlines);
        }
    });
}

/// The distinct words currently marked anywhere in the tree. Used to
/// rebuild the active error set from a reloaded document.
pub fn marked_words(doc: &Document) -> BTreeSet<SmolStr> {
    let mut words = BTreeSet::new();
    doc.for_each_text_block(&mut |block| {
        let Some(inlines) = block.inlines() else {
            return;
        };
        for inline in inlines {
            if let Inline::Run(run) = inline {
                if let Some(mark) = &run.mark {
                    words.insert(mark.clone());
                }
            }
        }
    });
    words
}

fn run_marked_with(inline: &Inline, word: &str) -> bool {
    matches!(inline, Inline::Run(run) if run.mark.as_deref() == Some(word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Block, ImageNode, TextKind};
    use crate::style::Style;

    fn words(list: &[&str]) -> BTreeSet<SmolStr> {
        list.iter().map(|w| SmolStr::new(*w)).collect()
    }

    fn para(text: &str) -> Block {
        Block::text(TextKind::Paragraph, vec![Inline::Run(Run::new(text))])
    }

    fn marked_texts(doc: &Document) -> Vec<String> {
        let mut out = Vec::new();
        doc.for_each_text_block(&mut |block| {
            if let Some(inlines) = block.inlines() {
                for inline in inlines {
                    if let Inline::Run(run) = inline {
                        if run.mark.is_some() {
                            out.push(run.text.clone());
                        }
                    }
                }
            }
        });
        out
    }

    #[test]
    fn test_marks_every_occurrence_case_insensitive() {
        let mut doc = Document::from_blocks(vec![para("Teh cat, teh dog. TEH!")]);
        let marked = mark_errors(&mut doc, &words(&["teh"]));
        assert_eq!(marked, 3);
        assert_eq!(marked_texts(&doc), vec!["Teh", "teh", "TEH"]);
    }

    #[test]
    fn test_whole_word_boundaries() {
        let mut doc = Document::from_blocks(vec![para("the theme the_me lathe")]);
        let marked = mark_errors(&mut doc, &words(&["the"]));
        assert_eq!(marked, 1);
        assert_eq!(marked_texts(&doc), vec!["the"]);
    }

    #[test]
    fn test_marks_word_split_across_styled_runs() {
        let mut bold = Style::default();
        bold.bold = true;
        let mut doc = Document::from_blocks(vec![Block::text(
            TextKind::Paragraph,
            vec![
                Inline::Run(Run::styled("Te", bold)),
                Inline::Run(Run::new("h cat")),
            ],
        )]);
        let marked = mark_errors(&mut doc, &words(&["teh"]));
        assert_eq!(marked, 1);
        assert_eq!(marked_texts(&doc), vec!["Te", "h"]);
        assert_eq!(doc.blocks[0].plain_text(), "Teh cat");
    }

    #[test]
    fn test_image_interrupts_a_word() {
        let mut doc = Document::from_blocks(vec![Block::text(
            TextKind::Paragraph,
            vec![
                Inline::Run(Run::new("ca")),
                Inline::Image(ImageNode::new("pic.png")),
                Inline::Run(Run::new("t")),
            ],
        )]);
        assert_eq!(mark_errors(&mut doc, &words(&["cat"])), 0);
    }

    #[test]
    fn test_apply_suggestion_replaces_all_with_plain_text() {
        let mut bold = Style::default();
        bold.bold = true;
        let mut doc = Document::from_blocks(vec![
            para("Teh cat sat"),
            Block::text(TextKind::Paragraph, vec![Inline::Run(Run::styled("teh", bold))]),
        ]);
        mark_errors(&mut doc, &words(&["teh"]));
        let replaced = apply_suggestion(&mut doc, "Teh", "The");
        assert_eq!(replaced, 2);
        assert_eq!(doc.blocks[0].plain_text(), "The cat sat");
        assert_eq!(doc.blocks[1].plain_text(), "The");
        // The styled occurrence came back plain and unmarked.
        let run = doc.blocks[1].inlines().unwrap()[0].as_run().unwrap();
        assert!(run.style.is_plain());
        assert!(run.mark.is_none());
        assert!(marked_texts(&doc).is_empty());
    }

    #[test]
    fn test_apply_suggestion_merges_with_neighbors() {
        let mut doc = Document::from_blocks(vec![para("a teh b")]);
        mark_errors(&mut doc, &words(&["teh"]));
        apply_suggestion(&mut doc, "teh", "the");
        assert_eq!(doc.blocks[0].inlines().unwrap().len(), 1);
        assert_eq!(doc.blocks[0].plain_text(), "a the b");
    }

    #[test]
    fn test_ignore_keeps_text_drops_marks() {
        let mut doc = Document::from_blocks(vec![para("teh cat teh")]);
        mark_errors(&mut doc, &words(&["teh"]));
        let cleared = clear_marks(&mut doc, "TEH");
        assert!(cleared >= 2);
        assert!(marked_texts(&doc).is_empty());
        assert_eq!(doc.blocks[0].plain_text(), "teh cat teh");
        assert_eq!(doc.blocks[0].inlines().unwrap().len(), 1);
    }

    #[test]
    fn test_sweep_drops_stale_marks_only() {
        let mut doc = Document::from_blocks(vec![para("teh wrd ok")]);
        mark_errors(&mut doc, &words(&["teh", "wrd"]));
        sweep_marks(&mut doc, &words(&["wrd"]));
        assert_eq!(marked_texts(&doc), vec!["wrd"]);
    }

    #[test]
    fn test_marks_inside_table_cells() {
        let mut grid = crate::node::TableGrid::new(1, 1);
        grid.cell_mut(0, 0).unwrap().blocks = vec![para("teh")];
        let mut doc = Document::from_blocks(vec![para("x"), Block::table(grid)]);
        assert_eq!(mark_errors(&mut doc, &words(&["teh"])), 1);
    }

    #[test]
    fn test_marked_words_collects_distinct_set() {
        let mut doc = Document::from_blocks(vec![para("teh wrd teh ok")]);
        mark_errors(&mut doc, &words(&["teh", "wrd"]));
        assert_eq!(marked_words(&doc), words(&["teh", "wrd"]));
        assert!(marked_words(&Document::new()).is_empty());
    }
}
