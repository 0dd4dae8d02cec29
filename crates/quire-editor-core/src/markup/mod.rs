//! The serialized document dialect.
//!
//! Documents persist as an HTML-shaped markup string. The writer emits one
//! canonical form; the parser accepts that form plus the usual leniencies
//! (alias tags, unknown attributes, stray inline content at block level),
//! so serialize-parse-serialize is stable byte for byte.
//!
//! Inline containers nest in one canonical order, outermost first:
//! `mark`, `strong`, `em`, `u`, `s`, `span`. Zero-width style markers are
//! never serialized.

mod parser;
mod writer;

#[cfg(test)]
mod tests;

pub use parser::parse;
pub use writer::serialize;

/// Class carried by the forced-break block element.
pub(crate) const PAGE_BREAK_CLASS: &str = "page-break";
/// Class carried by spell-error highlight elements.
pub(crate) const SPELL_MARK_CLASS: &str = "spelling-error";
/// Class marking embedded images as resize targets in the host surface.
pub(crate) const RESIZABLE_IMG_CLASS: &str = "resizable-img";
/// One indent level in serialized margin units.
pub(crate) const INDENT_STEP_PX: u32 = 40;

/// Escape text content. Quotes stay literal outside attributes.
pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an attribute value for double-quoted position.
pub(crate) fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Decode the entities the dialect knows. Unknown sequences pass through
/// as literal text.
pub(crate) fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find(';') {
            Some(end) if end <= 10 => {
                let entity = &tail[1..end];
                let decoded = match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => decode_numeric(entity),
                };
                match decoded {
                    Some(ch) => {
                        out.push(ch);
                        rest = &tail[end + 1..];
                    }
                    None => {
                        out.push('&');
                        rest = &tail[1..];
                    }
                }
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_numeric(entity: &str) -> Option<char> {
    let code = entity.strip_prefix('#')?;
    let value = match code.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => code.parse::<u32>().ok()?,
    };
    char::from_u32(value)
}
