//! Pretty-printing for reply frames.
//!
//! Renders replies the way redis-cli users expect to read them, with
//! colors from `colored`.

use colored::Colorize;
use strata_protocol::Frame;

/// Formats a reply frame for terminal display.
///
/// - simple strings: green
/// - errors: red with `(error)` prefix
/// - integers: yellow with `(integer)` prefix
/// - bulk strings: green, quoted
/// - nil: dim `(nil)`
/// - arrays: numbered list
/// - maps: key => value pairs
pub fn format_response(frame: &Frame) -> String {
    format_frame(frame)
}

/// Strips ANSI escape sequences and other control characters so stored
/// members can't drive the terminal. Keeps printable text, tabs and
/// newlines.
fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            // skip the ESC and the rest of a CSI sequence
            if chars.next() == Some('[') {
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else if ch == '\t' || ch == '\n' || !ch.is_control() {
            out.push(ch);
        }
    }
    out
}

fn format_frame(frame: &Frame) -> String {
    match frame {
        Frame::Simple(s) => sanitize(s).green().to_string(),

        Frame::Error(e) => format!("{} {}", "(error)".red(), sanitize(e).red()),

        Frame::Integer(n) => format!("{} {}", "(integer)".yellow(), n.to_string().yellow()),

        Frame::Bulk(data) => match std::str::from_utf8(data) {
            Ok(s) => format!("\"{}\"", sanitize(s)).green().to_string(),
            Err(_) => {
                // binary member, show as hex
                let hex: String = data.iter().map(|b| format!("{b:02x}")).collect();
                hex.green().to_string()
            }
        },

        Frame::Null => "(nil)".dimmed().to_string(),

        Frame::Array(items) if items.is_empty() => "(empty array)".dimmed().to_string(),

        Frame::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}) {}", i + 1, format_frame(item)))
            .collect::<Vec<_>>()
            .join("\n"),

        Frame::Map(pairs) if pairs.is_empty() => "(empty map)".dimmed().to_string(),

        Frame::Map(pairs) => pairs
            .iter()
            .enumerate()
            .map(|(i, (key, val))| {
                format!("{}) {} => {}", i + 1, format_frame(key), format_frame(val))
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
