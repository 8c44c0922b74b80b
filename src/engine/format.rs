//! Output line formatting.

use std::fmt::Write as _;

use crate::types::ResultLine;

/// Append `url, #rrggbb, #rrggbb, #rrggbb\n` to `buf`, with as many color fields as were found (0–3).
pub fn write_result_line(buf: &mut String, line: &ResultLine) {
    buf.push_str(&line.url);
    for color in &line.colors {
        // Writing to a String cannot fail.
        let _ = write!(buf, ", {color}");
    }
    buf.push('\n');
}

/// Format one result line including the trailing newline.
pub fn format_result_line(line: &ResultLine) -> String {
    let mut s = String::with_capacity(line.url.len() + line.colors.len() * 9 + 1);
    write_result_line(&mut s, line);
    s
}
