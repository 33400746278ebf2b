use rollcall_roster::Table;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a preview column may grow before cells are truncated.
const MAX_PREVIEW_WIDTH: usize = 32;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` to at most `width` display columns, marking the cut with "..".
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .find(|ch| ch.width().unwrap_or(0) <= width)
            .map(String::from)
            .unwrap_or_default();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = ch.width().unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str("..");
    out
}

/// Pad or truncate to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// Aligned text preview of the first `limit` rows of the named columns.
/// Columns the table lacks are skipped.
pub(crate) fn render_preview(table: &Table, columns: &[&str], limit: usize) -> String {
    let picked: Vec<(usize, &str)> = columns
        .iter()
        .filter_map(|name| table.column_index(name).map(|idx| (idx, *name)))
        .collect();
    if picked.is_empty() {
        return String::new();
    }

    let rows: Vec<_> = table.rows().iter().take(limit).collect();
    let widths: Vec<usize> = picked
        .iter()
        .map(|(idx, name)| {
            rows.iter()
                .map(|r| display_width(r.get(*idx)))
                .chain(std::iter::once(display_width(name)))
                .max()
                .unwrap_or(0)
                .min(MAX_PREVIEW_WIDTH)
        })
        .collect();

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad_right(c, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(picked.iter().map(|(_, name)| *name).collect()));
    out.push('\n');
    for row in rows {
        out.push_str(&line(picked.iter().map(|(idx, _)| row.get(*idx)).collect()));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_width_cjk() {
        // CJK characters are 2 display columns each
        assert_eq!(display_width("\u{4e16}\u{754c}"), 4);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn truncate_cuts() {
        assert_eq!(truncate_display("abc", 3), "abc");
        assert_eq!(truncate_display("abcdef", 5), "abc..");
        assert_eq!(truncate_display("abc", 2), "a");
        assert_eq!(truncate_display("", 0), "");
    }

    #[test]
    fn truncate_cjk_boundary() {
        let s = "\u{4e16}\u{754c}\u{4f60}\u{597d}";
        let t = truncate_display(s, 6);
        assert_eq!(t, "\u{4e16}\u{754c}..");
        assert!(display_width(&t) <= 6);
    }

    #[test]
    fn pad_right_pads_and_cuts() {
        assert_eq!(pad_right("ab", 5), "ab   ");
        assert_eq!(pad_right("abcde", 5), "abcde");
        assert_eq!(pad_right("abcdef", 5), "abc..");
    }

    #[test]
    fn preview_aligns_selected_columns() {
        let table = Table::from_rows(
            vec!["Employee ID".into(), "Dept".into(), "Email".into()],
            vec![
                vec!["A3", "History", "markobrienA3@x.edu"],
                vec!["ID12345", "Maths", "johnsmith45@x.edu"],
                vec!["EMP7", "Maths", "annleeP7@x.edu"],
            ],
        );
        let text = render_preview(&table, &["Employee ID", "Email", "Missing"], 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Employee ID  Email");
        assert_eq!(lines[1], "A3           markobrienA3@x.edu");
        assert_eq!(lines[2], "ID12345      johnsmith45@x.edu");
    }

    #[test]
    fn preview_without_known_columns_is_empty() {
        let table = Table::new(vec!["a".into()]);
        assert_eq!(render_preview(&table, &["b"], 5), "");
    }
}
