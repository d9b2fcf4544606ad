use crate::storage::types::PostRecord;

/// Renders a record's metadata as a YAML front-matter block, including the
/// `---` fences and a trailing newline.
///
/// Only fields that carry information are emitted: empty dates, tag lists
/// and category lists are omitted entirely, and `comments` appears only
/// when explicitly false.
pub fn render(record: &PostRecord) -> String {
    let mut out = String::from("---\n");

    out.push_str("title: ");
    out.push_str(&scalar(&record.title));
    out.push('\n');

    out.push_str(&format!("id: {}\n", record.id));

    if !record.date.is_empty() {
        // Verbatim source timestamp; quoting would change how generators
        // interpret it.
        out.push_str(&format!("date: {}\n", record.date));
    }

    if !record.tags.is_empty() {
        out.push_str("tags:\n");
        for tag in &record.tags {
            out.push_str(&format!("  - {}\n", scalar(tag)));
        }
    }

    if !record.categories.is_empty() {
        out.push_str("categories:\n");
        for path in &record.categories {
            for (i, name) in path.iter().enumerate() {
                if i == 0 {
                    out.push_str(&format!("  - - {}\n", scalar(name)));
                } else {
                    out.push_str(&format!("    - {}\n", scalar(name)));
                }
            }
        }
    }

    if record.comments == Some(false) {
        out.push_str("comments: false\n");
    }

    if let Some(alias) = &record.alias {
        out.push_str(&format!("alias: {}\n", scalar(alias)));
    }

    out.push_str("---\n");
    out
}

/// Formats a string as a YAML scalar: plain when it is unambiguous,
/// single-quoted (with `''` escaping) otherwise.
fn scalar(s: &str) -> String {
    if is_plain_safe(s) {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "''"))
    }
}

fn is_plain_safe(s: &str) -> bool {
    if s.is_empty() || s != s.trim() {
        return false;
    }
    // Characters with YAML meaning anywhere in a scalar, plus indicators
    // that are only special at the start but cheap to quote uniformly.
    if s.starts_with(['-', '?', '!', '&', '*', '>', '|', '%', '@', '"', '\'', '[', '{']) {
        return false;
    }
    !s.chars().any(|c| matches!(c, ':' | '#' | ',' | ']' | '}' | '\n' | '\t'))
        && !matches!(s, "true" | "false" | "null" | "~" | "yes" | "no")
}
