use dissimilar::{diff, Chunk};
use std::collections::HashMap;

const CONTEXT_LINES: usize = 3;
const OLD_HEADER: &str = "Previous version";
const NEW_HEADER: &str = "Current version";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tag {
    Equal,
    Delete,
    Insert,
}

/// One line of the edit script, with the line index it sits at on each side.
struct Entry<'a> {
    tag: Tag,
    line: &'a str,
    old_at: usize,
    new_at: usize,
}

/// Line-based unified diff of `old` against `new`. Empty when nothing changed.
pub fn unified_diff(old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let new_lines: Vec<&str> = new.split_inclusive('\n').collect();
    let entries = edit_script(&old_lines, &new_lines);

    let changes: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.tag != Tag::Equal)
        .map(|(i, _)| i)
        .collect();
    if changes.is_empty() {
        return String::new();
    }

    let mut out = format!("--- {}\n+++ {}\n", OLD_HEADER, NEW_HEADER);
    for (first, last) in group_changes(&changes) {
        let start = first.saturating_sub(CONTEXT_LINES);
        let end = (last + 1 + CONTEXT_LINES).min(entries.len());
        let hunk = &entries[start..end];

        let old_len = hunk.iter().filter(|e| e.tag != Tag::Insert).count();
        let new_len = hunk.iter().filter(|e| e.tag != Tag::Delete).count();
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            format_range(hunk[0].old_at, old_len),
            format_range(hunk[0].new_at, new_len)
        ));
        for entry in hunk {
            let prefix = match entry.tag {
                Tag::Equal => ' ',
                Tag::Delete => '-',
                Tag::Insert => '+',
            };
            out.push(prefix);
            out.push_str(entry.line);
            if !entry.line.ends_with('\n') {
                out.push('\n');
            }
        }
    }
    out
}

/// Diff the two line sequences by encoding every distinct line as one code point.
fn edit_script<'a>(old_lines: &[&'a str], new_lines: &[&'a str]) -> Vec<Entry<'a>> {
    let mut codes: HashMap<&'a str, char> = HashMap::new();
    let mut table: Vec<&'a str> = Vec::new();
    let (old_encoded, new_encoded) = match (
        encode_lines(old_lines, &mut codes, &mut table),
        encode_lines(new_lines, &mut codes, &mut table),
    ) {
        (Some(o), Some(n)) => (o, n),
        // Too many distinct lines to encode; report a full replacement.
        _ => return full_replacement(old_lines, new_lines),
    };

    let mut entries = Vec::with_capacity(old_lines.len().max(new_lines.len()));
    let (mut old_at, mut new_at) = (0usize, 0usize);
    for chunk in diff(&old_encoded, &new_encoded) {
        let (tag, text) = match chunk {
            Chunk::Equal(text) => (Tag::Equal, text),
            Chunk::Delete(text) => (Tag::Delete, text),
            Chunk::Insert(text) => (Tag::Insert, text),
        };
        for code in text.chars() {
            let line = table[decode(code)];
            entries.push(Entry { tag, line, old_at, new_at });
            match tag {
                Tag::Equal => {
                    old_at += 1;
                    new_at += 1;
                }
                Tag::Delete => old_at += 1,
                Tag::Insert => new_at += 1,
            }
        }
    }
    entries
}

fn encode_lines<'a>(
    lines: &[&'a str],
    codes: &mut HashMap<&'a str, char>,
    table: &mut Vec<&'a str>,
) -> Option<String> {
    let mut encoded = String::with_capacity(lines.len());
    for &line in lines {
        let code = match codes.get(line) {
            Some(code) => *code,
            None => {
                let code = encode(table.len())?;
                codes.insert(line, code);
                table.push(line);
                code
            }
        };
        encoded.push(code);
    }
    Some(encoded)
}

// Surrogates are not valid chars, so indices at or above 0xD800 are shifted past them.
fn encode(index: usize) -> Option<char> {
    let index = u32::try_from(index).ok()?;
    let code = if index < 0xD800 { index } else { index.checked_add(0x800)? };
    char::from_u32(code)
}

fn decode(code: char) -> usize {
    let code = code as u32;
    let index = if code < 0xD800 { code } else { code - 0x800 };
    index as usize
}

fn full_replacement<'a>(old_lines: &[&'a str], new_lines: &[&'a str]) -> Vec<Entry<'a>> {
    let deletes = old_lines.iter().enumerate().map(|(i, &line)| Entry {
        tag: Tag::Delete,
        line,
        old_at: i,
        new_at: 0,
    });
    let inserts = new_lines.iter().enumerate().map(|(i, &line)| Entry {
        tag: Tag::Insert,
        line,
        old_at: old_lines.len(),
        new_at: i,
    });
    deletes.chain(inserts).collect()
}

/// Merge change indices whose gap is small enough to share context into (first, last) pairs.
fn group_changes(changes: &[usize]) -> Vec<(usize, usize)> {
    let mut groups: Vec<(usize, usize)> = Vec::new();
    for &idx in changes {
        match groups.last_mut() {
            Some((_, last)) if idx - *last <= 2 * CONTEXT_LINES + 1 => *last = idx,
            _ => groups.push((idx, idx)),
        }
    }
    groups
}

fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_has_no_diff() {
        assert_eq!(unified_diff("a\nb\n", "a\nb\n"), "");
        assert_eq!(unified_diff("", ""), "");
    }

    #[test]
    fn replacing_placeholder_shows_one_insert() {
        let d = unified_diff("// Start coding here...", "hello");
        assert_eq!(
            d,
            "--- Previous version\n+++ Current version\n@@ -1 +1 @@\n-// Start coding here...\n+hello\n"
        );
        assert_eq!(d.lines().filter(|l| l.starts_with('+') && !l.starts_with("+++")).count(), 1);
    }

    #[test]
    fn insert_into_empty() {
        let d = unified_diff("", "one\ntwo\n");
        assert_eq!(d, "--- Previous version\n+++ Current version\n@@ -0,0 +1,2 @@\n+one\n+two\n");
    }

    #[test]
    fn keeps_three_lines_of_context() {
        let old = "1\n2\n3\n4\n5\n6\n7\n8\n9\n";
        let new = "1\n2\n3\n4\nfive\n6\n7\n8\n9\n";
        let d = unified_diff(old, new);
        assert!(d.contains("@@ -2,7 +2,7 @@\n"), "{}", d);
        assert!(d.contains(" 2\n 3\n 4\n-5\n+five\n 6\n 7\n 8\n"), "{}", d);
        assert!(!d.contains(" 1\n"));
        assert!(!d.contains(" 9\n"));
    }

    #[test]
    fn distant_changes_make_separate_hunks() {
        let old: String = (1..=20).map(|i| format!("line {}\n", i)).collect();
        let new = old.replace("line 2\n", "line two\n").replace("line 19\n", "line nineteen\n");
        let d = unified_diff(&old, &new);
        assert_eq!(d.matches("@@ -").count(), 2, "{}", d);
    }

    #[test]
    fn encoding_skips_surrogates() {
        for index in [0usize, 0xD7FF, 0xD800, 0xE000, 0x10_0000] {
            let code = encode(index).unwrap();
            assert_eq!(decode(code), index);
        }
    }
}
