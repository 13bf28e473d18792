//! Turning pasted terminal text into file paths.
//!
//! Clipboard pastes and drag-and-drop onto the terminal both arrive as
//! bracketed-paste text. Depending on the source this is one path per
//! line, `file://` URIs, or a shell-quoted list such as
//! `'/tmp/a b.png' /tmp/c\ d.png`.

use std::path::PathBuf;

/// Existing files named by `text`, in order, without duplicates.
pub fn paths_from_paste(text: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // A bare path containing spaces is the common clipboard case.
        let whole = to_path(line);
        let candidates = if whole.exists() {
            vec![whole]
        } else {
            split_shell_words(line).iter().map(|w| to_path(w)).collect()
        };

        for path in candidates {
            if path.exists() && !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    paths
}

fn to_path(word: &str) -> PathBuf {
    match word.strip_prefix("file://") {
        Some(rest) => {
            let rest = rest.strip_prefix("localhost").unwrap_or(rest);
            PathBuf::from(percent_decode(rest))
        }
        None => PathBuf::from(word),
    }
}

/// Split on unquoted whitespace, honouring single quotes, double quotes
/// and backslash escapes.
fn split_shell_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_word {
        words.push(current);
    }
    words
}

/// Decode `%XX` escapes; malformed escapes are kept as-is.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    let hex = |b: u8| (b as char).to_digit(16).map(|d| d as u8);

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_split_shell_words() {
        assert_eq!(split_shell_words("a b"), vec!["a", "b"]);
        assert_eq!(split_shell_words("'a b' c"), vec!["a b", "c"]);
        assert_eq!(split_shell_words(r"a\ b   c"), vec!["a b", "c"]);
        assert_eq!(split_shell_words(r#""x \"y\"" ''"#), vec![r#"x "y""#, ""]);
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("/tmp/a%20b.png"), "/tmp/a b.png");
        assert_eq!(percent_decode("/tmp/caf%C3%A9.png"), "/tmp/café.png");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn test_paths_from_paste_formats() {
        let dir = tempdir().unwrap();
        let spaced = dir.path().join("funny cat.png");
        let plain = dir.path().join("doge.jpg");
        File::create(&spaced).unwrap();
        File::create(&plain).unwrap();

        // Bare path with spaces
        assert_eq!(paths_from_paste(&spaced.to_string_lossy()), vec![spaced.clone()]);

        // Shell-quoted drag and drop of two files
        let dropped = format!("'{}' {}", spaced.display(), plain.display());
        assert_eq!(paths_from_paste(&dropped), vec![spaced.clone(), plain.clone()]);

        // file:// URIs, one per line, with a duplicate and a missing file
        let uris = format!(
            "file://{}\nfile://{}\n{}\n/definitely/not/here.png\n",
            spaced.to_string_lossy().replace(' ', "%20"),
            plain.display(),
            plain.display()
        );
        assert_eq!(paths_from_paste(&uris), vec![spaced, plain]);
    }

    #[test]
    fn test_paths_from_paste_ignores_plain_text() {
        assert!(paths_from_paste("just some words\n\n").is_empty());
    }
}
