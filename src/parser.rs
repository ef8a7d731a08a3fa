use crate::error::ParseError;

/// How [`tokenize`] treats a quoted word that never closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fail the whole line with [`ParseError::UnterminatedQuote`].
    Strict,
    /// Keep going: the broken word runs to the next blank, unprocessed.
    /// Used while completing, when the user may still be typing inside quotes.
    Lenient,
}

/// One word of an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Word content. Quoted words have their quotes removed and `\<quote>`
    /// resolved; bare words are kept as typed.
    pub text: String,
    /// Byte offset of the first character, quotes included.
    pub start: usize,
    /// Byte offset one past the last character, quotes included.
    pub end: usize,
    /// Zero-based position of the word in its line.
    pub index: usize,
}

impl Word {
    /// The word exactly as it appears in `line`, quotes included.
    pub fn raw<'a>(&self, line: &'a str) -> &'a str {
        &line[self.start..self.end]
    }
}

pub(crate) fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

pub(crate) fn is_quote(b: u8) -> bool {
    b == b'\'' || b == b'"'
}

/// Splits an input line into words.
///
/// Words are separated by runs of spaces and tabs. A word that starts with
/// `'` or `"` runs to the matching closing quote, where a backslash makes the
/// next quote character literal; the closing quote must be followed by a
/// blank or the end of the line. Any other word runs to the next blank with
/// no escape processing.
///
/// # Example
/// ```
/// use gatesh::parser::{tokenize, Mode};
///
/// let words = tokenize("cp 'a b.txt' c.txt", Mode::Strict).unwrap();
/// let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
/// assert_eq!(texts, vec!["cp", "a b.txt", "c.txt"]);
/// ```
pub fn tokenize(line: &str, mode: Mode) -> Result<Vec<Word>, ParseError> {
    let bytes = line.as_bytes();
    let mut words = Vec::new();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && is_blank(bytes[pos]) {
            pos += 1;
        }
        if pos == bytes.len() {
            break;
        }

        let start = pos;
        let (end, text) = if is_quote(bytes[start]) {
            match scan_quoted(line, start) {
                Some(found) => found,
                None if mode == Mode::Lenient => {
                    let end = scan_bare(bytes, start);
                    (end, line[start..end].to_string())
                }
                None => return Err(ParseError::UnterminatedQuote { offset: start }),
            }
        } else {
            let end = scan_bare(bytes, start);
            (end, line[start..end].to_string())
        };

        words.push(Word {
            text,
            start,
            end,
            index: words.len(),
        });
        pos = end;
    }

    Ok(words)
}

fn scan_bare(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && !is_blank(bytes[end]) {
        end += 1;
    }
    end
}

/// Scans a quoted word starting at `start` (which holds the quote).
/// Returns the end offset and the unquoted content, or `None` if the quote
/// does not close properly.
fn scan_quoted(line: &str, start: usize) -> Option<(usize, String)> {
    let bytes = line.as_bytes();
    let quote = bytes[start];
    let mut text = String::new();
    let mut segment = start + 1;
    let mut pos = start + 1;

    while pos < bytes.len() {
        let b = bytes[pos];
        if b == b'\\' && bytes.get(pos + 1) == Some(&quote) {
            // drop the backslash, keep the quote as content
            text.push_str(&line[segment..pos]);
            segment = pos + 1;
            pos += 2;
        } else if b == quote {
            text.push_str(&line[segment..pos]);
            let end = pos + 1;
            return match bytes.get(end) {
                None => Some((end, text)),
                Some(&next) if is_blank(next) => Some((end, text)),
                Some(_) => None,
            };
        } else {
            pos += 1;
        }
    }
    None
}
