//! Raw-mode line editor with history and tab completion.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use termion::event::Key;
use termion::input::TermRead;
use termion::raw::IntoRawMode;

use crate::{Completer, CompletionKind, LineEditor};

const BELL: &str = "\x07";

/// Line editor for an interactive terminal.
#[derive(Debug)]
pub struct TermEditor {
    history: Vec<String>,
    history_limit: usize,
}

impl TermEditor {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history: Vec::new(),
            history_limit,
        }
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Records a submitted line. Blank lines and repeats of the previous
    /// line are skipped.
    pub fn remember(&mut self, line: &str) {
        if line.trim().is_empty() || self.history.last().is_some_and(|last| last == line) {
            return;
        }
        self.history.push(line.to_string());
        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
        }
    }
}

impl LineEditor for TermEditor {
    fn read_line(
        &mut self,
        prompt: &str,
        completer: &dyn Completer,
    ) -> anyhow::Result<Option<String>> {
        print!("{prompt}");
        io::stdout().flush()?;

        // Enter raw mode to handle input key by key
        let mut stdout = io::stdout().into_raw_mode()?;
        let stdin = io::stdin();
        let mut buffer = String::new();
        // index into history while browsing; history.len() means "the new line"
        let mut browse = self.history.len();

        for key in stdin.keys() {
            match key? {
                Key::Ctrl('c') => {
                    buffer.clear();
                    browse = self.history.len();
                    write!(stdout, "^C\r\n{prompt}")?;
                }
                Key::Ctrl('d') => {
                    if buffer.is_empty() {
                        write!(stdout, "\r\n")?;
                        return Ok(None);
                    }
                }
                Key::Char('\n') | Key::Char('\r') => {
                    write!(stdout, "\r\n")?;
                    break;
                }
                Key::Char('\t') => {
                    let output = tab_complete(&mut buffer, completer);
                    match output {
                        TabOutput::Insert(text) => write!(stdout, "{text}")?,
                        TabOutput::List(names) => {
                            write!(stdout, "\r\n{}\r\n{prompt}{buffer}", names.join("  "))?
                        }
                        TabOutput::Bell => write!(stdout, "{BELL}")?,
                    }
                }
                Key::Backspace => {
                    if buffer.pop().is_some() {
                        // Move cursor back, erase char with space, move back again
                        write!(stdout, "\x08 \x08")?;
                    }
                }
                Key::Up if browse > 0 => {
                    browse -= 1;
                    buffer = self.history[browse].clone();
                    redraw(&mut stdout, prompt, &buffer)?;
                }
                Key::Down if browse < self.history.len() => {
                    browse += 1;
                    buffer = self.history.get(browse).cloned().unwrap_or_default();
                    redraw(&mut stdout, prompt, &buffer)?;
                }
                Key::Char(c) => {
                    buffer.push(c);
                    write!(stdout, "{c}")?;
                }
                _ => {}
            }
            stdout.flush()?;
        }

        // Disable raw mode before the command writes anything
        drop(stdout);
        self.remember(&buffer);
        Ok(Some(buffer))
    }
}

fn redraw(stdout: &mut impl Write, prompt: &str, buffer: &str) -> io::Result<()> {
    write!(stdout, "\r{}{prompt}{buffer}", termion::clear::CurrentLine)
}

/// What a Tab press should do to the terminal.
#[derive(Debug, PartialEq, Eq)]
enum TabOutput {
    /// Text appended to the line.
    Insert(String),
    /// Several candidates to show below the line.
    List(Vec<String>),
    Bell,
}

fn tab_complete(buffer: &mut String, completer: &dyn Completer) -> TabOutput {
    let completion = completer.complete(buffer.as_str(), buffer.len());
    let word = &buffer[completion.start..];
    let (candidates, is_path) = match completion.kind {
        CompletionKind::CommandName => (completion.candidates, false),
        CompletionKind::FilenameLike => (path_candidates(word), true),
        CompletionKind::None => return TabOutput::Bell,
    };

    let insert = match candidates.len() {
        0 => return TabOutput::Bell,
        1 => {
            let only = &candidates[0];
            let mut text = only[word.len()..].to_string();
            if !(is_path && only.ends_with('/')) {
                text.push(' ');
            }
            text
        }
        _ => {
            let prefix = common_prefix(&candidates).to_string();
            if prefix.len() <= word.len() {
                return TabOutput::List(candidates);
            }
            prefix[word.len()..].to_string()
        }
    };
    buffer.push_str(&insert);
    TabOutput::Insert(insert)
}

/// Entries matching a partially typed path, sorted. Directories end in `/`.
///
/// Hidden entries are listed only when the typed name starts with a dot.
pub fn path_candidates(partial: &str) -> Vec<String> {
    let (dir_part, name_part) = match partial.rfind('/') {
        Some(slash) => partial.split_at(slash + 1),
        None => ("", partial),
    };
    let dir = if dir_part.is_empty() {
        Path::new(".")
    } else {
        Path::new(dir_part)
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut candidates: Vec<String> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            if !name.starts_with(name_part) || (name.starts_with('.') && !name_part.starts_with('.'))
            {
                return None;
            }
            let is_dir = fs::metadata(entry.path()).is_ok_and(|meta| meta.is_dir());
            let suffix = if is_dir { "/" } else { "" };
            Some(format!("{dir_part}{name}{suffix}"))
        })
        .collect();
    candidates.sort();
    candidates
}

/// Longest prefix shared by every string, cut on a char boundary.
pub fn common_prefix(items: &[String]) -> &str {
    let Some(first) = items.first() else {
        return "";
    };
    let mut len = first.len();
    for item in &items[1..] {
        len = first
            .char_indices()
            .zip(item.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8())
            .min(len);
    }
    &first[..len]
}
