//! Tab-completion classification.

use tracing::trace;

use crate::parser::{Mode, is_blank, tokenize};
use crate::registry::{ArgumentKind, Registry};

/// What, if anything, can complete the word under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// The word is a command name.
    CommandName,
    /// The word is a path; the line editor's file completion applies.
    FilenameLike,
    /// Nothing should be offered.
    None,
}

impl From<ArgumentKind> for CompletionKind {
    fn from(kind: ArgumentKind) -> Self {
        match kind {
            ArgumentKind::ExistingFile
            | ArgumentKind::NewFile
            | ArgumentKind::ExistingFileOrDir
            | ArgumentKind::ExistingDir => CompletionKind::FilenameLike,
            ArgumentKind::FreeText | ArgumentKind::HostOrIp => CompletionKind::None,
        }
    }
}

/// Classifies the word that begins at byte offset `pos` of `line`.
///
/// The line may be incomplete (an open quote, a trailing blank); it is
/// tokenized leniently. A `pos` past every word means a new word is being
/// started.
pub fn resolve(registry: &Registry, line: &str, pos: usize) -> CompletionKind {
    let words = match tokenize(line, Mode::Lenient) {
        Ok(words) => words,
        Err(_) => return CompletionKind::None,
    };

    let index = words
        .iter()
        .find(|word| word.end > pos)
        .map_or(words.len(), |word| word.index);
    if index == 0 {
        return CompletionKind::CommandName;
    }

    let Some(command) = registry.lookup(&words[0].text) else {
        return CompletionKind::None;
    };
    match command.specs().get(index - 1) {
        Some(spec) => spec.kind.into(),
        None => CompletionKind::None,
    }
}

/// Byte offset where the word ending at `cursor` begins.
///
/// A cursor past the end of the line is treated as being at the end.
pub fn word_start(line: &str, cursor: usize) -> usize {
    line.as_bytes()[..cursor.min(line.len())]
        .iter()
        .rposition(|&b| is_blank(b))
        .map_or(0, |blank| blank + 1)
}

/// Command names starting with a prefix, in alphabetical order.
///
/// The names are captured when the generator is created, so registering
/// commands afterwards does not change an ongoing completion session.
#[derive(Debug, Clone)]
pub struct CommandNames {
    names: Vec<String>,
    prefix: String,
    next: usize,
}

impl CommandNames {
    pub fn new(registry: &Registry, prefix: &str) -> Self {
        Self {
            names: registry
                .enumerate()
                .map(|cmd| cmd.name().to_string())
                .collect(),
            prefix: prefix.to_string(),
            next: 0,
        }
    }

    /// Starts over from the first name.
    pub fn restart(&mut self) {
        self.next = 0;
    }
}

impl Iterator for CommandNames {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(name) = self.names.get(self.next) {
            self.next += 1;
            if name.starts_with(&self.prefix) {
                return Some(name.clone());
            }
        }
        None
    }
}

/// Answer to one completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Byte offset where the word being completed starts.
    pub start: usize,
    pub kind: CompletionKind,
    /// Matching command names; empty unless `kind` is `CommandName`.
    pub candidates: Vec<String>,
}

/// Handles a completion request for `line` with the cursor at `cursor`.
///
/// Any byte offset is accepted: one past the end is moved to the end, one
/// inside a multi-byte character is moved back to that character's start.
pub fn complete(registry: &Registry, line: &str, cursor: usize) -> Completion {
    let mut cursor = cursor.min(line.len());
    while !line.is_char_boundary(cursor) {
        cursor -= 1;
    }
    let start = word_start(line, cursor);
    let kind = resolve(registry, line, start);
    trace!(line, cursor, start, ?kind, "completion requested");

    let candidates = match kind {
        CompletionKind::CommandName => {
            CommandNames::new(registry, &line[start..cursor]).collect()
        }
        CompletionKind::FilenameLike | CompletionKind::None => Vec::new(),
    };
    Completion {
        start,
        kind,
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ArgumentSpec;
    use std::io::Write;

    fn noop(_: &[Option<String>], _: &mut dyn Write) -> i32 {
        0
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register("cd", &[ArgumentSpec::required(ArgumentKind::ExistingDir)], noop)
            .unwrap();
        registry
            .register(
                "cp",
                &[
                    ArgumentSpec::required(ArgumentKind::ExistingFile),
                    ArgumentSpec::required(ArgumentKind::NewFile),
                ],
                noop,
            )
            .unwrap();
        registry
            .register(
                "grep",
                &[
                    ArgumentSpec::required(ArgumentKind::FreeText),
                    ArgumentSpec::required(ArgumentKind::ExistingFile),
                ],
                noop,
            )
            .unwrap();
        registry
            .register("ping", &[ArgumentSpec::required(ArgumentKind::HostOrIp)], noop)
            .unwrap();
        registry.register("pwd", &[], noop).unwrap();
        registry
    }

    #[test]
    fn empty_or_blank_buffer_completes_command_names() {
        let registry = registry();
        assert_eq!(resolve(&registry, "", 0), CompletionKind::CommandName);
        assert_eq!(resolve(&registry, "   ", 3), CompletionKind::CommandName);
        assert_eq!(resolve(&registry, "pw", 0), CompletionKind::CommandName);
    }

    #[test]
    fn directory_argument_completes_filenames() {
        let registry = registry();
        assert_eq!(resolve(&registry, "cd ", 3), CompletionKind::FilenameLike);
        assert_eq!(resolve(&registry, "cd sr", 3), CompletionKind::FilenameLike);
    }

    #[test]
    fn words_beyond_arity_complete_nothing() {
        let registry = registry();
        assert_eq!(resolve(&registry, "pwd extra ", 9), CompletionKind::None);
        assert_eq!(resolve(&registry, "pwd extra ", 10), CompletionKind::None);
        assert_eq!(resolve(&registry, "cd a b", 5), CompletionKind::None);
    }

    #[test]
    fn slot_kind_decides() {
        let registry = registry();
        assert_eq!(resolve(&registry, "grep pat", 5), CompletionKind::None);
        assert_eq!(resolve(&registry, "grep pat ", 9), CompletionKind::FilenameLike);
        assert_eq!(resolve(&registry, "cp a ", 5), CompletionKind::FilenameLike);
        assert_eq!(resolve(&registry, "ping ", 5), CompletionKind::None);
    }

    #[test]
    fn offset_inside_a_word_picks_that_word() {
        let registry = registry();
        // "grep" is 0..4, "pat" is 5..8, "file" is 9..13
        assert_eq!(resolve(&registry, "grep pat file", 6), CompletionKind::None);
        assert_eq!(resolve(&registry, "grep pat file", 11), CompletionKind::FilenameLike);
        assert_eq!(resolve(&registry, "cp abc def", 4), CompletionKind::FilenameLike);
        assert_eq!(resolve(&registry, "grep pat file", 2), CompletionKind::CommandName);
    }

    #[test]
    fn offset_at_a_word_end_belongs_to_the_next_word() {
        let registry = registry();
        assert_eq!(resolve(&registry, "grep pat file", 4), CompletionKind::None);
        assert_eq!(resolve(&registry, "grep pat file", 8), CompletionKind::FilenameLike);
        assert_eq!(resolve(&registry, "grep pat file", 13), CompletionKind::None);
        assert_eq!(resolve(&registry, "cd", 2), CompletionKind::FilenameLike);
    }

    #[test]
    fn unknown_command_completes_nothing() {
        let registry = registry();
        assert_eq!(resolve(&registry, "rm ", 3), CompletionKind::None);
    }

    #[test]
    fn open_quote_does_not_abort_classification() {
        let registry = registry();
        assert_eq!(resolve(&registry, "cp 'my fi", 7), CompletionKind::FilenameLike);
        assert_eq!(resolve(&registry, "grep 'two words", 10), CompletionKind::FilenameLike);
    }

    #[test]
    fn word_start_scans_back_to_a_blank() {
        assert_eq!(word_start("", 0), 0);
        assert_eq!(word_start("cd src", 6), 3);
        assert_eq!(word_start("cd ", 3), 3);
        assert_eq!(word_start("pw", 2), 0);
        assert_eq!(word_start("ls\tsr", 5), 3);
        assert_eq!(word_start("cd", 5), 0);
        assert_eq!(word_start("cd x", 9), 3);
    }

    #[test]
    fn command_names_match_prefix_in_order_and_restart() {
        let registry = registry();
        let mut names = CommandNames::new(&registry, "p");
        assert_eq!(names.next().as_deref(), Some("ping"));
        assert_eq!(names.next().as_deref(), Some("pwd"));
        assert_eq!(names.next(), None);

        names.restart();
        assert_eq!(names.collect::<Vec<_>>(), vec!["ping", "pwd"]);

        let all: Vec<_> = CommandNames::new(&registry, "").collect();
        assert_eq!(all, vec!["cd", "cp", "grep", "ping", "pwd"]);
    }

    #[test]
    fn command_names_are_a_snapshot() {
        let mut registry = registry();
        let names = CommandNames::new(&registry, "l");
        registry.register("ls", &[], noop).unwrap();
        assert_eq!(names.count(), 0);
    }

    #[test]
    fn complete_offers_command_names_only_for_the_first_word() {
        let registry = registry();

        let completion = complete(&registry, "c", 1);
        assert_eq!(completion.start, 0);
        assert_eq!(completion.kind, CompletionKind::CommandName);
        assert_eq!(completion.candidates, vec!["cd", "cp"]);

        let completion = complete(&registry, "cd sr", 5);
        assert_eq!(completion.start, 3);
        assert_eq!(completion.kind, CompletionKind::FilenameLike);
        assert!(completion.candidates.is_empty());

        let completion = complete(&registry, "ping ya", 7);
        assert_eq!(completion.kind, CompletionKind::None);
        assert!(completion.candidates.is_empty());
    }

    #[test]
    fn out_of_range_cursors_are_clamped() {
        let registry = registry();

        let completion = complete(&registry, "cd", 5);
        assert_eq!(completion.start, 0);
        assert_eq!(completion.kind, CompletionKind::CommandName);
        assert_eq!(completion.candidates, vec!["cd"]);

        let completion = complete(&registry, "é", 1);
        assert_eq!(completion.start, 0);
        assert_eq!(completion.kind, CompletionKind::CommandName);
        assert_eq!(completion.candidates.len(), 5);

        let completion = complete(&registry, "cd é", 4);
        assert_eq!(completion.start, 3);
        assert_eq!(completion.kind, CompletionKind::FilenameLike);
    }
}
