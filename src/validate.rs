//! Argument validation.
//!
//! Each argument kind has one rule. Filesystem kinds check existence and
//! type; name-shaped kinds only check that every character belongs to an
//! allowed class. The class checks are deliberately shallow: `.1.2.3` passes
//! as a host, and so does a malformed IPv6 literal like `1:::2`.

use std::fs;
use std::path::Path;

use crate::registry::{ArgumentKind, ArgumentSpec};

/// Why an argument was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// A required argument was not supplied.
    Missing,
    /// The value has the wrong shape or type; no specific message.
    Malformed,
    /// Refused with a message that should be shown to the user as is.
    Diagnosed(String),
}

/// Checks one bound argument against its spec.
///
/// On success returns the value that was checked, which is what the command
/// must receive: dequoted for the filesystem kinds and `NewFile`, unchanged
/// otherwise. An omitted optional argument yields `Ok(None)`.
pub fn validate(value: Option<&str>, spec: ArgumentSpec) -> Result<Option<&str>, Rejection> {
    let Some(value) = value else {
        return if spec.optional {
            Ok(None)
        } else {
            Err(Rejection::Missing)
        };
    };

    let checked = match spec.kind {
        ArgumentKind::ExistingFile => check_entry(value, |meta| meta.is_file())?,
        ArgumentKind::ExistingFileOrDir => {
            check_entry(value, |meta| meta.is_file() || meta.is_dir())?
        }
        ArgumentKind::ExistingDir => check_entry(value, |meta| meta.is_dir())?,
        ArgumentKind::NewFile => match dequote(value) {
            Some(name) if is_filename(name) => name,
            _ => return Err(Rejection::Malformed),
        },
        ArgumentKind::FreeText => value,
        ArgumentKind::HostOrIp if is_host_or_ip(value) => value,
        ArgumentKind::HostOrIp => return Err(Rejection::Malformed),
    };
    Ok(Some(checked))
}

fn check_entry<'a>(
    value: &'a str,
    accept: impl Fn(&fs::Metadata) -> bool,
) -> Result<&'a str, Rejection> {
    let Some(name) = dequote(value) else {
        return Err(Rejection::Diagnosed("Empty name.".to_string()));
    };
    match fs::metadata(Path::new(name)) {
        Ok(meta) if accept(&meta) => Ok(name),
        Ok(_) => Err(Rejection::Malformed),
        Err(err) => Err(Rejection::Diagnosed(format!("{name}: {err}"))),
    }
}

/// Strips one pair of matching surrounding quotes.
///
/// Returns `None` for an empty value or one that is nothing but a pair of
/// quotes. Values without surrounding quotes come back unchanged.
pub fn dequote(value: &str) -> Option<&str> {
    let bytes = value.as_bytes();
    let inner = match (bytes.first(), bytes.last()) {
        (Some(&first), Some(&last))
            if bytes.len() > 1 && crate::parser::is_quote(first) && first == last =>
        {
            &value[1..value.len() - 1]
        }
        _ => value,
    };
    if inner.is_empty() { None } else { Some(inner) }
}

/// Which alphanumerics a [`CharMask`] admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alnum {
    Digits,
    Ascii,
    Unicode,
}

/// A set of characters: an alphanumeric class plus extra punctuation,
/// minus a denylist that always wins.
#[derive(Debug, Clone, Copy)]
struct CharMask {
    alnum: Alnum,
    allow: &'static str,
    deny: &'static str,
}

impl CharMask {
    fn contains(&self, c: char) -> bool {
        if self.deny.contains(c) {
            return false;
        }
        let alnum = match self.alnum {
            Alnum::Digits => c.is_ascii_digit(),
            Alnum::Ascii => c.is_ascii_alphanumeric(),
            Alnum::Unicode => c.is_alphanumeric(),
        };
        alnum || self.allow.contains(c)
    }

    /// True if `s` is non-empty and made only of characters in the mask.
    fn matches(&self, s: &str) -> bool {
        !s.is_empty() && s.chars().all(|c| self.contains(c))
    }
}

const HOSTNAME: CharMask = CharMask {
    alnum: Alnum::Ascii,
    allow: "-_.",
    deny: "",
};

const IPV4: CharMask = CharMask {
    alnum: Alnum::Digits,
    allow: ".",
    deny: "",
};

const IPV6: CharMask = CharMask {
    alnum: Alnum::Digits,
    allow: ":abcdefABCDEF",
    deny: "",
};

const FILENAME: CharMask = CharMask {
    alnum: Alnum::Unicode,
    allow: "._-+,@%=:/~ ",
    deny: "<>|&",
};

/// True if `s` could be a file name: no shell metacharacters, no
/// redirection, not empty.
pub fn is_filename(s: &str) -> bool {
    FILENAME.matches(s)
}

/// True if `s` is shaped like a host name, an IPv4 or an IPv6 literal.
pub fn is_host_or_ip(s: &str) -> bool {
    HOSTNAME.matches(s) || IPV4.matches(s) || IPV6.matches(s)
}
