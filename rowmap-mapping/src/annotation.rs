//! Per-field directive parsing.
//!
//! Annotations use struct-tag syntax: space separated `key:"value"` pairs.
//! Two keys are recognised:
//!
//! - `db:"name,opt,..."`: column name override (`-` ignores the field)
//!   followed by option flags.
//! - `scan:"opt,..."`: option flags only.
//!
//! Option flags from both keys are merged. Recognised flags are `follow`,
//! `embed` and `notate`; anything else is ignored.

pub const DB_TAG: &str = "db";
pub const SCAN_TAG: &str = "scan";

const IGNORE_NAME: &str = "-";
const FOLLOW: &str = "follow";
const EMBED: &str = "embed";
const NOTATE: &str = "notate";

/// Outcome of parsing one field's annotation string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    /// Exclude the field from the column map entirely.
    pub ignore: bool,
    /// Explicit column name from the `db` key.
    pub name: Option<String>,
    /// Flatten a nested record into the parent's namespace.
    pub follow: bool,
    /// Never namespace the nested record's columns.
    pub embed: bool,
    /// Namespace the nested record's columns under this field's column name.
    pub notate: bool,
}

impl Directives {
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    fn apply_option(&mut self, option: &str) {
        match option.trim() {
            FOLLOW => self.follow = true,
            EMBED => self.embed = true,
            NOTATE => self.notate = true,
            _ => {}
        }
    }
}

/// Parse a raw annotation string into its [`Directives`].
pub fn parse_directives(tag: &str) -> Directives {
    let mut directives = Directives::default();

    if let Some(db) = lookup(tag, DB_TAG) {
        let mut parts = db.split(',');
        match parts.next().map(str::trim) {
            Some(IGNORE_NAME) => {
                directives.ignore = true;
                return directives;
            }
            Some(name) if !name.is_empty() => directives.name = Some(name.to_string()),
            _ => {}
        }
        parts.for_each(|option| directives.apply_option(option));
    }

    if let Some(scan) = lookup(tag, SCAN_TAG) {
        scan.split(',')
            .for_each(|option| directives.apply_option(option));
    }

    directives
}

/// Value stored under `key`, unescaped. Parsing stops at the first malformed
/// pair.
pub fn lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        let name_len = rest
            .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\u{7f}')
            .unwrap_or(rest.len());
        if name_len == 0 {
            return None;
        }
        let name = &rest[..name_len];
        rest = rest[name_len..].strip_prefix(":\"")?;

        let (raw, after) = split_quoted(rest)?;
        rest = after;
        if name == key {
            return Some(unescape(raw));
        }
    }
}

/// Split `input` at the first unescaped closing quote.
fn split_quoted(input: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (idx, c) in input.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some((&input[..idx], &input[idx + 1..])),
            _ => {}
        }
    }
    None
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
