//! Column notation rewriting.
//!
//! A query can scope the columns that follow it under a dotted prefix by
//! selecting a pseudo-column named `notate:<prefix>`:
//!
//! ```sql
//! SELECT 0 AS "notate:a", a.*, 0 AS "notate:b", b.*
//! FROM a JOIN b ON ...
//! ```
//!
//! Every column after `notate:a` is read as `a.<column>` until the next
//! pseudo-column. `notate:` with nothing after the colon clears the prefix, and
//! multi-level prefixes such as `notate:a.sub` are allowed. Pseudo-columns
//! carry no data; the scan engine binds them to a discard slot.

use std::borrow::Cow;
use std::fmt;

use rowmap_result::{Error, Result};

/// Reserved prefix of pseudo-column names.
pub const NOTATE_PREFIX: &str = "notate:";

/// One physical column after notation rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    /// A data column, addressed by its (possibly prefixed) name.
    Data(String),
    /// A consumed pseudo-column. Holds the physical name for diagnostics.
    Notation(String),
}

impl Column {
    /// Name used to look the column up in a column map, `None` for
    /// pseudo-columns.
    pub fn name(&self) -> Option<&str> {
        match self {
            Column::Data(name) => Some(name),
            Column::Notation(_) => None,
        }
    }

    pub fn is_notation(&self) -> bool {
        matches!(self, Column::Notation(_))
    }

    /// Data columns taken verbatim, without notation processing.
    pub fn data<I, S>(names: I) -> Vec<Column>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(|name| Column::Data(name.into())).collect()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Data(name) | Column::Notation(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::Data(name.to_string())
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::Data(name)
    }
}

/// Rewrites physical column names into notated [`Column`]s.
#[derive(Debug, Clone)]
pub struct NotationRewriter {
    prefix: Cow<'static, str>,
}

impl Default for NotationRewriter {
    fn default() -> Self {
        Self {
            prefix: Cow::Borrowed(NOTATE_PREFIX),
        }
    }
}

impl NotationRewriter {
    /// Rewriter recognising `prefix` instead of `notate:`.
    pub fn with_prefix(prefix: impl Into<Cow<'static, str>>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Rewrite one column list. State never outlives the call.
    pub fn rewrite<S: AsRef<str>>(&self, raw: &[S]) -> Result<Vec<Column>> {
        let mut columns = Vec::with_capacity(raw.len());
        let mut current = String::new();

        for name in raw {
            let name = name.as_ref();
            let notation = if self.prefix.is_empty() {
                None
            } else {
                name.strip_prefix(self.prefix())
            };
            let Some(rest) = notation else {
                columns.push(Column::Data(scoped(&current, name)));
                continue;
            };
            if rest.contains(self.prefix()) {
                return Err(Error::InvalidNotationSyntax(name.to_string()));
            }

            current = rest.trim().trim_end_matches('.').to_string();
            tracing::trace!(column = name, prefix = %current, "column notation prefix switched");
            columns.push(Column::Notation(name.to_string()));
        }

        Ok(columns)
    }
}

fn scoped(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Rewrite `raw` with the default `notate:` prefix.
pub fn rewrite_columns<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Column>> {
    NotationRewriter::default().rewrite(raw)
}
