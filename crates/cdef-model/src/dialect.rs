use serde::{Deserialize, Serialize};

/// Identifier quoting rules of the main schema's database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// ANSI double quotes (SQLite, PostgreSQL, Oracle, H2).
    #[default]
    Standard,
    /// Backticks.
    MySql,
    /// Square brackets.
    SqlServer,
}

impl SqlDialect {
    /// Quote an identifier when it is not a plain `[A-Za-z_][A-Za-z0-9_$]*` name.
    ///
    /// Dotted names (`schema.table`) are quoted part by part.
    pub fn quote_identifier(&self, identifier: &str) -> String {
        let identifier = identifier.trim();
        if identifier.contains('.') {
            return identifier
                .split('.')
                .map(|part| self.quote_part(part))
                .collect::<Vec<_>>()
                .join(".");
        }
        self.quote_part(identifier)
    }

    fn quote_part(&self, part: &str) -> String {
        if is_plain_identifier(part) || self.is_quoted(part) {
            return part.to_string();
        }
        match self {
            Self::Standard => format!("\"{}\"", part.replace('"', "\"\"")),
            Self::MySql => format!("`{}`", part.replace('`', "``")),
            Self::SqlServer => format!("[{}]", part.replace(']', "]]")),
        }
    }

    fn is_quoted(&self, part: &str) -> bool {
        let (open, close) = match self {
            Self::Standard => ('"', '"'),
            Self::MySql => ('`', '`'),
            Self::SqlServer => ('[', ']'),
        };
        part.len() >= 2 && part.starts_with(open) && part.ends_with(close)
    }
}

fn is_plain_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
