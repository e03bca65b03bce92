//! Column resolution for sources with inconsistent headers.
//!
//! Each source names its columns however its owner likes. This crate maps
//! the headers of one source to the semantic [`Role`]s the row pipeline
//! needs, trying three strategies in strict precedence:
//!
//! 1. exact match of the normalized header against a normalized alias,
//! 2. substring match (shortest matching header wins),
//! 3. role-specific token heuristic (first header containing a token).
//!
//! An exact hit is never shadowed by a shorter accidental substring match.

mod aliases;

use fleettally_shared::RawRow;
use unicode_normalization::UnicodeNormalization;

/// Semantic column roles a source may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Type,
    Status,
    District,
    Quantity,
    Tracker,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Type,
        Role::Status,
        Role::District,
        Role::Quantity,
        Role::Tracker,
    ];

    /// Ordered alias list for this role.
    pub fn aliases(self) -> &'static [&'static str] {
        aliases::aliases(self)
    }

    /// Last-resort heuristic tokens for this role.
    pub fn tokens(self) -> &'static [&'static str] {
        aliases::tokens(self)
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Type => "type",
            Role::Status => "status",
            Role::District => "district",
            Role::Quantity => "quantity",
            Role::Tracker => "tracker",
        }
    }
}

/// Normalize a header for comparison: NFKC, lower-case, `ҳ`→`х`, no whitespace.
pub fn normalize_header(s: &str) -> String {
    s.nfkc()
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ҳ' { 'х' } else { c })
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Which strategy produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Substring,
    Heuristic,
}

/// Headers of one source, normalized once and kept in column order.
struct NormalizedHeaders<'a> {
    entries: Vec<(String, &'a str)>,
}

impl<'a> NormalizedHeaders<'a> {
    fn new<S: AsRef<str>>(headers: &'a [S]) -> Self {
        let mut entries: Vec<(String, &'a str)> = Vec::with_capacity(headers.len());
        for header in headers {
            let original = header.as_ref();
            let normalized = normalize_header(original);
            // First column wins when two headers normalize identically.
            if !entries.iter().any(|(n, _)| *n == normalized) {
                entries.push((normalized, original));
            }
        }
        Self { entries }
    }

    fn exact(&self, aliases: &[&str]) -> Option<&'a str> {
        aliases.iter().find_map(|alias| {
            let key = normalize_header(alias);
            self.entries
                .iter()
                .find(|(n, _)| *n == key)
                .map(|(_, orig)| *orig)
        })
    }

    fn substring(&self, aliases: &[&str]) -> Option<&'a str> {
        let mut best: Option<(usize, &'a str)> = None;
        for alias in aliases {
            let key = normalize_header(alias);
            if key.is_empty() {
                continue;
            }
            for (normalized, orig) in &self.entries {
                if normalized.contains(&key) {
                    let len = normalized.chars().count();
                    if best.is_none_or(|(best_len, _)| len < best_len) {
                        best = Some((len, *orig));
                    }
                }
            }
        }
        best.map(|(_, orig)| orig)
    }

    fn heuristic(&self, tokens: &[&str]) -> Option<&'a str> {
        let tokens: Vec<String> = tokens.iter().map(|t| normalize_header(t)).collect();
        self.entries
            .iter()
            .find(|(n, _)| tokens.iter().any(|t| n.contains(t.as_str())))
            .map(|(_, orig)| *orig)
    }

    fn resolve(&self, aliases: &[&str], tokens: &[&str]) -> Option<(&'a str, MatchKind)> {
        if let Some(h) = self.exact(aliases) {
            return Some((h, MatchKind::Exact));
        }
        if let Some(h) = self.substring(aliases) {
            return Some((h, MatchKind::Substring));
        }
        self.heuristic(tokens).map(|h| (h, MatchKind::Heuristic))
    }
}

/// Find the header that best matches `aliases`, falling back to `tokens`.
///
/// Returns the original (un-normalized) header text.
pub fn resolve_column<'a, S: AsRef<str>>(
    headers: &'a [S],
    aliases: &[&str],
    tokens: &[&str],
) -> Option<&'a str> {
    NormalizedHeaders::new(headers)
        .resolve(aliases, tokens)
        .map(|(h, _)| h)
}

/// Resolve a single role against `headers`.
pub fn resolve_role<S: AsRef<str>>(headers: &[S], role: Role) -> Option<&str> {
    resolve_column(headers, role.aliases(), role.tokens())
}

/// Ordered, de-duplicated headers across all rows of a source.
pub fn collect_headers(rows: &[RawRow]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for header in row.headers() {
            let header = header.trim();
            if !headers.iter().any(|h| h == header) {
                headers.push(header.to_string());
            }
        }
    }
    headers
}

// ---------------------------------------------------------------------------
// ResolvedSchema
// ---------------------------------------------------------------------------

/// A resolved column for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub header: String,
    pub kind: MatchKind,
}

/// Column assignment for every role of one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub kind: Option<ResolvedColumn>,
    pub status: Option<ResolvedColumn>,
    pub district: Option<ResolvedColumn>,
    pub quantity: Option<ResolvedColumn>,
    pub tracker: Option<ResolvedColumn>,
}

impl ResolvedSchema {
    /// Resolve all roles from scratch against `headers`.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let normalized = NormalizedHeaders::new(headers);
        let column = |role: Role| {
            normalized
                .resolve(role.aliases(), role.tokens())
                .map(|(header, kind)| ResolvedColumn {
                    header: header.to_string(),
                    kind,
                })
        };
        Self {
            kind: column(Role::Type),
            status: column(Role::Status),
            district: column(Role::District),
            quantity: column(Role::Quantity),
            tracker: column(Role::Tracker),
        }
    }

    /// Header resolved for `role`, if any.
    pub fn header(&self, role: Role) -> Option<&str> {
        let column = match role {
            Role::Type => &self.kind,
            Role::Status => &self.status,
            Role::District => &self.district,
            Role::Quantity => &self.quantity,
            Role::Tracker => &self.tracker,
        };
        column.as_ref().map(|c| c.header.as_str())
    }

    /// Roles that could not be resolved.
    pub fn missing(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.header(*r).is_none())
            .collect()
    }
}
