use serde::{Deserialize, Serialize};

use warden_core::{DomainError, DomainResult};

/// Segment that matches any single segment at the same position.
pub const WILDCARD: &str = "*";

/// Separator between permission segments (`invoices/read`).
pub const SEGMENT_SEPARATOR: char = '/';

/// Prefix that marks a permission as negative (`-invoices/delete`).
pub const NEGATION_PREFIX: char = '-';

/// Hierarchical permission string.
///
/// Permissions are `/`-delimited sequences of opaque, case-sensitive segments.
/// A leading `-` marks a negative (deny) permission and any segment may be the
/// wildcard `*`. There is no escaping of `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    negative: bool,
    segments: Vec<String>,
}

impl Permission {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let (negative, body) = match raw.strip_prefix(NEGATION_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        if body.is_empty() {
            return Err(DomainError::validation(format!(
                "permission '{raw}' has no segments"
            )));
        }

        let segments: Vec<String> = body.split(SEGMENT_SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(DomainError::validation(format!(
                "permission '{raw}' contains an empty segment"
            )));
        }

        Ok(Self { negative, segments })
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this permission, read as a pattern, covers `target`.
    ///
    /// Polarity is ignored on both sides; only segments are compared.
    pub fn contains(&self, target: &Permission) -> bool {
        contains(&self.segments, &target.segments)
    }
}

/// Segment-wise containment with positional wildcards.
///
/// `pattern` may not have more segments than `target`. Every index where
/// either side holds `*` is removed from *both* sequences; what remains of the
/// pattern must then equal the target position by position. A pattern that is
/// shorter than the target therefore covers everything below it.
pub fn contains<S: AsRef<str>>(pattern: &[S], target: &[S]) -> bool {
    if pattern.len() > target.len() {
        return false;
    }

    let is_wild = |i: usize| {
        pattern.get(i).is_some_and(|s| s.as_ref() == WILDCARD)
            || target.get(i).is_some_and(|s| s.as_ref() == WILDCARD)
    };

    let pruned_pattern = pattern
        .iter()
        .enumerate()
        .filter(|(i, _)| !is_wild(*i))
        .map(|(_, s)| s.as_ref());
    let mut pruned_target = target
        .iter()
        .enumerate()
        .filter(|(i, _)| !is_wild(*i))
        .map(|(_, s)| s.as_ref());

    pruned_pattern.into_iter().all(|p| pruned_target.next() == Some(p))
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.negative {
            write!(f, "{NEGATION_PREFIX}")?;
        }
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, "{SEGMENT_SEPARATOR}")?;
            }
            f.write_str(segment)?;
            first = false;
        }
        Ok(())
    }
}

impl core::str::FromStr for Permission {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Permission {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.to_string()
    }
}

/// Parse a list of permission strings, failing on the first invalid one.
pub fn parse_all<I, S>(raw: I) -> DomainResult<Vec<Permission>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter().map(|s| Permission::parse(s.as_ref())).collect()
}
