//! Paper identifiers.
//!
//! Two generations of identifier exist:
//!
//! - modern: `YYMM.NNNN` or `YYMM.NNNNN`, e.g. `1204.1234v2`
//! - legacy: `<archive>/YYMMNNN`, e.g. `cs/0005003v1`
//!
//! Both may carry a `vN` version suffix. Parsing searches the input rather
//! than matching it whole, so a storage path such as
//! `ps_cache/hep-ph/pdf/0511/0511005v2.pdf` yields `hep-ph/0511005v2`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::AppError;
use crate::models::taxonomy::TAXONOMY;

static MODERN_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(\d{2})(\d{2})\.(\d{4,5})(?:v(\d+))?(?:$|[^\d])")
        .expect("modern id pattern is valid")
});

static LEGACY_ID: LazyLock<Regex> = LazyLock::new(|| {
    let prefixes = TAXONOMY
        .legacy_prefixes()
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?:^|/)({prefixes})/(?:[^/]*/)*?(\d{{2}})(\d{{2}})(\d{{3}})(?:v(\d+))?(?:$|[^\d])"
    ))
    .expect("legacy id pattern is valid")
});

/// A parsed paper identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaperId {
    id: String,
    version: Option<u32>,
    year: u16,
    month: u8,
}

impl PaperId {
    /// Find a paper identifier in `text`.
    ///
    /// Modern identifiers take priority. Returns `None` for empty input or
    /// when no candidate has a valid month and version.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }

        first_valid(&MODERN_ID, text, 3, Self::from_modern)
            .or_else(|| first_valid(&LEGACY_ID, text, 4, Self::from_legacy))
    }

    fn from_modern(caps: &Captures<'_>) -> Option<Self> {
        let yy: u16 = caps[1].parse().ok()?;
        let month = valid_month(&caps[2])?;
        let version = parse_version(caps.get(4).map(|m| m.as_str()))?;

        Some(Self {
            id: format!("{}{}.{}", &caps[1], &caps[2], &caps[3]),
            version,
            year: 2000 + yy,
            month,
        })
    }

    fn from_legacy(caps: &Captures<'_>) -> Option<Self> {
        let yy: u16 = caps[2].parse().ok()?;
        let month = valid_month(&caps[3])?;
        let version = parse_version(caps.get(5).map(|m| m.as_str()))?;
        let year = if yy >= 91 { 1900 + yy } else { 2000 + yy };

        Some(Self {
            id: format!("{}/{}{}{}", &caps[1], &caps[2], &caps[3], &caps[4]),
            version,
            year,
            month,
        })
    }

    /// The identifier without a version suffix.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// Four-digit year of first submission.
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Month of first submission, 1-12.
    pub fn month(&self) -> u8 {
        self.month
    }

    /// The identifier with its version suffix, or the bare id when the
    /// identifier carries no version.
    pub fn idv(&self) -> String {
        match self.version {
            Some(version) => format!("{}v{}", self.id, version),
            None => self.id.clone(),
        }
    }

    /// The same paper at another version.
    pub fn with_version(&self, version: u32) -> Self {
        Self {
            version: Some(version),
            ..self.clone()
        }
    }
}

/// First candidate of `pattern` that `build` accepts.
///
/// Each search resumes right after the rejected candidate's number group,
/// so the delimiter that closed it can open the next candidate.
fn first_valid(
    pattern: &Regex,
    text: &str,
    number_group: usize,
    build: impl Fn(&Captures<'_>) -> Option<PaperId>,
) -> Option<PaperId> {
    let mut start = 0;
    while let Some(caps) = pattern.captures_at(text, start) {
        if let Some(id) = build(&caps) {
            return Some(id);
        }
        start = caps.get(number_group)?.end();
    }
    None
}

fn valid_month(digits: &str) -> Option<u8> {
    digits
        .parse::<u8>()
        .ok()
        .filter(|month| (1..=12).contains(month))
}

/// `None` means the suffix is invalid; `Some(None)` means there was none.
fn parse_version(digits: Option<&str>) -> Option<Option<u32>> {
    match digits {
        None => Some(None),
        Some(digits) => digits
            .parse::<u32>()
            .ok()
            .filter(|version| *version > 0)
            .map(Some),
    }
}

impl fmt::Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.idv())
    }
}

impl FromStr for PaperId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AppError::InvalidPaperId(s.to_string()))
    }
}
