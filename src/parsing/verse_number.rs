use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::core::types::VerseShape;

static NORMAL_PATTERN: OnceLock<Regex> = OnceLock::new();
static SPLIT_PATTERN: OnceLock<Regex> = OnceLock::new();
static MERGED_PATTERN: OnceLock<Regex> = OnceLock::new();

// ASCII digit classes: `\d` would also accept non-ASCII digits that do not parse as u32
fn normal_pattern() -> &'static Regex {
    NORMAL_PATTERN.get_or_init(|| Regex::new(r"^[0-9]+$").expect("valid regex"))
}

fn split_pattern() -> &'static Regex {
    SPLIT_PATTERN.get_or_init(|| Regex::new(r"^([0-9]+)([^0-9]+)$").expect("valid regex"))
}

fn merged_pattern() -> &'static Regex {
    MERGED_PATTERN.get_or_init(|| Regex::new(r"^([0-9]+)-([0-9]+)$").expect("valid regex"))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("unrecognized verse number pattern")]
    Unrecognized,

    #[error("merged range {start}-{end} must ascend")]
    NonAscendingRange { start: u32, end: u32 },

    #[error("verse number '{0}' is too large")]
    Overflow(String),
}

/// A verse-number token classified by shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerseNumberToken {
    /// `N`
    Normal(u32),
    /// `N<suffix>`, one fragment of verse `N`
    Split { verse: u32, suffix: String },
    /// `N-M` with `N < M`
    Merged { start: u32, end: u32 },
}

impl VerseNumberToken {
    /// Classify a raw token. Shapes are tried in order: normal, split, merged.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Unrecognized` if no shape matches,
    /// `TokenError::NonAscendingRange` for `N-M` with `N >= M`, and
    /// `TokenError::Overflow` if a number does not fit in a `u32`.
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        let token = token.trim();

        if normal_pattern().is_match(token) {
            return Ok(Self::Normal(parse_number(token)?));
        }

        if let Some(caps) = split_pattern().captures(token) {
            return Ok(Self::Split {
                verse: parse_number(&caps[1])?,
                suffix: caps[2].to_string(),
            });
        }

        if let Some(caps) = merged_pattern().captures(token) {
            let start = parse_number(&caps[1])?;
            let end = parse_number(&caps[2])?;
            if start >= end {
                return Err(TokenError::NonAscendingRange { start, end });
            }
            return Ok(Self::Merged { start, end });
        }

        Err(TokenError::Unrecognized)
    }

    #[must_use]
    pub fn shape(&self) -> VerseShape {
        match self {
            Self::Normal(_) => VerseShape::Normal,
            Self::Split { .. } => VerseShape::Split,
            Self::Merged { .. } => VerseShape::Merged,
        }
    }

    /// The verse number the token's text is displayed at
    #[must_use]
    pub fn first_verse(&self) -> u32 {
        match self {
            Self::Normal(verse) | Self::Split { verse, .. } => *verse,
            Self::Merged { start, .. } => *start,
        }
    }
}

fn parse_number(digits: &str) -> Result<u32, TokenError> {
    digits
        .parse()
        .map_err(|_| TokenError::Overflow(digits.to_string()))
}
