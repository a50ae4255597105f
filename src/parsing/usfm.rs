//! Minimal USFM reader and writer.
//!
//! Only the structure needed for verse normalization is read: the book code
//! from `\id`, chapters from `\c` and verses from `\v`. Headings and other
//! non-verse paragraphs are skipped, footnotes and cross references are
//! dropped, and character markers are stripped so only the verse text remains.

use regex::Regex;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::OnceLock;

use crate::parsing::book_json::{BookDocument, ChapterContent, VerseContent};
use crate::parsing::ParseError;
use crate::utils::validation::check_content_limit;

/// Markers whose whole line is not verse text
const SKIPPED_MARKERS: &[&str] = &[
    "id", "ide", "h", "toc", "toca", "mt", "mte", "ms", "mr", "s", "sr", "r", "d", "sp", "cl",
    "cp", "ca", "rem", "sts", "usfm", "is", "ip", "ipi", "imt", "io", "iot", "ior", "im", "imi",
    "ipr", "iq", "ib", "ili", "ie", "periph",
];

static NOTE_PATTERN: OnceLock<Regex> = OnceLock::new();
static ATTRIBUTE_PATTERN: OnceLock<Regex> = OnceLock::new();
static CHAR_MARKER_PATTERN: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn note_pattern() -> &'static Regex {
    NOTE_PATTERN.get_or_init(|| {
        Regex::new(r"\\(f|fe|ef|x|ex)\s.*?\\(f|fe|ef|x|ex)\*").expect("valid regex")
    })
}

fn attribute_pattern() -> &'static Regex {
    ATTRIBUTE_PATTERN.get_or_init(|| Regex::new(r"\|[^\\]*").expect("valid regex"))
}

fn char_marker_pattern() -> &'static Regex {
    CHAR_MARKER_PATTERN.get_or_init(|| Regex::new(r"\\\+?[a-z]+[0-9]*\*?").expect("valid regex"))
}

fn whitespace_pattern() -> &'static Regex {
    WHITESPACE_PATTERN.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Parse a USFM file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or the errors of [`parse_usfm`].
pub fn parse_usfm_file(path: &Path) -> Result<BookDocument, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_usfm(&content)
}

/// Parse USFM text into a book document
///
/// # Errors
///
/// Returns `ParseError::Usfm` if `\id` is missing, a chapter number is not an
/// integer, or a verse appears before the first chapter, and
/// `ParseError::TooManyContents` when the entry limit is exceeded.
pub fn parse_usfm(text: &str) -> Result<BookDocument, ParseError> {
    let mut reader = UsfmReader::default();

    for (i, raw_line) in text.lines().enumerate() {
        let line_num = i + 1;
        let line = note_pattern().replace_all(raw_line.trim(), "");
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(stripped) = line.strip_prefix('\\') else {
            reader.push_text(line, line_num)?;
            continue;
        };

        let (marker, rest) = stripped
            .split_once(char::is_whitespace)
            .map_or((stripped, ""), |(m, r)| (m, r.trim()));

        match marker {
            "id" => {
                let code = rest.split_whitespace().next().ok_or_else(|| ParseError::Usfm {
                    line: line_num,
                    message: "\\id marker without a book code".to_string(),
                })?;
                reader.book_code = Some(code.to_string());
            }
            "c" => {
                let number = rest
                    .split_whitespace()
                    .next()
                    .and_then(|n| n.parse::<u32>().ok())
                    .ok_or_else(|| ParseError::Usfm {
                        line: line_num,
                        message: format!("chapter number should be an integer, got '{rest}'"),
                    })?;
                reader.start_chapter(number);
            }
            "v" => reader.push_text(line, line_num)?,
            _ if is_skipped(marker) => {}
            // Paragraph and poetry markers carry verse text
            _ => reader.push_text(rest, line_num)?,
        }
    }

    reader.finish()
}

fn is_skipped(marker: &str) -> bool {
    let base = marker.trim_end_matches(|c: char| c.is_ascii_digit());
    SKIPPED_MARKERS.contains(&base)
}

#[derive(Default)]
struct UsfmReader {
    book_code: Option<String>,
    chapters: Vec<ChapterContent>,
    current: Option<(String, String)>,
    contents: usize,
}

impl UsfmReader {
    fn start_chapter(&mut self, number: u32) {
        self.flush_verse();
        self.chapters.push(ChapterContent::new(number, Vec::new()));
    }

    /// Append text that may contain inline `\v` markers
    fn push_text(&mut self, text: &str, line_num: usize) -> Result<(), ParseError> {
        let mut segments = text.split("\\v ");
        if let Some(leading) = segments.next() {
            self.append(leading);
        }
        for segment in segments {
            let segment = segment.trim_start();
            let (token, verse_text) = segment
                .split_once(char::is_whitespace)
                .unwrap_or((segment, ""));
            if token.is_empty() {
                return Err(ParseError::Usfm {
                    line: line_num,
                    message: "\\v marker without a verse number".to_string(),
                });
            }
            self.start_verse(token, line_num)?;
            self.append(verse_text);
        }
        Ok(())
    }

    fn start_verse(&mut self, token: &str, line_num: usize) -> Result<(), ParseError> {
        self.flush_verse();
        if self.chapters.is_empty() {
            return Err(ParseError::Usfm {
                line: line_num,
                message: format!("verse {token} appears before the first \\c marker"),
            });
        }
        if check_content_limit(self.contents).is_some() {
            return Err(ParseError::TooManyContents(self.contents));
        }
        self.contents += 1;
        self.current = Some((token.to_string(), String::new()));
        Ok(())
    }

    fn append(&mut self, text: &str) {
        // Text outside any verse (introductions, headings) is dropped
        if let Some((_, verse_text)) = self.current.as_mut() {
            let cleaned = clean_text(text);
            if !cleaned.is_empty() {
                if !verse_text.is_empty() {
                    verse_text.push(' ');
                }
                verse_text.push_str(&cleaned);
            }
        }
    }

    fn flush_verse(&mut self) {
        if let Some((token, text)) = self.current.take() {
            if let Some(chapter) = self.chapters.last_mut() {
                chapter.contents.push(VerseContent::new(token, text));
            }
        }
    }

    fn finish(mut self) -> Result<BookDocument, ParseError> {
        self.flush_verse();
        let book_code = self.book_code.ok_or_else(|| ParseError::Usfm {
            line: 1,
            message: "missing \\id marker".to_string(),
        })?;
        Ok(BookDocument::new(book_code, self.chapters))
    }
}

fn clean_text(text: &str) -> String {
    let text = attribute_pattern().replace_all(text, "");
    let text = char_marker_pattern().replace_all(&text, " ");
    whitespace_pattern()
        .replace_all(text.trim(), " ")
        .trim()
        .to_string()
}

/// Render a book document as USFM
#[must_use]
pub fn to_usfm(doc: &BookDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\\id {}", doc.book_code().to_uppercase());
    for chapter in &doc.chapters {
        let _ = writeln!(out, "\\c {}", chapter.chapter_number);
        out.push_str("\\p\n");
        for content in &chapter.contents {
            let _ = writeln!(out, "\\v {} {}", content.verse_number, content.verse_text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_usfm_verses() {
        let usfm = r"\id GEN Genesis
\h Genesis
\mt1 Genesis
\c 1
\s1 The Creation
\p
\v 1 In the beginning God created
the heavens and the earth.
\v 2 And the earth was \add without\add* form.
\c 2
\p \v 1 Thus the heavens \v 2 And on the seventh day
";

        let doc = parse_usfm(usfm).unwrap();
        assert_eq!(doc.book_code(), "GEN");
        assert_eq!(doc.chapters.len(), 2);
        assert_eq!(doc.chapters[0].contents.len(), 2);
        assert_eq!(
            doc.chapters[0].contents[0].verse_text,
            "In the beginning God created the heavens and the earth."
        );
        assert_eq!(
            doc.chapters[0].contents[1].verse_text,
            "And the earth was without form."
        );
        assert_eq!(doc.chapters[1].contents[0].verse_text, "Thus the heavens");
        assert_eq!(doc.chapters[1].contents[1].verse_number, "2");
    }

    #[test]
    fn test_parse_usfm_keeps_split_and_merged_tokens() {
        let usfm = "\\id RUT\n\\c 1\n\\v 1-2 Merged\n\\v 3a First\n\\v 3b Second\n";
        let doc = parse_usfm(usfm).unwrap();
        let tokens: Vec<&str> = doc.chapters[0]
            .contents
            .iter()
            .map(|c| c.verse_number.as_str())
            .collect();
        assert_eq!(tokens, vec!["1-2", "3a", "3b"]);
    }

    #[test]
    fn test_parse_usfm_drops_footnotes() {
        let usfm = "\\id JHN\n\\c 3\n\\v 16 For God so loved\\f + \\fr 3:16 \\ft Or only\\f* the world\n";
        let doc = parse_usfm(usfm).unwrap();
        assert_eq!(doc.chapters[0].contents[0].verse_text, "For God so loved the world");
    }

    #[test]
    fn test_parse_usfm_word_attributes() {
        let usfm = "\\id JHN\n\\c 1\n\\v 1 \\w In|lemma=\"en\"\\w* the beginning\n";
        let doc = parse_usfm(usfm).unwrap();
        assert_eq!(doc.chapters[0].contents[0].verse_text, "In the beginning");
    }

    #[test]
    fn test_parse_usfm_errors() {
        assert!(matches!(
            parse_usfm("\\c 1\n\\v 1 text\n"),
            Err(ParseError::Usfm { .. })
        ));
        assert!(matches!(
            parse_usfm("\\id GEN\n\\v 1 text\n"),
            Err(ParseError::Usfm { line: 2, .. })
        ));
        assert!(matches!(
            parse_usfm("\\id GEN\n\\c one\n"),
            Err(ParseError::Usfm { line: 2, .. })
        ));
    }

    #[test]
    fn test_to_usfm_round_trips_structure() {
        let doc = BookDocument::new(
            "oba",
            vec![ChapterContent::new(
                1,
                vec![VerseContent::new("1", "The vision"), VerseContent::new("2a", "Behold")],
            )],
        );
        let usfm = to_usfm(&doc);
        assert!(usfm.starts_with("\\id OBA\n\\c 1\n"));
        let reparsed = parse_usfm(&usfm).unwrap();
        assert_eq!(reparsed.chapters, doc.chapters);
    }
}
