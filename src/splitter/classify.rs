//! Rule classification
//!
//! Scans stylesheet text into top-level rule units and sorts them into
//! buckets by media condition. Only block boundaries are recognised; the
//! contents of a block are opaque and move as a unit.

use thiserror::Error;

use super::COMMON_BUCKET;
use crate::config::BucketDefinition;

/// What a top-level unit is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// `selector { ... }`
    Style,
    /// `@media <condition> { ... }`
    Media,
    /// Any other at-rule with a block (`@font-face`, `@supports`, ...)
    AtBlock,
    /// A statement ending in `;` (`@import`, `@charset`, ...)
    Statement,
    /// Comments after the last rule
    Comment,
}

/// A top-level unit of a stylesheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleUnit<'a> {
    pub kind: RuleKind,
    /// Media condition, only set for [`RuleKind::Media`]
    pub condition: Option<&'a str>,
    /// Comments directly preceding the unit
    pub leading: &'a str,
    /// The unit itself, trimmed
    pub text: &'a str,
    /// Contents between the outer braces
    pub body: Option<&'a str>,
    /// Byte offset of the unit in the source
    pub offset: usize,
}

impl<'a> RuleUnit<'a> {
    /// Text placed into a bucket for this unit
    pub fn render(&self, unwrap: bool) -> String {
        let core = match (self.kind, self.body) {
            (RuleKind::Media, Some(body)) if unwrap => body.trim(),
            _ => self.text,
        };

        match (self.leading.is_empty(), core.is_empty()) {
            (true, _) => core.to_string(),
            (false, true) => self.leading.to_string(),
            (false, false) => format!("{}\n{}", self.leading, core),
        }
    }
}

/// Parse failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unterminated block")]
    UnterminatedBlock,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("rule without a block")]
    UnterminatedRule,
    #[error("unexpected `}}`")]
    UnexpectedClose,
    #[error("invalid UTF-8")]
    InvalidUtf8,
}

/// Malformed stylesheet, with the position it was detected at
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    /// Build an error, computing the line and column of `offset` in `src`
    pub fn at(kind: ParseErrorKind, src: &[u8], offset: usize) -> Self {
        let before = &src[..offset.min(src.len())];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        // Count characters, not continuation bytes
        let column = before[line_start..]
            .iter()
            .filter(|&&b| (b & 0xC0) != 0x80)
            .count()
            + 1;

        Self {
            kind,
            offset,
            line,
            column,
        }
    }
}

/// Bucket texts for one stylesheet, in bucket order, empty buckets pruned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    entries: Vec<(String, String)>,
}

impl Partition {
    pub fn get(&self, bucket: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(id, _)| id == bucket)
            .map(|(_, text)| text.as_str())
    }

    pub fn bucket_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Rewrite every bucket text, pruning any that become empty
    pub fn try_map<E, F>(self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(&str, &str) -> Result<String, E>,
    {
        let mut entries = Vec::with_capacity(self.entries.len());
        for (id, text) in self.entries {
            let text = f(&id, &text)?;
            if !text.trim().is_empty() {
                entries.push((id, text));
            }
        }
        Ok(Self { entries })
    }

    pub(crate) fn into_entries(self) -> Vec<(String, String)> {
        self.entries
    }

    fn push(&mut self, bucket: &str, text: String) {
        if !text.is_empty() {
            self.entries.push((bucket.to_string(), text));
        }
    }
}

/// Where a unit ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Index into the bucket order, `common` being last
    pub bucket: usize,
    pub text: String,
}

/// Assign each unit to the first bucket whose matcher accepts it
///
/// Only style rules and `@media` blocks are matched. Other at-rules and
/// trailing comments always go to `common`.
pub fn place_units(units: &[RuleUnit<'_>], buckets: &[BucketDefinition]) -> Vec<Placement> {
    units
        .iter()
        .map(|unit| match claiming_bucket(unit, buckets) {
            Some(index) => Placement {
                bucket: index,
                text: unit.render(buckets[index].unwrap_media),
            },
            None => Placement {
                bucket: buckets.len(),
                text: unit.render(false),
            },
        })
        .filter(|placement| !placement.text.is_empty())
        .collect()
}

fn claiming_bucket(unit: &RuleUnit<'_>, buckets: &[BucketDefinition]) -> Option<usize> {
    match unit.kind {
        RuleKind::Style | RuleKind::Media => {
            buckets.iter().position(|b| b.matches(unit.condition))
        }
        RuleKind::AtBlock | RuleKind::Statement | RuleKind::Comment => None,
    }
}

/// Split a stylesheet into bucket texts
pub fn classify(css: &str, buckets: &[BucketDefinition]) -> Result<Partition, ParseError> {
    let units = tokenize(css)?;
    let placements = place_units(&units, buckets);

    let mut grouped: Vec<Vec<String>> = vec![Vec::new(); buckets.len() + 1];
    for placement in placements {
        grouped[placement.bucket].push(placement.text);
    }

    let mut partition = Partition::default();
    for (index, texts) in grouped.into_iter().enumerate() {
        let id = buckets
            .get(index)
            .map(|b| b.id.as_str())
            .unwrap_or(COMMON_BUCKET);
        partition.push(id, texts.join("\n"));
    }

    Ok(partition)
}

/// Split stylesheet text into its top-level units
pub fn tokenize(css: &str) -> Result<Vec<RuleUnit<'_>>, ParseError> {
    let mut scanner = Scanner {
        src: css,
        bytes: css.as_bytes(),
        pos: 0,
    };
    let mut units = Vec::new();

    loop {
        let leading = scanner.skip_trivia()?;

        if scanner.pos >= scanner.bytes.len() {
            if !leading.is_empty() {
                units.push(RuleUnit {
                    kind: RuleKind::Comment,
                    condition: None,
                    leading: "",
                    text: leading,
                    body: None,
                    offset: leading.as_ptr() as usize - css.as_ptr() as usize,
                });
            }
            break;
        }

        units.push(scanner.unit(leading)?);
    }

    Ok(units)
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn error(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
        ParseError::at(kind, self.bytes, offset)
    }

    /// Skip whitespace and comments, returning the comments found
    fn skip_trivia(&mut self) -> Result<&'a str, ParseError> {
        let src = self.src;
        let mut start = None;
        let mut end = self.pos;

        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if !self.at_comment(self.pos) {
                break;
            }
            start.get_or_insert(self.pos);
            self.pos = self.skip_comment(self.pos)?;
            end = self.pos;
        }

        Ok(start.map(|s| &src[s..end]).unwrap_or(""))
    }

    fn at_comment(&self, pos: usize) -> bool {
        self.bytes.get(pos) == Some(&b'/') && self.bytes.get(pos + 1) == Some(&b'*')
    }

    /// Returns the offset just past the closing `*/`
    fn skip_comment(&self, start: usize) -> Result<usize, ParseError> {
        self.src[start + 2..]
            .find("*/")
            .map(|i| start + 2 + i + 2)
            .ok_or_else(|| self.error(ParseErrorKind::UnterminatedComment, start))
    }

    /// Returns the offset just past the closing quote
    fn skip_string(&self, start: usize) -> Result<usize, ParseError> {
        let quote = self.bytes[start];
        let mut i = start + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b if b == quote => return Ok(i + 1),
                _ => i += 1,
            }
        }
        Err(self.error(ParseErrorKind::UnterminatedString, start))
    }

    /// Returns the offset of the `}` matching the `{` at `open`
    fn matching_close(&self, open: usize) -> Result<usize, ParseError> {
        let mut depth = 1usize;
        let mut i = open + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'"' | b'\'' => {
                    i = self.skip_string(i)?;
                    continue;
                }
                b'/' if self.at_comment(i) => {
                    i = self.skip_comment(i)?;
                    continue;
                }
                b'\\' => i += 1,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(self.error(ParseErrorKind::UnterminatedBlock, open))
    }

    /// Scan one unit starting at the current position
    fn unit(&mut self, leading: &'a str) -> Result<RuleUnit<'a>, ParseError> {
        let src = self.src;
        let start = self.pos;
        let mut i = start;

        while i < self.bytes.len() {
            match self.bytes[i] {
                b'"' | b'\'' => {
                    i = self.skip_string(i)?;
                    continue;
                }
                b'/' if self.at_comment(i) => {
                    i = self.skip_comment(i)?;
                    continue;
                }
                b'\\' => i += 1,
                b';' => {
                    self.pos = i + 1;
                    return Ok(RuleUnit {
                        kind: RuleKind::Statement,
                        condition: None,
                        leading,
                        text: src[start..=i].trim(),
                        body: None,
                        offset: start,
                    });
                }
                b'{' => {
                    let close = self.matching_close(i)?;
                    let prelude = src[start..i].trim();
                    let (kind, condition) = prelude_kind(prelude);
                    self.pos = close + 1;
                    return Ok(RuleUnit {
                        kind,
                        condition,
                        leading,
                        text: src[start..=close].trim(),
                        body: Some(&src[i + 1..close]),
                        offset: start,
                    });
                }
                b'}' => return Err(self.error(ParseErrorKind::UnexpectedClose, i)),
                _ => {}
            }
            i += 1;
        }

        Err(self.error(ParseErrorKind::UnterminatedRule, start))
    }
}

fn prelude_kind(prelude: &str) -> (RuleKind, Option<&str>) {
    let Some(rest) = prelude.strip_prefix('@') else {
        return (RuleKind::Style, None);
    };

    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(rest.len());

    if rest[..name_len].eq_ignore_ascii_case("media") {
        (RuleKind::Media, Some(rest[name_len..].trim()))
    } else {
        (RuleKind::AtBlock, None)
    }
}
