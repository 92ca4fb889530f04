//! # Command Router
//!
//! An ordered table of text patterns and handlers. [`Router::dispatch`] scans
//! the table in registration order and runs the first handler whose pattern
//! matches the whole message.
//!
//! ## Pattern syntax
//!
//! ```text
//! LIST                          literal text only
//! GET-{filename}                one or more characters, no line breaks
//! PUT-{filename:word}           one or more non-whitespace characters
//! PUT-{filename:word}\n{body:*} anything, line breaks included, may be empty
//! ```
//!
//! Patterns are anchored at both ends. Captures are greedy and backtrack when
//! the rest of the pattern fails.

use super::errors::{PatternError, RouteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureKind {
    Line,
    Word,
    Any,
}

impl CaptureKind {
    fn allows(self, c: char) -> bool {
        match self {
            CaptureKind::Line => c != '\n' && c != '\r',
            CaptureKind::Word => !c.is_whitespace(),
            CaptureKind::Any => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture { name: String, kind: CaptureKind },
}

/// A parsed route pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars();

        while let Some(c) = chars.next() {
            if c != '{' {
                literal.push(c);
                continue;
            }

            let mut body = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                body.push(c);
            }
            if !closed {
                return Err(PatternError::UnclosedCapture(source.to_string()));
            }

            let (name, kind) = match body.split_once(':') {
                None => (body.as_str(), CaptureKind::Line),
                Some((name, "word")) => (name, CaptureKind::Word),
                Some((name, "*")) => (name, CaptureKind::Any),
                Some((_, other)) => {
                    return Err(PatternError::UnknownKind {
                        pattern: source.to_string(),
                        kind: other.to_string(),
                    })
                }
            };
            if name.is_empty() {
                return Err(PatternError::EmptyName(source.to_string()));
            }

            if literal.is_empty() {
                if let Some(Segment::Capture { .. }) = segments.last() {
                    return Err(PatternError::AdjacentCaptures(source.to_string()));
                }
            } else {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Capture {
                name: name.to_string(),
                kind,
            });
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match the whole of `text`, returning the named captures on success.
    pub fn captures(&self, text: &str) -> Option<Captures> {
        let mut spans = Vec::new();
        if !match_segments(&self.segments, text, 0, &mut spans) {
            return None;
        }

        let names = self.segments.iter().filter_map(|segment| match segment {
            Segment::Capture { name, .. } => Some(name),
            Segment::Literal(_) => None,
        });
        let values = names
            .zip(spans)
            .map(|(name, (start, end))| (name.clone(), text[start..end].to_string()))
            .collect();
        Some(Captures { values })
    }
}

/// Match `segments` against `text[pos..]`, recording each capture as a byte range.
///
/// A capture is followed either by the end of the pattern or by a literal
/// (`Pattern::parse` rejects adjacent captures), so its only candidate ends
/// are occurrences of that literal within the capture's reach, longest first.
fn match_segments(
    segments: &[Segment],
    text: &str,
    pos: usize,
    spans: &mut Vec<(usize, usize)>,
) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return pos == text.len();
    };

    match first {
        Segment::Literal(literal) => {
            text[pos..].starts_with(literal.as_str())
                && match_segments(rest, text, pos + literal.len(), spans)
        }
        Segment::Capture { kind, .. } => {
            let limit = text[pos..]
                .find(|c: char| !kind.allows(c))
                .map_or(text.len(), |offset| pos + offset);
            let may_be_empty = *kind == CaptureKind::Any;

            let next = match rest.first() {
                None => {
                    let matched = limit == text.len() && (limit > pos || may_be_empty);
                    if matched {
                        spans.push((pos, limit));
                    }
                    return matched;
                }
                Some(Segment::Literal(literal)) => literal.as_str(),
                Some(Segment::Capture { .. }) => return false,
            };

            let mut ends = Vec::new();
            let mut from = pos;
            while let Some(offset) = text[from..].find(next) {
                let start = from + offset;
                if start > limit {
                    break;
                }
                ends.push(start);
                from = start + text[start..].chars().next().map_or(1, char::len_utf8);
            }

            for end in ends.into_iter().rev() {
                if end == pos && !may_be_empty {
                    continue;
                }
                spans.push((pos, end));
                if match_segments(rest, text, end, spans) {
                    return true;
                }
                spans.pop();
            }
            false
        }
    }
}

/// Named values captured by a matching pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    values: Vec<(String, String)>,
}

impl Captures {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Owned copy of a capture; names the pattern does not define read as empty.
    pub fn text(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }
}

type Handler<T> = Box<dyn Fn(Captures) -> T + Send + Sync>;

/// Ordered pattern-to-handler table. First match wins.
pub struct Router<T> {
    routes: Vec<(Pattern, Handler<T>)>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Append a route. Routes registered earlier take precedence.
    pub fn register<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(Captures) -> T + Send + Sync + 'static,
    {
        let pattern = Pattern::parse(pattern)?;
        self.routes.push((pattern, Box::new(handler)));
        Ok(self)
    }

    /// Run the first handler whose pattern matches `message`, exactly once.
    pub fn dispatch(&self, message: &str) -> Result<T, RouteError> {
        self.routes
            .iter()
            .find_map(|(pattern, handler)| pattern.captures(message).map(|caps| handler(caps)))
            .ok_or_else(|| RouteError::NoMatch(message.to_string()))
    }

    /// Registered patterns in precedence order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|(pattern, _)| pattern.as_str())
    }
}
