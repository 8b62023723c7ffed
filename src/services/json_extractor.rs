//! Best-effort recovery of JSON payloads from free-form model output.
//!
//! Model responses are never schema-guaranteed. [`JsonExtractor::extract`]
//! tries a fixed ladder of strategies, cheapest and most specific first:
//!
//! 1. a fenced ```` ```json ```` block (after the whole response, when it
//!    already starts with `{` or `[`)
//! 2. the whole trimmed response
//! 3. the first balanced `{...}` object
//! 4. that object with trailing commas and CRLF line endings normalized
//! 5. truncation repair: close the open string, drop a dangling `,` or `:`
//!    and append the missing closers
//!
//! The first strategy that yields a syntactically valid object or array wins.
//! If every strategy fails the result is `None`; a partially parsed value is
//! never returned.

use serde_json::Value;

/// Which strategy produced an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    FencedBlock,
    Direct,
    BalancedObject,
    Normalized,
    TruncationRepair,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStrategy::FencedBlock => "fenced_block",
            ExtractionStrategy::Direct => "direct",
            ExtractionStrategy::BalancedObject => "balanced_object",
            ExtractionStrategy::Normalized => "normalized",
            ExtractionStrategy::TruncationRepair => "truncation_repair",
        }
    }

    /// Whether the payload may be missing data the model intended to send.
    pub fn possibly_incomplete(&self) -> bool {
        matches!(self, ExtractionStrategy::TruncationRepair)
    }
}

/// A recovered payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub value: Value,
    pub strategy: ExtractionStrategy,
}

/// Stateless JSON recovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl JsonExtractor {
    /// Recover the JSON payload of `text`. `label` only tags log lines.
    pub fn extract(text: &str, label: &str) -> Option<Value> {
        Self::extract_detailed(text, label).map(|e| e.value)
    }

    /// Like [`extract`](Self::extract), also reporting the winning strategy.
    pub fn extract_detailed(text: &str, label: &str) -> Option<Extraction> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            tracing::debug!(label, "Empty response, nothing to extract");
            return None;
        }

        let starts_structured = trimmed.starts_with('{') || trimmed.starts_with('[');
        if starts_structured {
            if let Some(value) = parse_structured(trimmed) {
                return Some(found(value, ExtractionStrategy::Direct, label));
            }
        }

        if let Some(value) = fenced_block(trimmed).and_then(parse_structured) {
            return Some(found(value, ExtractionStrategy::FencedBlock, label));
        }

        if !starts_structured {
            if let Some(value) = parse_structured(trimmed) {
                return Some(found(value, ExtractionStrategy::Direct, label));
            }
        }

        let balanced = balanced_object(trimmed);
        if let Some(candidate) = balanced {
            if let Some(value) = parse_structured(candidate) {
                return Some(found(value, ExtractionStrategy::BalancedObject, label));
            }
            if let Some(value) = parse_structured(&normalize(candidate)) {
                return Some(found(value, ExtractionStrategy::Normalized, label));
            }
        }

        if let Some(value) = repair_truncated(trimmed) {
            tracing::warn!(
                label,
                "Recovered JSON by truncation repair; payload is possibly incomplete"
            );
            return Some(Extraction {
                value,
                strategy: ExtractionStrategy::TruncationRepair,
            });
        }

        let counts = BracketCounts::of(trimmed);
        tracing::warn!(
            label,
            open_braces = counts.open_braces,
            close_braces = counts.close_braces,
            open_brackets = counts.open_brackets,
            close_brackets = counts.close_brackets,
            likely_truncated = counts.looks_truncated(),
            response_chars = trimmed.chars().count(),
            "Could not extract JSON from response"
        );
        None
    }
}

fn found(value: Value, strategy: ExtractionStrategy, label: &str) -> Extraction {
    if strategy != ExtractionStrategy::Direct {
        tracing::debug!(label, strategy = strategy.as_str(), "Extracted JSON via fallback");
    }
    Extraction { value, strategy }
}

/// Only objects and arrays count as structured data.
fn parse_structured(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

const JSON_FENCE: &str = "```json";

/// Interior of the first ```` ```json ```` fence that has a closing fence.
///
/// Quotes are tracked from the first `{` or `[` on, so a fence quoted inside
/// a JSON string value is not taken for a real one.
fn fenced_block(text: &str) -> Option<&str> {
    let json_start = text.find(['{', '[']).unwrap_or(text.len());
    let mut state = ScanState::Normal;

    for (offset, c) in text.char_indices() {
        if state == ScanState::Normal
            && c == '`'
            && text
                .get(offset..offset + JSON_FENCE.len())
                .is_some_and(|tag| tag.eq_ignore_ascii_case(JSON_FENCE))
        {
            let rest = &text[offset + JSON_FENCE.len()..];
            let end = rest.find("```")?;
            return Some(rest[..end].trim());
        }
        if offset >= json_start {
            state = state.advance(c);
        }
    }
    None
}

/// Lexer state for brace/quote tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InString,
    Escaped,
}

impl ScanState {
    fn advance(self, c: char) -> Self {
        match (self, c) {
            (ScanState::Normal, '"') => ScanState::InString,
            (ScanState::Normal, _) => ScanState::Normal,
            (ScanState::InString, '\\') => ScanState::Escaped,
            (ScanState::InString, '"') => ScanState::Normal,
            (ScanState::InString, _) => ScanState::InString,
            (ScanState::Escaped, _) => ScanState::InString,
        }
    }
}

/// Substring from the first `{` to its matching `}`, ignoring braces inside
/// string literals.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut state = ScanState::Normal;
    let mut depth = 0usize;

    for (offset, c) in text[start..].char_indices() {
        if state == ScanState::Normal {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..start + offset + c.len_utf8()]);
                    }
                }
                _ => {}
            }
        }
        state = state.advance(c);
    }
    None
}

/// CRLF to LF, and drop commas that directly precede `}` or `]`.
fn normalize(candidate: &str) -> String {
    let text = candidate.replace("\r\n", "\n");
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = ScanState::Normal;

    for (i, &c) in chars.iter().enumerate() {
        if state == ScanState::Normal && c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
        state = state.advance(c);
    }
    out
}

/// A place the text can be cut and closed off, with the closers needed there.
struct CutPoint {
    end: usize,
    closers: Vec<char>,
}

/// Close a response that was cut off mid-generation.
///
/// First tries closing at end of input. If that does not parse, backs off to
/// the latest container opening or element separator that yields valid JSON,
/// so every fully written member before the cut survives.
fn repair_truncated(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let body = &text[start..];

    let mut state = ScanState::Normal;
    let mut stack: Vec<char> = Vec::new();
    let mut cuts: Vec<CutPoint> = Vec::new();

    for (offset, c) in body.char_indices() {
        if state == ScanState::Normal {
            match c {
                '{' | '[' => {
                    stack.push(if c == '{' { '}' } else { ']' });
                    cuts.push(CutPoint {
                        end: offset + 1,
                        closers: stack.clone(),
                    });
                }
                '}' | ']' => {
                    if stack.pop() != Some(c) {
                        return None;
                    }
                    if stack.is_empty() {
                        // Balanced already; earlier strategies saw this.
                        return None;
                    }
                }
                ',' => cuts.push(CutPoint {
                    end: offset,
                    closers: stack.clone(),
                }),
                _ => {}
            }
        }
        state = state.advance(c);
    }

    let mut tail = body.to_string();
    match state {
        ScanState::Escaped => {
            tail.pop();
            tail.push('"');
        }
        ScanState::InString => tail.push('"'),
        ScanState::Normal => {}
    }
    let trimmed_len = tail.trim_end().len();
    tail.truncate(trimmed_len);
    while tail.ends_with(',') || tail.ends_with(':') {
        tail.pop();
        let len = tail.trim_end().len();
        tail.truncate(len);
    }
    tail.extend(stack.iter().rev());

    if let Some(value) = parse_structured(&tail).or_else(|| parse_structured(&normalize(&tail))) {
        return Some(value);
    }

    cuts.iter().rev().find_map(|cut| {
        let mut candidate = body[..cut.end].trim_end().to_string();
        candidate.extend(cut.closers.iter().rev());
        parse_structured(&candidate).or_else(|| parse_structured(&normalize(&candidate)))
    })
}

/// Raw bracket tallies, used for the truncation diagnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BracketCounts {
    pub open_braces: usize,
    pub close_braces: usize,
    pub open_brackets: usize,
    pub close_brackets: usize,
}

impl BracketCounts {
    pub fn of(text: &str) -> Self {
        text.chars().fold(Self::default(), |mut counts, c| {
            match c {
                '{' => counts.open_braces += 1,
                '}' => counts.close_braces += 1,
                '[' => counts.open_brackets += 1,
                ']' => counts.close_brackets += 1,
                _ => {}
            }
            counts
        })
    }

    pub fn looks_truncated(&self) -> bool {
        self.open_braces > self.close_braces || self.open_brackets > self.close_brackets
    }
}
