use std::error::Error;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Log stream name template.
///
/// Placeholders use format string syntax: `{LogGroup}`, `{LogStream}`,
/// `{YYYY}`, `{MM}`, `{DD}` and `{HH}`. Literal braces are written as `{{`
/// and `}}`. Date fields are rendered in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTemplate {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    LogGroup,
    LogStream,
    Year,
    Month,
    Day,
    Hour,
}

impl FromStr for Field {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "LogGroup" => Ok(Field::LogGroup),
            "LogStream" => Ok(Field::LogStream),
            "YYYY" => Ok(Field::Year),
            "MM" => Ok(Field::Month),
            "DD" => Ok(Field::Day),
            "HH" => Ok(Field::Hour),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    UnknownField(String),
    /// Byte offset of the `{` that is never closed.
    Unclosed(usize),
    /// Byte offset of a lone `}`.
    UnmatchedClose(usize),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TemplateError::UnknownField(name) => write!(f, "unknown template field: {}", name),
            TemplateError::Unclosed(pos) => write!(f, "unclosed '{{' at offset {}", pos),
            TemplateError::UnmatchedClose(pos) => write!(f, "unmatched '}}' at offset {}", pos),
        }
    }
}

impl Error for TemplateError {}

impl StreamTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed(pos));
                    }
                    let field: Field = name
                        .trim()
                        .parse()
                        .map_err(|_| TemplateError::UnknownField(name.clone()))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => return Err(TemplateError::UnmatchedClose(pos)),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    pub fn render(&self, log_group: &str, log_stream: &str, now: DateTime<Utc>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Field::LogGroup) => out.push_str(log_group),
                Segment::Field(Field::LogStream) => out.push_str(log_stream),
                Segment::Field(Field::Year) => out.push_str(&format!("{:04}", now.year())),
                Segment::Field(Field::Month) => out.push_str(&format!("{:02}", now.month())),
                Segment::Field(Field::Day) => out.push_str(&format!("{:02}", now.day())),
                Segment::Field(Field::Hour) => out.push_str(&format!("{:02}", now.hour())),
            }
        }
        out
    }
}

impl FromStr for StreamTemplate {
    type Err = TemplateError;

    fn from_str(template: &str) -> Result<Self, Self::Err> {
        Self::parse(template)
    }
}
