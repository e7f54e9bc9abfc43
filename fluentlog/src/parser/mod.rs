//! # Parser Module
//!
//! Printf-style template parsing.
//!
//! Grammar of a term: `%[index][flags][width][.precision]<type>` with
//! explicit (`%2$s`), relative (`%<s`) and implicit indexing. `%%` and
//! `%n` are unescape terms, not parameters; `%t`/`%T` consume one extra
//! sub-format character; `%h`/`%H` is hex of the argument's identity
//! hash. Templates parse into a flat segment list that the formatter
//! walks with the argument vector.

mod __test__;

use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

use crate::format::{FormatChar, FormatOptions, FLAG_LEFT_ALIGN};

/// Upper bound (exclusive) for explicit argument indices.
pub const MAX_ARG_COUNT: usize = 1_000_000;

/// Structured parse failure: message plus the byte range of the
/// offending term inside the original template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
  message: String,
  span: (usize, usize),
  template: String,
}

impl ParseError {
  pub fn new(message: impl Into<String>, span: (usize, usize), template: &str) -> Self {
    Self {
      message: message.into(),
      span,
      template: template.to_string(),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn span(&self) -> (usize, usize) {
    self.span
  }

  pub fn template(&self) -> &str {
    &self.template
  }
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "invalid format template: {} at [{}..{}] in {:?}",
      self.message, self.span.0, self.span.1, self.template
    )
  }
}

impl std::error::Error for ParseError {}

/// What a parameter term renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
  /// An ordinary conversion.
  Std(FormatChar),
  /// `%h`/`%H`: hex of the argument's identity hash.
  Hash,
  /// `%t`/`%T` with its sub-format character.
  DateTime(char),
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
  Text(String),
  /// From `%%`.
  Percent,
  /// From `%n`.
  Newline,
  Parameter {
    index: usize,
    options: FormatOptions,
    kind: ParamKind,
  },
}

/// A fully parsed template, ready to be walked with arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
  segments: Vec<Segment>,
}

impl ParsedTemplate {
  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }
}

/// A template grammar. Identity of the parser is part of the template
/// context so backends can cache parsed forms per parser.
pub trait TemplateParser: Send + Sync + fmt::Debug {
  fn parse(&self, template: &str) -> Result<ParsedTemplate, ParseError>;
}

/// The printf grammar.
#[derive(Debug, Default)]
pub struct PrintfParser;

static DEFAULT_PRINTF: Lazy<Arc<PrintfParser>> = Lazy::new(|| Arc::new(PrintfParser));

/// The shared printf parser instance used for identity comparisons.
pub fn printf_parser() -> Arc<PrintfParser> {
  Arc::clone(&DEFAULT_PRINTF)
}

impl TemplateParser for PrintfParser {
  fn parse(&self, template: &str) -> Result<ParsedTemplate, ParseError> {
    let bytes = template.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0usize;
    let mut pos = 0usize;
    let mut next_implicit = 0usize;
    let mut last_index: Option<usize> = None;

    while pos < bytes.len() {
      if bytes[pos] != b'%' {
        pos += 1;
        continue;
      }
      if pos > text_start {
        segments.push(Segment::Text(template[text_start..pos].to_string()));
      }

      let term_start = pos;
      pos += 1;
      if pos >= bytes.len() {
        return Err(ParseError::new(
          "unterminated term",
          (term_start, bytes.len()),
          template,
        ));
      }

      match bytes[pos] {
        b'%' => {
          segments.push(Segment::Percent);
          pos += 1;
          text_start = pos;
          continue;
        },
        b'n' => {
          segments.push(Segment::Newline);
          pos += 1;
          text_start = pos;
          continue;
        },
        _ => {},
      }

      // Index part: explicit `N$`, relative `<`, or implicit.
      let mut index: Option<usize> = None;
      if bytes[pos] == b'<' {
        match last_index {
          Some(prior) => index = Some(prior),
          None => {
            return Err(ParseError::new(
              "relative index with no prior parameter",
              (term_start, pos + 1),
              template,
            ));
          },
        }
        pos += 1;
      } else if bytes[pos].is_ascii_digit() {
        let digits_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
          pos += 1;
        }
        if pos < bytes.len() && bytes[pos] == b'$' {
          let digits = &template[digits_start..pos];
          if digits.starts_with('0') {
            let message = if digits == "0" {
              "explicit index must be positive"
            } else {
              "explicit index has a leading zero"
            };
            return Err(ParseError::new(message, (term_start, pos + 1), template));
          }
          let value = digits
            .parse::<usize>()
            .ok()
            .filter(|&v| v < MAX_ARG_COUNT)
            .ok_or_else(|| {
              ParseError::new("explicit index too large", (term_start, pos + 1), template)
            })?;
          index = Some(value - 1);
          pos += 1;
        } else {
          // The digits belong to the width.
          pos = digits_start;
        }
      }

      // Options region runs until the conversion character.
      let options_start = pos;
      while pos < bytes.len() && !bytes[pos].is_ascii_alphabetic() {
        pos += 1;
      }
      if pos >= bytes.len() {
        return Err(ParseError::new(
          "unterminated term",
          (term_start, bytes.len()),
          template,
        ));
      }
      let type_char = bytes[pos] as char;
      let upper_case = type_char.is_ascii_uppercase();
      let options = FormatOptions::parse(&template[options_start..pos], upper_case)
        .map_err(|(message, offset)| {
          ParseError::new(message, (options_start + offset, pos), template)
        })?;
      pos += 1;

      let kind = match type_char.to_ascii_lowercase() {
        'h' => ParamKind::Hash,
        't' => {
          if pos >= bytes.len() {
            return Err(ParseError::new(
              "date/time term is missing its sub-format",
              (term_start, bytes.len()),
              template,
            ));
          }
          let sub = bytes[pos] as char;
          pos += 1;
          ParamKind::DateTime(sub)
        },
        c => match FormatChar::of(c) {
          Some(format_char) => {
            if upper_case && !format_char.has_upper_variant() {
              return Err(ParseError::new(
                format!("'%{}' has no upper-case variant", type_char),
                (term_start, pos),
                template,
              ));
            }
            ParamKind::Std(format_char)
          },
          None => {
            return Err(ParseError::new(
              format!("unknown conversion character '{}'", type_char),
              (term_start, pos),
              template,
            ));
          },
        },
      };

      let valid = match kind {
        ParamKind::Std(format_char) => options.are_valid_for(format_char),
        ParamKind::Hash => options.validate(FormatChar::Hex.allowed_flags(), true, false),
        ParamKind::DateTime(_) => options.validate(FLAG_LEFT_ALIGN, true, false),
      };
      if !valid {
        return Err(ParseError::new(
          format!("invalid options for '%{}'", type_char),
          (term_start, pos),
          template,
        ));
      }

      let resolved = match index {
        Some(explicit) => explicit,
        None => {
          let implicit = next_implicit;
          next_implicit += 1;
          implicit
        },
      };
      last_index = Some(resolved);
      segments.push(Segment::Parameter {
        index: resolved,
        options,
        kind,
      });
      text_start = pos;
    }

    if text_start < bytes.len() {
      segments.push(Segment::Text(template[text_start..].to_string()));
    }

    Ok(ParsedTemplate { segments })
  }
}
