//! # Formatter Module
//!
//! Renders parsed templates with their argument vectors, and the
//! metadata suffix backends append to a formatted line.
//!
//! Argument problems never raise: a missing argument renders
//! `[ERROR: MISSING LOG ARGUMENT]` and a type mismatch renders
//! `[INVALID: format=%d, type=..., value=...]` inline, so a bad log
//! statement degrades to a readable line instead of failing the
//! statement.


use crate::arg::Arg;
use crate::format::{FormatChar, FormatOptions, FormatType, UNSET};
use crate::log_data::{LogData, Payload};
use crate::metadata::Metadata;
use crate::metadata_key::{AnyKey, AnyValue};
use crate::metadata_processor::{MetadataHandler, MetadataProcessor};
use crate::parser::{ParamKind, ParseError, Segment};

/// Marker for an index past the end of the argument vector.
pub const MISSING_ARGUMENT_MARKER: &str = "[ERROR: MISSING LOG ARGUMENT]";

/// Formats a record's message (template or literal). Template parse
/// failures surface to the caller; the backend decides how to report.
pub fn format(data: &LogData) -> Result<String, ParseError> {
  match data.payload() {
    Payload::Literal(message) => Ok(message.clone()),
    Payload::Template { context, args } => {
      let parsed = context.parser().parse(context.message())?;
      let mut out = String::with_capacity(context.message().len() + 16);
      for segment in parsed.segments() {
        match segment {
          Segment::Text(text) => out.push_str(text),
          Segment::Percent => out.push('%'),
          Segment::Newline => out.push_str(system_newline()),
          Segment::Parameter {
            index,
            options,
            kind,
          } => append_parameter(&mut out, args, *index, *options, *kind),
        }
      }
      Ok(out)
    },
  }
}

/// The `%n` expansion, validated against the allowed set with a safe
/// fallback.
fn system_newline() -> &'static str {
  let newline = if cfg!(windows) { "\r\n" } else { "\n" };
  match newline {
    "\n" | "\r" | "\r\n" => newline,
    _ => "\n",
  }
}

fn append_parameter(
  out: &mut String,
  args: &[Arg],
  index: usize,
  options: FormatOptions,
  kind: ParamKind,
) {
  let arg = match args.get(index) {
    Some(arg) => arg,
    None => {
      out.push_str(MISSING_ARGUMENT_MARKER);
      return;
    },
  };
  match kind {
    ParamKind::Hash => append_hash(out, arg, options),
    ParamKind::DateTime(sub) => append_date_time(out, arg, options, sub),
    ParamKind::Std(format_char) => match format_char.format_type() {
      FormatType::General => append_string(out, arg, options),
      FormatType::Boolean => append_bool(out, arg, options),
      FormatType::Character => append_char(out, arg, options),
      FormatType::Integral => append_integral(out, arg, options, format_char),
      FormatType::Float => append_float(out, arg, options, format_char),
    },
  }
}

fn push_invalid(out: &mut String, format: &str, arg: &Arg) {
  out.push_str("[INVALID: format=%");
  out.push_str(format);
  out.push_str(", type=");
  out.push_str(arg.type_label());
  out.push_str(", value=");
  out.push_str(&arg.render());
  out.push(']');
}

/// Pads `token` to the requested width with spaces; alignment follows
/// the `-` flag.
fn push_padded(out: &mut String, token: &str, options: FormatOptions) {
  let width = options.width();
  let len = token.chars().count();
  if width == UNSET || width as usize <= len {
    out.push_str(token);
    return;
  }
  let pad = width as usize - len;
  if options.should_left_align() {
    out.push_str(token);
    out.extend(std::iter::repeat(' ').take(pad));
  } else {
    out.extend(std::iter::repeat(' ').take(pad));
    out.push_str(token);
  }
}

/// Emits `prefix body suffix` padded to the width; the `0` flag pads
/// with zeros between the prefix (sign or radix marker) and the body.
fn push_padded_numeric(out: &mut String, prefix: &str, body: &str, suffix: &str, options: FormatOptions) {
  let width = options.width();
  let len = prefix.len() + body.len() + suffix.len();
  if width == UNSET || width as usize <= len {
    out.push_str(prefix);
    out.push_str(body);
    out.push_str(suffix);
    return;
  }
  let pad = width as usize - len;
  if options.should_left_align() {
    out.push_str(prefix);
    out.push_str(body);
    out.push_str(suffix);
    out.extend(std::iter::repeat(' ').take(pad));
  } else if options.should_zero_pad() {
    out.push_str(prefix);
    out.extend(std::iter::repeat('0').take(pad));
    out.push_str(body);
    out.push_str(suffix);
  } else {
    out.extend(std::iter::repeat(' ').take(pad));
    out.push_str(prefix);
    out.push_str(body);
    out.push_str(suffix);
  }
}

/// Sign prefix/suffix for a finite numeric value.
fn sign_affixes(negative: bool, options: FormatOptions) -> (&'static str, &'static str) {
  if negative {
    if options.should_parenthesize_negative() {
      ("(", ")")
    } else {
      ("-", "")
    }
  } else if options.should_prefix_plus() {
    ("+", "")
  } else if options.should_prefix_space() {
    (" ", "")
  } else {
    ("", "")
  }
}

/// Inserts grouping separators every three digits, counting from the
/// right of the integer part.
fn group_digits(digits: &str) -> String {
  let (int_part, rest) = match digits.find('.') {
    Some(dot) => digits.split_at(dot),
    None => (digits, ""),
  };
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
  let count = int_part.len();
  for (n, c) in int_part.chars().enumerate() {
    if n > 0 && (count - n) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(c);
  }
  grouped.push_str(rest);
  grouped
}

fn append_string(out: &mut String, arg: &Arg, options: FormatOptions) {
  if let Arg::Formattable(_) = arg {
    // Self-formatting values receive the options directly; render()
    // already guards against panics but cannot pass options through, so
    // a dedicated guarded path is used here.
    let rendered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
      let mut tmp = String::new();
      if let Arg::Formattable(value) = arg {
        value.format_to(&options, &mut tmp);
      }
      tmp
    }))
    .unwrap_or_else(|_| arg.render());
    out.push_str(&rendered);
    return;
  }

  let mut token = arg.render();
  if options.precision() != UNSET {
    token = token.chars().take(options.precision() as usize).collect();
  }
  if options.should_upper_case() {
    token = token.to_uppercase();
  }
  push_padded(out, &token, options);
}

fn append_bool(out: &mut String, arg: &Arg, options: FormatOptions) {
  // Any non-boolean argument formats as true, matching printf `%b`.
  let value = match arg {
    Arg::Bool(b) => *b,
    _ => true,
  };
  let token = if options.should_upper_case() {
    if value {
      "TRUE"
    } else {
      "FALSE"
    }
  } else if value {
    "true"
  } else {
    "false"
  };
  push_padded(out, token, options);
}

fn append_char(out: &mut String, arg: &Arg, options: FormatOptions) {
  let value = match arg {
    Arg::Char(c) => Some(*c),
    Arg::I64(v) => u32::try_from(*v).ok().and_then(char::from_u32),
    Arg::U64(v) => u32::try_from(*v).ok().and_then(char::from_u32),
    _ => None,
  };
  match value {
    Some(c) => {
      let mut token = c.to_string();
      if options.should_upper_case() {
        token = token.to_uppercase();
      }
      push_padded(out, &token, options);
    },
    None => push_invalid(out, "c", arg),
  }
}

enum IntValue {
  Signed(i64),
  Unsigned(u64),
}

fn as_integral(arg: &Arg) -> Option<IntValue> {
  match arg {
    Arg::I64(v) => Some(IntValue::Signed(*v)),
    Arg::U64(v) => Some(IntValue::Unsigned(*v)),
    _ => None,
  }
}

fn append_integral(out: &mut String, arg: &Arg, options: FormatOptions, format_char: FormatChar) {
  let value = match as_integral(arg) {
    Some(value) => value,
    None => {
      push_invalid(out, &format_char.printf_char().to_string(), arg);
      return;
    },
  };
  match format_char {
    FormatChar::Decimal => {
      let (negative, magnitude) = match value {
        IntValue::Signed(v) => (v < 0, v.unsigned_abs() as u128),
        IntValue::Unsigned(v) => (false, v as u128),
      };
      let mut body = magnitude.to_string();
      if options.should_group() {
        body = group_digits(&body);
      }
      let (prefix, suffix) = sign_affixes(negative, options);
      push_padded_numeric(out, prefix, &body, suffix, options);
    },
    FormatChar::Hex | FormatChar::Octal => {
      // Negative signed values format as their 64-bit two's complement.
      let bits = match value {
        IntValue::Signed(v) => v as u64,
        IntValue::Unsigned(v) => v,
      };
      let mut body = if format_char == FormatChar::Hex {
        format!("{:x}", bits)
      } else {
        format!("{:o}", bits)
      };
      if options.should_upper_case() {
        body.make_ascii_uppercase();
      }
      let prefix = if options.should_show_alternate() {
        match (format_char, options.should_upper_case()) {
          (FormatChar::Hex, false) => "0x",
          (FormatChar::Hex, true) => "0X",
          _ => "0",
        }
      } else {
        ""
      };
      push_padded_numeric(out, prefix, &body, "", options);
    },
    _ => unreachable!("integral conversions are d, o and x"),
  }
}

fn append_hash(out: &mut String, arg: &Arg, options: FormatOptions) {
  let mut body = format!("{:x}", arg.identity_hash());
  if options.should_upper_case() {
    body.make_ascii_uppercase();
  }
  push_padded_numeric(out, "", &body, "", options);
}

fn append_float(out: &mut String, arg: &Arg, options: FormatOptions, format_char: FormatChar) {
  let value = match arg {
    Arg::F64(v) => *v,
    _ => {
      push_invalid(out, &format_char.printf_char().to_string(), arg);
      return;
    },
  };

  if value.is_nan() || value.is_infinite() {
    let mut token = if value.is_nan() {
      "NaN".to_string()
    } else if value > 0.0 {
      "Infinity".to_string()
    } else {
      "-Infinity".to_string()
    };
    if options.should_upper_case() {
      token.make_ascii_uppercase();
    }
    push_padded(out, &token, options);
    return;
  }

  let negative = value.is_sign_negative();
  let magnitude = value.abs();
  let (prefix, suffix) = sign_affixes(negative, options);

  let mut body = match format_char {
    FormatChar::Float => {
      let precision = if options.precision() == UNSET {
        6
      } else {
        options.precision() as usize
      };
      let mut body = format!("{:.*}", precision, magnitude);
      if precision == 0 && options.should_show_alternate() {
        body.push('.');
      }
      if options.should_group() {
        body = group_digits(&body);
      }
      body
    },
    FormatChar::Exponent => {
      let precision = if options.precision() == UNSET {
        6
      } else {
        options.precision() as usize
      };
      scientific(magnitude, precision)
    },
    FormatChar::General => {
      let precision = match options.precision() {
        UNSET => 6,
        0 => 1,
        p => p as usize,
      };
      let mut body = general(magnitude, precision);
      if options.should_group() {
        body = group_digits(&body);
      }
      body
    },
    FormatChar::ExponentHex => hex_float(magnitude),
    _ => unreachable!("float conversions are f, e, g and a"),
  };

  if options.should_upper_case() {
    body.make_ascii_uppercase();
  }
  push_padded_numeric(out, prefix, &body, suffix, options);
}

/// `1234.5` with precision 2 → `1.23e+03`.
fn scientific(magnitude: f64, precision: usize) -> String {
  let raw = format!("{:.*e}", precision, magnitude);
  match raw.split_once('e') {
    Some((mantissa, exponent)) => {
      let (sign, digits) = match exponent.strip_prefix('-') {
        Some(rest) => ('-', rest),
        None => ('+', exponent),
      };
      format!("{}e{}{:0>2}", mantissa, sign, digits)
    },
    None => raw,
  }
}

/// `%g`: `precision` significant digits, scientific form when the
/// exponent is below -4 or at least the precision.
fn general(magnitude: f64, precision: usize) -> String {
  if magnitude == 0.0 {
    return format!("{:.*}", precision.saturating_sub(1), 0.0);
  }
  let exponent = magnitude.log10().floor() as i32;
  if exponent < -4 || exponent >= precision as i32 {
    scientific(magnitude, precision.saturating_sub(1))
  } else {
    let decimals = precision as i32 - 1 - exponent;
    format!("{:.*}", decimals.max(0) as usize, magnitude)
  }
}

/// `%a`: hexadecimal floating point, e.g. `0x1.8p1` for 3.0.
fn hex_float(magnitude: f64) -> String {
  if magnitude == 0.0 {
    return "0x0.0p0".to_string();
  }
  let bits = magnitude.to_bits();
  let raw_exponent = ((bits >> 52) & 0x7ff) as i64;
  let mantissa = bits & 0x000f_ffff_ffff_ffff;
  let mantissa_hex = {
    let mut hex = format!("{:013x}", mantissa);
    while hex.len() > 1 && hex.ends_with('0') {
      hex.pop();
    }
    hex
  };
  if raw_exponent == 0 {
    format!("0x0.{}p-1022", mantissa_hex)
  } else {
    format!("0x1.{}p{}", mantissa_hex, raw_exponent - 1023)
  }
}

fn append_date_time(out: &mut String, arg: &Arg, options: FormatOptions, sub: char) {
  let millis = match arg {
    Arg::I64(v) => Some(*v),
    Arg::U64(v) => i64::try_from(*v).ok(),
    _ => None,
  };
  let format_label = format!("t{}", sub);
  let millis = match millis {
    Some(millis) => millis,
    None => {
      push_invalid(out, &format_label, arg);
      return;
    },
  };
  let date_time = match chrono::DateTime::from_timestamp_millis(millis) {
    Some(date_time) => date_time,
    None => {
      push_invalid(out, &format_label, arg);
      return;
    },
  };

  let mut token = match sub {
    'H' => date_time.format("%H").to_string(),
    'M' => date_time.format("%M").to_string(),
    'S' => date_time.format("%S").to_string(),
    'L' => date_time.format("%3f").to_string(),
    'y' => date_time.format("%y").to_string(),
    'Y' => date_time.format("%Y").to_string(),
    'm' => date_time.format("%m").to_string(),
    'b' => date_time.format("%b").to_string(),
    'd' => date_time.format("%d").to_string(),
    'T' => date_time.format("%H:%M:%S").to_string(),
    'R' => date_time.format("%H:%M").to_string(),
    'F' => date_time.format("%Y-%m-%d").to_string(),
    's' => (millis.div_euclid(1000)).to_string(),
    'Q' => millis.to_string(),
    _ => {
      push_invalid(out, &format_label, arg);
      return;
    },
  };
  if options.should_upper_case() {
    token.make_ascii_uppercase();
  }
  push_padded(out, &token, options);
}

/// Appends ` [key=value ...]` for the merged scope + statement metadata;
/// appends nothing when the merged view is empty.
pub fn append_metadata_suffix(out: &mut String, scope: &dyn Metadata, logged: &dyn Metadata) {
  let processor = MetadataProcessor::of(scope, logged);
  if processor.key_count() == 0 {
    return;
  }
  out.push_str(" [");
  let mut appender = KeyValueAppender { first: true };
  processor.process(&mut appender, out);
  out.push(']');
}

struct KeyValueAppender {
  first: bool,
}

impl KeyValueAppender {
  fn separator(&mut self, out: &mut String) {
    if self.first {
      self.first = false;
    } else {
      out.push(' ');
    }
  }
}

impl MetadataHandler<String> for KeyValueAppender {
  fn handle_single(&mut self, key: &AnyKey, value: &AnyValue, out: &mut String) {
    self.separator(out);
    out.push_str(key.label());
    out.push('=');
    out.push_str(&key.render(value));
  }

  fn handle_repeated(
    &mut self,
    key: &AnyKey,
    values: &mut dyn Iterator<Item = &AnyValue>,
    out: &mut String,
  ) {
    self.separator(out);
    out.push_str(key.label());
    out.push_str("=[");
    let mut first = true;
    for value in values {
      if !first {
        out.push_str(", ");
      }
      first = false;
      out.push_str(&key.render(value));
    }
    out.push(']');
  }
}
