//! # Format Module
//!
//! Printf format options (flags, width, precision) and the format
//! character tables.
//!
//! Options are an immutable `Copy` triple with `UNSET = -1` for missing
//! width/precision. Flags are a bitmask whose bits follow the canonical
//! flag order `" #(+,-0"`; the upper-case flag (derived from the case of
//! the type character, never written as a printf flag) occupies a bit
//! above them and is stripped when options are rendered back to a
//! printf string.

mod __test__;

/// Sentinel for "no width" / "no precision".
pub const UNSET: i32 = -1;

/// Largest accepted width or precision value.
pub const MAX_WIDTH_OR_PRECISION: i32 = 999_999;

/// Canonical flag order used when rendering options back to printf.
const FLAG_CHARS_ORDERED: &[u8; 7] = b" #(+,-0";

pub const FLAG_SPACE_FOR_POSITIVE: u32 = 1 << 0;
pub const FLAG_ALTERNATE: u32 = 1 << 1;
pub const FLAG_PARENS_FOR_NEGATIVE: u32 = 1 << 2;
pub const FLAG_PLUS_FOR_POSITIVE: u32 = 1 << 3;
pub const FLAG_GROUPING: u32 = 1 << 4;
pub const FLAG_LEFT_ALIGN: u32 = 1 << 5;
pub const FLAG_ZERO_PAD: u32 = 1 << 6;

/// Derived from the type character case; never parsed from or emitted
/// into the flag region.
pub const FLAG_UPPER_CASE: u32 = 1 << 7;

/// Every flag that can legally appear in a printf flag region.
pub const ALL_PRINTF_FLAGS: u32 = (1 << 7) - 1;

fn flag_bit(c: u8) -> Option<u32> {
  FLAG_CHARS_ORDERED
    .iter()
    .position(|&f| f == c)
    .map(|n| 1u32 << n)
}

/// Immutable (flags, width, precision) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
  flags: u32,
  width: i32,
  precision: i32,
}

impl FormatOptions {
  /// The shared default: no flags, no width, no precision. Parsing an
  /// empty spec without the upper-case bit returns exactly this value so
  /// callers can compare against it directly.
  pub const DEFAULT: FormatOptions = FormatOptions {
    flags: 0,
    width: UNSET,
    precision: UNSET,
  };

  /// Parses the region between the (optional) index and the type
  /// character: flags, width, precision. Errors carry a message and the
  /// byte offset of the offending character inside `region`.
  pub fn parse(region: &str, upper_case: bool) -> Result<FormatOptions, (String, usize)> {
    if region.is_empty() && !upper_case {
      return Ok(Self::DEFAULT);
    }

    let bytes = region.as_bytes();
    let mut pos = 0;
    let mut flags = if upper_case { FLAG_UPPER_CASE } else { 0 };

    while pos < bytes.len() {
      match flag_bit(bytes[pos]) {
        Some(bit) => {
          if flags & bit != 0 {
            return Err((format!("repeated flag '{}'", bytes[pos] as char), pos));
          }
          flags |= bit;
          pos += 1;
        },
        None => break,
      }
    }

    let mut width = UNSET;
    let width_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
      pos += 1;
    }
    if pos > width_start {
      // A leading '0' is impossible here: it was consumed as a flag.
      width = match region[width_start..pos].parse::<i32>() {
        Ok(value) if value <= MAX_WIDTH_OR_PRECISION => value,
        _ => return Err(("width too large".to_string(), width_start)),
      };
    }

    let mut precision = UNSET;
    if pos < bytes.len() && bytes[pos] == b'.' {
      let dot = pos;
      pos += 1;
      let digits_start = pos;
      while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
      }
      if pos == digits_start {
        return Err(("precision is missing its digits".to_string(), dot));
      }
      let digits = &region[digits_start..pos];
      if digits.len() > 1 && digits.starts_with('0') {
        return Err(("precision has a leading zero".to_string(), digits_start));
      }
      precision = match digits.parse::<i32>() {
        Ok(value) if value <= MAX_WIDTH_OR_PRECISION => value,
        _ => return Err(("precision too large".to_string(), digits_start)),
      };
    }

    if pos != bytes.len() {
      return Err((
        format!("unexpected character '{}'", bytes[pos] as char),
        pos,
      ));
    }

    if flags & FLAG_PLUS_FOR_POSITIVE != 0 && flags & FLAG_SPACE_FOR_POSITIVE != 0 {
      return Err(("flags '+' and ' ' conflict".to_string(), 0));
    }
    if flags & FLAG_LEFT_ALIGN != 0 && flags & FLAG_ZERO_PAD != 0 {
      return Err(("flags '-' and '0' conflict".to_string(), 0));
    }
    if width == UNSET && flags & (FLAG_LEFT_ALIGN | FLAG_ZERO_PAD) != 0 {
      return Err(("flags '-' and '0' require a width".to_string(), 0));
    }

    Ok(FormatOptions {
      flags,
      width,
      precision,
    })
  }

  pub fn flags(&self) -> u32 {
    self.flags
  }

  pub fn width(&self) -> i32 {
    self.width
  }

  pub fn precision(&self) -> i32 {
    self.precision
  }

  pub fn is_default(&self) -> bool {
    *self == Self::DEFAULT
  }

  #[inline]
  fn has(&self, flag: u32) -> bool {
    self.flags & flag != 0
  }

  pub fn should_upper_case(&self) -> bool {
    self.has(FLAG_UPPER_CASE)
  }

  pub fn should_left_align(&self) -> bool {
    self.has(FLAG_LEFT_ALIGN)
  }

  pub fn should_zero_pad(&self) -> bool {
    self.has(FLAG_ZERO_PAD)
  }

  pub fn should_group(&self) -> bool {
    self.has(FLAG_GROUPING)
  }

  pub fn should_show_alternate(&self) -> bool {
    self.has(FLAG_ALTERNATE)
  }

  pub fn should_prefix_plus(&self) -> bool {
    self.has(FLAG_PLUS_FOR_POSITIVE)
  }

  pub fn should_prefix_space(&self) -> bool {
    self.has(FLAG_SPACE_FOR_POSITIVE)
  }

  pub fn should_parenthesize_negative(&self) -> bool {
    self.has(FLAG_PARENS_FOR_NEGATIVE)
  }

  /// True when the printf flags are within `allowed` and width/precision
  /// only appear where permitted. The upper-case bit is outside the
  /// printf flag set and is checked separately against the type char.
  pub fn validate(&self, allowed_flags: u32, allow_width: bool, allow_precision: bool) -> bool {
    if (self.flags & ALL_PRINTF_FLAGS) & !allowed_flags != 0 {
      return false;
    }
    if !allow_width && self.width != UNSET {
      return false;
    }
    if !allow_precision && self.precision != UNSET {
      return false;
    }
    true
  }

  /// Validates against a format character's flag subset and type rules.
  pub fn are_valid_for(&self, format_char: FormatChar) -> bool {
    self.validate(
      format_char.allowed_flags(),
      true,
      format_char.format_type().supports_precision(),
    )
  }

  /// Returns options restricted to the allowed set; never an invalid
  /// combination. Unchanged inputs come back as the same value.
  pub fn filter(&self, allowed_flags: u32, allow_width: bool, allow_precision: bool) -> Self {
    let mut flags = self.flags & (allowed_flags | FLAG_UPPER_CASE);
    let width = if allow_width { self.width } else { UNSET };
    if width == UNSET {
      // Alignment flags are meaningless (and invalid) without a width.
      flags &= !(FLAG_LEFT_ALIGN | FLAG_ZERO_PAD);
    }
    FormatOptions {
      flags,
      width,
      precision: if allow_precision { self.precision } else { UNSET },
    }
  }

  /// Renders the options back into printf syntax: flags in canonical
  /// order, then width, then `.precision`. The upper-case flag is not
  /// emitted; it travels in the type character chosen downstream.
  pub fn append_printf(&self, out: &mut String) {
    for (n, &c) in FLAG_CHARS_ORDERED.iter().enumerate() {
      if self.flags & (1u32 << n) != 0 {
        out.push(c as char);
      }
    }
    if self.width != UNSET {
      out.push_str(&self.width.to_string());
    }
    if self.precision != UNSET {
      out.push('.');
      out.push_str(&self.precision.to_string());
    }
  }
}

impl Default for FormatOptions {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Categories of printf conversions, deciding width/precision legality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
  General,
  Boolean,
  Character,
  Integral,
  Float,
}

impl FormatType {
  pub fn is_numeric(self) -> bool {
    matches!(self, FormatType::Integral | FormatType::Float)
  }

  pub fn supports_precision(self) -> bool {
    matches!(self, FormatType::General | FormatType::Float)
  }
}

/// The supported printf conversion characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatChar {
  String,
  Boolean,
  Char,
  Decimal,
  Octal,
  Hex,
  Float,
  Exponent,
  General,
  ExponentHex,
}

impl FormatChar {
  /// Lookup by lower-cased conversion character.
  pub fn of(c: char) -> Option<FormatChar> {
    match c {
      's' => Some(FormatChar::String),
      'b' => Some(FormatChar::Boolean),
      'c' => Some(FormatChar::Char),
      'd' => Some(FormatChar::Decimal),
      'o' => Some(FormatChar::Octal),
      'x' => Some(FormatChar::Hex),
      'f' => Some(FormatChar::Float),
      'e' => Some(FormatChar::Exponent),
      'g' => Some(FormatChar::General),
      'a' => Some(FormatChar::ExponentHex),
      _ => None,
    }
  }

  /// The lower-case conversion character.
  pub fn printf_char(self) -> char {
    match self {
      FormatChar::String => 's',
      FormatChar::Boolean => 'b',
      FormatChar::Char => 'c',
      FormatChar::Decimal => 'd',
      FormatChar::Octal => 'o',
      FormatChar::Hex => 'x',
      FormatChar::Float => 'f',
      FormatChar::Exponent => 'e',
      FormatChar::General => 'g',
      FormatChar::ExponentHex => 'a',
    }
  }

  pub fn format_type(self) -> FormatType {
    match self {
      FormatChar::String => FormatType::General,
      FormatChar::Boolean => FormatType::Boolean,
      FormatChar::Char => FormatType::Character,
      FormatChar::Decimal | FormatChar::Octal | FormatChar::Hex => FormatType::Integral,
      FormatChar::Float | FormatChar::Exponent | FormatChar::General | FormatChar::ExponentHex => {
        FormatType::Float
      },
    }
  }

  /// Printf flags legal for this conversion. Notably `%s` takes only
  /// `-`, and `%o` has no grouping.
  pub fn allowed_flags(self) -> u32 {
    match self {
      FormatChar::String | FormatChar::Boolean | FormatChar::Char => FLAG_LEFT_ALIGN,
      FormatChar::Decimal => {
        FLAG_LEFT_ALIGN
          | FLAG_ZERO_PAD
          | FLAG_PLUS_FOR_POSITIVE
          | FLAG_SPACE_FOR_POSITIVE
          | FLAG_GROUPING
          | FLAG_PARENS_FOR_NEGATIVE
      },
      FormatChar::Octal | FormatChar::Hex => {
        FLAG_LEFT_ALIGN | FLAG_ZERO_PAD | FLAG_ALTERNATE | FLAG_PARENS_FOR_NEGATIVE
      },
      FormatChar::Float => {
        FLAG_LEFT_ALIGN
          | FLAG_ALTERNATE
          | FLAG_ZERO_PAD
          | FLAG_PLUS_FOR_POSITIVE
          | FLAG_SPACE_FOR_POSITIVE
          | FLAG_GROUPING
          | FLAG_PARENS_FOR_NEGATIVE
      },
      FormatChar::Exponent => {
        FLAG_LEFT_ALIGN
          | FLAG_ALTERNATE
          | FLAG_ZERO_PAD
          | FLAG_PLUS_FOR_POSITIVE
          | FLAG_SPACE_FOR_POSITIVE
          | FLAG_PARENS_FOR_NEGATIVE
      },
      FormatChar::General => {
        FLAG_LEFT_ALIGN
          | FLAG_ZERO_PAD
          | FLAG_PLUS_FOR_POSITIVE
          | FLAG_SPACE_FOR_POSITIVE
          | FLAG_GROUPING
          | FLAG_PARENS_FOR_NEGATIVE
      },
      FormatChar::ExponentHex => {
        FLAG_LEFT_ALIGN | FLAG_ZERO_PAD | FLAG_PLUS_FOR_POSITIVE | FLAG_SPACE_FOR_POSITIVE
      },
    }
  }

  /// Whether the upper-case conversion character exists (`%D` does not).
  pub fn has_upper_variant(self) -> bool {
    !matches!(
      self,
      FormatChar::Decimal | FormatChar::Octal | FormatChar::Float
    )
  }
}
