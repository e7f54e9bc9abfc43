#[cfg(test)]
mod __test__ {

  use crate::format::{
    FormatChar, FormatOptions, FLAG_GROUPING, FLAG_LEFT_ALIGN, FLAG_PLUS_FOR_POSITIVE,
    FLAG_UPPER_CASE, FLAG_ZERO_PAD, UNSET,
  };

  fn parse(region: &str) -> FormatOptions {
    FormatOptions::parse(region, false).expect(region)
  }

  #[test]
  fn test_empty_region_is_the_default() {
    let parsed = parse("");
    assert!(parsed.is_default());
    assert_eq!(parsed, FormatOptions::DEFAULT);
  }

  #[test]
  fn test_upper_case_region_is_not_default() {
    let parsed = FormatOptions::parse("", true).unwrap();
    assert!(!parsed.is_default());
    assert!(parsed.should_upper_case());
    assert_eq!(parsed.flags() & FLAG_UPPER_CASE, FLAG_UPPER_CASE);
  }

  #[test]
  fn test_flags_width_precision() {
    let parsed = parse("+,010.3");
    assert!(parsed.should_prefix_plus());
    assert!(parsed.should_group());
    assert!(parsed.should_zero_pad());
    assert_eq!(parsed.width(), 10);
    assert_eq!(parsed.precision(), 3);
  }

  #[test]
  fn test_width_boundaries() {
    assert_eq!(parse("999999").width(), 999_999);
    assert!(FormatOptions::parse("1000000", false).is_err());
  }

  #[test]
  fn test_precision_boundaries() {
    assert_eq!(parse(".999999").precision(), 999_999);
    assert!(FormatOptions::parse(".1000000", false).is_err());
    assert_eq!(parse(".0").precision(), 0);
    // Leading zeros are allowed only for the value 0 itself.
    assert!(FormatOptions::parse(".000", false).is_err());
    assert!(FormatOptions::parse(".", false).is_err());
  }

  #[test]
  fn test_flag_conflicts() {
    assert!(FormatOptions::parse("+ 5", false).is_err());
    assert!(FormatOptions::parse("-05", false).is_err());
    assert!(FormatOptions::parse("-", false).is_err());
    assert!(FormatOptions::parse("0", false).is_err());
    assert!(FormatOptions::parse("--5", false).is_err());
  }

  #[test]
  fn test_append_printf_round_trip() {
    for region in ["", "-5", "+,010.3", "#8", "(6.2", ".0", "999999"] {
      let mut out = String::new();
      parse(region).append_printf(&mut out);
      assert_eq!(out, region, "round trip of {:?}", region);
    }
  }

  #[test]
  fn test_append_printf_normalizes_flag_order_and_strips_upper() {
    // '+' then ',' is canonical; parse a region with the upper bit set
    // and confirm the rendered form has canonical flags and no trace of
    // the upper-case flag.
    let parsed = FormatOptions::parse(",+8", true).unwrap();
    let mut out = String::new();
    parsed.append_printf(&mut out);
    assert_eq!(out, "+,8");
  }

  #[test]
  fn test_validate_against_format_chars() {
    // '#' is invalid for %s.
    assert!(FormatOptions::parse("#5", false)
      .map(|o| !o.are_valid_for(FormatChar::String))
      .unwrap_or(false));
    // ',' is invalid for %o.
    assert!(!parse(",5").are_valid_for(FormatChar::Octal));
    assert!(parse(",5").are_valid_for(FormatChar::Decimal));
    // Precision is only for general and float types.
    assert!(!parse(".2").are_valid_for(FormatChar::Decimal));
    assert!(parse(".2").are_valid_for(FormatChar::Float));
    assert!(parse(".2").are_valid_for(FormatChar::String));
  }

  #[test]
  fn test_filter_restricts_without_invalid_combinations() {
    let parsed = parse("+,08.2");
    let filtered = parsed.filter(FLAG_PLUS_FOR_POSITIVE | FLAG_ZERO_PAD, true, false);
    assert!(filtered.should_prefix_plus());
    assert!(filtered.should_zero_pad());
    assert!(!filtered.should_group());
    assert_eq!(filtered.width(), 8);
    assert_eq!(filtered.precision(), UNSET);

    let unchanged = parse("-7").filter(FLAG_LEFT_ALIGN | FLAG_GROUPING, true, true);
    assert_eq!(unchanged, parse("-7"));
  }

  #[test]
  fn test_upper_variants() {
    assert!(FormatChar::String.has_upper_variant());
    assert!(FormatChar::Hex.has_upper_variant());
    assert!(!FormatChar::Decimal.has_upper_variant());
    assert!(!FormatChar::Octal.has_upper_variant());
    assert!(!FormatChar::Float.has_upper_variant());
  }

  #[test]
  fn test_format_char_lookup() {
    assert_eq!(FormatChar::of('s'), Some(FormatChar::String));
    assert_eq!(FormatChar::of('x'), Some(FormatChar::Hex));
    assert_eq!(FormatChar::of('q'), None);
    assert_eq!(FormatChar::General.printf_char(), 'g');
  }
}
