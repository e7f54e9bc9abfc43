#[cfg(test)]
mod __test__ {

  use crate::format::FormatChar;
  use crate::parser::{printf_parser, ParamKind, ParseError, Segment, TemplateParser};

  fn parse(template: &str) -> Vec<Segment> {
    printf_parser()
      .parse(template)
      .expect(template)
      .segments()
      .to_vec()
  }

  fn parse_err(template: &str) -> ParseError {
    printf_parser()
      .parse(template)
      .expect_err(template)
  }

  fn param_indices(segments: &[Segment]) -> Vec<usize> {
    segments
      .iter()
      .filter_map(|s| match s {
        Segment::Parameter { index, .. } => Some(*index),
        _ => None,
      })
      .collect()
  }

  #[test]
  fn test_plain_text() {
    assert_eq!(
      parse("hello world"),
      vec![Segment::Text("hello world".to_string())]
    );
    assert!(parse("").is_empty());
  }

  #[test]
  fn test_implicit_indexing() {
    let segments = parse("%s = %d");
    assert_eq!(param_indices(&segments), vec![0, 1]);
  }

  #[test]
  fn test_explicit_and_relative_indexing() {
    // Scenario: "%2$s %1$s %<s" refers to arg 1, arg 0, arg 0.
    let segments = parse("%2$s %1$s %<s");
    assert_eq!(param_indices(&segments), vec![1, 0, 0]);
  }

  #[test]
  fn test_explicit_index_does_not_advance_implicit() {
    let segments = parse("%2$s %s %s");
    assert_eq!(param_indices(&segments), vec![1, 0, 1]);
  }

  #[test]
  fn test_explicit_index_errors() {
    assert!(parse_err("%0$s").message().contains("positive"));
    assert!(parse_err("%01$s").message().contains("leading zero"));
    assert!(parse_err("%1000000$s").message().contains("too large"));
    assert!(parse_err("%<s").message().contains("no prior"));
  }

  #[test]
  fn test_percent_and_newline_terms() {
    let segments = parse("100%% done%n");
    assert_eq!(
      segments,
      vec![
        Segment::Text("100".to_string()),
        Segment::Percent,
        Segment::Text(" done".to_string()),
        Segment::Newline,
      ]
    );
  }

  #[test]
  fn test_unterminated_terms() {
    assert!(parse_err("100%").message().contains("unterminated"));
    assert!(parse_err("%-5").message().contains("unterminated"));
  }

  #[test]
  fn test_date_time_consumes_sub_format() {
    let segments = parse("at %tT today");
    assert!(matches!(
      segments[1],
      Segment::Parameter {
        kind: ParamKind::DateTime('T'),
        ..
      }
    ));
    assert!(parse_err("at %t").message().contains("sub-format"));
  }

  #[test]
  fn test_hash_term() {
    let segments = parse("%h %H");
    assert!(matches!(
      segments[0],
      Segment::Parameter {
        kind: ParamKind::Hash,
        ..
      }
    ));
  }

  #[test]
  fn test_upper_case_variants() {
    let segments = parse("%S %X");
    for segment in &segments {
      if let Segment::Parameter { options, .. } = segment {
        assert!(options.should_upper_case());
      }
    }
    assert!(parse_err("%D").message().contains("upper-case"));
    assert!(parse_err("%O").message().contains("upper-case"));
    assert!(parse_err("%F").message().contains("upper-case"));
  }

  #[test]
  fn test_unknown_conversion() {
    assert!(parse_err("%q").message().contains("unknown conversion"));
  }

  #[test]
  fn test_type_specific_flag_rejection() {
    assert!(parse_err("%#s").message().contains("invalid options"));
    assert!(parse_err("%,o").message().contains("invalid options"));
    assert!(parse_err("%.2d").message().contains("invalid options"));
  }

  #[test]
  fn test_width_and_precision_boundaries() {
    let ok = parse("%999999.999999f");
    assert!(matches!(
      ok[0],
      Segment::Parameter {
        kind: ParamKind::Std(FormatChar::Float),
        ..
      }
    ));
    assert!(printf_parser().parse("%1000000f").is_err());
    assert!(printf_parser().parse("%.1000000f").is_err());
  }

  #[test]
  fn test_error_spans_point_into_template() {
    let err = parse_err("value: %1000000$s");
    let (start, end) = err.span();
    assert!(start >= 7 && end <= err.template().len());
  }

  #[test]
  fn test_options_round_trip_through_parser() {
    // The canonical re-rendering of parsed options matches the input
    // once flags are ordered and the case of the type char is dropped.
    for (template, expected) in [
      ("%-10s", "-10"),
      ("%+,8d", "+,8"),
      ("%(,6d", "(,6"),
      ("%08X", "08"),
      ("%.3G", ".3"),
    ] {
      let segments = parse(template);
      let rendered = segments
        .iter()
        .find_map(|s| match s {
          Segment::Parameter { options, .. } => {
            let mut out = String::new();
            options.append_printf(&mut out);
            Some(out)
          },
          _ => None,
        })
        .unwrap();
      assert_eq!(rendered, expected, "template {:?}", template);
    }
  }
}
