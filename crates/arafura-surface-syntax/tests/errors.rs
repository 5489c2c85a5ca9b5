//! Error taxonomy coverage: every failure class surfaces as its own
//! variant, and nothing is silently accepted.

use arafura_surface_syntax::{transpile, LowerError, TranslateError};

fn lower_err(source: &str) -> LowerError {
    match transpile(source) {
        Err(TranslateError::Lower(err)) => err,
        Err(TranslateError::Read(err)) => panic!("expected lowering error, got read error: {}", err),
        Ok(out) => panic!("expected error, got output:\n{}", out),
    }
}

#[test]
fn parse_error_surfaces_as_read_error() {
    match transpile("def broken(:\n    pass") {
        Err(TranslateError::Read(_)) => {}
        other => panic!("expected read error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn partial_annotations_are_rejected() {
    let err = lower_err("def f(a: int, b) -> int:\n    return a");
    assert!(matches!(err, LowerError::AnnotationMismatch { .. }), "{}", err);
}

#[test]
fn macro_with_return_annotation_is_rejected() {
    let err = lower_err("def f(a, b) -> int:\n    return a");
    assert!(matches!(err, LowerError::AnnotationMismatch { .. }), "{}", err);
}

#[test]
fn unknown_decorator_is_rejected() {
    let err = lower_err("@Packed\nclass S:\n    a: int");
    match err {
        LowerError::UnknownDecorator { name, .. } => assert_eq!(name, "Packed"),
        other => panic!("expected UnknownDecorator, got {}", other),
    }
}

#[test]
fn decorator_on_function_is_rejected() {
    let err = lower_err("@Typedef(F)\ndef f() -> int:\n    return 0");
    assert!(matches!(err, LowerError::UnknownDecorator { .. }), "{}", err);
}

#[test]
fn wildcard_as_identifier_is_reserved() {
    let err = lower_err("x = W");
    match err {
        LowerError::ReservedMisuse { name, .. } => assert_eq!(name, "W"),
        other => panic!("expected ReservedMisuse, got {}", other),
    }
}

#[test]
fn wildcard_as_declaration_target_is_reserved() {
    let err = lower_err("W: int = 5");
    assert!(matches!(err, LowerError::ReservedMisuse { .. }), "{}", err);
}

#[test]
fn label_outside_sentinel_position_is_reserved() {
    let err = lower_err("x = label");
    assert!(matches!(err, LowerError::ReservedMisuse { .. }), "{}", err);
}

#[test]
fn macro_name_outside_sentinel_position_is_reserved() {
    let err = lower_err("x = macro");
    assert!(matches!(err, LowerError::ReservedMisuse { .. }), "{}", err);
}

#[test]
fn chained_comparison_is_not_modelled() {
    let err = lower_err("x = a < b < c");
    assert!(matches!(err, LowerError::UnrecognisedPattern { .. }), "{}", err);
}

#[test]
fn arithmetic_power_is_not_modelled() {
    let err = lower_err("x = a ** b");
    assert!(matches!(err, LowerError::UnrecognisedPattern { .. }), "{}", err);
}

#[test]
fn arithmetic_floor_division_is_not_modelled() {
    let err = lower_err("x = a // b");
    assert!(matches!(err, LowerError::UnrecognisedPattern { .. }), "{}", err);
}

#[test]
fn compound_literal_needs_context() {
    let err = lower_err("x = W(a=1)");
    assert!(matches!(err, LowerError::MissingContext { .. }), "{}", err);
}

#[test]
fn for_loop_arity_mismatch() {
    let err =
        lower_err("def f() -> void:\n    for (i, j) in (int, int)((i := 0))(i < 5)(i ** W):\n        g()");
    assert!(matches!(err, LowerError::AnnotationMismatch { .. }), "{}", err);
}

#[test]
fn for_loop_type_arity_mismatch() {
    let err = lower_err(
        "def f() -> void:\n    for (i, j) in (int, int, int)((i := 0, j := 1))(i < 5)(i ** W):\n        g()",
    );
    assert!(matches!(err, LowerError::AnnotationMismatch { .. }), "{}", err);
}

#[test]
fn for_loop_shares_a_single_untupled_type() {
    // A non-tuple TYPES is applied to every variable
    let out = arafura_surface_syntax::transpile(
        "def f() -> void:\n    for (i, j) in int((i := 0, j := 1))(i < 5)((i ** W, j ** W)):\n        g()",
    )
    .unwrap();
    assert!(out.contains("for (int i = 0, j = 1; i < 5; i++, j++)"), "got: {}", out);
}

#[test]
fn for_loop_without_header_shape() {
    let err = lower_err("def f() -> void:\n    for i in items:\n        g(i)");
    assert!(matches!(err, LowerError::UnrecognisedPattern { .. }), "{}", err);
}

#[test]
fn flexible_member_must_be_last() {
    let err = lower_err("class B:\n    data: list[char]\n    len: int");
    assert!(matches!(err, LowerError::AnnotationMismatch { .. }), "{}", err);
}

#[test]
fn flexible_member_outside_struct() {
    let err = lower_err("data: list[char]");
    assert!(matches!(err, LowerError::AnnotationMismatch { .. }), "{}", err);
}

#[test]
fn bitfield_outside_struct() {
    let err = lower_err("x: bit[int, 3]");
    assert!(matches!(err, LowerError::AnnotationMismatch { .. }), "{}", err);
}

#[test]
fn bare_tag_reference_needs_wrapper() {
    let err = lower_err("class Node:\n    data: int\n\nx: Node");
    match err {
        LowerError::UnrecognisedPattern { expected, .. } => {
            assert!(expected.contains("type["), "{}", expected);
        }
        other => panic!("expected UnrecognisedPattern, got {}", other),
    }
}

#[test]
fn object_macro_needs_value() {
    let err = lower_err("X: macro");
    assert!(matches!(err, LowerError::AnnotationMismatch { .. }), "{}", err);
}

#[test]
fn goto_target_must_be_a_name() {
    let err = lower_err("def f() -> void:\n    raise g()");
    assert!(matches!(err, LowerError::UnrecognisedPattern { .. }), "{}", err);
}

#[test]
fn keyword_arguments_in_plain_calls_are_rejected() {
    let err = lower_err("f(x=1)");
    assert!(matches!(err, LowerError::UnrecognisedPattern { .. }), "{}", err);
}

#[test]
fn top_level_anonymous_class_needs_var() {
    let err = lower_err("class W:\n    a: int");
    assert!(matches!(err, LowerError::AnnotationMismatch { .. }), "{}", err);
}

#[test]
fn anonymous_class_cannot_be_typedefd() {
    let err = lower_err("@Typedef(T)\n@Var(v)\nclass W:\n    a: int");
    assert!(matches!(err, LowerError::AnnotationMismatch { .. }), "{}", err);
}

#[test]
fn struct_field_with_initialiser_is_rejected() {
    let err = lower_err("class S:\n    a: int = 5");
    assert!(matches!(err, LowerError::AnnotationMismatch { .. }), "{}", err);
}

#[test]
fn unknown_class_base_is_rejected() {
    let err = lower_err("class S(Exception):\n    a: int");
    assert!(matches!(err, LowerError::UnrecognisedPattern { .. }), "{}", err);
}

#[test]
fn errors_carry_source_locations() {
    let err = lower_err("x: int = 1\ny = W");
    let text = err.to_string();
    assert!(text.starts_with("2:"), "diagnostic should point at line 2: {}", text);
}
