use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_diagnostic_builder() {
    let diag = Diagnostic::error(ErrorCode::E4001)
        .with_message("test error")
        .with_label(Span::new(0, 5), "here")
        .with_note("some context");

    assert_eq!(diag.code, ErrorCode::E4001);
    assert_eq!(diag.message, "test error");
    assert!(diag.is_error());
    assert_eq!(diag.labels.len(), 1);
    assert!(diag.labels[0].is_primary);
    assert_eq!(diag.notes.len(), 1);
}

#[test]
fn test_diagnostic_display_format() {
    let diag = Diagnostic::error(ErrorCode::E4002)
        .with_message("test error")
        .with_label(Span::new(0, 5), "primary")
        .with_secondary_label(Span::new(10, 15), "secondary")
        .with_note("a note");

    assert_eq!(
        diag.to_string(),
        "error [E4002]: test error\n  --> 0..5: primary\n      10..15: secondary\n  = note: a note"
    );
}

#[test]
fn test_consumed_more_than_once_labels_both_sites() {
    let diag = consumed_more_than_once(Some("x"), Span::new(20, 21), Span::new(10, 11));

    assert_eq!(diag.code, ErrorCode::E4001);
    assert!(diag.message.contains("`x`"));
    assert_eq!(diag.primary_span(), Some(Span::new(20, 21)));
    assert_eq!(diag.labels.len(), 2);
    assert!(!diag.labels[1].is_primary);
}

#[test]
fn test_unnamed_values_get_generic_noun() {
    let diag = used_before_init(None, Span::new(3, 4));
    assert_eq!(diag.message, "value used before being initialized");
}

#[test]
fn test_internal_errors_ask_for_report() {
    let marker = unanalyzable_marker(Span::DUMMY, "operand is defined more than once");
    let missed = missed_copy(Some("y"), Span::new(1, 2));

    assert!(marker.code.is_internal_error());
    assert!(missed.code.is_internal_error());
    assert!(marker.notes[0].contains("compiler bug"));
    assert!(missed.message.contains("`y`"));
}

#[test]
fn test_every_move_error_is_an_error() {
    let span = Span::new(0, 1);
    let diags = [
        consumed_more_than_once(None, span, span),
        used_after_consume(None, span, span),
        consumed_while_borrowed(None, span),
        assigned_while_borrowed(None, span),
        missing_reinit(None, span, span),
        used_before_init(None, span),
        consumed_in_loop(None, span),
    ];
    let codes: Vec<ErrorCode> = diags.iter().map(|d| d.code).collect();
    assert_eq!(codes, ErrorCode::ALL[..7].to_vec());
    assert!(diags.iter().all(Diagnostic::is_error));
}
