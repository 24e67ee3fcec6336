use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_builder_and_primary_span() {
    let diag = Diagnostic::error(ErrorCode::E2003)
        .with_message("unknown identifier `x`")
        .with_secondary_label(Span::new(0, 1), "context")
        .with_label(Span::new(10, 11), "not found")
        .with_note("marks: '1");

    assert!(diag.is_error());
    assert_eq!(diag.primary_span(), Some(Span::new(10, 11)));
    assert_eq!(diag.notes, vec!["marks: '1".to_string()]);
}

#[test]
fn test_display() {
    let diag = unknown_identifier(Span::new(4, 7), "foo");
    assert_eq!(
        diag.to_string(),
        "error [E2003]: unknown identifier `foo`\n  --> 4..7: not found in this scope"
    );
}

#[test]
fn test_duplicate_definition_labels() {
    let diag = duplicate_definition(Span::new(20, 23), Span::new(2, 5), "foo");
    assert_eq!(diag.code, ErrorCode::E2006);
    assert_eq!(diag.labels.len(), 2);
    assert!(diag.labels[0].is_primary);
    assert!(!diag.labels[1].is_primary);
}

#[test]
fn test_render_resolves_line_and_column() {
    let source = "int x;\nint y = z;\n";
    let diag = unknown_identifier(Span::new(15, 16), "z");
    assert_eq!(
        diag.render("main.w", source),
        "error [E2003]: unknown identifier `z`\n  --> main.w:2:9: not found in this scope"
    );
}

#[test]
fn test_warning_is_not_error() {
    let diag = Diagnostic::warning(ErrorCode::E2006).with_message("shadowed");
    assert!(!diag.is_error());
    assert_eq!(diag.severity.to_string(), "warning");
}
