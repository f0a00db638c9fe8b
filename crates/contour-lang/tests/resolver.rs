//! Front-end tests through the public `compile()` API.
//!
//! Each test covers one lexer, parser or scope rule.
//! Error codes: L001–L003, P001–P002, S001–S004.

use contour_lang::{compile, Error, ErrorCode};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn ok(src: &str) {
    compile(src).unwrap_or_else(|errs| {
        panic!("expected compile to succeed, got errors: {errs:#?}");
    });
}

fn err(src: &str) -> Vec<Error> {
    match compile(src) {
        Ok(_)  => panic!("expected compile to fail but it succeeded"),
        Err(e) => e,
    }
}

fn has(errs: &[Error], code: ErrorCode) -> bool {
    errs.iter().any(|e| e.code == code)
}

fn has_msg(errs: &[Error], s: &str) -> bool {
    errs.iter().any(|e| e.message.contains(s))
}

// ─── Success paths ───────────────────────────────────────────────────────────

#[test]
fn circle_shape() {
    ok("{dist: p -> length(p) - 1}");
}

#[test]
fn shape_with_helpers_and_comments() {
    ok(r#"
        // a box with rounded corners
        let r = 0.25;
            size = [1, 0.5];
            box = p -> let q = abs(p) - size in
                length(max(q, 0)) + min(max(q.x, q.y), 0)
        in
        /* the shape */
        {name: "rounded box", dist: p -> box(p) - r}
    "#);
}

#[test]
fn nullary_and_multi_parameter_lambdas() {
    ok("let f = () -> 1; g = (a, b, c) -> a + b + c in g(f(), 2, 3)");
}

#[test]
fn nested_conditionals() {
    ok("x -> if (x < 0) -1 else if (x > 0) 1 else 0");
    ok("x -> x < 0 ? -1 : x > 0 ? 1 : 0");
}

#[test]
fn constants_are_names() {
    ok("p -> atan2(p.y, p.x) / tau + pi");
}

// ─── Lexer ───────────────────────────────────────────────────────────────────

#[test]
fn l001_unexpected_character() {
    let errs = err("p -> p # 2");
    assert!(has(&errs, ErrorCode::L001));
}

#[test]
fn l001_bang_is_not_negation() {
    let errs = err("!true");
    assert!(has(&errs, ErrorCode::L001));
    assert!(has_msg(&errs, "not"));
}

#[test]
fn l002_unterminated_string() {
    let errs = err("\"abc");
    assert!(has(&errs, ErrorCode::L002));
}

#[test]
fn l002_backslash_at_end_of_input() {
    let errs = err("\"a\\");
    assert_eq!(errs.len(), 1);
    assert!(has(&errs, ErrorCode::L002));
}

#[test]
fn l003_invalid_escape() {
    let errs = err(r#""a\qb""#);
    assert!(has(&errs, ErrorCode::L003));
}

// ─── Parser ──────────────────────────────────────────────────────────────────

#[test]
fn p001_trailing_tokens() {
    let errs = err("1 2");
    assert!(has(&errs, ErrorCode::P001));
}

#[test]
fn p002_missing_in() {
    let errs = err("let a = 1 a");
    assert!(has(&errs, ErrorCode::P002));
    assert!(has_msg(&errs, "In"));
}

#[test]
fn p002_unclosed_record() {
    let errs = err("{dist: p -> p");
    assert!(has(&errs, ErrorCode::P002));
}

// ─── Scope ───────────────────────────────────────────────────────────────────

#[test]
fn s001_undefined() {
    let errs = err("{dist: p -> length(q)}");
    assert!(has(&errs, ErrorCode::S001));
    assert!(has_msg(&errs, "`q`"));
}

#[test]
fn s001_parameter_not_visible_outside_lambda() {
    let errs = err("let f = p -> p in p");
    assert!(has(&errs, ErrorCode::S001));
}

#[test]
fn s002_duplicate_parameter() {
    let errs = err("{dist: (p, p) -> p}");
    assert!(has(&errs, ErrorCode::S002));
}

#[test]
fn s003_duplicate_field() {
    let errs = err("{dist: p -> 0, dist: p -> 1}");
    assert!(has(&errs, ErrorCode::S003));
}

#[test]
fn s004_builtin_without_call() {
    let errs = err("let f = sqrt in f(4)");
    assert!(has(&errs, ErrorCode::S004));
}

#[test]
fn error_display_has_code_and_position() {
    let errs = err("\n  zz");
    assert_eq!(errs[0].to_string(), "[S001] 2:3: undefined: `zz`");
}
