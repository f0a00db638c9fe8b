//! Resolver tests: slot allocation, closure captures and every S-code.

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::analysis::{Analyser, Capture, Lambda, Operation};
    use crate::builtins::Builtin;
    use crate::error::{Error, ErrorCode};
    use crate::syntax::lexer::Lexer;
    use crate::syntax::parser::Parser;

    // ─── Helpers ─────────────────────────────────────────────────────────────

    fn analyse(src: &str) -> Result<Rc<Lambda>, Vec<Error>> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        let ast = Parser::new(tokens).parse().expect("parse failed");
        Analyser::new().analyse(&ast)
    }

    fn analyse_ok(src: &str) -> Rc<Lambda> {
        analyse(src).expect("expected analysis to succeed")
    }

    fn analyse_err(src: &str) -> Vec<Error> {
        match analyse(src) {
            Ok(_) => panic!("expected analysis to fail"),
            Err(e) => e,
        }
    }

    fn has_code(errors: &[Error], code: ErrorCode) -> bool {
        errors.iter().any(|e| e.code == code)
    }

    fn lambda_of(op: &Operation) -> &Rc<Lambda> {
        match op {
            Operation::Lambda(l) => l,
            other => panic!("expected lambda, got {other:?}"),
        }
    }

    // ─── Slots ───────────────────────────────────────────────────────────────

    #[test]
    fn program_is_a_nullary_function() {
        let top = analyse_ok("1 + 2");
        assert_eq!(top.nargs, 0);
        assert_eq!(top.nslots, 0);
        assert!(top.name.is_none());
    }

    #[test]
    fn params_take_the_first_slots() {
        let top = analyse_ok("(a, b) -> let c = a + b in c * a");
        let f = lambda_of(&top.body);
        assert_eq!(f.nargs, 2);
        assert_eq!(f.nslots, 3);
        let Operation::Let { bindings, body, .. } = &*f.body else { panic!("expected let") };
        assert_eq!(bindings[0].0, 2);
        let Operation::Binary { left, right, .. } = &**body else { panic!("expected binary") };
        assert!(matches!(**left, Operation::Local(2, _)));
        assert!(matches!(**right, Operation::Local(0, _)));
    }

    #[test]
    fn let_bindings_see_earlier_ones() {
        let top = analyse_ok("let a = 1; b = a + 1 in b");
        let Operation::Let { bindings, .. } = &*top.body else { panic!("expected let") };
        let Operation::Binary { left, .. } = &bindings[1].1 else { panic!("expected binary") };
        assert!(matches!(**left, Operation::Local(0, _)));
    }

    #[test]
    fn shadowing_uses_the_innermost_binding() {
        let top = analyse_ok("let a = 1 in let a = 2 in a");
        let Operation::Let { body, .. } = &*top.body else { panic!() };
        let Operation::Let { body, .. } = &**body else { panic!() };
        assert!(matches!(**body, Operation::Local(1, _)));
    }

    // ─── Captures ────────────────────────────────────────────────────────────

    #[test]
    fn lambda_captures_enclosing_local() {
        let top = analyse_ok("let r = 2 in p -> length(p) - r");
        let Operation::Let { body, .. } = &*top.body else { panic!() };
        let f = lambda_of(body);
        assert_eq!(f.captures, vec![Capture::Local(0)]);
        let Operation::Binary { right, .. } = &*f.body else { panic!() };
        assert!(matches!(**right, Operation::NonLocal(0, _)));
    }

    #[test]
    fn nested_lambda_captures_through_its_parent() {
        let top = analyse_ok("let k = 3 in x -> y -> x + y + k");
        let Operation::Let { body, .. } = &*top.body else { panic!() };
        let outer = lambda_of(body);
        let inner = lambda_of(&outer.body);
        assert_eq!(outer.captures, vec![Capture::Local(0)]);
        assert_eq!(inner.captures, vec![Capture::Local(0), Capture::NonLocal(0)]);
    }

    #[test]
    fn repeated_use_captures_once() {
        let top = analyse_ok("let r = 2 in p -> r * r");
        let Operation::Let { body, .. } = &*top.body else { panic!() };
        assert_eq!(lambda_of(body).captures.len(), 1);
    }

    // ─── Names ───────────────────────────────────────────────────────────────

    #[test]
    fn let_and_field_names_label_lambdas() {
        let top = analyse_ok("let f = p -> p in {dist: p -> f(p)}");
        let Operation::Let { bindings, body, .. } = &*top.body else { panic!() };
        assert_eq!(lambda_of(&bindings[0].1).name.as_ref().map(|a| a.as_str()), Some("f"));
        let Operation::Record(fields, _) = &**body else { panic!() };
        assert_eq!(lambda_of(&fields[0].1).name.as_ref().map(|a| a.as_str()), Some("dist"));
    }

    #[test]
    fn builtin_call_resolves_to_builtin() {
        let top = analyse_ok("sqrt(4)");
        assert!(matches!(&*top.body, Operation::Builtin { builtin: Builtin::Sqrt, .. }));
    }

    #[test]
    fn local_shadows_builtin() {
        let top = analyse_ok("let sqrt = x -> x in sqrt(4)");
        let Operation::Let { body, .. } = &*top.body else { panic!() };
        assert!(matches!(&**body, Operation::Call { .. }));
    }

    #[test]
    fn constants_fold_to_numbers() {
        let top = analyse_ok("tau");
        assert!(matches!(&*top.body, Operation::Constant(crate::Value::Num(x), _) if *x == std::f64::consts::TAU));
    }

    // ─── S001–S004 ───────────────────────────────────────────────────────────

    #[test]
    fn s001_undefined_name() {
        let errs = analyse_err("p -> q + 1");
        assert!(has_code(&errs, ErrorCode::S001));
        assert!(errs[0].message.contains("q"));
        assert_eq!((errs[0].line, errs[0].column), (1, 6));
    }

    #[test]
    fn s001_reports_every_undefined_name() {
        let errs = analyse_err("a + b");
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn s001_let_binding_is_not_recursive() {
        let errs = analyse_err("let f = x -> f(x) in f(1)");
        assert!(has_code(&errs, ErrorCode::S001));
    }

    #[test]
    fn s001_binding_out_of_scope_after_let() {
        let errs = analyse_err("[let a = 1 in a, a]");
        assert!(has_code(&errs, ErrorCode::S001));
    }

    #[test]
    fn s002_duplicate_parameter() {
        let errs = analyse_err("(a, a) -> a");
        assert!(has_code(&errs, ErrorCode::S002));
    }

    #[test]
    fn s003_duplicate_record_field() {
        let errs = analyse_err("{r: 1, r: 2}");
        assert!(has_code(&errs, ErrorCode::S003));
    }

    #[test]
    fn s004_builtin_as_value() {
        let errs = analyse_err("{dist: length}");
        assert!(has_code(&errs, ErrorCode::S004));
        assert!(errs[0].message.contains("length"));
    }
}
