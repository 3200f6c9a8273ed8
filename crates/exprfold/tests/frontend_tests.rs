use exprfold::frontends::RustFrontend;
use exprfold::*;
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn lower(source: &str) -> Program {
    init_tracing();
    RustFrontend::new().lower(source).expect("lowering failed")
}

// First argument of the n-th root call of a function
fn call_arg(program: &Program, function: &str, root: usize) -> ExprId {
    let body = program.function(function).expect("function not found");
    program.tree().call_arguments(body.roots[root])[0]
}

// ═══════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_constant_chain() {
    let program = lower(
        r#"
        const MOD_ID: &str = "examplemod";
        const SEP: char = ':';
        const BLOCK: &str = MOD_ID + SEP + "ore_" + 3 as u8;
        "#,
    );
    let root = program.constant("BLOCK").unwrap();
    assert_eq!(
        evaluate_constant(program.tree(), root, None, None).as_deref(),
        Some("examplemod:ore_3")
    );
}

#[test]
fn test_cyclic_constants_terminate() {
    let program = lower(
        r#"
        const A: &str = B + "a";
        const B: &str = A + "b";
        "#,
    );
    let root = program.constant("A").unwrap();
    // the cycle is detected inside B's initializer, which has no default;
    // the failed operand then makes A's concatenation fall back to "D"
    assert_eq!(
        evaluate_constant(program.tree(), root, Some("D"), None).as_deref(),
        Some("D")
    );
    assert_eq!(
        substitute_parameter(program.tree(), root, false, false, &NoTranslations),
        None
    );
}

#[test]
fn test_statics_and_modules() {
    let program = lower(
        r#"
        mod ids {
            pub static ROOT: &str = "root";
            pub mod nested {
                pub const LEAF: &str = super::ROOT + "/leaf";
            }
        }
        const PATH: &str = ids::nested::LEAF;
        "#,
    );
    let root = program.constant("PATH").unwrap();
    assert_eq!(
        evaluate_constant(program.tree(), root, None, None).as_deref(),
        Some("root/leaf")
    );
    let names: Vec<_> = program.global_names().collect();
    assert_eq!(names, vec!["ids::ROOT", "ids::nested::LEAF", "PATH"]);
}

#[test]
fn test_lower_expr_against_globals() {
    let mut program = lower(r#"const NAME: &str = "world";"#);
    let expr = RustFrontend::new()
        .lower_expr(&mut program, r#""hello " + NAME"#)
        .unwrap();
    assert_eq!(
        evaluate_constant(program.tree(), expr, None, None).as_deref(),
        Some("hello world")
    );

    let unknown = RustFrontend::new()
        .lower_expr(&mut program, "UNKNOWN")
        .unwrap();
    assert_eq!(
        substitute_parameter(program.tree(), unknown, true, false, &NoTranslations).as_deref(),
        Some("${UNKNOWN}")
    );
}

#[test]
fn test_lower_expr_parse_error() {
    let mut program = Program::default();
    let result = RustFrontend::new().lower_expr(&mut program, "1 +");
    assert!(matches!(result, Err(FrontendError::Parse(_))));
}

// ═══════════════════════════════════════════════════════════════════════
// Functions
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_parameters_and_locals() {
    let program = lower(
        r#"
        const PREFIX: &str = "[mod] ";
        fn log(level: u8, message: &str) {
            let tag = PREFIX + "info: ";
            emit(tag + message);
            emit(tag);
            emit(message);
        }
        "#,
    );
    let ctx = EvalContext::default();
    let evaluator = program.evaluator(&ctx);

    let first = call_arg(&program, "log", 0);
    assert_eq!(
        evaluator.evaluate_constant(first, None, Some("<msg>")).as_deref(),
        Some("[mod] info: <msg>")
    );
    assert_eq!(evaluator.substitute_parameter(first, true, false), None);

    let second = call_arg(&program, "log", 1);
    assert_eq!(
        evaluator.substitute_parameter(second, true, false).as_deref(),
        Some("[mod] info: ")
    );

    let third = call_arg(&program, "log", 2);
    assert_eq!(
        evaluator.substitute_parameter(third, true, false).as_deref(),
        Some("${message}")
    );
    assert_eq!(evaluator.evaluate_constant(third, Some("D"), None), None);
}

#[test]
fn test_methods_see_associated_constants() {
    let program = lower(
        r#"
        struct Registry;
        impl Registry {
            const NAMESPACE: &str = "registry";
            fn key(&self, id: &str) -> String {
                join(Self::NAMESPACE + "." + id)
            }
        }
        "#,
    );
    let arg = call_arg(&program, "Registry::key", 0);
    assert_eq!(
        evaluate_constant(program.tree(), arg, None, Some("*")).as_deref(),
        Some("registry.*")
    );
}

#[test]
fn test_trait_default_constant() {
    let program = lower(
        r#"
        trait Named {
            const NAME: &str = "named";
            const LABEL: &str;
            fn label(&self) -> String { show(Self::NAME + "!") }
        }
        "#,
    );
    let arg = call_arg(&program, "Named::label", 0);
    assert_eq!(
        evaluate_constant(program.tree(), arg, None, None).as_deref(),
        Some("named!")
    );
    let label = program.global("Named::LABEL").unwrap();
    assert_eq!(program.tree().decl(label).initializer(), None);
}

// ═══════════════════════════════════════════════════════════════════════
// Attributes and translations
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_attribute_values() {
    let program = lower(
        r#"
        const TARGET: &str = "net/minecraft/Entity";
        #[mixin(target = TARGET, priority = 1000)]
        struct EntityMixin;
        impl EntityMixin {
            #[inject(method = "tick" + "()V")]
            fn on_tick(&self) {}
        }
        "#,
    );
    let tree = program.tree();
    let target = program.attribute("EntityMixin", "mixin", "target").unwrap();
    let priority = program.attribute("EntityMixin", "mixin", "priority").unwrap();
    let method = program
        .attribute("EntityMixin::on_tick", "inject", "method")
        .unwrap();

    assert_eq!(
        evaluate_constant(tree, target, None, None).as_deref(),
        Some("net/minecraft/Entity")
    );
    assert_eq!(
        evaluate_constant(tree, priority, None, None).as_deref(),
        Some("1000")
    );
    assert_eq!(
        evaluate_constant(tree, method, None, None).as_deref(),
        Some("tick()V")
    );
}

#[test]
fn test_translated_call() {
    let program = lower(
        r#"
        const KEY: &str = "msg.welcome";
        fn welcome(player: &str) {
            send(translate(KEY, player));
            send(translate(KEY));
            send(translate("msg.unknown"));
        }
        "#,
    );
    let table = TranslationTable::new();
    table.insert("msg.welcome", "Welcome, %s!");

    let ctx = EvalContext::default();
    let evaluator = program.evaluator(&ctx).with_translations(&table);

    let ok = call_arg(&program, "welcome", 0);
    assert_eq!(
        evaluator.substitute_parameter(ok, true, true).as_deref(),
        Some("Welcome, %s!")
    );

    let missing = call_arg(&program, "welcome", 1);
    assert_eq!(
        evaluator.substitute_parameter(missing, true, true).as_deref(),
        Some("{ERROR: Missing formatting arguments for 'Welcome, %s!'}")
    );

    let unknown = call_arg(&program, "welcome", 2);
    assert_eq!(
        evaluator.substitute_parameter(unknown, true, true).as_deref(),
        Some("${translate(\"msg.unknown\")}")
    );
}
