use exprfold::*;
use pretty_assertions::assert_eq;

fn substitute(tree: &ExprTree, root: ExprId, refs: bool) -> Option<String> {
    substitute_parameter(tree, root, refs, false, &NoTranslations)
}

// ═══════════════════════════════════════════════════════════════════════
// Placeholders
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_unresolved_reference_placeholder() {
    let mut tree = ExprTree::new();
    let r = tree.reference(None, "player.name");
    assert_eq!(substitute(&tree, r, true).as_deref(), Some("${player.name}"));
    assert_eq!(substitute(&tree, r, false), None);
}

#[test]
fn test_variable_reference_inlines_initializer() {
    let mut tree = ExprTree::new();
    let x = tree.literal("x", "\"x\"");
    let v = tree.declare_variable("v", Some(x));
    let r = tree.reference(Some(v), "v");
    assert_eq!(substitute(&tree, r, true).as_deref(), Some("x"));
    assert_eq!(
        evaluate_constant(&tree, r, None, None).as_deref(),
        Some("x")
    );
}

#[test]
fn test_unresolvable_initializer_shows_reference() {
    let mut tree = ExprTree::new();
    let unresolved = tree.reference(None, "other");
    let v = tree.declare_variable("NAME", Some(unresolved));
    let r = tree.reference(Some(v), "NAME");
    assert_eq!(substitute(&tree, r, false).as_deref(), Some("${NAME}"));
    // with references allowed the innermost unresolved node is shown
    assert_eq!(substitute(&tree, r, true).as_deref(), Some("${other}"));
}

#[test]
fn test_cycle_renders_repeated_node() {
    let mut tree = ExprTree::new();
    let a = tree.declare_variable("A", None);
    let b = tree.declare_variable("B", None);
    let ra = tree.reference(Some(a), "A");
    let rb = tree.reference(Some(b), "B");
    tree.set_initializer(a, rb);
    tree.set_initializer(b, ra);
    assert_eq!(substitute(&tree, ra, false).as_deref(), Some("${A}"));
}

#[test]
fn test_opaque_node() {
    let mut tree = ExprTree::new();
    let opaque = tree.opaque("if x { 1 } else { 2 }");
    assert_eq!(
        substitute(&tree, opaque, true).as_deref(),
        Some("${if x { 1 } else { 2 }}")
    );
    assert_eq!(substitute(&tree, opaque, false), None);
}

// ═══════════════════════════════════════════════════════════════════════
// Concatenation
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_concatenation_of_literals() {
    let mut tree = ExprTree::new();
    let a = tree.literal("a", "\"a\"");
    let n = tree.literal(1i64, "1");
    let root = tree.concatenation(vec![a, n], "\"a\" + 1");
    assert_eq!(substitute(&tree, root, true).as_deref(), Some("a1"));
}

#[test]
fn test_concatenation_never_produces_placeholders() {
    let mut tree = ExprTree::new();
    let lead = tree.literal("Hi ", "\"Hi \"");
    let unresolved = tree.reference(None, "name");
    let root = tree.concatenation(vec![lead, unresolved], "\"Hi \" + name");
    assert_eq!(substitute(&tree, root, true), None);
}

#[test]
fn test_concatenation_failure_returns_inherited_default() {
    let mut tree = ExprTree::new();
    let lead = tree.literal("Hi ", "\"Hi \"");
    let unresolved = tree.reference(None, "name");
    let concat = tree.concatenation(vec![lead, unresolved], "\"Hi \" + name");
    let v = tree.declare_variable("GREETING", Some(concat));
    let r = tree.reference(Some(v), "GREETING");
    assert_eq!(substitute(&tree, r, true).as_deref(), Some("${GREETING}"));
    assert_eq!(substitute(&tree, r, false).as_deref(), Some("${GREETING}"));
}

// ═══════════════════════════════════════════════════════════════════════
// Translations
// ═══════════════════════════════════════════════════════════════════════

fn table() -> TranslationTable {
    [
        ("chat.join", "%s joined the game"),
        ("chat.leave", "Someone left"),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_translation_text() {
    let table = table();
    let mut tree = ExprTree::new();
    let key = tree.literal("chat.leave", "\"chat.leave\"");
    let call = tree.call(vec![key], "tr(\"chat.leave\")");
    assert_eq!(
        substitute_parameter(&tree, call, false, true, &table).as_deref(),
        Some("Someone left")
    );
}

#[test]
fn test_translation_missing_arguments() {
    let table = table();
    let mut tree = ExprTree::new();
    let key = tree.literal("chat.join", "\"chat.join\"");
    let call = tree.call(vec![key], "tr(\"chat.join\")");
    assert_eq!(
        substitute_parameter(&tree, call, true, true, &table).as_deref(),
        Some("{ERROR: Missing formatting arguments for '%s joined the game'}")
    );
}

#[test]
fn test_translation_key_through_constant() {
    let table = table();
    let mut tree = ExprTree::new();
    let prefix = tree.literal("chat.", "\"chat.\"");
    let v = tree.declare_variable("PREFIX", Some(prefix));
    let r = tree.reference(Some(v), "PREFIX");
    let suffix = tree.literal("join", "\"join\"");
    let key = tree.concatenation(vec![r, suffix], "PREFIX + \"join\"");
    let who = tree.reference(None, "who");
    let call = tree.call(vec![key, who], "tr(PREFIX + \"join\", who)");
    assert_eq!(
        substitute_parameter(&tree, call, true, true, &table).as_deref(),
        Some("%s joined the game")
    );
}

#[test]
fn test_translations_disabled() {
    let table = table();
    let mut tree = ExprTree::new();
    let key = tree.literal("chat.leave", "\"chat.leave\"");
    let call = tree.call(vec![key], "tr(\"chat.leave\")");
    assert_eq!(
        substitute_parameter(&tree, call, true, false, &table).as_deref(),
        Some("${tr(\"chat.leave\")}")
    );
}
