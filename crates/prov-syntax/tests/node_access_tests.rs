//! Navigation helpers: enclosing declarations and position lookup.

use prov_common::Position;
use prov_syntax::*;

const SOURCE: &str = r#"class Account
{
    private int _balance;
    public int Balance
    {
        get { return _balance; }
        set { _balance = value; }
    }
    public int Next(int step)
    {
        return ((_balance)) + step;
    }
}
"#;

fn tree() -> SyntaxTree {
    let tree = SyntaxTree::parse(SOURCE).expect("parse");
    assert!(tree.diagnostics().is_empty(), "{:?}", tree.diagnostics());
    tree
}

#[test]
fn test_enclosing_member_of_setter_write() {
    let tree = tree();
    let write = tree
        .find(|_, node| matches!(node, Node::Assignment(_)))
        .expect("assignment in setter");
    let arena = tree.arena();

    let member = arena.enclosing_member(write);
    assert!(matches!(
        arena.get(member),
        Some(Node::Accessor(a)) if a.kind == AccessorKind::Set
    ));

    let declaration = arena.enclosing_declaration(write);
    assert!(matches!(arena.get(declaration), Some(Node::Property(p)) if p.name == "Balance"));

    let ty = arena.enclosing_type(write);
    assert!(matches!(arena.get(ty), Some(Node::TypeDeclaration(t)) if t.name == "Account"));
}

#[test]
fn test_expression_at_position_finds_innermost_identifier() {
    let tree = tree();
    // Line 10: `        return ((_balance)) + step;`
    let at_step = tree
        .expression_at(Position::new(10, 30))
        .expect("expression at step");
    assert_eq!(tree.text(at_step), "step");

    let at_balance = tree
        .expression_at(Position::new(10, 18))
        .expect("expression at _balance");
    assert_eq!(tree.text(at_balance), "_balance");
}

#[test]
fn test_position_outside_any_expression() {
    let tree = tree();
    // Line 0 is the class header.
    assert_eq!(tree.expression_at(Position::new(0, 2)), None);
    assert_eq!(tree.expression_at(Position::new(99, 0)), None);
}

#[test]
fn test_skip_parentheses_and_ancestors() {
    let tree = tree();
    let outer = tree
        .find(|_, node| matches!(node, Node::Parenthesized(_)))
        .expect("parenthesized");
    let arena = tree.arena();
    let inner = arena.skip_parentheses(outer);
    assert!(matches!(arena.get(inner), Some(Node::Identifier(id)) if id.name == "_balance"));

    let ancestor_kinds: Vec<&str> = arena
        .ancestors(inner)
        .map(|a| arena.kind_name(a))
        .collect();
    assert_eq!(
        ancestor_kinds,
        vec![
            "Parenthesized",
            "Parenthesized",
            "Binary",
            "Return",
            "Block",
            "Method",
            "TypeDeclaration",
            "SourceFile"
        ]
    );
    assert!(arena.is_ancestor_or_self(arena.enclosing_member(inner), inner));
}

#[test]
fn test_descendants_are_in_source_order() {
    let tree = tree();
    let arena = tree.arena();
    let all = arena.descendants(tree.root());
    assert_eq!(all[0], tree.root());

    let starts: Vec<u32> = all
        .iter()
        .filter(|&&n| arena.get(n).is_some_and(Node::is_expression))
        .map(|&n| arena.span(n).start)
        .collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);
}
