//! End-to-end behaviour on small, complete classes.

mod common;

use common::*;
use prov_resolver::SourceKind::*;
use prov_syntax::Node;

#[test]
fn test_expression_bodied_getter_is_calculated_from_its_literal() {
    let source = r#"class C
{
    int A => 1;
    int Read() => A;
}"#;
    assert_eq!(kinds(source, "A", 0), vec![Calculated, Constant]);

    let tree = parse(source);
    let property = tree
        .find(|_, node| matches!(node, Node::Property(_)))
        .expect("property");
    assert_eq!(resolve_node(&tree, property).kinds(), vec![Calculated, Constant]);
}

#[test]
fn test_field_assigned_in_uncalled_constructor_is_injected() {
    let source = r#"class C
{
    int f = 1;
    C(int x) { f = x; }
    int Read() { return f; }
}"#;
    assert_eq!(
        steps(source, "f", 1),
        vec![
            step(Member, "f"),
            step(Argument, "x"),
            step(Injected, "int x"),
        ]
    );
}

#[test]
fn test_public_field_is_potentially_injected() {
    let source = r#"class C
{
    public int f = 1;
    C(int x) { f = x; }
    int Read() { return f; }
}"#;
    assert_eq!(
        kinds(source, "f", 1),
        vec![Member, Argument, Injected, PotentiallyInjected]
    );
}

#[test]
fn test_self_recursive_method_terminates() {
    let source = r#"class C
{
    int M(int v) { return M(v); }
    int Use() { return M(1); }
}"#;
    assert_eq!(
        steps(source, "M(1)", 0),
        vec![step(Calculated, "M(1)"), step(Recursion, "M(v)")]
    );
}

#[test]
fn test_out_argument_resolves_through_the_callee() {
    let source = r#"class C
{
    void Assign(out int v) { v = 1; }
    int Use()
    {
        int x;
        Assign(out x);
        return x;
    }
}"#;
    assert_eq!(
        steps(source, "x", 1),
        vec![step(Out, "out x"), step(Constant, "1")]
    );
}

#[test]
fn test_locally_created_disposable() {
    let source = r#"class C
{
    void Run()
    {
        var stream = new MemoryStream();
        var alias = stream;
        Use(alias);
    }
    void Use(MemoryStream s) { }
}"#;
    let tree = parse(source);
    let provenance = resolve_node(&tree, expr(&tree, "alias", 0));
    assert_eq!(provenance.kinds(), vec![Created]);
    assert!(provenance.is_locally_created());
    assert!(!provenance.any_injected());
}

#[test]
fn test_injected_dependency_is_not_locally_created() {
    let source = r#"public class Service
{
    private readonly Repo repo;
    public Service(Repo repo) { this.repo = repo; }
    public Repo Get() => repo;
}
public class Repo { }"#;
    let tree = parse(source);
    let provenance = resolve_node(&tree, expr(&tree, "repo", 1));
    assert_eq!(provenance.kinds(), vec![Member, Argument, Injected]);
    assert!(provenance.any_injected());
    assert!(!provenance.is_locally_created());
    assert_eq!(provenance.last().map(|e| e.kind), Some(Injected));
}
