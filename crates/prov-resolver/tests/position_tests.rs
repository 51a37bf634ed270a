//! What a field or property read can observe depends on where it happens.

mod common;

use common::*;
use prov_resolver::SourceKind::*;

const CONSTRUCTOR_READS: &str = r#"class C
{
    int f = 1;
    C(int x)
    {
        var before = f;
        f = x;
        var after = f;
    }
}"#;

#[test]
fn test_read_before_constructor_assignment_sees_initializer() {
    assert_eq!(
        steps(CONSTRUCTOR_READS, "f", 0),
        vec![step(Member, "f"), step(Constant, "1")]
    );
}

#[test]
fn test_read_after_constructor_assignment_sees_argument() {
    assert_eq!(
        steps(CONSTRUCTOR_READS, "f", 2),
        vec![step(Member, "f"), step(Argument, "x")]
    );
}

#[test]
fn test_assignment_reading_its_own_target_in_constructor() {
    let source = r#"class C
{
    int f = 1;
    C() { f = f + 1; }
}"#;
    // The right-hand read runs before the store it feeds.
    assert_eq!(
        steps(source, "f", 1),
        vec![step(Member, "f"), step(Constant, "1")]
    );
}

#[test]
fn test_conditional_constructor_write_keeps_initializer() {
    let source = r#"class C
{
    int f = 1;
    C(bool flag)
    {
        if (flag) f = 2;
    }
    int Read() => f;
}"#;
    assert_eq!(
        steps(source, "f", 1),
        vec![step(Member, "f"), step(Constant, "1"), step(Constant, "2")]
    );
}

#[test]
fn test_unconditional_constructor_write_hides_initializer() {
    let source = r#"class C
{
    int f = 1;
    C() { f = 2; }
    void Reset() { f = 3; }
    int Read() { return f; }
}"#;
    assert_eq!(
        steps(source, "f", 2),
        vec![step(Member, "f"), step(Constant, "2"), step(Constant, "3")]
    );
}

#[test]
fn test_last_unconditional_write_wins_within_a_constructor() {
    let source = r#"class C
{
    int f;
    C(bool flag)
    {
        f = 1;
        f = 2;
        if (flag) f = 3;
    }
    int Read() => f;
}"#;
    assert_eq!(
        steps(source, "f", 3),
        vec![step(Member, "f"), step(Constant, "2"), step(Constant, "3")]
    );
}

#[test]
fn test_each_constructor_contributes_its_final_state() {
    let source = r#"class C
{
    int f = 1;
    C() { }
    C(int x) { f = x; }
    int Read() => f;
}"#;
    assert_eq!(
        steps(source, "f", 1),
        vec![
            step(Member, "f"),
            step(Constant, "1"),
            step(Argument, "x"),
            step(Injected, "int x"),
        ]
    );
}

#[test]
fn test_chained_constructor_state_is_inherited() {
    let source = r#"class C
{
    int f;
    C() { f = 1; }
    C(int x) : this() { var seen = f; }
}"#;
    assert_eq!(
        steps(source, "f", 1),
        vec![step(Member, "f"), step(Constant, "1")]
    );
}

#[test]
fn test_without_constructors_initializer_and_member_writes() {
    let source = r#"class C
{
    int f = 1;
    void Set() { f = 2; }
    int Read() => f;
}"#;
    assert_eq!(
        steps(source, "f", 1),
        vec![step(Member, "f"), step(Constant, "1"), step(Constant, "2")]
    );
}

#[test]
fn test_property_with_backing_field_merges_writes() {
    let source = r#"class C
{
    private int _size;
    public int Size { get { return _size; } set { _size = value; } }
    C() { _size = 4; }
    void Grow() { Size = 8; }
    int Read() => Size;
}"#;
    assert_eq!(
        steps(source, "Size", 1),
        vec![
            step(Member, "Size"),
            step(Constant, "4"),
            step(Constant, "8"),
            step(PotentiallyInjected, "Size"),
        ]
    );
}

#[test]
fn test_auto_property_initializer_and_constructor() {
    let source = r#"class C
{
    int Width { get; set; } = 10;
    C(bool wide)
    {
        if (wide) Width = 20;
    }
    int Area() => Width * 2;
}"#;
    assert_eq!(
        steps(source, "Width", 1),
        vec![step(Member, "Width"), step(Constant, "10"), step(Constant, "20")]
    );
}

#[test]
fn test_resolving_a_field_declaration_uses_the_post_construction_view() {
    let tree = parse(
        r#"class C
{
    int f = 1;
    C() { f = 2; }
}"#,
    );
    let field = tree
        .find(|_, node| matches!(node, prov_syntax::Node::Field(_)))
        .expect("field");
    let provenance = resolve_node(&tree, field);
    assert_eq!(provenance.kinds(), vec![Member, Constant]);
    assert_eq!(tree.text(provenance.entries()[1].node), "2");
}
