//! Values that may be supplied from outside the unit.

mod common;

use common::*;
use prov_resolver::SourceKind::*;

#[test]
fn test_public_constructor_without_callers_is_injected() {
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
    let injected = provenance.last().expect("entries");
    assert_eq!(tree.text(injected.node), "Repo repo");
}

#[test]
fn test_in_unit_caller_supplies_the_argument() {
    let source = r#"public class Service
{
    private readonly Repo repo;
    public Service(Repo repo) { this.repo = repo; }
    public Repo Get() => repo;
}
public class Repo { }
class Factory
{
    Service Make() => new Service(new Repo());
}"#;
    assert_eq!(
        steps(source, "repo", 1),
        vec![
            step(Member, "repo"),
            step(Argument, "repo"),
            step(Created, "new Repo()"),
        ]
    );
}

#[test]
fn test_private_constructor_without_callers_is_injected() {
    let source = r#"class Holder
{
    int value;
    Holder(int value) { this.value = value; }
    int Get() => value;
}"#;
    assert_eq!(kinds(source, "value", 1), vec![Member, Argument, Injected]);

    let source = r#"class C { int f; C(int x) { f = x; } int Read() { return f; } }"#;
    assert_eq!(
        steps(source, "f", 1),
        vec![step(Member, "f"), step(Argument, "x"), step(Injected, "int x")]
    );
}

#[test]
fn test_default_value_stands_in_when_no_caller_exists() {
    let source = r#"public class Pool
{
    private int size;
    public Pool(int size = 16) { this.size = size; }
    public int Size() => size;
}"#;
    assert_eq!(
        steps(source, "size", 1),
        vec![
            step(Member, "size"),
            step(Argument, "size"),
            step(Constant, "16"),
            step(Injected, "int size = 16"),
        ]
    );
}

#[test]
fn test_default_value_used_where_caller_omits_argument() {
    let source = r#"public class Pool
{
    private int size;
    public Pool(int size = 16) { this.size = size; }
    public int Size() => size;
    public static Pool Small() => new Pool(4);
    public static Pool Standard() => new Pool();
}"#;
    assert_eq!(
        steps(source, "size", 1),
        vec![
            step(Member, "size"),
            step(Argument, "size"),
            step(Constant, "4"),
            step(Constant, "16"),
        ]
    );
}

#[test]
fn test_chained_constructor_argument() {
    let source = r#"public class Widget
{
    private int width;
    public Widget() : this(10) { }
    public Widget(int width) { this.width = width; }
    public int Width() => width;
}"#;
    assert_eq!(
        steps(source, "width", 1),
        vec![
            step(Member, "width"),
            step(Argument, "width"),
            step(Constant, "10"),
        ]
    );
}

#[test]
fn test_settable_public_auto_property_is_potentially_injected() {
    let source = r#"public class Options
{
    public int Retries { get; set; } = 3;
    public int Read() => Retries;
}"#;
    assert_eq!(kinds(source, "Retries", 0), vec![Member, Constant, PotentiallyInjected]);
}

#[test]
fn test_private_setter_is_not_potentially_injected() {
    let source = r#"public class Options
{
    public int Retries { get; private set; } = 3;
    public int Read() => Retries;
}"#;
    assert_eq!(kinds(source, "Retries", 0), vec![Member, Constant]);
}

#[test]
fn test_readonly_public_field_is_not_potentially_injected() {
    let source = r#"public class Limits
{
    public readonly int Max = 9;
    public int Read() => Max;
}"#;
    assert_eq!(kinds(source, "Max", 0), vec![Member, Constant]);
}

#[test]
fn test_reads_during_construction_are_not_potentially_injected() {
    let source = r#"public class Options
{
    public int Retries = 3;
    public Options() { var copy = Retries; }
}"#;
    assert_eq!(kinds(source, "Retries", 0), vec![Member, Constant]);
}

#[test]
fn test_nested_private_type_members_are_not_potentially_injected() {
    let source = r#"public class Outer
{
    private class Inner
    {
        public int Level = 1;
        public Inner(int level) { Level = level; }
        public int Read() => Level;
    }
}"#;
    assert_eq!(kinds(source, "Level", 1), vec![Member, Argument, Injected]);
}
