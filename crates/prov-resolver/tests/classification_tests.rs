//! One expression shape at a time.

mod common;

use common::*;
use prov_resolver::SourceKind::*;

#[test]
fn test_literals_and_foldable_expressions_are_single_constants() {
    let source = r#"class C
{
    object A() => 42;
    object B() => "text";
    object D() => 1 + 2 * 3;
    object E() => -1;
    object F() => (long)7;
    object G() => default;
    object H() => typeof(string);
    object I() => nameof(A);
    object J() => true ? 1 : 2;
    object K() => null;
}"#;
    for text in [
        "42",
        "\"text\"",
        "1 + 2 * 3",
        "-1",
        "(long)7",
        "default",
        "typeof(string)",
        "nameof(A)",
        "true ? 1 : 2",
        "null",
    ] {
        assert_eq!(kinds(source, text, 0), vec![Constant], "{text}");
    }
}

#[test]
fn test_interpolated_string_is_calculated() {
    let source = r#"class C
{
    string Greet(string name) => $"hi {name}";
}"#;
    assert_eq!(kinds(source, "$\"hi {name}\"", 0), vec![Calculated]);
}

#[test]
fn test_arithmetic_unwraps_operands() {
    let source = r#"class C
{
    int Scale(int a) => a * 2 + 1;
}"#;
    assert_eq!(
        steps(source, "a * 2 + 1", 0),
        vec![
            step(Calculated, "a * 2 + 1"),
            step(Calculated, "a * 2"),
            step(Argument, "a"),
            step(Constant, "2"),
            step(Constant, "1"),
        ]
    );
}

#[test]
fn test_comparisons_are_calculated_leaves() {
    let source = r#"class C
{
    bool Check(int a) => a > 3 && a < 10;
    bool Not(bool b) => !b;
}"#;
    assert_eq!(kinds(source, "a > 3 && a < 10", 0), vec![Calculated]);
    assert_eq!(kinds(source, "!b", 0), vec![Calculated]);
}

#[test]
fn test_coalesce_and_conditional_cover_both_branches() {
    let source = r#"class C
{
    string Name(string given) => given ?? "anonymous";
    int Pick(bool flag, int a) => flag ? a : 0;
}"#;
    assert_eq!(
        kinds(source, "given ?? \"anonymous\"", 0),
        vec![Calculated, Argument, Constant]
    );
    assert_eq!(kinds(source, "flag ? a : 0", 0), vec![Calculated, Argument, Constant]);
}

#[test]
fn test_transparent_wrappers_contribute_no_entry() {
    let source = r#"class C
{
    object A(object o) => (string)o;
    object B(object o) => o as string;
    object C2(object o) => (o);
    object D(string s) => s!;
}"#;
    assert_eq!(kinds(source, "(string)o", 0), vec![Argument]);
    assert_eq!(kinds(source, "(o)", 0), vec![Argument]);
    assert_eq!(kinds(source, "s!", 0), vec![Argument]);
    assert_eq!(kinds(source, "o as string", 0), vec![Argument]);
}

#[test]
fn test_creations() {
    let source = r#"class C
{
    object A() => new Widget();
    object B() => new int[4];
    object D() => new[] { 1, 2 };
    object E() => new List<int> { 1, 2 };
}
class Widget { }"#;
    for text in ["new Widget()", "new int[4]", "new[] { 1, 2 }", "new List<int> { 1, 2 }"] {
        assert_eq!(kinds(source, text, 0), vec![Created], "{text}");
    }
}

#[test]
fn test_static_readonly_storage_is_cached() {
    let source = r#"class Registry
{
    static readonly Registry Instance = new Registry();
    const int Size = 4;
    public static int Max { get; } = 5;
    object A() => Instance;
    int B() => Size;
    int D() => Max;
    int E() => Registry.Size;
}"#;
    assert_eq!(kinds(source, "Instance", 0), vec![Cached]);
    assert_eq!(kinds(source, "Size", 0), vec![Cached]);
    assert_eq!(kinds(source, "Max", 0), vec![Cached]);
    assert_eq!(kinds(source, "Registry.Size", 0), vec![Cached]);
}

#[test]
fn test_mutable_static_sees_every_write() {
    let source = r#"class Counter
{
    static int count = 0;
    static void Bump() { count = 5; }
    int Read() => count;
}"#;
    assert_eq!(
        steps(source, "count", 1),
        vec![step(Member, "count"), step(Constant, "0"), step(Constant, "5")]
    );
}

#[test]
fn test_calls_outside_the_unit_are_external() {
    let source = r#"class C
{
    string A() => System.Console.ReadLine();
    int B(string s) => s.Length;
    int D(string s) => s?.Length ?? 0;
}"#;
    assert_eq!(kinds(source, "System.Console.ReadLine()", 0), vec![External]);
    assert_eq!(kinds(source, "s.Length", 0), vec![External]);
    assert_eq!(kinds(source, "s?.Length", 0), vec![External]);
}

#[test]
fn test_bodiless_members_are_external() {
    let source = r#"interface IShape
{
    int Area { get; }
    int Sides();
}
abstract class Base
{
    public abstract int Weight { get; }
}
class User
{
    int A(IShape shape) => shape.Area;
    int B(IShape shape) => shape.Sides();
    int D(Base b) => b.Weight;
}"#;
    assert_eq!(kinds(source, "shape.Area", 0), vec![External]);
    assert_eq!(kinds(source, "shape.Sides()", 0), vec![External]);
    assert_eq!(kinds(source, "b.Weight", 0), vec![External]);
}

#[test]
fn test_method_call_is_calculated_from_returns() {
    let source = r#"class C
{
    int Twice(int n) => n * 2;
    int Pick(bool flag)
    {
        if (flag) return 1;
        return Twice(3);
    }
    void Nothing() { }
    int Use() => Pick(true);
}"#;
    assert_eq!(
        steps(source, "Pick(true)", 0),
        vec![
            step(Calculated, "Pick(true)"),
            step(Constant, "1"),
            step(Calculated, "Twice(3)"),
            step(Calculated, "n * 2"),
            step(Argument, "n"),
            step(Constant, "2"),
        ]
    );
}

#[test]
fn test_unresolved_names_degrade_to_unknown() {
    let source = r#"class C
{
    int A() => missing;
    int B() => Helper(1);
    int D() => this.Nowhere;
}"#;
    assert_eq!(kinds(source, "missing", 0), vec![Unknown]);
    assert_eq!(kinds(source, "Helper(1)", 0), vec![Unknown]);
    assert_eq!(kinds(source, "this.Nowhere", 0), vec![Unknown]);
}

#[test]
fn test_unsupported_and_error_nodes_are_unknown() {
    let source = r#"class C
{
    object Make()
    {
        var f = () => 1;
        return f;
    }
}"#;
    assert_eq!(kinds(source, "f", 0), vec![Unknown]);

    let broken = prov_syntax::SyntaxTree::parse("class C { int M() { int x = ; return x; } }")
        .expect("parse");
    assert!(!broken.diagnostics().is_empty());
    let x = expr(&broken, "x", 0);
    assert_eq!(resolve_node(&broken, x).kinds(), vec![Unknown]);
}

#[test]
fn test_out_argument_to_external_callee() {
    let source = r#"class C
{
    int Parse(string s)
    {
        Parser.TryParse(s, out var n);
        return n;
    }
}"#;
    assert_eq!(
        steps(source, "n", 0),
        vec![
            step(Out, "out var n"),
            step(External, "Parser.TryParse(s, out var n)"),
        ]
    );
}

#[test]
fn test_ref_argument_resolves_callee_writes() {
    let source = r#"class C
{
    void Reset(ref int value) { value = 0; }
    int Use()
    {
        int x = 5;
        Reset(ref x);
        return x;
    }
}"#;
    assert_eq!(
        steps(source, "x", 1),
        vec![step(Constant, "5"), step(Ref, "ref x"), step(Constant, "0")]
    );
}

#[test]
fn test_ref_parameter_read_follows_caller_variable() {
    let source = r#"class C
{
    int M(ref int v) { return v; }
    int Use()
    {
        int x = 5;
        return M(ref x);
    }
}"#;
    assert_eq!(
        steps(source, "v", 0),
        vec![step(Argument, "v"), step(Constant, "5"), step(Ref, "ref x")]
    );
    assert!(!kinds(source, "v", 0).contains(&Recursion));
}

#[test]
fn test_local_sees_all_assignments_in_order() {
    let source = r#"class C
{
    int Use(bool flag, int a)
    {
        int x = 1;
        if (flag) x = a;
        return x;
    }
}"#;
    assert_eq!(
        steps(source, "x", 1),
        vec![step(Constant, "1"), step(Argument, "a")]
    );
}

#[test]
fn test_conditional_access_member_is_resolved() {
    let source = r#"public class Box
{
    public int Count;
}
class Reader
{
    int? Read(Box box) => box?.Count;
}"#;
    assert_eq!(kinds(source, "box?.Count", 0), vec![Member, PotentiallyInjected]);
}

#[test]
fn test_setter_value_comes_from_property_writes() {
    let source = r#"class Box
{
    private int v;
    public int V { get { return v; } set { v = value; } }
    void Fill() { V = 3; }
}"#;
    assert_eq!(
        steps(source, "value", 0),
        vec![step(Argument, "value"), step(Constant, "3")]
    );
}

#[test]
fn test_await_is_transparent() {
    let source = r#"class C
{
    async Task<int> Run(Task<int> pending) => await pending;
}"#;
    assert_eq!(kinds(source, "await pending", 0), vec![Argument]);
}
