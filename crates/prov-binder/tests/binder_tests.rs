//! Name binding, overload selection, call sites and reachability.

use prov_binder::*;
use prov_syntax::{Node, NodeIndex, SyntaxTree};

fn parse(source: &str) -> SyntaxTree {
    let tree = SyntaxTree::parse(source).expect("parse");
    assert!(tree.diagnostics().is_empty(), "{:?}", tree.diagnostics());
    tree
}

fn identifiers(tree: &SyntaxTree, name: &str) -> Vec<NodeIndex> {
    tree.find_all(|_, node| matches!(node, Node::Identifier(id) if id.name == name))
}

fn symbol_named(binder: &BinderState<'_>, kind: SymbolKind, name: &str) -> SymbolId {
    binder
        .symbols
        .iter()
        .find(|(_, s)| s.kind == kind && s.name == name)
        .map(|(id, _)| id)
        .unwrap_or_else(|| panic!("no {kind:?} named {name}"))
}

#[test]
fn test_identifiers_bind_locals_before_parameters_before_members() {
    let tree = parse(
        r#"class C
{
    int x;
    int A(int x) { return x; }
    int B() { var x = 2; return x; }
    int D() { return x; }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let uses = identifiers(&tree, "x");
    assert_eq!(uses.len(), 3);

    let kinds: Vec<SymbolKind> = uses
        .iter()
        .map(|&u| {
            let id = binder.resolve_declaration(u).expect("bound");
            binder.symbol(id).expect("symbol").kind
        })
        .collect();
    assert_eq!(
        kinds,
        vec![SymbolKind::Parameter, SymbolKind::Local, SymbolKind::Field]
    );
}

#[test]
fn test_forward_references_and_this_access_bind() {
    let tree = parse(
        r#"class C
{
    int Read() { return this.later + Later; }
    int later;
    int Later { get; set; }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let access = tree
        .find(|_, node| matches!(node, Node::MemberAccess(m) if m.name == "later"))
        .expect("this.later");
    let field = symbol_named(&binder, SymbolKind::Field, "later");
    assert_eq!(binder.resolve_declaration(access), Some(field));

    let prop_use = identifiers(&tree, "Later")[0];
    let property = symbol_named(&binder, SymbolKind::Property, "Later");
    assert_eq!(binder.resolve_declaration(prop_use), Some(property));
}

#[test]
fn test_member_access_follows_declared_and_inferred_types() {
    let tree = parse(
        r#"class Engine { public int Power; public Engine Clone() { return this; } }
class Car
{
    private Engine engine = new Engine();
    int Read()
    {
        var copy = engine.Clone();
        return copy.Power;
    }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let power_read = tree
        .find(|_, node| matches!(node, Node::MemberAccess(m) if m.name == "Power"))
        .expect("copy.Power");
    let power = symbol_named(&binder, SymbolKind::Field, "Power");
    assert_eq!(binder.resolve_declaration(power_read), Some(power));

    let copy = symbol_named(&binder, SymbolKind::Local, "copy");
    assert_eq!(binder.symbol(copy).expect("local").type_name, "Engine");
}

#[test]
fn test_inherited_members_bind_through_base_chain() {
    let tree = parse(
        r#"class Base { protected int shared; }
class Derived : Base, IThing
{
    int Read() { return shared + base.shared; }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let shared = symbol_named(&binder, SymbolKind::Field, "shared");
    let plain = identifiers(&tree, "shared")[0];
    assert_eq!(binder.resolve_declaration(plain), Some(shared));
    let via_base = tree
        .find(|_, node| matches!(node, Node::MemberAccess(m) if m.name == "shared"))
        .expect("base.shared");
    assert_eq!(binder.resolve_declaration(via_base), Some(shared));
}

#[test]
fn test_overloads_are_selected_by_argument_count() {
    let tree = parse(
        r#"class C
{
    int M(int a) { return a; }
    int M(int a, int b, int c = 3) { return a + b + c; }
    int Sum(params int[] values) { return 0; }
    void Use()
    {
        M(1);
        M(1, 2);
        M(1, 2, 3);
        Sum(1, 2, 3, 4);
        M();
    }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let methods: Vec<SymbolId> = binder
        .symbols
        .iter()
        .filter(|(_, s)| s.kind == SymbolKind::Method && s.name == "M")
        .map(|(id, _)| id)
        .collect();
    let sum = symbol_named(&binder, SymbolKind::Method, "Sum");

    let calls = tree.find_all(|_, node| matches!(node, Node::Invocation(_)));
    let bound: Vec<Option<SymbolId>> = calls.iter().map(|&c| binder.resolve_declaration(c)).collect();
    assert_eq!(
        bound,
        vec![
            Some(methods[0]),
            Some(methods[1]),
            Some(methods[1]),
            Some(sum),
            None
        ]
    );
    assert_eq!(binder.call_sites_of(methods[1]), vec![calls[1], calls[2]]);
}

#[test]
fn test_named_and_positional_arguments_map_to_parameters() {
    let tree = parse(
        r#"class C
{
    void Put(int key, string label) { }
    void Use() { Put(label: "a", key: 1); Put(2, "b"); }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let key = symbol_named(&binder, SymbolKind::Parameter, "key");
    let label = symbol_named(&binder, SymbolKind::Parameter, "label");
    let args = tree.find_all(|_, node| matches!(node, Node::Argument(_)));
    let mapped: Vec<Option<SymbolId>> = args.iter().map(|&a| binder.parameter_of_argument(a)).collect();
    assert_eq!(mapped, vec![Some(label), Some(key), Some(key), Some(label)]);

    let second_call = tree.find_all(|_, node| matches!(node, Node::Invocation(_)))[1];
    assert_eq!(binder.argument_for_parameter(second_call, label), Some(args[3]));
}

#[test]
fn test_constructor_call_sites_include_chained_initializers() {
    let tree = parse(
        r#"public class Service
{
    public Service() : this(5) { }
    public Service(int size) { }
}
class Factory
{
    Service Make() { return new Service(3); }
    Service Default() { Service s = new(); return s; }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let service = symbol_named(&binder, SymbolKind::Type(prov_syntax::TypeDeclKind::Class), "Service");
    let ctors = binder.constructors_of(service);
    assert_eq!(ctors.len(), 2);

    let chained = tree
        .find(|_, node| matches!(node, Node::ConstructorInitializer(_)))
        .expect("this(5)");
    let creations = tree.find_all(|_, node| matches!(node, Node::ObjectCreation(_)));
    assert_eq!(binder.call_sites_of(ctors[1]), vec![chained, creations[0]]);
    assert_eq!(binder.call_sites_of(ctors[0]), vec![creations[1]]);
}

#[test]
fn test_setter_value_parameter_binds() {
    let tree = parse(
        r#"class C
{
    private int _v;
    public int V { get { return _v; } set { _v = value; } }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let value_use = identifiers(&tree, "value")[0];
    let id = binder.resolve_declaration(value_use).expect("value bound");
    let symbol = binder.symbol(id).expect("symbol");
    assert_eq!(symbol.kind, SymbolKind::Parameter);
    assert_eq!(symbol.type_name, "int");
}

#[test]
fn test_backing_field_detection() {
    let tree = parse(
        r#"class C
{
    private int _a;
    private int _b;
    private int _c;
    public int A { get { return _a; } }
    public int B => this._b;
    public int C2 { get => _c + 1; }
    public int D { get; set; }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let a = symbol_named(&binder, SymbolKind::Property, "A");
    let b = symbol_named(&binder, SymbolKind::Property, "B");
    let c2 = symbol_named(&binder, SymbolKind::Property, "C2");
    let d = symbol_named(&binder, SymbolKind::Property, "D");
    assert_eq!(
        binder.backing_field_of(a),
        Some(symbol_named(&binder, SymbolKind::Field, "_a"))
    );
    assert_eq!(
        binder.backing_field_of(b),
        Some(symbol_named(&binder, SymbolKind::Field, "_b"))
    );
    assert_eq!(binder.backing_field_of(c2), None);
    assert_eq!(binder.backing_field_of(d), None);
}

#[test]
fn test_external_reachability_and_writability() {
    let tree = parse(
        r#"public class Open
{
    public int field;
    public readonly int frozen;
    private int hidden;
    public int Auto { get; set; }
    public int GetOnly { get; }
    public int PrivateSet { get; private set; }
    public Open(int seed) { }
    public class Inner { public int deep; }
    private class Secret { public int deep; }
}
class Internal { public int field; }
interface IShape { int Area { get; } }"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let named = |kind, name: &str| symbol_named(&binder, kind, name);
    let fields: Vec<SymbolId> = binder
        .symbols
        .iter()
        .filter(|(_, s)| s.kind == SymbolKind::Field)
        .map(|(id, _)| id)
        .collect();

    assert!(binder.is_externally_reachable(fields[0]));
    assert!(binder.is_externally_writable(fields[0]));
    assert!(binder.is_externally_reachable(named(SymbolKind::Field, "frozen")));
    assert!(!binder.is_externally_writable(named(SymbolKind::Field, "frozen")));
    assert!(!binder.is_externally_reachable(named(SymbolKind::Field, "hidden")));

    assert!(binder.is_externally_writable(named(SymbolKind::Property, "Auto")));
    assert!(!binder.is_externally_writable(named(SymbolKind::Property, "GetOnly")));
    assert!(!binder.is_externally_writable(named(SymbolKind::Property, "PrivateSet")));

    // Nested types: reachable only through reachable containers.
    let deep: Vec<SymbolId> = binder
        .symbols
        .iter()
        .filter(|(_, s)| s.name == "deep")
        .map(|(id, _)| id)
        .collect();
    assert!(binder.is_externally_reachable(deep[0]));
    assert!(!binder.is_externally_reachable(deep[1]));

    // Parameters are as visible as their callable; internal types still count.
    assert!(binder.is_externally_reachable(named(SymbolKind::Parameter, "seed")));
    assert!(binder.is_externally_reachable(fields[fields.len() - 1]));

    // Interface members default to public.
    assert!(binder.is_externally_reachable(named(SymbolKind::Property, "Area")));
}

#[test]
fn test_unresolved_names_have_no_binding() {
    let tree = parse(
        r#"class C
{
    int Read() { return Missing.Value + unknown + Helper(1); }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    for name in ["Missing", "unknown", "Helper"] {
        let node = identifiers(&tree, name)[0];
        assert_eq!(binder.resolve_declaration(node), None, "{name}");
    }
    let access = tree
        .find(|_, node| matches!(node, Node::MemberAccess(_)))
        .expect("Missing.Value");
    assert_eq!(binder.resolve_declaration(access), None);
}

#[test]
fn test_conditional_access_binds_member_bindings() {
    let tree = parse(
        r#"class Node2 { public Node2 Next; public int Value; }
class C
{
    Node2 head;
    int? Read() { return head?.Next.Value; }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let binding = tree
        .find(|_, node| matches!(node, Node::MemberBinding(b) if b.name == "Next"))
        .expect(".Next binding");
    assert_eq!(
        binder.resolve_declaration(binding),
        Some(symbol_named(&binder, SymbolKind::Field, "Next"))
    );
    let value = tree
        .find(|_, node| matches!(node, Node::MemberAccess(m) if m.name == "Value"))
        .expect(".Value");
    assert_eq!(
        binder.resolve_declaration(value),
        Some(symbol_named(&binder, SymbolKind::Field, "Value"))
    );
}

#[test]
fn test_static_member_access_through_type_name() {
    let tree = parse(
        r#"static class Defaults { public const int Size = 4; }
class C { int Read() { return Defaults.Size; } }"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let access = tree
        .find(|_, node| matches!(node, Node::MemberAccess(m) if m.name == "Size"))
        .expect("Defaults.Size");
    let size = symbol_named(&binder, SymbolKind::Field, "Size");
    assert_eq!(binder.resolve_declaration(access), Some(size));
    assert!(binder.symbol(size).expect("size").is_static());
}

#[test]
fn test_indexer_access_binds_indexer() {
    let tree = parse(
        r#"class Table
{
    private int[] cells = new int[4];
    public int this[int i] { get { return cells[i]; } }
}
class C
{
    Table table = new Table();
    int Read() { return table[2]; }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let indexer = symbol_named(&binder, SymbolKind::Indexer, "this");
    let accesses = tree.find_all(|_, node| matches!(node, Node::ElementAccess(_)));
    assert_eq!(binder.resolve_declaration(accesses[0]), None, "array element");
    assert_eq!(binder.resolve_declaration(accesses[1]), Some(indexer));
}

#[test]
fn test_symbols_serialize_with_their_modifiers() {
    let tree = parse(
        r#"class C
{
    static readonly int Max = 3;
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let id = symbol_named(&binder, SymbolKind::Field, "Max");
    let symbol = binder.symbols.get(id).expect("symbol");
    assert!(symbol.is_static() && symbol.is_readonly());

    let json = serde_json::to_value(symbol).expect("serialize symbol");
    assert_eq!(json["name"], "Max");
    let modifiers = json["modifiers"].as_str().expect("modifier names");
    assert!(modifiers.contains("STATIC"), "{modifiers}");
    assert!(modifiers.contains("READONLY"), "{modifiers}");
}
