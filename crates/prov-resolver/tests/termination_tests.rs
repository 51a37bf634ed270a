//! Cycles, budgets, cancellation and repeatability.

mod common;

use std::cell::Cell;

use common::*;
use prov_binder::{BinderState, BindingOracle, Symbol, SymbolId, WriteSite};
use prov_common::CancellationToken;
use prov_resolver::SourceKind::*;
use prov_resolver::{ProvenanceResolver, RecursionProfile, ResolveError, ResolverOptions};
use prov_syntax::{NodeArena, NodeIndex};

/// Which oracle query cancels the token.
#[derive(Clone, Copy)]
enum Trigger {
    /// The n-th `write_sites_of` call (1-based).
    WriteSites(usize),
    CallSites,
    Never,
}

/// Delegates to a binder and cancels `token` from inside a query, so the
/// cancellation lands while the resolver is partway through a chain.
struct CancellingOracle<'a> {
    inner: &'a BinderState<'a>,
    token: &'a CancellationToken,
    trigger: Trigger,
    write_queries: Cell<usize>,
}

impl<'a> CancellingOracle<'a> {
    fn new(inner: &'a BinderState<'a>, token: &'a CancellationToken, trigger: Trigger) -> Self {
        Self {
            inner,
            token,
            trigger,
            write_queries: Cell::new(0),
        }
    }
}

impl BindingOracle for CancellingOracle<'_> {
    fn arena(&self) -> &NodeArena {
        self.inner.arena()
    }

    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.inner.symbol(id)
    }

    fn resolve_declaration(&self, node: NodeIndex) -> Option<SymbolId> {
        self.inner.resolve_declaration(node)
    }

    fn write_sites_of(&self, location: SymbolId, scope: NodeIndex) -> Vec<WriteSite> {
        let seen = self.write_queries.get() + 1;
        self.write_queries.set(seen);
        if matches!(self.trigger, Trigger::WriteSites(n) if n == seen) {
            self.token.cancel();
        }
        self.inner.write_sites_of(location, scope)
    }

    fn call_sites_of(&self, callable: SymbolId) -> Vec<NodeIndex> {
        if matches!(self.trigger, Trigger::CallSites) {
            self.token.cancel();
        }
        self.inner.call_sites_of(callable)
    }

    fn backing_field_of(&self, property: SymbolId) -> Option<SymbolId> {
        self.inner.backing_field_of(property)
    }

    fn is_externally_reachable(&self, symbol: SymbolId) -> bool {
        self.inner.is_externally_reachable(symbol)
    }

    fn is_externally_writable(&self, symbol: SymbolId) -> bool {
        self.inner.is_externally_writable(symbol)
    }

    fn constructors_of(&self, ty: SymbolId) -> Vec<SymbolId> {
        self.inner.constructors_of(ty)
    }

    fn parameter_of_argument(&self, argument: NodeIndex) -> Option<SymbolId> {
        self.inner.parameter_of_argument(argument)
    }
}

const CONSTRUCTOR_CHAIN: &str = r#"class C
{
    int f;
    C(int x) { var y = x; f = y; }
    int Read() => f;
}
class D
{
    C Make() => new C(3);
}"#;

#[test]
fn test_mutually_recursive_getters() {
    let source = r#"class C
{
    int A => B;
    int B => A;
    int Read() => A;
}"#;
    assert_eq!(
        steps(source, "A", 1),
        vec![
            step(Calculated, "A"),
            step(Calculated, "B"),
            step(Recursion, "A"),
        ]
    );
}

#[test]
fn test_loop_counter_local() {
    let source = r#"class C
{
    int Count()
    {
        int i = 0;
        while (i < 10) i = i + 1;
        return i;
    }
}"#;
    assert_eq!(
        steps(source, "i", 3),
        vec![
            step(Constant, "0"),
            step(Calculated, "i + 1"),
            step(Recursion, "i"),
            step(Constant, "1"),
        ]
    );
}

#[test]
fn test_compound_assignment_on_a_field() {
    let source = r#"class C
{
    int total;
    void Add(int amount) { total += amount; }
    int Read() => total;
}"#;
    assert_eq!(
        steps(source, "total", 1),
        vec![
            step(Member, "total"),
            step(Calculated, "total += amount"),
            step(Recursion, "total"),
            step(Argument, "amount"),
        ]
    );
}

#[test]
fn test_out_parameter_cycle() {
    let source = r#"class C
{
    void Loop(out int v) { Loop(out v); }
    int Use()
    {
        int x;
        Loop(out x);
        return x;
    }
}"#;
    assert_eq!(
        steps(source, "x", 1),
        vec![step(Out, "out x"), step(Recursion, "out v")]
    );
}

#[test]
fn test_sibling_branches_may_revisit_a_location() {
    let source = r#"class C
{
    int Base => 2;
    int Twice => Base + Base;
}"#;
    assert_eq!(
        kinds(source, "Base + Base", 0),
        vec![Calculated, Calculated, Constant, Calculated, Constant]
    );
}

#[test]
fn test_depth_budget_degrades_to_unknown() {
    let source = r#"class C
{
    int A => B;
    int B => D;
    int D => 1;
    int Read() => A;
}"#;
    let tree = parse(source);
    let read = expr(&tree, "A", 0);
    let shallow = ResolverOptions {
        profile: RecursionProfile::Custom {
            max_depth: 1,
            max_iterations: 100,
        },
    };
    assert_eq!(
        resolve_node_with(&tree, read, shallow).kinds(),
        vec![Calculated, Unknown]
    );
    assert_eq!(
        resolve_node(&tree, read).kinds(),
        vec![Calculated, Calculated, Calculated, Constant]
    );
}

#[test]
fn test_iteration_budget_degrades_to_unknown() {
    let source = r#"class C
{
    int A => B;
    int B => 1;
    int Read() => A;
}"#;
    let tree = parse(source);
    let read = expr(&tree, "A", 0);
    let options = ResolverOptions {
        profile: RecursionProfile::Custom {
            max_depth: 100,
            max_iterations: 1,
        },
    };
    assert_eq!(
        resolve_node_with(&tree, read, options).kinds(),
        vec![Calculated, Unknown]
    );
}

#[test]
fn test_cancelled_token_abandons() {
    let tree = parse(
        r#"class C
{
    int M(int v) { return M(v); }
    int Use() { return M(1); }
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let token = CancellationToken::new();
    token.cancel();
    let result = ProvenanceResolver::new(&binder).resolve(expr(&tree, "M(1)", 0), &token);
    assert_eq!(result, Err(ResolveError::Abandoned));
    assert_eq!(
        ResolveError::Abandoned.to_string(),
        "resolution abandoned: cancellation requested"
    );
}

#[test]
fn test_cancellation_inside_a_walk_abandons() {
    let tree = parse(CONSTRUCTOR_CHAIN);
    let binder = BinderState::bind_tree(&tree);
    let read = expr(&tree, "f", 1);

    let token = CancellationToken::new();
    let oracle = CancellingOracle::new(&binder, &token, Trigger::Never);
    let provenance = ProvenanceResolver::new(&oracle)
        .resolve(read, &token)
        .expect("not cancelled");
    assert!(provenance.kinds().contains(&Constant), "{:?}", provenance.kinds());

    for trigger in [Trigger::WriteSites(1), Trigger::WriteSites(2), Trigger::CallSites] {
        let token = CancellationToken::new();
        let oracle = CancellingOracle::new(&binder, &token, trigger);
        let resolver = ProvenanceResolver::new(&oracle);
        assert_eq!(resolver.resolve(read, &token), Err(ResolveError::Abandoned));
        assert!(token.is_cancelled());

        // The oracle only ever cancels the old token.
        let again = resolver
            .resolve(read, &CancellationToken::new())
            .expect("fresh token");
        assert_eq!(again, provenance);
    }
}

#[test]
fn test_resolution_is_repeatable() {
    let tree = parse(
        r#"public class C
{
    public int f = 1;
    public C(int x) { if (x > 0) f = x; }
    int Read() => f + Twice(f);
    int Twice(int n) => n * 2;
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let resolver = ProvenanceResolver::new(&binder);
    let token = CancellationToken::new();
    let node = expr(&tree, "f + Twice(f)", 0);
    let first = resolver.resolve(node, &token).expect("first");
    let second = resolver.resolve(node, &token).expect("second");
    assert_eq!(first, second);
    assert!(!first.is_empty());

    let all = resolver.resolve_all(&[node, node], &token).expect("all");
    assert_eq!(all, vec![first.clone(), first]);
}

#[test]
fn test_concurrent_resolutions_share_one_binder() {
    let tree = parse(
        r#"class C
{
    int A => B + 1;
    int B => A;
    int Read() => A;
}"#,
    );
    let binder = BinderState::bind_tree(&tree);
    let resolver = ProvenanceResolver::new(&binder);
    let node = expr(&tree, "A", 1);
    let expected = resolver
        .resolve(node, &CancellationToken::new())
        .expect("serial");

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    resolver
                        .resolve(node, &CancellationToken::new())
                        .expect("parallel")
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("thread panicked"), expected);
        }
    });
}

#[test]
fn test_provenance_serializes_as_entry_list() {
    let tree = parse("class C { int A => 1; int Read() => A; }");
    let provenance = resolve_node(&tree, expr(&tree, "A", 0));
    let json = serde_json::to_value(&provenance).expect("serialize");
    let kinds: Vec<&str> = json
        .as_array()
        .expect("array")
        .iter()
        .map(|e| e["kind"].as_str().expect("kind"))
        .collect();
    assert_eq!(kinds, vec!["Calculated", "Constant"]);
}
