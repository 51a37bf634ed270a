//! Syntax tree node definitions.
//!
//! Nodes are stored in a [`NodeArena`](crate::NodeArena) and referenced by
//! [`NodeIndex`]. Optional children use `NodeIndex::NONE` rather than
//! `Option<NodeIndex>` so node data stays `Copy`-friendly and compact.

use bitflags::bitflags;
use serde::Serialize;

/// Index of a node inside its [`NodeArena`](crate::NodeArena).
///
/// Only meaningful together with the arena that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Sentinel for "no node".
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }

    /// `None` for the sentinel, `Some(self)` otherwise.
    #[inline]
    pub fn get(self) -> Option<NodeIndex> {
        if self.is_none() { None } else { Some(self) }
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        Self::NONE
    }
}

bitflags! {
    /// Declaration modifiers as written in source.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
    pub struct ModifierFlags: u32 {
        const PUBLIC = 1 << 0;
        const PRIVATE = 1 << 1;
        const PROTECTED = 1 << 2;
        const INTERNAL = 1 << 3;
        const STATIC = 1 << 4;
        const READONLY = 1 << 5;
        const CONST = 1 << 6;
        const VIRTUAL = 1 << 7;
        const ABSTRACT = 1 << 8;
        const OVERRIDE = 1 << 9;
        const SEALED = 1 << 10;
        const EXTERN = 1 << 11;
        const NEW = 1 << 12;
        const PARTIAL = 1 << 13;
        const ASYNC = 1 << 14;

        const ACCESSIBILITY = Self::PUBLIC.bits()
            | Self::PRIVATE.bits()
            | Self::PROTECTED.bits()
            | Self::INTERNAL.bits();
    }
}

impl ModifierFlags {
    /// Whether any accessibility keyword was written.
    #[inline]
    pub fn has_explicit_accessibility(self) -> bool {
        self.intersects(Self::ACCESSIBILITY)
    }
}

// =============================================================================
// Small enums
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeDeclKind {
    Class,
    Struct,
    Interface,
    /// Enum members are modelled as public constant fields.
    Enum,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AccessorKind {
    Get,
    Set,
    Init,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterModifier {
    None,
    Out,
    Ref,
    In,
    Params,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ArgumentModifier {
    None,
    Out,
    Ref,
    In,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ConstructorInitializerKind {
    This,
    Base,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LiteralKind {
    Integer,
    Real,
    String,
    /// `$"..."`: has holes, so never a compile-time constant.
    InterpolatedString,
    Char,
    True,
    False,
    Null,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum InitializerKind {
    /// `new C { A = 1 }`
    Object,
    /// `new List<int> { 1, 2 }`
    Collection,
    /// `{ 1, 2 }` / `new[] { 1, 2 }`
    Array,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AssignOp {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    BitwiseAnd,
    BitwiseOr,
    ExclusiveOr,
    LeftShift,
    RightShift,
    Coalesce,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    LogicalAnd,
    LogicalOr,
    Coalesce,
    BitwiseAnd,
    BitwiseOr,
    ExclusiveOr,
    LeftShift,
    RightShift,
    /// `e is T` / `e is T x`; the right operand is the designation, if any.
    Is,
}

impl BinaryOp {
    /// Arithmetic operators whose result is derived from both operands.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Remainder
                | BinaryOp::BitwiseAnd
                | BinaryOp::BitwiseOr
                | BinaryOp::ExclusiveOr
                | BinaryOp::LeftShift
                | BinaryOp::RightShift
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    Negate,
    Plus,
    Not,
    BitwiseNot,
    /// `await e`
    Await,
    /// Postfix `e!`
    SuppressNullable,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

// =============================================================================
// Node payloads
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct SourceFileData {
    pub declarations: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct TypeDeclData {
    pub kind: TypeDeclKind,
    pub modifiers: ModifierFlags,
    pub name: String,
    pub base_types: Vec<String>,
    pub members: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct FieldData {
    pub modifiers: ModifierFlags,
    pub ty: String,
    pub name: String,
    pub initializer: NodeIndex,
}

/// Property or indexer.
#[derive(Clone, Debug)]
pub struct PropertyData {
    pub modifiers: ModifierFlags,
    pub ty: String,
    /// `this` for indexers.
    pub name: String,
    pub is_indexer: bool,
    /// Indexer parameters; empty for plain properties.
    pub parameters: Vec<NodeIndex>,
    pub accessors: Vec<NodeIndex>,
    /// `int A => 1;`
    pub expression_body: NodeIndex,
    /// `int A { get; } = 1;`
    pub initializer: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct AccessorData {
    pub kind: AccessorKind,
    pub modifiers: ModifierFlags,
    /// Block body; NONE for `get;`.
    pub body: NodeIndex,
    pub expression_body: NodeIndex,
}

impl AccessorData {
    #[inline]
    pub fn is_auto(&self) -> bool {
        self.body.is_none() && self.expression_body.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct MethodData {
    pub modifiers: ModifierFlags,
    pub return_ty: String,
    pub name: String,
    pub parameters: Vec<NodeIndex>,
    pub body: NodeIndex,
    pub expression_body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ConstructorData {
    pub modifiers: ModifierFlags,
    pub name: String,
    pub parameters: Vec<NodeIndex>,
    /// `: this(...)` / `: base(...)`
    pub initializer: NodeIndex,
    pub body: NodeIndex,
    pub expression_body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ConstructorInitializerData {
    pub kind: ConstructorInitializerKind,
    pub arguments: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct ParameterData {
    pub modifier: ParameterModifier,
    pub ty: String,
    pub name: String,
    pub default: NodeIndex,
}

#[derive(Clone, Debug, Default)]
pub struct BlockData {
    pub statements: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct LocalDeclarationData {
    /// `using var x = ...;`
    pub is_using: bool,
    pub declarators: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct VariableDeclaratorData {
    pub ty: String,
    pub name: String,
    pub initializer: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct IfData {
    pub condition: NodeIndex,
    pub then_statement: NodeIndex,
    pub else_statement: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct WhileData {
    pub condition: NodeIndex,
    pub body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct DoData {
    pub body: NodeIndex,
    pub condition: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ForData {
    /// Local declaration or expressions.
    pub initializers: Vec<NodeIndex>,
    pub condition: NodeIndex,
    pub incrementors: Vec<NodeIndex>,
    pub body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ForeachData {
    pub ty: String,
    pub name: String,
    pub expression: NodeIndex,
    pub body: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct UsingData {
    /// Local declaration or expression.
    pub resource: NodeIndex,
    pub body: NodeIndex,
}

/// `switch (e) { case ...: ... }`; each section is a block of its statements.
#[derive(Clone, Debug)]
pub struct SwitchData {
    pub expression: NodeIndex,
    pub sections: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct TryData {
    pub block: NodeIndex,
    pub catches: Vec<NodeIndex>,
    pub finally_block: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct CatchData {
    pub ty: String,
    /// Empty when the exception is not captured.
    pub name: String,
    pub block: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct LiteralData {
    pub kind: LiteralKind,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct IdentifierData {
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct MemberAccessData {
    pub expression: NodeIndex,
    pub name: String,
}

/// The `.b` part of `a?.b`, whose receiver is the enclosing conditional access.
#[derive(Clone, Debug)]
pub struct MemberBindingData {
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct ConditionalAccessData {
    pub expression: NodeIndex,
    pub when_not_null: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct InvocationData {
    pub expression: NodeIndex,
    pub arguments: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct ElementAccessData {
    pub expression: NodeIndex,
    pub arguments: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct ArgumentData {
    /// Named argument `name: e`; empty when positional.
    pub name: String,
    pub modifier: ArgumentModifier,
    pub expression: NodeIndex,
}

/// `out var x` / `out int x`
#[derive(Clone, Debug)]
pub struct DeclarationExpressionData {
    pub ty: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct ObjectCreationData {
    /// Empty for anonymous objects (`new { A = 1 }`).
    pub ty: String,
    pub arguments: Vec<NodeIndex>,
    pub initializer: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ArrayCreationData {
    /// Empty for implicitly typed arrays (`new[] { ... }`).
    pub element_ty: String,
    pub sizes: Vec<NodeIndex>,
    pub initializer: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct InitializerData {
    pub kind: InitializerKind,
    pub expressions: Vec<NodeIndex>,
}

#[derive(Clone, Debug)]
pub struct AssignmentData {
    pub op: AssignOp,
    pub target: NodeIndex,
    pub value: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct BinaryData {
    pub op: BinaryOp,
    pub left: NodeIndex,
    pub right: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct UnaryData {
    pub op: UnaryOp,
    pub operand: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct ConditionalData {
    pub condition: NodeIndex,
    pub when_true: NodeIndex,
    pub when_false: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct CastData {
    pub ty: String,
    pub expression: NodeIndex,
    /// `e as T` rather than `(T)e`.
    pub is_as: bool,
}

// =============================================================================
// Node
// =============================================================================

/// A syntax tree node.
#[derive(Clone, Debug)]
pub enum Node {
    SourceFile(SourceFileData),
    TypeDeclaration(TypeDeclData),

    // ----- Members -----
    Field(FieldData),
    Property(PropertyData),
    Accessor(AccessorData),
    Method(MethodData),
    Constructor(ConstructorData),
    ConstructorInitializer(ConstructorInitializerData),
    Parameter(ParameterData),

    // ----- Statements -----
    Block(BlockData),
    LocalDeclaration(LocalDeclarationData),
    VariableDeclarator(VariableDeclaratorData),
    ExpressionStatement(NodeIndex),
    Return(NodeIndex),
    Throw(NodeIndex),
    If(IfData),
    While(WhileData),
    Do(DoData),
    For(ForData),
    Foreach(ForeachData),
    Using(UsingData),
    Switch(SwitchData),
    Try(TryData),
    Catch(CatchData),
    Break,
    Continue,
    Empty,

    // ----- Expressions -----
    Literal(LiteralData),
    Identifier(IdentifierData),
    This,
    Base,
    MemberAccess(MemberAccessData),
    MemberBinding(MemberBindingData),
    ConditionalAccess(ConditionalAccessData),
    Invocation(InvocationData),
    ElementAccess(ElementAccessData),
    Argument(ArgumentData),
    DeclarationExpression(DeclarationExpressionData),
    ObjectCreation(ObjectCreationData),
    ArrayCreation(ArrayCreationData),
    Initializer(InitializerData),
    Assignment(AssignmentData),
    Binary(BinaryData),
    Unary(UnaryData),
    Conditional(ConditionalData),
    Parenthesized(NodeIndex),
    Cast(CastData),
    /// `default` / `default(T)`
    Default(String),
    TypeOf(String),

    /// A construct the parser recognises but the model does not cover
    /// (lambdas, switch expressions, ...).
    Unsupported(String),
    /// Recovery node inserted after a syntax error.
    Error(String),
}

impl Node {
    /// Short, stable name of the node kind (for logs and test output).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::SourceFile(_) => "SourceFile",
            Node::TypeDeclaration(_) => "TypeDeclaration",
            Node::Field(_) => "Field",
            Node::Property(_) => "Property",
            Node::Accessor(_) => "Accessor",
            Node::Method(_) => "Method",
            Node::Constructor(_) => "Constructor",
            Node::ConstructorInitializer(_) => "ConstructorInitializer",
            Node::Parameter(_) => "Parameter",
            Node::Block(_) => "Block",
            Node::LocalDeclaration(_) => "LocalDeclaration",
            Node::VariableDeclarator(_) => "VariableDeclarator",
            Node::ExpressionStatement(_) => "ExpressionStatement",
            Node::Return(_) => "Return",
            Node::Throw(_) => "Throw",
            Node::If(_) => "If",
            Node::While(_) => "While",
            Node::Do(_) => "Do",
            Node::For(_) => "For",
            Node::Foreach(_) => "Foreach",
            Node::Using(_) => "Using",
            Node::Switch(_) => "Switch",
            Node::Try(_) => "Try",
            Node::Catch(_) => "Catch",
            Node::Break => "Break",
            Node::Continue => "Continue",
            Node::Empty => "Empty",
            Node::Literal(_) => "Literal",
            Node::Identifier(_) => "Identifier",
            Node::This => "This",
            Node::Base => "Base",
            Node::MemberAccess(_) => "MemberAccess",
            Node::MemberBinding(_) => "MemberBinding",
            Node::ConditionalAccess(_) => "ConditionalAccess",
            Node::Invocation(_) => "Invocation",
            Node::ElementAccess(_) => "ElementAccess",
            Node::Argument(_) => "Argument",
            Node::DeclarationExpression(_) => "DeclarationExpression",
            Node::ObjectCreation(_) => "ObjectCreation",
            Node::ArrayCreation(_) => "ArrayCreation",
            Node::Initializer(_) => "Initializer",
            Node::Assignment(_) => "Assignment",
            Node::Binary(_) => "Binary",
            Node::Unary(_) => "Unary",
            Node::Conditional(_) => "Conditional",
            Node::Parenthesized(_) => "Parenthesized",
            Node::Cast(_) => "Cast",
            Node::Default(_) => "Default",
            Node::TypeOf(_) => "TypeOf",
            Node::Unsupported(_) => "Unsupported",
            Node::Error(_) => "Error",
        }
    }

    /// Members that own a body or an initializer: the unit of "enclosing member".
    pub fn is_member_declaration(&self) -> bool {
        matches!(
            self,
            Node::Field(_)
                | Node::Property(_)
                | Node::Accessor(_)
                | Node::Method(_)
                | Node::Constructor(_)
        )
    }

    /// Nodes that produce a value.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            Node::Literal(_)
                | Node::Identifier(_)
                | Node::This
                | Node::Base
                | Node::MemberAccess(_)
                | Node::MemberBinding(_)
                | Node::ConditionalAccess(_)
                | Node::Invocation(_)
                | Node::ElementAccess(_)
                | Node::Argument(_)
                | Node::DeclarationExpression(_)
                | Node::ObjectCreation(_)
                | Node::ArrayCreation(_)
                | Node::Initializer(_)
                | Node::Assignment(_)
                | Node::Binary(_)
                | Node::Unary(_)
                | Node::Conditional(_)
                | Node::Parenthesized(_)
                | Node::Cast(_)
                | Node::Default(_)
                | Node::TypeOf(_)
                | Node::Unsupported(_)
                | Node::Error(_)
        )
    }

    /// Direct children in source order, `NONE` slots skipped.
    pub fn children(&self) -> Vec<NodeIndex> {
        let mut children = Vec::new();
        let mut add = |idx: NodeIndex| {
            if idx.is_some() {
                children.push(idx);
            }
        };

        match self {
            Node::SourceFile(data) => data.declarations.iter().copied().for_each(add),
            Node::TypeDeclaration(data) => data.members.iter().copied().for_each(add),
            Node::Field(data) => add(data.initializer),
            Node::Property(data) => {
                data.parameters.iter().copied().for_each(&mut add);
                data.accessors.iter().copied().for_each(&mut add);
                add(data.expression_body);
                add(data.initializer);
            }
            Node::Accessor(data) => {
                add(data.body);
                add(data.expression_body);
            }
            Node::Method(data) => {
                data.parameters.iter().copied().for_each(&mut add);
                add(data.body);
                add(data.expression_body);
            }
            Node::Constructor(data) => {
                data.parameters.iter().copied().for_each(&mut add);
                add(data.initializer);
                add(data.body);
                add(data.expression_body);
            }
            Node::ConstructorInitializer(data) => data.arguments.iter().copied().for_each(add),
            Node::Parameter(data) => add(data.default),
            Node::Block(data) => data.statements.iter().copied().for_each(add),
            Node::LocalDeclaration(data) => data.declarators.iter().copied().for_each(add),
            Node::VariableDeclarator(data) => add(data.initializer),
            Node::ExpressionStatement(expr) | Node::Return(expr) | Node::Throw(expr) => add(*expr),
            Node::If(data) => {
                add(data.condition);
                add(data.then_statement);
                add(data.else_statement);
            }
            Node::While(data) => {
                add(data.condition);
                add(data.body);
            }
            Node::Do(data) => {
                add(data.body);
                add(data.condition);
            }
            Node::For(data) => {
                data.initializers.iter().copied().for_each(&mut add);
                add(data.condition);
                data.incrementors.iter().copied().for_each(&mut add);
                add(data.body);
            }
            Node::Foreach(data) => {
                add(data.expression);
                add(data.body);
            }
            Node::Using(data) => {
                add(data.resource);
                add(data.body);
            }
            Node::Switch(data) => {
                add(data.expression);
                data.sections.iter().copied().for_each(&mut add);
            }
            Node::Try(data) => {
                add(data.block);
                data.catches.iter().copied().for_each(&mut add);
                add(data.finally_block);
            }
            Node::Catch(data) => add(data.block),
            Node::MemberAccess(data) => add(data.expression),
            Node::ConditionalAccess(data) => {
                add(data.expression);
                add(data.when_not_null);
            }
            Node::Invocation(data) => {
                add(data.expression);
                data.arguments.iter().copied().for_each(&mut add);
            }
            Node::ElementAccess(data) => {
                add(data.expression);
                data.arguments.iter().copied().for_each(&mut add);
            }
            Node::Argument(data) => add(data.expression),
            Node::ObjectCreation(data) => {
                data.arguments.iter().copied().for_each(&mut add);
                add(data.initializer);
            }
            Node::ArrayCreation(data) => {
                data.sizes.iter().copied().for_each(&mut add);
                add(data.initializer);
            }
            Node::Initializer(data) => data.expressions.iter().copied().for_each(add),
            Node::Assignment(data) => {
                add(data.target);
                add(data.value);
            }
            Node::Binary(data) => {
                add(data.left);
                add(data.right);
            }
            Node::Unary(data) => add(data.operand),
            Node::Conditional(data) => {
                add(data.condition);
                add(data.when_true);
                add(data.when_false);
            }
            Node::Parenthesized(expr) => add(*expr),
            Node::Cast(data) => add(data.expression),
            Node::Break
            | Node::Continue
            | Node::Empty
            | Node::Literal(_)
            | Node::Identifier(_)
            | Node::This
            | Node::Base
            | Node::MemberBinding(_)
            | Node::DeclarationExpression(_)
            | Node::Default(_)
            | Node::TypeOf(_)
            | Node::Unsupported(_)
            | Node::Error(_) => {}
        }

        children
    }
}
