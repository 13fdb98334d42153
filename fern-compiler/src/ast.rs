use serde::{Deserialize, Serialize};

use crate::segment::UnparsedBlock;
use crate::types::{FixedType, FunctionType, Property, Type};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringValue {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatStringValue {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListValue {
    pub items: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRange {
    pub start: Value,
    pub end: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ObjectLiteral {
    /// `...base` spread, always first.
    pub base: Option<Box<Expression>>,
    pub fields: Vec<Field>,
}

impl ObjectLiteral {
    pub fn is_empty(&self) -> bool {
        self.base.is_none() && self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfStatement {
    pub predicate: Box<Expression>,
    pub if_body: Box<Expression>,
    pub if_let_body: Vec<Block>,
    pub else_body: Box<Expression>,
    pub else_let_body: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destructure {
    pub constructor: String,
    pub bindings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ListDestructurePart {
    EmptyList,
    StringValue(StringValue),
    FormatStringValue(FormatStringValue),
    Value(Value),
    Destructure(Destructure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDestructure {
    pub parts: Vec<ListDestructurePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BranchPattern {
    StringValue(StringValue),
    FormatStringValue(FormatStringValue),
    Destructure(Destructure),
    ListDestructure(ListDestructure),
    EmptyList,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub pattern: BranchPattern,
    pub body: Expression,
    pub let_body: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStatement {
    pub predicate: Box<Expression>,
    pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let operator = match symbol {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "%" => BinaryOperator::Mod,
            "==" => BinaryOperator::Equal,
            "!=" => BinaryOperator::NotEqual,
            "<" => BinaryOperator::LessThan,
            "<=" => BinaryOperator::LessThanOrEqual,
            ">" => BinaryOperator::GreaterThan,
            ">=" => BinaryOperator::GreaterThanOrEqual,
            "&&" => BinaryOperator::And,
            "||" => BinaryOperator::Or,
            _ => return None,
        };
        Some(operator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPrepend {
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipe {
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReference {
    pub path: Vec<String>,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constructor {
    pub constructor: String,
    pub pattern: ObjectLiteral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lambda {
    pub args: Vec<String>,
    pub body: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaCall {
    pub lambda: Lambda,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expression {
    Value(Value),
    StringValue(StringValue),
    FormatStringValue(FormatStringValue),
    ListValue(ListValue),
    ListRange(ListRange),
    ObjectLiteral(ObjectLiteral),
    IfStatement(IfStatement),
    CaseStatement(CaseStatement),
    Operator(BinaryExpression),
    ListPrepend(ListPrepend),
    /// `left |> right`
    LeftPipe(Pipe),
    /// `left <| right`
    RightPipe(Pipe),
    ModuleReference(ModuleReference),
    FunctionCall(FunctionCall),
    Constructor(Constructor),
    Lambda(Lambda),
    LambdaCall(LambdaCall),
}

impl Expression {
    pub fn value(body: impl Into<String>) -> Self {
        Expression::Value(Value { body: body.into() })
    }

    pub fn string(body: impl Into<String>) -> Self {
        Expression::StringValue(StringValue { body: body.into() })
    }

    pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Operator(BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportNamespace {
    Global,
    Relative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportModule {
    pub name: String,
    pub alias: Option<String>,
    pub exposing: Vec<String>,
    pub namespace: ImportNamespace,
}

impl ImportModule {
    /// The module's own name: the file stem for relative imports, the full name otherwise.
    pub fn stem(&self) -> &str {
        match self.namespace {
            ImportNamespace::Relative => module_stem(&self.name),
            ImportNamespace::Global => &self.name,
        }
    }

    /// The name this import is referred to by in code.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.stem())
    }
}

/// Last path segment without extension: `"../utils/Maybe.fern"` gives `Maybe`.
pub fn module_stem(name: &str) -> &str {
    let file = name.rsplit('/').next().unwrap_or(name);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub modules: Vec<ImportModule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagArg {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub args: Vec<TagArg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionType {
    #[serde(rename = "type")]
    pub type_: FixedType,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionUntaggedType {
    #[serde(rename = "type")]
    pub type_: FixedType,
    pub values: Vec<StringValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAlias {
    #[serde(rename = "type")]
    pub type_: FixedType,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionArg {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: Type,
}

/// A declared parameter with no name on the implementation line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonFunctionArg {
    pub index: usize,
    #[serde(rename = "type")]
    pub type_: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FunctionArgument {
    FunctionArg(FunctionArg),
    AnonFunctionArg(AnonFunctionArg),
}

impl FunctionArgument {
    pub fn type_(&self) -> &Type {
        match self {
            FunctionArgument::FunctionArg(arg) => &arg.type_,
            FunctionArgument::AnonFunctionArg(arg) => &arg.type_,
        }
    }

    /// Anonymous arguments are named after their type: `Context` becomes `context`.
    pub fn name(&self) -> String {
        match self {
            FunctionArgument::FunctionArg(arg) => arg.name.clone(),
            FunctionArgument::AnonFunctionArg(arg) => match &arg.type_ {
                Type::Fixed(fixed) => {
                    let base = fixed.name.rsplit('.').next().unwrap_or(&fixed.name);
                    let mut chars = base.chars();
                    match chars.next() {
                        Some(first) => first.to_lowercase().chain(chars).collect(),
                        None => format!("arg{}", arg.index),
                    }
                }
                _ => format!("arg{}", arg.index),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    pub args: Vec<FunctionArgument>,
    pub let_body: Vec<Block>,
    pub body: Expression,
}

impl Function {
    pub fn type_(&self) -> Type {
        let mut args = self
            .args
            .iter()
            .map(|arg| arg.type_().clone())
            .collect::<Vec<_>>();
        args.push(self.return_type.clone());
        Type::Function(FunctionType { args })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Const {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: Type,
    pub let_body: Vec<Block>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Block {
    Import(Import),
    Export(Export),
    UnionType(UnionType),
    UnionUntaggedType(UnionUntaggedType),
    TypeAlias(TypeAlias),
    Function(Function),
    Const(Const),
    Comment,
    MultilineComment,
}

impl Block {
    /// Blocks that contribute to the type-checking context.
    pub fn is_typed(&self) -> bool {
        matches!(
            self,
            Block::UnionType(_)
                | Block::UnionUntaggedType(_)
                | Block::TypeAlias(_)
                | Block::Function(_)
                | Block::Const(_)
        )
    }

    /// The top-level name a declaration introduces, if any.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Block::UnionType(union) => Some(&union.type_.name),
            Block::UnionUntaggedType(union) => Some(&union.type_.name),
            Block::TypeAlias(alias) => Some(&alias.type_.name),
            Block::Function(function) => Some(&function.name),
            Block::Const(constant) => Some(&constant.name),
            Block::Import(_) | Block::Export(_) | Block::Comment | Block::MultilineComment => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub body: Vec<Block>,
    pub errors: Vec<String>,
}

impl Module {
    pub fn imports(&self) -> impl Iterator<Item = &ImportModule> {
        imports_of(&self.body)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A module that keeps its unparsed blocks so later passes can point at source lines.
/// `unparsed_body[i]` is the text `body[i]` was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextModule {
    pub name: String,
    pub body: Vec<Block>,
    pub unparsed_body: Vec<UnparsedBlock>,
    pub errors: Vec<String>,
}

impl ContextModule {
    pub fn imports(&self) -> impl Iterator<Item = &ImportModule> {
        imports_of(&self.body)
    }

    pub fn into_module(self) -> Module {
        Module {
            name: self.name,
            body: self.body,
            errors: self.errors,
        }
    }
}

pub(crate) fn imports_of(blocks: &[Block]) -> impl Iterator<Item = &ImportModule> {
    blocks.iter().flat_map(|block| match block {
        Block::Import(import) => import.modules.iter(),
        _ => [].iter(),
    })
}
