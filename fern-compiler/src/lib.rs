mod ast;
mod collisions;
mod compiler;
mod diagnostics;
mod error;
mod formatter;
mod indentation;
mod lexer;
mod parser;
mod segment;
mod typechecker;
mod types;

pub use crate::ast::{
    module_stem, AnonFunctionArg, BinaryExpression, BinaryOperator, Block, Branch, BranchPattern,
    CaseStatement, Const, Constructor, ContextModule, Destructure, Export, Expression, Field,
    FormatStringValue, Function, FunctionArg, FunctionArgument, FunctionCall, IfStatement, Import,
    ImportModule, ImportNamespace, Lambda, LambdaCall, ListDestructure, ListDestructurePart,
    ListPrepend, ListRange, ListValue, Module, ModuleReference, ObjectLiteral, Pipe, StringValue,
    Tag, TagArg, TypeAlias, UnionType, UnionUntaggedType, Value,
};
pub use crate::collisions::{collisions, Collision};
pub use crate::compiler::{add_type_errors, parse, parse_with_context, CompileOptions, Compiler};
pub use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use crate::error::{FrontendError, DEFAULT_MAX_NESTING_DEPTH};
pub use crate::formatter::{render_block, render_expression, render_module};
pub use crate::lexer::{
    check_keyword_token, strip_comments, tokenize, tokenize_type, tokens_to_text, Lexer, Token,
    TypeToken, KEYWORDS,
};
pub use crate::parser::{parse_block, parse_expression};
pub use crate::segment::{block_kind, into_blocks, BlockKind, UnparsedBlock};
pub use crate::typechecker::{
    get_values_in_block_scope, get_values_in_top_level_scope, infer_type,
    validate_all_branches_covered, validate_const, validate_function, validate_type, ScopedValues,
    TypeChecker,
};
pub use crate::types::{
    parse_type, parse_type_token, FixedType, FunctionType, GenericType, ObjectLiteralType,
    Property, Type, BUILTIN_TYPES,
};
