//! Type inference and validation over parsed blocks.
//!
//! A [`TypeChecker`] borrows the typed declarations visible to a module (its own plus
//! any merged in from siblings) and the module's imports. Values in scope are passed
//! explicitly as [`ScopedValues`], cloned whenever a scope is extended.

mod compat;
mod exhaustive;
mod infer;

use std::collections::HashMap;

use anyhow::{bail, Result};

use crate::ast::{
    Block, Branch, Const, Expression, Function, FunctionArgument, ImportModule, Tag, TypeAlias,
    UnionType, UnionUntaggedType,
};
use crate::types::{Type, BUILTIN_TYPES};

pub type ScopedValues = HashMap<String, Type>;

#[derive(Debug, Clone, Copy)]
pub struct TypeChecker<'a> {
    typed_blocks: &'a [Block],
    imports: &'a [ImportModule],
}

impl<'a> TypeChecker<'a> {
    pub fn new(typed_blocks: &'a [Block], imports: &'a [ImportModule]) -> Self {
        Self {
            typed_blocks,
            imports,
        }
    }

    /// The type a declaration introduces, after checking its body against it.
    pub fn validate(&self, block: &Block, scope: &ScopedValues) -> Result<Type> {
        match block {
            Block::Function(function) => self.validate_function(function, scope),
            Block::Const(constant) => self.validate_const(constant, scope),
            Block::UnionType(union) => {
                for arg in union.tags.iter().flat_map(|tag| &tag.args) {
                    self.check_declared_type(&arg.type_)?;
                }
                Ok(union.type_.to_type())
            }
            Block::UnionUntaggedType(union) => Ok(union.type_.to_type()),
            Block::TypeAlias(alias) => {
                for property in &alias.properties {
                    self.check_declared_type(&property.type_)?;
                }
                Ok(alias.type_.to_type())
            }
            Block::Import(_) | Block::Export(_) | Block::Comment | Block::MultilineComment => {
                bail!("Only declarations have a type")
            }
        }
    }

    pub fn validate_function(&self, function: &Function, scope: &ScopedValues) -> Result<Type> {
        tracing::debug!(name = %function.name, "checking function");
        for arg in &function.args {
            self.check_declared_type(arg.type_())?;
        }
        self.check_declared_type(&function.return_type)?;

        let scope = function_scope(function, scope);
        self.validate_let_body(&function.let_body, &scope)?;

        // Unnamed parameters are left for the body to take, as in `increment = add 1`.
        let mut remaining = function
            .args
            .iter()
            .filter(|arg| matches!(arg, FunctionArgument::AnonFunctionArg(_)))
            .map(|arg| arg.type_().clone())
            .collect::<Vec<_>>();
        let expected = if remaining.is_empty() {
            function.return_type.clone()
        } else {
            remaining.push(function.return_type.clone());
            Type::function(remaining)
        };

        let inferred = self.infer(&function.body, Some(&expected), &scope)?;
        if !self.is_same_type(&expected, &inferred) {
            bail!(
                "Expected `{}` but got `{}` in the body of the function `{}`",
                expected,
                inferred,
                function.name
            );
        }
        Ok(function.type_())
    }

    pub fn validate_const(&self, constant: &Const, scope: &ScopedValues) -> Result<Type> {
        tracing::debug!(name = %constant.name, "checking const");
        self.check_declared_type(&constant.type_)?;

        let scope = let_scope(&constant.let_body, scope);
        self.validate_let_body(&constant.let_body, &scope)?;

        let inferred = self.infer(&constant.value, Some(&constant.type_), &scope)?;
        if !self.is_same_type(&constant.type_, &inferred) {
            bail!(
                "Expected `{}` but got `{}` in the body of the const `{}`",
                constant.type_,
                inferred,
                constant.name
            );
        }
        Ok(constant.type_.clone())
    }

    pub(crate) fn validate_let_body(&self, blocks: &[Block], scope: &ScopedValues) -> Result<()> {
        for block in blocks {
            if matches!(block, Block::Function(_) | Block::Const(_)) {
                self.validate(block, scope)?;
            }
        }
        Ok(())
    }

    /// Every fixed type must be a builtin, declared here or reachable through an import.
    fn check_declared_type(&self, ty: &Type) -> Result<()> {
        match ty {
            Type::Generic(_) => Ok(()),
            Type::Fixed(fixed) => {
                if !self.is_known_type(&fixed.name) {
                    bail!(
                        "Cannot find the type `{}`. Did you forget to import it?",
                        fixed.name
                    );
                }
                fixed
                    .args
                    .iter()
                    .try_for_each(|arg| self.check_declared_type(arg))
            }
            Type::Function(function) => function
                .args
                .iter()
                .try_for_each(|arg| self.check_declared_type(arg)),
            Type::ObjectLiteral(literal) => literal
                .properties
                .iter()
                .try_for_each(|property| self.check_declared_type(&property.type_)),
        }
    }

    fn is_known_type(&self, name: &str) -> bool {
        if BUILTIN_TYPES.contains(&name) || matches!(name, "List" | "any") {
            return true;
        }
        if let Some((qualifier, _)) = name.rsplit_once('.') {
            return self
                .imports
                .iter()
                .any(|module| module.local_name() == qualifier || module.name == qualifier);
        }
        self.find_alias(name).is_some()
            || self.find_union(name).is_some()
            || self.find_untagged(name).is_some()
            || self.is_exposed(name)
    }

    pub(crate) fn is_exposed(&self, name: &str) -> bool {
        self.imports
            .iter()
            .any(|module| module.exposing.iter().any(|exposed| exposed == name))
    }

    pub(crate) fn find_alias(&self, name: &str) -> Option<&'a TypeAlias> {
        let name = base_name(name);
        self.typed_blocks.iter().find_map(|block| match block {
            Block::TypeAlias(alias) if alias.type_.name == name => Some(alias),
            _ => None,
        })
    }

    pub(crate) fn find_union(&self, name: &str) -> Option<&'a UnionType> {
        let name = base_name(name);
        self.typed_blocks.iter().find_map(|block| match block {
            Block::UnionType(union) if union.type_.name == name => Some(union),
            _ => None,
        })
    }

    pub(crate) fn find_untagged(&self, name: &str) -> Option<&'a UnionUntaggedType> {
        let name = base_name(name);
        self.typed_blocks.iter().find_map(|block| match block {
            Block::UnionUntaggedType(union) if union.type_.name == name => Some(union),
            _ => None,
        })
    }

    /// The union declaring a tag, and the tag itself.
    pub(crate) fn find_tag(&self, name: &str) -> Option<(&'a UnionType, &'a Tag)> {
        let name = base_name(name);
        self.typed_blocks.iter().find_map(|block| match block {
            Block::UnionType(union) => union
                .tags
                .iter()
                .find(|tag| tag.name == name)
                .map(|tag| (union, tag)),
            _ => None,
        })
    }
}

/// `Maybe.Just` and `Just` refer to the same declaration.
pub(crate) fn base_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

pub fn validate_type(
    block: &Block,
    typed_blocks: &[Block],
    imports: &[ImportModule],
    values_in_scope: &ScopedValues,
) -> Result<Type> {
    TypeChecker::new(typed_blocks, imports).validate(block, values_in_scope)
}

pub fn validate_function(
    function: &Function,
    typed_blocks: &[Block],
    imports: &[ImportModule],
    values_in_scope: &ScopedValues,
) -> Result<Type> {
    TypeChecker::new(typed_blocks, imports).validate_function(function, values_in_scope)
}

pub fn validate_const(
    constant: &Const,
    typed_blocks: &[Block],
    imports: &[ImportModule],
    values_in_scope: &ScopedValues,
) -> Result<Type> {
    TypeChecker::new(typed_blocks, imports).validate_const(constant, values_in_scope)
}

pub fn infer_type(
    expression: &Expression,
    expected: Option<&Type>,
    typed_blocks: &[Block],
    imports: &[ImportModule],
    values_in_scope: &ScopedValues,
) -> Result<Type> {
    TypeChecker::new(typed_blocks, imports).infer(expression, expected, values_in_scope)
}

pub fn validate_all_branches_covered(
    typed_blocks: &[Block],
    predicate_type: &Type,
    branches: &[Branch],
) -> Result<()> {
    TypeChecker::new(typed_blocks, &[]).validate_all_branches_covered(predicate_type, branches)
}

pub fn get_values_in_top_level_scope(blocks: &[Block]) -> ScopedValues {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Function(function) => Some((function.name.clone(), function.type_())),
            Block::Const(constant) => Some((constant.name.clone(), constant.type_.clone())),
            _ => None,
        })
        .collect()
}

/// `scope` extended with a block's arguments and `let` names.
pub fn get_values_in_block_scope(block: &Block, scope: &ScopedValues) -> ScopedValues {
    match block {
        Block::Function(function) => function_scope(function, scope),
        Block::Const(constant) => let_scope(&constant.let_body, scope),
        _ => scope.clone(),
    }
}

fn function_scope(function: &Function, scope: &ScopedValues) -> ScopedValues {
    let mut scope = scope.clone();
    for arg in &function.args {
        scope.insert(arg.name(), arg.type_().clone());
    }
    let_scope(&function.let_body, &scope)
}

pub(crate) fn let_scope(blocks: &[Block], scope: &ScopedValues) -> ScopedValues {
    let mut scope = scope.clone();
    scope.extend(get_values_in_top_level_scope(blocks));
    scope
}
