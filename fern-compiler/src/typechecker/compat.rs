use std::collections::HashMap;

use anyhow::{bail, Result};
use fern_support::join_alternatives;

use super::{base_name, ScopedValues, TypeChecker};
use crate::ast::{ObjectLiteral, TypeAlias};
use crate::types::{FixedType, FunctionType, ObjectLiteralType, Property, Type};

/// Generic name to the type it was resolved to.
pub(crate) type Bindings = HashMap<String, Type>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GenericConflict {
    pub(crate) name: String,
    pub(crate) first: Type,
    pub(crate) second: Type,
}

impl TypeChecker<'_> {
    /// Whether a value of type `actual` can be used where `expected` is declared.
    pub(crate) fn is_same_type(&self, expected: &Type, actual: &Type) -> bool {
        if expected.is_wildcard() || actual.is_wildcard() {
            return true;
        }
        match (expected, actual) {
            (Type::Fixed(expected), Type::Fixed(actual)) => {
                if base_name(&expected.name) != base_name(&actual.name) {
                    return expected.name == "string" && self.find_untagged(&actual.name).is_some();
                }
                expected.args.is_empty()
                    || actual.args.is_empty()
                    || (expected.args.len() == actual.args.len()
                        && expected
                            .args
                            .iter()
                            .zip(&actual.args)
                            .all(|(left, right)| self.is_same_type(left, right)))
            }
            (Type::Function(expected), Type::Function(actual)) => {
                expected.args.len() == actual.args.len()
                    && expected
                        .args
                        .iter()
                        .zip(&actual.args)
                        .all(|(left, right)| self.is_same_type(left, right))
            }
            (Type::ObjectLiteral(expected), Type::ObjectLiteral(actual)) => {
                self.same_properties(&expected.properties, &actual.properties)
            }
            (Type::Fixed(fixed), Type::ObjectLiteral(literal))
            | (Type::ObjectLiteral(literal), Type::Fixed(fixed)) => {
                match self.find_alias(&fixed.name) {
                    Some(alias) => self.same_properties(
                        &alias_properties(alias, &fixed.args),
                        &literal.properties,
                    ),
                    None => false,
                }
            }
            _ => false,
        }
    }

    fn same_properties(&self, expected: &[Property], actual: &[Property]) -> bool {
        expected.len() == actual.len()
            && expected.iter().all(|property| {
                actual
                    .iter()
                    .find(|other| other.name == property.name)
                    .is_some_and(|other| self.is_same_type(&property.type_, &other.type_))
            })
    }

    /// Records what each generic in `declared` resolves to given `actual`.
    pub(crate) fn unify(
        &self,
        declared: &Type,
        actual: &Type,
        bindings: &mut Bindings,
    ) -> Result<(), GenericConflict> {
        match (declared, actual) {
            (Type::Generic(generic), actual) => {
                if actual.is_wildcard() {
                    return Ok(());
                }
                match bindings.get(&generic.name) {
                    Some(existing) if !self.is_same_type(existing, actual) => {
                        Err(GenericConflict {
                            name: generic.name.clone(),
                            first: existing.clone(),
                            second: actual.clone(),
                        })
                    }
                    Some(_) => Ok(()),
                    None => {
                        bindings.insert(generic.name.clone(), actual.clone());
                        Ok(())
                    }
                }
            }
            (Type::Fixed(declared), Type::Fixed(actual))
                if declared.args.len() == actual.args.len() =>
            {
                declared
                    .args
                    .iter()
                    .zip(&actual.args)
                    .try_for_each(|(left, right)| self.unify(left, right, bindings))
            }
            (Type::Function(declared), Type::Function(actual))
                if declared.args.len() == actual.args.len() =>
            {
                declared
                    .args
                    .iter()
                    .zip(&actual.args)
                    .try_for_each(|(left, right)| self.unify(left, right, bindings))
            }
            _ => Ok(()),
        }
    }

    /// Checks an object literal against declared properties. Reports missing, extra
    /// and mismatched properties together, and returns the inferred type of each field.
    pub(crate) fn check_object_literal(
        &self,
        owner: &str,
        owner_type: &Type,
        properties: &[Property],
        literal: &ObjectLiteral,
        scope: &ScopedValues,
    ) -> Result<Vec<Property>> {
        if let Some(base) = &literal.base {
            let base_type = self.infer(base, Some(owner_type), scope)?;
            if !self.is_same_type(owner_type, &base_type) {
                bail!("Cannot spread a `{base_type}` into `{owner}`");
            }
        }

        let missing = if literal.base.is_some() {
            Vec::new()
        } else {
            properties
                .iter()
                .filter(|property| {
                    !literal
                        .fields
                        .iter()
                        .any(|field| field.name == property.name)
                })
                .map(|property| format!("`{}`", property.name))
                .collect::<Vec<_>>()
        };

        let extra = literal
            .fields
            .iter()
            .filter(|field| !properties.iter().any(|property| property.name == field.name))
            .map(|field| format!("`{}`", field.name))
            .collect::<Vec<_>>();

        let mut mismatched = Vec::new();
        let mut inferred = Vec::new();
        for property in properties {
            let field = literal
                .fields
                .iter()
                .find(|field| field.name == property.name);
            let Some(field) = field else {
                continue;
            };
            let actual = self.infer(&field.value, Some(&property.type_), scope)?;
            if !self.is_same_type(&property.type_, &actual) {
                mismatched.push(format!(
                    "`{}` expected `{}` but got `{}`",
                    property.name, property.type_, actual
                ));
            }
            inferred.push(Property::new(property.name.clone(), actual));
        }

        let mut messages = Vec::new();
        if !missing.is_empty() {
            messages.push(format!(
                "The following properties were missing from `{owner}`: {}",
                join_alternatives(&missing)
            ));
        }
        if !extra.is_empty() {
            messages.push(format!(
                "The following properties are not part of `{owner}`: {}",
                join_alternatives(&extra)
            ));
        }
        if !mismatched.is_empty() {
            messages.push(format!(
                "Mismatching property types for `{owner}`: {}",
                join_alternatives(&mismatched)
            ));
        }
        if !messages.is_empty() {
            bail!(messages.join("\n"));
        }
        Ok(inferred)
    }
}

/// Replaces resolved generics throughout `ty`.
pub(crate) fn substitute(ty: &Type, bindings: &Bindings) -> Type {
    match ty {
        Type::Generic(generic) => bindings
            .get(&generic.name)
            .cloned()
            .unwrap_or_else(|| ty.clone()),
        Type::Fixed(fixed) => Type::Fixed(FixedType {
            name: fixed.name.clone(),
            args: fixed.args.iter().map(|arg| substitute(arg, bindings)).collect(),
        }),
        Type::Function(function) => Type::Function(FunctionType {
            args: function.args.iter().map(|arg| substitute(arg, bindings)).collect(),
        }),
        Type::ObjectLiteral(literal) => Type::ObjectLiteral(ObjectLiteralType {
            properties: literal
                .properties
                .iter()
                .map(|property| {
                    Property::new(property.name.clone(), substitute(&property.type_, bindings))
                })
                .collect(),
        }),
    }
}

/// An alias's properties with its generics replaced by `args`.
pub(crate) fn alias_properties(alias: &TypeAlias, args: &[Type]) -> Vec<Property> {
    let bindings = alias
        .type_
        .generic_names()
        .into_iter()
        .zip(args)
        .map(|(name, arg)| (name.to_string(), arg.clone()))
        .collect::<Bindings>();
    alias
        .properties
        .iter()
        .map(|property| {
            Property::new(property.name.clone(), substitute(&property.type_, &bindings))
        })
        .collect()
}
