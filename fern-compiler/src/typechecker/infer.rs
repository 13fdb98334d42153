use anyhow::{bail, Result};

use super::compat::{alias_properties, substitute, Bindings};
use super::{base_name, let_scope, ScopedValues, TypeChecker};
use crate::ast::{
    BinaryExpression, BinaryOperator, BranchPattern, CaseStatement, Constructor, Expression,
    FunctionCall, IfStatement, Lambda, LambdaCall, ListDestructurePart, ListPrepend, ListValue,
    ModuleReference, ObjectLiteral, Value,
};
use crate::formatter::render_expression;
use crate::lexer::is_number;
use crate::types::{FixedType, ObjectLiteralType, Property, Type};

impl TypeChecker<'_> {
    /// Infers the type of `expression`. `expected` is a hint from the surrounding
    /// declaration; it selects aliases for object literals and element types for lists.
    pub fn infer(
        &self,
        expression: &Expression,
        expected: Option<&Type>,
        scope: &ScopedValues,
    ) -> Result<Type> {
        let expected = expected.filter(|ty| !ty.is_wildcard());
        match expression {
            Expression::Value(value) => Ok(value_type(value, scope)),
            Expression::StringValue(value) => self.infer_string(&value.body, expected),
            Expression::FormatStringValue(_) => Ok(Type::string()),
            Expression::ListValue(list) => self.infer_list(list, expected, scope),
            Expression::ListRange(range) => {
                for bound in [&range.start, &range.end] {
                    let bound_type = value_type(bound, scope);
                    if !bound_type.is_wildcard() && !bound_type.is_named("number") {
                        bail!(
                            "List ranges must be between numbers but `{}` is a `{}`",
                            bound.body,
                            bound_type
                        );
                    }
                }
                Ok(Type::list(Type::number()))
            }
            Expression::ObjectLiteral(literal) => {
                self.infer_object_literal(literal, expected, scope)
            }
            Expression::IfStatement(statement) => self.infer_if(statement, expected, scope),
            Expression::CaseStatement(statement) => self.infer_case(statement, expected, scope),
            Expression::Operator(operation) => self.infer_operator(operation, scope),
            Expression::ListPrepend(prepend) => self.infer_prepend(prepend, expected, scope),
            Expression::LeftPipe(pipe) => {
                let call = pipe_into(&pipe.right, &pipe.left)?;
                self.infer(&call, expected, scope)
            }
            Expression::RightPipe(pipe) => {
                let call = pipe_into(&pipe.left, &pipe.right)?;
                self.infer(&call, expected, scope)
            }
            Expression::ModuleReference(reference) => {
                self.infer_module_reference(reference, expected, scope)
            }
            Expression::FunctionCall(call) => self.infer_function_call(call, scope),
            Expression::Constructor(constructor) => {
                self.infer_constructor(constructor, expected, scope, false)
            }
            Expression::Lambda(lambda) => self.infer_lambda(lambda, expected, scope),
            Expression::LambdaCall(call) => self.infer_lambda_call(call, scope),
        }
    }

    fn infer_string(&self, body: &str, expected: Option<&Type>) -> Result<Type> {
        if let Some(Type::Fixed(fixed)) = expected {
            if let Some(union) = self.find_untagged(&fixed.name) {
                if union.values.iter().any(|value| value.body == body) {
                    return Ok(fixed.to_type());
                }
                let valid = union
                    .values
                    .iter()
                    .map(|value| format!("\"{}\"", value.body))
                    .collect::<Vec<_>>();
                bail!(
                    "Expected `{}`, composed of {}, but got \"{}\"",
                    fixed.name,
                    fern_support::join_alternatives(&valid),
                    body
                );
            }
        }
        Ok(Type::string())
    }

    fn infer_list(
        &self,
        list: &ListValue,
        expected: Option<&Type>,
        scope: &ScopedValues,
    ) -> Result<Type> {
        let hint = expected
            .and_then(Type::list_element)
            .filter(|element| !element.is_wildcard());
        let mut element: Option<Type> = None;
        for item in &list.items {
            let item_type = self.infer(item, hint.or(element.as_ref()), scope)?;
            if let Some(existing) = &element {
                if !self.is_same_type(existing, &item_type) {
                    bail!("Mixed types in list: `{existing}` and `{item_type}`");
                }
            }
            if element.as_ref().map_or(true, Type::is_wildcard) {
                element = Some(item_type);
            }
        }
        let element = element
            .or_else(|| hint.cloned())
            .unwrap_or_else(Type::any);
        Ok(Type::list(element))
    }

    fn infer_object_literal(
        &self,
        literal: &ObjectLiteral,
        expected: Option<&Type>,
        scope: &ScopedValues,
    ) -> Result<Type> {
        match expected {
            Some(Type::Fixed(fixed)) => {
                if let Some(alias) = self.find_alias(&fixed.name) {
                    let properties = alias_properties(alias, &fixed.args);
                    let owner = fixed.to_type();
                    self.check_object_literal(&fixed.name, &owner, &properties, literal, scope)?;
                    return Ok(owner);
                }
            }
            Some(Type::ObjectLiteral(shape)) => {
                let owner = Type::ObjectLiteral(shape.clone());
                let name = owner.to_string();
                self.check_object_literal(&name, &owner, &shape.properties, literal, scope)?;
                return Ok(owner);
            }
            _ => {}
        }

        let mut properties = match &literal.base {
            Some(base) => match self.infer(base, None, scope)? {
                Type::ObjectLiteral(shape) => shape.properties,
                Type::Fixed(fixed) => match self.find_alias(&fixed.name) {
                    Some(alias) => alias_properties(alias, &fixed.args),
                    None => Vec::new(),
                },
                _ => Vec::new(),
            },
            None => Vec::new(),
        };
        for field in &literal.fields {
            let field_type = self.infer(&field.value, None, scope)?;
            match properties.iter_mut().find(|property| property.name == field.name) {
                Some(property) => property.type_ = field_type,
                None => properties.push(Property::new(field.name.clone(), field_type)),
            }
        }
        Ok(Type::ObjectLiteral(ObjectLiteralType { properties }))
    }

    fn infer_if(
        &self,
        statement: &IfStatement,
        expected: Option<&Type>,
        scope: &ScopedValues,
    ) -> Result<Type> {
        let predicate = self.infer(&statement.predicate, Some(&Type::boolean()), scope)?;
        if !self.is_same_type(&Type::boolean(), &predicate) {
            bail!("The predicate of an `if` must be a `boolean` but got `{predicate}`");
        }

        let if_scope = let_scope(&statement.if_let_body, scope);
        self.validate_let_body(&statement.if_let_body, &if_scope)?;
        let then_type = self.infer(&statement.if_body, expected, &if_scope)?;

        let else_scope = let_scope(&statement.else_let_body, scope);
        self.validate_let_body(&statement.else_let_body, &else_scope)?;
        let else_type = self.infer(
            &statement.else_body,
            expected.or(Some(&then_type)),
            &else_scope,
        )?;

        if !self.is_same_type(&then_type, &else_type) {
            bail!(
                "The branches of an `if` must have the same type but got `{then_type}` and `{else_type}`"
            );
        }
        Ok(if then_type.is_wildcard() {
            else_type
        } else {
            then_type
        })
    }

    fn infer_case(
        &self,
        statement: &CaseStatement,
        expected: Option<&Type>,
        scope: &ScopedValues,
    ) -> Result<Type> {
        let predicate = self.infer(&statement.predicate, None, scope)?;
        self.validate_all_branches_covered(&predicate, &statement.branches)?;

        let mut result: Option<Type> = None;
        for branch in &statement.branches {
            let mut branch_scope = scope.clone();
            self.bind_pattern(&branch.pattern, &predicate, &mut branch_scope)?;
            let branch_scope = let_scope(&branch.let_body, &branch_scope);
            self.validate_let_body(&branch.let_body, &branch_scope)?;

            let hint = expected.or(result.as_ref());
            let branch_type = self.infer(&branch.body, hint, &branch_scope)?;
            if let Some(existing) = &result {
                if !self.is_same_type(existing, &branch_type) {
                    bail!(
                        "The branches of a `case` must have the same type but got `{existing}` and `{branch_type}`"
                    );
                }
            }
            if result.as_ref().map_or(true, Type::is_wildcard) {
                result = Some(branch_type);
            }
        }
        Ok(result.unwrap_or_else(Type::any))
    }

    /// Adds the names a branch pattern binds to `scope`.
    fn bind_pattern(
        &self,
        pattern: &BranchPattern,
        predicate: &Type,
        scope: &mut ScopedValues,
    ) -> Result<()> {
        match pattern {
            BranchPattern::Destructure(destructure) => self.bind_destructure(
                &destructure.constructor,
                &destructure.bindings,
                predicate,
                scope,
            ),
            BranchPattern::ListDestructure(list) => {
                let element = predicate.list_element().cloned().unwrap_or_else(Type::any);
                let last = list.parts.len().saturating_sub(1);
                for (index, part) in list.parts.iter().enumerate() {
                    match part {
                        ListDestructurePart::Value(value) if index == last => {
                            scope.insert(value.body.clone(), Type::list(element.clone()));
                        }
                        ListDestructurePart::Value(value) => {
                            scope.insert(value.body.clone(), element.clone());
                        }
                        ListDestructurePart::Destructure(destructure) => self.bind_destructure(
                            &destructure.constructor,
                            &destructure.bindings,
                            &element,
                            scope,
                        )?,
                        ListDestructurePart::EmptyList
                        | ListDestructurePart::StringValue(_)
                        | ListDestructurePart::FormatStringValue(_) => {}
                    }
                }
                Ok(())
            }
            BranchPattern::StringValue(_)
            | BranchPattern::FormatStringValue(_)
            | BranchPattern::EmptyList
            | BranchPattern::Default => Ok(()),
        }
    }

    fn bind_destructure(
        &self,
        constructor: &str,
        names: &[String],
        predicate: &Type,
        scope: &mut ScopedValues,
    ) -> Result<()> {
        let Some((union, tag)) = self.find_tag(constructor) else {
            for name in names {
                scope.insert(name.clone(), Type::any());
            }
            return Ok(());
        };

        let mut bindings = Bindings::new();
        if let Type::Fixed(fixed) = predicate {
            if base_name(&fixed.name) == union.type_.name {
                for (name, arg) in union.type_.generic_names().into_iter().zip(&fixed.args) {
                    bindings.insert(name.to_string(), arg.clone());
                }
            }
        }

        for name in names {
            let Some(arg) = tag.args.iter().find(|arg| &arg.name == name) else {
                bail!("`{}` is not a property of the tag `{}`", name, tag.name);
            };
            scope.insert(name.clone(), substitute(&arg.type_, &bindings));
        }
        Ok(())
    }

    fn infer_operator(&self, operation: &BinaryExpression, scope: &ScopedValues) -> Result<Type> {
        let symbol = operation.operator.symbol();
        match operation.operator {
            BinaryOperator::Add => {
                let left = self.infer(&operation.left, None, scope)?;
                let right = self.infer(&operation.right, None, scope)?;
                if left.is_wildcard() {
                    return Ok(right);
                }
                if right.is_wildcard() || self.is_same_type(&left, &right) {
                    return Ok(left);
                }
                let mixes_text_and_numbers = (left.is_named("string") && right.is_named("number"))
                    || (left.is_named("number") && right.is_named("string"));
                if mixes_text_and_numbers {
                    bail!(
                        "Mismatching types between the left `{left}` and right `{right}` of the addition operator.\nTry using a format string instead, for example `{}`",
                        format_string_example(operation)
                    );
                }
                bail!(
                    "Mismatching types between the left `{left}` and right `{right}` of the addition operator"
                )
            }
            BinaryOperator::Subtract
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Mod => {
                self.expect_both(operation, &Type::number(), scope)?;
                Ok(Type::number())
            }
            BinaryOperator::And | BinaryOperator::Or => {
                self.expect_both(operation, &Type::boolean(), scope)?;
                Ok(Type::boolean())
            }
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => {
                let left = self.infer(&operation.left, None, scope)?;
                let right = self.infer(&operation.right, Some(&left), scope)?;
                if !self.is_same_type(&left, &right) {
                    bail!("Cannot compare `{left}` with `{right}` using `{symbol}`");
                }
                Ok(Type::boolean())
            }
        }
    }

    fn expect_both(
        &self,
        operation: &BinaryExpression,
        expected: &Type,
        scope: &ScopedValues,
    ) -> Result<()> {
        let left = self.infer(&operation.left, Some(expected), scope)?;
        let right = self.infer(&operation.right, Some(expected), scope)?;
        if !self.is_same_type(expected, &left) || !self.is_same_type(expected, &right) {
            bail!(
                "Expected `{expected}` on both sides of `{}` but got `{left}` and `{right}`",
                operation.operator.symbol()
            );
        }
        Ok(())
    }

    fn infer_prepend(
        &self,
        prepend: &ListPrepend,
        expected: Option<&Type>,
        scope: &ScopedValues,
    ) -> Result<Type> {
        let list = self.infer(&prepend.right, expected, scope)?;
        let hint = list
            .list_element()
            .or_else(|| expected.and_then(Type::list_element))
            .cloned();
        let item = self.infer(&prepend.left, hint.as_ref(), scope)?;
        if list.is_wildcard() {
            return Ok(Type::list(item));
        }
        let Some(element) = list.list_element() else {
            bail!("Expected a list on the right of `::` but got `{list}`");
        };
        if !self.is_same_type(element, &item) {
            bail!("Cannot prepend `{item}` to `{list}`");
        }
        Ok(if element.is_wildcard() {
            Type::list(item)
        } else {
            list.clone()
        })
    }

    fn infer_module_reference(
        &self,
        reference: &ModuleReference,
        expected: Option<&Type>,
        scope: &ScopedValues,
    ) -> Result<Type> {
        let Some((head, rest)) = reference.path.split_first() else {
            return self.infer(&reference.value, expected, scope);
        };

        if let Some(head_type) = scope.get(head) {
            let mut current = head_type.clone();
            for segment in rest {
                current = self.property_type(&current, segment)?;
            }
            return match reference.value.as_ref() {
                Expression::Value(value) => self.property_type(&current, &value.body),
                Expression::FunctionCall(call) => {
                    let function = self.property_type(&current, &call.name)?;
                    self.apply(&call.name, &function, &call.args, scope)
                }
                other => {
                    self.infer(other, expected, scope)?;
                    Ok(Type::any())
                }
            };
        }

        match reference.value.as_ref() {
            Expression::Constructor(constructor) => {
                self.infer_constructor(constructor, expected, scope, true)
            }
            Expression::FunctionCall(call) => {
                for arg in &call.args {
                    self.infer(arg, None, scope)?;
                }
                Ok(Type::any())
            }
            _ => Ok(Type::any()),
        }
    }

    /// The type of `owner.name`.
    fn property_type(&self, owner: &Type, name: &str) -> Result<Type> {
        if owner.is_wildcard() {
            return Ok(Type::any());
        }
        let properties = match owner {
            Type::ObjectLiteral(shape) => shape.properties.clone(),
            Type::Fixed(fixed) => match self.find_alias(&fixed.name) {
                Some(alias) => alias_properties(alias, &fixed.args),
                None => bail!("Cannot access `{name}` on `{owner}`"),
            },
            _ => bail!("Cannot access `{name}` on `{owner}`"),
        };
        match properties.into_iter().find(|property| property.name == name) {
            Some(property) => Ok(property.type_),
            None => bail!("`{name}` is not a property of `{owner}`"),
        }
    }

    fn infer_function_call(&self, call: &FunctionCall, scope: &ScopedValues) -> Result<Type> {
        match scope.get(&call.name) {
            Some(function) => self.apply(&call.name, function, &call.args, scope),
            None => {
                for arg in &call.args {
                    self.infer(arg, None, scope)?;
                }
                Ok(Type::any())
            }
        }
    }

    /// Applies `args` to a function type, returning the remaining curried type when
    /// fewer arguments than parameters are given.
    fn apply(
        &self,
        name: &str,
        callee: &Type,
        args: &[Expression],
        scope: &ScopedValues,
    ) -> Result<Type> {
        let Type::Function(function) = callee else {
            if callee.is_wildcard() {
                for arg in args {
                    self.infer(arg, None, scope)?;
                }
                return Ok(Type::any());
            }
            bail!("`{name}` is a `{callee}` and cannot be called with arguments");
        };

        let parameters = function.parameters();
        if args.len() > parameters.len() {
            bail!(
                "Too many arguments for `{name}`: expected {} but got {}",
                parameters.len(),
                args.len()
            );
        }

        let mut bindings = Bindings::new();
        for (index, (arg, parameter)) in args.iter().zip(parameters).enumerate() {
            let expected = substitute(parameter, &bindings);
            let actual = self.infer(arg, Some(&expected), scope)?;
            if !self.is_same_type(&expected, &actual) {
                bail!(
                    "Argument {} of `{name}` should be `{expected}` but got `{actual}`",
                    index + 1
                );
            }
            if let Err(conflict) = self.unify(parameter, &actual, &mut bindings) {
                bail!(
                    "Conflicting types for `{}` in `{name}`: `{}` and `{}`",
                    conflict.name,
                    conflict.first,
                    conflict.second
                );
            }
        }

        let mut remaining = function.args[args.len()..]
            .iter()
            .map(|ty| substitute(ty, &bindings))
            .collect::<Vec<_>>();
        Ok(if remaining.len() == 1 {
            remaining.remove(0)
        } else {
            Type::function(remaining)
        })
    }

    fn infer_constructor(
        &self,
        constructor: &Constructor,
        expected: Option<&Type>,
        scope: &ScopedValues,
        qualified: bool,
    ) -> Result<Type> {
        let Some((union, tag)) = self.find_tag(&constructor.constructor) else {
            for field in &constructor.pattern.fields {
                self.infer(&field.value, None, scope)?;
            }
            if qualified || self.is_exposed(base_name(&constructor.constructor)) {
                return Ok(Type::any());
            }
            bail!(
                "Could not find a constructor named `{}`. Did you forget to import it?",
                constructor.constructor
            );
        };

        let declared = tag
            .args
            .iter()
            .map(|arg| Property::new(arg.name.clone(), arg.type_.clone()))
            .collect::<Vec<_>>();
        let union_type = union.type_.to_type();
        let inferred = self.check_object_literal(
            &tag.name,
            &union_type,
            &declared,
            &constructor.pattern,
            scope,
        )?;

        let mut bindings = Bindings::new();
        for property in &inferred {
            let Some(declared_property) = declared
                .iter()
                .find(|declared_property| declared_property.name == property.name)
            else {
                continue;
            };
            let unified = self.unify(&declared_property.type_, &property.type_, &mut bindings);
            if let Err(conflict) = unified {
                bail!(
                    "Conflicting types for `{}` in `{}`: `{}` and `{}`",
                    conflict.name,
                    tag.name,
                    conflict.first,
                    conflict.second
                );
            }
        }

        let hinted: &[Type] = match expected {
            Some(Type::Fixed(fixed))
                if base_name(&fixed.name) == union.type_.name
                    && fixed.args.len() == union.type_.args.len() =>
            {
                fixed.args.as_slice()
            }
            _ => &[],
        };
        let args = union
            .type_
            .args
            .iter()
            .enumerate()
            .map(|(index, arg)| match substitute(arg, &bindings) {
                Type::Generic(_) if index < hinted.len() => hinted[index].clone(),
                resolved => resolved,
            })
            .collect();
        Ok(Type::Fixed(FixedType {
            name: union.type_.name.clone(),
            args,
        }))
    }

    fn infer_lambda(
        &self,
        lambda: &Lambda,
        expected: Option<&Type>,
        scope: &ScopedValues,
    ) -> Result<Type> {
        let (parameters, return_hint) = match expected {
            Some(Type::Function(function)) if function.parameters().len() == lambda.args.len() => {
                (function.parameters().to_vec(), Some(function.return_type()))
            }
            _ => (vec![Type::any(); lambda.args.len()], None),
        };

        let mut lambda_scope = scope.clone();
        for (name, parameter) in lambda.args.iter().zip(&parameters) {
            lambda_scope.insert(name.clone(), parameter.clone());
        }
        let body = self.infer(&lambda.body, return_hint.as_ref(), &lambda_scope)?;

        let mut args = parameters;
        args.push(body);
        Ok(Type::function(args))
    }

    fn infer_lambda_call(&self, call: &LambdaCall, scope: &ScopedValues) -> Result<Type> {
        let arg_types = call
            .args
            .iter()
            .map(|arg| self.infer(arg, None, scope))
            .collect::<Result<Vec<_>>>()?;
        let mut hint = (0..call.lambda.args.len())
            .map(|index| arg_types.get(index).cloned().unwrap_or_else(Type::any))
            .collect::<Vec<_>>();
        hint.push(Type::any());

        let function = self.infer_lambda(&call.lambda, Some(&Type::function(hint)), scope)?;
        self.apply("lambda", &function, &call.args, scope)
    }
}

fn value_type(value: &Value, scope: &ScopedValues) -> Type {
    match value.body.as_str() {
        "true" | "false" => Type::boolean(),
        body if is_number(body) => Type::number(),
        body => scope.get(body).cloned().unwrap_or_else(Type::any),
    }
}

/// Rewrites `argument |> target` into a call with `argument` as the final argument.
fn pipe_into(target: &Expression, argument: &Expression) -> Result<Expression> {
    let call = match target {
        Expression::FunctionCall(call) => {
            let mut call = call.clone();
            call.args.push(argument.clone());
            Expression::FunctionCall(call)
        }
        Expression::Value(value) if !is_number(&value.body) => {
            Expression::FunctionCall(FunctionCall {
                name: value.body.clone(),
                args: vec![argument.clone()],
            })
        }
        Expression::ModuleReference(reference) => Expression::ModuleReference(ModuleReference {
            path: reference.path.clone(),
            value: Box::new(pipe_into(&reference.value, argument)?),
        }),
        Expression::Lambda(lambda) => Expression::LambdaCall(LambdaCall {
            lambda: lambda.clone(),
            args: vec![argument.clone()],
        }),
        Expression::LambdaCall(call) => {
            let mut call = call.clone();
            call.args.push(argument.clone());
            Expression::LambdaCall(call)
        }
        other => bail!(
            "Cannot pipe `{}` into `{}`",
            render_expression(argument),
            render_expression(other)
        ),
    };
    Ok(call)
}

/// `"a" + 1` suggests `"a${1}"`.
fn format_string_example(operation: &BinaryExpression) -> String {
    fn part(expression: &Expression) -> String {
        match expression {
            Expression::StringValue(value) => value.body.clone(),
            Expression::FormatStringValue(value) => value.body.clone(),
            Expression::Operator(operation) if operation.operator == BinaryOperator::Add => {
                format!("{}{}", part(&operation.left), part(&operation.right))
            }
            other => format!("${{{}}}", render_expression(other)),
        }
    }
    format!("{}{}", part(&operation.left), part(&operation.right))
}
