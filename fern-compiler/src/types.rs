use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::error::Depth;
use crate::lexer::{strip_comments, tokenize, tokenize_type_with_depth, Token, TypeToken};

pub const BUILTIN_TYPES: &[&str] = &["boolean", "number", "string"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericType {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedType {
    pub name: String,
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionType {
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLiteralType {
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: Type,
}

impl Property {
    pub fn new(name: impl Into<String>, type_: Type) -> Self {
        Self {
            name: name.into(),
            type_,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Type {
    Generic(GenericType),
    Fixed(FixedType),
    Function(FunctionType),
    /// Inferred shape of a record literal that has not been matched against an alias.
    ObjectLiteral(ObjectLiteralType),
}

impl Type {
    pub fn generic(name: impl Into<String>) -> Self {
        Type::Generic(GenericType { name: name.into() })
    }

    pub fn fixed(name: impl Into<String>, args: Vec<Type>) -> Self {
        Type::Fixed(FixedType {
            name: name.into(),
            args,
        })
    }

    pub fn any() -> Self {
        Type::fixed("any", Vec::new())
    }

    pub fn number() -> Self {
        Type::fixed("number", Vec::new())
    }

    pub fn string() -> Self {
        Type::fixed("string", Vec::new())
    }

    pub fn boolean() -> Self {
        Type::fixed("boolean", Vec::new())
    }

    pub fn list(element: Type) -> Self {
        Type::fixed("List", vec![element])
    }

    pub fn function(args: Vec<Type>) -> Self {
        Type::Function(FunctionType { args })
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Fixed(fixed) if fixed.name == "any")
    }

    /// `any` and generics unify with everything.
    pub fn is_wildcard(&self) -> bool {
        self.is_any() || matches!(self, Type::Generic(_))
    }

    pub fn is_named(&self, name: &str) -> bool {
        matches!(self, Type::Fixed(fixed) if fixed.name == name)
    }

    /// Element type of a `List`, if this is one.
    pub fn list_element(&self) -> Option<&Type> {
        match self {
            Type::Fixed(fixed) if fixed.name == "List" => fixed.args.first(),
            _ => None,
        }
    }
}

impl FixedType {
    pub fn to_type(&self) -> Type {
        Type::Fixed(self.clone())
    }

    /// Names of the generic parameters, in declaration order.
    pub fn generic_names(&self) -> Vec<&str> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                Type::Generic(generic) => Some(generic.name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl FunctionType {
    pub fn return_type(&self) -> Type {
        self.args.last().cloned().unwrap_or_else(Type::any)
    }

    pub fn parameters(&self) -> &[Type] {
        match self.args.split_last() {
            Some((_, parameters)) => parameters,
            None => &[],
        }
    }
}

fn needs_brackets_as_argument(ty: &Type) -> bool {
    match ty {
        Type::Fixed(fixed) => !fixed.args.is_empty(),
        Type::Function(_) => true,
        _ => false,
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Generic(generic) => write!(f, "{}", generic.name),
            Type::Fixed(fixed) => {
                write!(f, "{}", fixed.name)?;
                for arg in &fixed.args {
                    if needs_brackets_as_argument(arg) {
                        write!(f, " ({arg})")?;
                    } else {
                        write!(f, " {arg}")?;
                    }
                }
                Ok(())
            }
            Type::Function(function) => {
                let parts = function
                    .args
                    .iter()
                    .map(|arg| match arg {
                        Type::Function(_) => format!("({arg})"),
                        _ => arg.to_string(),
                    })
                    .collect::<Vec<_>>();
                write!(f, "{}", parts.join(" -> "))
            }
            Type::ObjectLiteral(object) => {
                if object.properties.is_empty() {
                    return write!(f, "{{}}");
                }
                let properties = object
                    .properties
                    .iter()
                    .map(|property| format!("{}: {}", property.name, property.type_))
                    .collect::<Vec<_>>();
                write!(f, "{{ {} }}", properties.join(", "))
            }
        }
    }
}

fn type_from_name(name: &str, args: Vec<Type>) -> Result<Type> {
    if name == "any" {
        return Ok(Type::any());
    }

    let starts_lowercase = name.chars().next().is_some_and(char::is_lowercase);
    if starts_lowercase && !BUILTIN_TYPES.contains(&name) {
        if !args.is_empty() {
            bail!("The generic type `{name}` cannot take type arguments");
        }
        return Ok(Type::generic(name));
    }

    if name == "List" && args.len() > 1 {
        bail!(
            "`List` takes a single type argument but was given {}",
            args.len()
        );
    }

    Ok(Type::fixed(name, args))
}

pub fn parse_type_token(token: &TypeToken) -> Result<Type> {
    match token {
        TypeToken::Identifier { name } => type_from_name(name, Vec::new()),
        TypeToken::Base { body } => {
            let Some((head, rest)) = body.split_first() else {
                bail!("Expected a type but found nothing");
            };
            match head {
                TypeToken::Identifier { name } => {
                    let args = rest.iter().map(parse_type_token).collect::<Result<Vec<_>>>()?;
                    type_from_name(name, args)
                }
                nested if rest.is_empty() => parse_type_token(nested),
                _ => bail!("Expected a type name at the start of a type"),
            }
        }
        TypeToken::Function { body } => {
            let args = body.iter().map(parse_type_token).collect::<Result<Vec<_>>>()?;
            Ok(Type::function(args))
        }
    }
}

/// Parses every root of a tokenized signature: `a -> b -> c` gives three types.
pub(crate) fn parse_type_roots(tokens: &[Token], depth: Depth) -> Result<Vec<Type>> {
    tokenize_type_with_depth(tokens, depth)?
        .iter()
        .map(parse_type_token)
        .collect()
}

/// A single type from a token slice; a top-level arrow chain becomes a function type.
pub(crate) fn parse_type_tokens(tokens: &[Token], depth: Depth) -> Result<Type> {
    let mut roots = parse_type_roots(tokens, depth)?;
    if roots.len() == 1 {
        Ok(roots.remove(0))
    } else {
        Ok(Type::function(roots))
    }
}

pub fn parse_type(text: &str) -> Result<Type> {
    let tokens = strip_comments(tokenize(text));
    parse_type_tokens(&tokens, Depth::default())
}
