//! Rendering a parsed module and parsing it again yields the same tree.

use fern_compiler::{
    parse, parse_expression, render_expression, render_module, BinaryOperator, Constructor,
    Expression, Field, FormatStringValue, FunctionCall, Lambda, LambdaCall, ListPrepend,
    ListRange, ListValue, ModuleReference, ObjectLiteral, Pipe, Value, KEYWORDS,
};
use proptest::collection::vec;
use proptest::option;
use proptest::prelude::*;

const PROGRAM: &str = "\
import \"./Maybe\" as M exposing (Maybe, Just, Nothing)
import List

exposing (describe, greet)

-- colours we know about
type Color =
    Red
    | Green
    | Blue

type Animal =
    \"cat\"
    | \"dog\"

type alias Person = {
    name: string,
    age: number
}

describe: Color -> string
describe color =
    case color of
        Red ->
            \"red\"
        default ->
            \"other\"

greet: Person -> string
greet person =
    let
        prefix: string
        prefix = \"Hello \"
    in
    prefix + person.name

older: Person -> Person
older person = { ...person, age: (person.age + 1) }

total: List number -> number
total xs =
    case xs of
        [] ->
            0
        x :: rest ->
            x + total rest
        default ->
            0

label: number -> string
label n =
    if n > 10 then \"big\" else \"small\"

wrap: number -> Maybe number
wrap n =
    M.Just { value: n }

doubled: List number -> List number
doubled xs =
    xs |> List.map (\\x -> x * 2)
";

#[test]
fn a_module_survives_rendering() {
    let first = parse(PROGRAM, "Main");
    assert!(first.errors.is_empty(), "{:#?}", first.errors);

    let rendered = render_module(&first);
    let second = parse(&rendered, "Main");
    assert!(second.errors.is_empty(), "{rendered}\n{:#?}", second.errors);
    assert_eq!(first.body, second.body, "{rendered}");
}

#[test]
fn rendering_is_stable() {
    let once = render_module(&parse(PROGRAM, "Main"));
    let twice = render_module(&parse(&once, "Main"));
    assert_eq!(once, twice);
}

#[test]
fn multi_line_expressions_survive_rendering() -> anyhow::Result<()> {
    let sources = [
        "if a then\n    1\nelse if b then\n    2\nelse\n    3",
        "case x of\n    Just { value } ->\n        value\n    Nothing ->\n        0",
        "case name of\n    \"a\" ->\n        1\n    `b` ->\n        2\n    default ->\n        3",
    ];
    for source in sources {
        let parsed = parse_expression(source)?;
        let rendered = render_expression(&parsed);
        assert_eq!(parse_expression(&rendered)?, parsed, "{rendered}");
    }
    Ok(())
}

// ==== Generated expressions ====

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,4}".prop_filter("keywords are not identifiers", |name| {
        !KEYWORDS.contains(&name.as_str()) && name != "true" && name != "false"
    })
}

fn tag_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,4}"
}

fn operator() -> impl Strategy<Value = BinaryOperator> {
    prop_oneof![
        Just(BinaryOperator::Add),
        Just(BinaryOperator::Subtract),
        Just(BinaryOperator::Multiply),
        Just(BinaryOperator::Divide),
        Just(BinaryOperator::Mod),
        Just(BinaryOperator::Equal),
        Just(BinaryOperator::NotEqual),
        Just(BinaryOperator::LessThan),
        Just(BinaryOperator::LessThanOrEqual),
        Just(BinaryOperator::GreaterThan),
        Just(BinaryOperator::GreaterThanOrEqual),
        Just(BinaryOperator::And),
        Just(BinaryOperator::Or),
    ]
}

fn leaf() -> impl Strategy<Value = Expression> {
    prop_oneof![
        identifier().prop_map(Expression::value),
        "[0-9]{1,3}".prop_map(Expression::value),
        "[a-z ]{0,6}".prop_map(Expression::string),
        "[a-z ]{0,6}".prop_map(|body| Expression::FormatStringValue(FormatStringValue { body })),
        tag_name().prop_map(|constructor| Expression::Constructor(Constructor {
            constructor,
            pattern: ObjectLiteral::default(),
        })),
        (tag_name(), identifier()).prop_map(|(module, name)| {
            Expression::ModuleReference(ModuleReference {
                path: vec![module],
                value: Box::new(Expression::value(name)),
            })
        }),
        ("[0-9]{1,2}", identifier()).prop_map(|(start, end)| {
            Expression::ListRange(ListRange {
                start: Value { body: start },
                end: Value { body: end },
            })
        }),
    ]
}

fn fields(
    inner: impl Strategy<Value = Expression> + Clone,
    size: std::ops::Range<usize>,
) -> impl Strategy<Value = Vec<Field>> {
    vec((identifier(), inner), size)
        .prop_map(|fields| {
            fields
                .into_iter()
                .map(|(name, value)| Field { name, value })
                .collect()
        })
}

fn expression() -> impl Strategy<Value = Expression> {
    leaf().prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            (operator(), inner.clone(), inner.clone())
                .prop_map(|(operator, left, right)| Expression::binary(operator, left, right)),
            (inner.clone(), inner.clone()).prop_map(|(left, right)| {
                Expression::ListPrepend(ListPrepend {
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }),
            (inner.clone(), inner.clone()).prop_map(|(left, right)| {
                Expression::LeftPipe(Pipe {
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }),
            (inner.clone(), inner.clone()).prop_map(|(left, right)| {
                Expression::RightPipe(Pipe {
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }),
            (identifier(), vec(inner.clone(), 1..3))
                .prop_map(|(name, args)| Expression::FunctionCall(FunctionCall { name, args })),
            (tag_name(), identifier(), vec(inner.clone(), 1..3)).prop_map(|(module, name, args)| {
                Expression::ModuleReference(ModuleReference {
                    path: vec![module],
                    value: Box::new(Expression::FunctionCall(FunctionCall { name, args })),
                })
            }),
            vec(inner.clone(), 0..3).prop_map(|items| Expression::ListValue(ListValue { items })),
            (option::of(identifier()), fields(inner.clone(), 0..3)).prop_map(|(base, fields)| {
                Expression::ObjectLiteral(ObjectLiteral {
                    base: base.map(|base| Box::new(Expression::value(base))),
                    fields,
                })
            }),
            (tag_name(), fields(inner.clone(), 1..3)).prop_map(|(constructor, fields)| {
                Expression::Constructor(Constructor {
                    constructor,
                    pattern: ObjectLiteral { base: None, fields },
                })
            }),
            (vec(identifier(), 1..3), inner.clone()).prop_map(|(args, body)| {
                Expression::Lambda(Lambda {
                    args,
                    body: Box::new(body),
                })
            }),
            (vec(identifier(), 1..3), inner.clone(), vec(inner, 1..3)).prop_map(
                |(args, body, call_args)| {
                    Expression::LambdaCall(LambdaCall {
                        lambda: Lambda {
                            args,
                            body: Box::new(body),
                        },
                        args: call_args,
                    })
                }
            ),
        ]
    })
}

proptest! {
    #[test]
    fn rendered_expressions_parse_back(expression in expression()) {
        let rendered = render_expression(&expression);
        let parsed = parse_expression(&rendered);
        prop_assert!(parsed.is_ok(), "{} failed: {:?}", rendered, parsed);
        prop_assert_eq!(parsed.ok(), Some(expression), "{}", rendered);
    }
}
