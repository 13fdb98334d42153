use fern_compiler::{
    block_kind, into_blocks, parse_block, AnonFunctionArg, Block, BlockKind, Expression,
    FunctionArg, FunctionArgument, ImportNamespace, Property, StringValue, Tag, TagArg, Type,
    UnparsedBlock,
};

fn parse_one(source: &str) -> anyhow::Result<Block> {
    let blocks = into_blocks(source);
    assert_eq!(blocks.len(), 1, "expected one block in {source:?}: {blocks:?}");
    parse_block(&blocks[0])
}

const PROGRAM: &str = "\
import List
import \"./Maybe\" as M exposing (Maybe, Just)

exposing (main)

-- the entry point
main: number
main =
    1

{- a longer
   comment -}
type Color =
    Red
    | Green

type alias Point = {
    x: number,
    y: number
}
";

#[test]
fn segments_a_module_into_blocks() {
    let blocks = into_blocks(PROGRAM);
    let kinds = blocks.iter().map(|block| block.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            BlockKind::Import,
            BlockKind::Export,
            BlockKind::Comment,
            BlockKind::Const,
            BlockKind::MultilineComment,
            BlockKind::UnionType,
            BlockKind::TypeAlias,
        ]
    );

    let starts = blocks.iter().map(|block| block.line_start).collect::<Vec<_>>();
    assert_eq!(starts, vec![1, 4, 6, 7, 11, 13, 17]);
    assert_eq!(blocks[3].lines, vec!["main: number", "main =", "    1"]);
    assert_eq!(blocks[6].line_end(), 20);
}

#[test]
fn comments_before_an_implementation_stay_in_the_declaration() -> anyhow::Result<()> {
    let source = "x: number\n-- hi\nx =\n    1\n";
    let blocks = into_blocks(source);
    assert_eq!(blocks.len(), 1, "{blocks:?}");
    assert_eq!(blocks[0].kind, BlockKind::Const);

    let Block::Const(constant) = parse_block(&blocks[0])? else {
        panic!("expected a const");
    };
    assert_eq!(constant.name, "x");
    assert_eq!(constant.value, Expression::value("1"));
    assert!(fern_compiler::parse(source, "Main").errors.is_empty());

    let function = into_blocks("double: number -> number\n-- twice\ndouble n =\n    n * 2\n");
    assert_eq!(function.len(), 1, "{function:?}");
    assert_eq!(function[0].kind, BlockKind::Function);
    parse_block(&function[0])?;

    let trailing = into_blocks("x: number\nx =\n    1\n-- after\n");
    let kinds = trailing.iter().map(|block| block.kind).collect::<Vec<_>>();
    assert_eq!(kinds, vec![BlockKind::Const, BlockKind::Comment]);
    Ok(())
}

#[test]
fn classifies_blocks_by_their_first_line() -> anyhow::Result<()> {
    assert_eq!(block_kind("add: number -> number -> number\nadd x y =\n    x + y")?, BlockKind::Function);
    assert_eq!(block_kind("pi: number\npi =\n    3.14")?, BlockKind::Const);
    assert_eq!(block_kind("type Animal =\n    \"cat\"\n    | \"dog\"")?, BlockKind::UnionUntaggedType);
    assert_eq!(block_kind("exposing (a)")?, BlockKind::Export);

    let err = block_kind("x = 1").expect_err("no signature");
    assert_eq!(err.to_string(), "Missing type annotation for `x`");

    let err = block_kind("    x: number").expect_err("indented block");
    assert_eq!(err.to_string(), "Unexpected indentation");
    Ok(())
}

#[test]
fn parses_imports() -> anyhow::Result<()> {
    let Block::Import(import) = parse_one("import List\nimport \"./Maybe\" as M exposing (Maybe, Just)")?
    else {
        panic!("expected an import");
    };
    assert_eq!(import.modules.len(), 2);

    let list = &import.modules[0];
    assert_eq!(list.name, "List");
    assert_eq!(list.namespace, ImportNamespace::Global);
    assert_eq!(list.local_name(), "List");

    let maybe = &import.modules[1];
    assert_eq!(maybe.name, "./Maybe");
    assert_eq!(maybe.namespace, ImportNamespace::Relative);
    assert_eq!(maybe.alias.as_deref(), Some("M"));
    assert_eq!(maybe.exposing, vec!["Maybe", "Just"]);
    assert_eq!(maybe.stem(), "Maybe");
    assert_eq!(maybe.local_name(), "M");
    Ok(())
}

#[test]
fn parses_exports() -> anyhow::Result<()> {
    let Block::Export(export) = parse_one("exposing (main, Person)")? else {
        panic!("expected an export");
    };
    assert_eq!(export.names, vec!["main", "Person"]);
    Ok(())
}

#[test]
fn parses_generic_unions() -> anyhow::Result<()> {
    let Block::UnionType(union) = parse_one("type Maybe a =\n    Just { value: a }\n    | Nothing")?
    else {
        panic!("expected a union");
    };
    assert_eq!(union.type_.name, "Maybe");
    assert_eq!(union.type_.args, vec![Type::generic("a")]);
    assert_eq!(
        union.tags,
        vec![
            Tag {
                name: "Just".to_string(),
                args: vec![TagArg {
                    name: "value".to_string(),
                    type_: Type::generic("a"),
                }],
            },
            Tag {
                name: "Nothing".to_string(),
                args: Vec::new(),
            },
        ]
    );
    Ok(())
}

#[test]
fn parses_untagged_unions() -> anyhow::Result<()> {
    let Block::UnionUntaggedType(union) = parse_one("type Animal =\n    \"cat\"\n    | \"dog\"")?
    else {
        panic!("expected an untagged union");
    };
    assert_eq!(union.type_.name, "Animal");
    assert_eq!(
        union.values,
        vec![
            StringValue {
                body: "cat".to_string()
            },
            StringValue {
                body: "dog".to_string()
            },
        ]
    );
    Ok(())
}

#[test]
fn parses_type_aliases() -> anyhow::Result<()> {
    let Block::TypeAlias(alias) = parse_one("type alias Person = {\n    name: string,\n    tags: List string\n}")?
    else {
        panic!("expected an alias");
    };
    assert_eq!(alias.type_.name, "Person");
    assert_eq!(
        alias.properties,
        vec![
            Property::new("name", Type::string()),
            Property::new("tags", Type::list(Type::string())),
        ]
    );
    Ok(())
}

#[test]
fn parses_functions_with_a_let() -> anyhow::Result<()> {
    let source = "\
scale: number -> number -> number
scale factor x =
    let
        scaled: number
        scaled =
            x * factor
    in
    scaled + 1";
    let Block::Function(function) = parse_one(source)? else {
        panic!("expected a function");
    };
    assert_eq!(function.name, "scale");
    assert_eq!(function.return_type, Type::number());
    assert_eq!(
        function.args,
        vec![
            FunctionArgument::FunctionArg(FunctionArg {
                name: "factor".to_string(),
                type_: Type::number(),
            }),
            FunctionArgument::FunctionArg(FunctionArg {
                name: "x".to_string(),
                type_: Type::number(),
            }),
        ]
    );
    assert_eq!(function.let_body.len(), 1);
    assert!(matches!(function.let_body[0], Block::Const(_)));
    assert!(matches!(function.body, Expression::Operator(_)));
    assert_eq!(function.type_().to_string(), "number -> number -> number");
    Ok(())
}

#[test]
fn unnamed_parameters_become_anonymous_arguments() -> anyhow::Result<()> {
    let Block::Function(function) = parse_one("run: Context -> string\nrun =\n    \"done\"")? else {
        panic!("expected a function");
    };
    assert_eq!(
        function.args,
        vec![FunctionArgument::AnonFunctionArg(AnonFunctionArg {
            index: 0,
            type_: Type::fixed("Context", Vec::new()),
        })]
    );
    assert_eq!(function.args[0].name(), "context");
    Ok(())
}

#[test]
fn parses_constants_with_inline_bodies() -> anyhow::Result<()> {
    let Block::Const(constant) = parse_one("pi: number\npi = 3.14")? else {
        panic!("expected a const");
    };
    assert_eq!(constant.name, "pi");
    assert_eq!(constant.type_, Type::number());
    assert_eq!(constant.value, Expression::value("3.14"));
    Ok(())
}

#[test]
fn implementation_names_must_match_the_signature() {
    let block = UnparsedBlock::new(
        BlockKind::Function,
        1,
        vec![
            "f: number -> number".to_string(),
            "g x =".to_string(),
            "    x".to_string(),
        ],
    );
    let err = parse_block(&block).expect_err("mismatched names");
    assert!(
        err.to_string()
            .contains("does not match the type signature for `f`"),
        "{err}"
    );
}

#[test]
fn functions_cannot_name_more_arguments_than_declared() {
    let err = parse_one("f: number -> number\nf x y =\n    x").expect_err("too many names");
    assert!(
        err.to_string()
            .contains("takes 2 arguments but its type only declares 1"),
        "{err}"
    );
}

#[test]
fn declarations_need_an_implementation() {
    let err = parse_one("f: number -> number").expect_err("no implementation");
    assert!(
        err.to_string().contains("Missing an implementation"),
        "{err}"
    );
}

#[test]
fn comments_parse_to_comment_blocks() -> anyhow::Result<()> {
    assert_eq!(parse_one("-- note")?, Block::Comment);
    assert_eq!(parse_one("{- one\n   two -}")?, Block::MultilineComment);
    Ok(())
}

#[test]
fn blocks_serialize_with_a_kind_tag() -> anyhow::Result<()> {
    let block = parse_one("pi: number\npi =\n    3")?;
    let json = serde_json::to_value(&block)?;
    assert_eq!(json["kind"], "Const");
    assert_eq!(json["name"], "pi");
    Ok(())
}
