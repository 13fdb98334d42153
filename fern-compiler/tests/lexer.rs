use fern_compiler::{
    check_keyword_token, parse_type, strip_comments, tokenize, tokenize_type, tokens_to_text,
    FixedType, Token, Type, TypeToken,
};
use proptest::prelude::*;

fn identifier(name: &str) -> Token {
    Token::Identifier(name.to_string())
}

fn whitespace() -> Token {
    Token::Whitespace(" ".to_string())
}

#[test]
fn tokenizes_a_signature() {
    let tokens = tokenize("a: number -> number");
    assert_eq!(
        tokens,
        vec![
            identifier("a"),
            Token::Colon,
            whitespace(),
            identifier("number"),
            whitespace(),
            Token::Arrow,
            whitespace(),
            identifier("number"),
        ]
    );
}

#[test]
fn classifies_keywords_and_literals() {
    assert_eq!(check_keyword_token("case"), Token::Keyword("case".to_string()));
    assert_eq!(check_keyword_token("true"), Token::Literal("true".to_string()));
    assert_eq!(check_keyword_token("3.5"), Token::Literal("3.5".to_string()));
    assert_eq!(check_keyword_token("person.name"), identifier("person.name"));
}

#[test]
fn strings_keep_their_body_without_quotes() {
    let tokens = tokenize(r#"greet "hello world" `hi ${name}`"#);
    assert_eq!(
        tokens,
        vec![
            identifier("greet"),
            whitespace(),
            Token::StringToken("hello world".to_string()),
            whitespace(),
            Token::FormatStringToken("hi ${name}".to_string()),
        ]
    );
}

#[test]
fn square_brackets_are_one_literal() {
    let tokens = tokenize("[1, [2, 3], \"]\"]");
    assert_eq!(tokens, vec![Token::Literal("[1, [2, 3], \"]\"]".to_string())]);
}

#[test]
fn operators_and_negative_numbers() {
    let tokens = strip_comments(tokenize("x :: -1 |> f -- trailing"));
    let meaningful = tokens
        .into_iter()
        .filter(|token| !token.is_whitespace())
        .collect::<Vec<_>>();
    assert_eq!(
        meaningful,
        vec![
            identifier("x"),
            Token::Operator("::".to_string()),
            Token::Literal("-1".to_string()),
            Token::Operator("|>".to_string()),
            identifier("f"),
        ]
    );
}

#[test]
fn exponent_signs_stay_in_the_number() {
    assert_eq!(tokenize("1e-5"), vec![Token::Literal("1e-5".to_string())]);
    assert_eq!(tokenize("2.5E+3"), vec![Token::Literal("2.5E+3".to_string())]);
    assert_eq!(
        tokenize("x-1e-5"),
        vec![
            identifier("x"),
            Token::Operator("-".to_string()),
            Token::Literal("1e-5".to_string()),
        ]
    );
    assert_eq!(
        tokenize("e-5"),
        vec![
            identifier("e"),
            Token::Operator("-".to_string()),
            Token::Literal("5".to_string()),
        ]
    );
}

#[test]
fn nested_comments_are_one_token() {
    let tokens = tokenize("{- outer {- inner -} still outer -}x");
    assert_eq!(
        tokens,
        vec![
            Token::MultilineComment(" outer {- inner -} still outer ".to_string()),
            identifier("x"),
        ]
    );
}

#[test]
fn type_tokens_nest_by_brackets() -> anyhow::Result<()> {
    let tokens = tokenize_type(&tokenize("List (Maybe string)"))?;
    let identifier = |name: &str| TypeToken::Identifier {
        name: name.to_string(),
    };
    assert_eq!(
        tokens,
        vec![TypeToken::Base {
            body: vec![
                identifier("List"),
                TypeToken::Base {
                    body: vec![identifier("Maybe"), identifier("string")],
                },
            ],
        }]
    );
    Ok(())
}

#[test]
fn type_tokens_split_on_arrows() -> anyhow::Result<()> {
    let tokens = tokenize_type(&tokenize("(a -> b) -> List a -> List b"))?;
    assert_eq!(tokens.len(), 3);
    assert!(matches!(tokens[0], TypeToken::Function { .. }));
    Ok(())
}

#[test]
fn parses_types() -> anyhow::Result<()> {
    let nested = parse_type("List (Maybe string)")?;
    assert_eq!(
        nested,
        Type::Fixed(FixedType {
            name: "List".to_string(),
            args: vec![Type::fixed("Maybe", vec![Type::string()])],
        })
    );
    assert_eq!(nested.to_string(), "List (Maybe string)");

    let function = parse_type("(a -> b) -> List a -> List b")?;
    assert_eq!(function.to_string(), "(a -> b) -> List a -> List b");

    assert!(parse_type("any")?.is_wildcard());
    assert_eq!(parse_type("a")?, Type::generic("a"));
    Ok(())
}

#[test]
fn rejects_broken_types() {
    assert!(parse_type("List (Maybe string").is_err());
    assert!(parse_type("Maybe string)").is_err());
    assert!(parse_type("a string").is_err());
}

#[test]
fn deeply_nested_types_hit_the_depth_limit() {
    let source = format!("{}number{}", "(".repeat(200), ")".repeat(200));
    let err = parse_type(&source).expect_err("nesting should be rejected");
    assert!(
        err.to_string().contains("max nesting depth exceeded"),
        "unexpected error: {err}"
    );
}

// ==== Properties ====

proptest! {
    #[test]
    fn tokenizing_never_panics(source in "\\PC{0,64}") {
        let _ = tokenize(&source);
    }

    #[test]
    fn tokens_reproduce_their_source(source in "[a-z0-9 :,()\\[\\]=+*/<>|&%!\\\\.\n-]{0,48}") {
        let tokens = tokenize(&source);
        prop_assert_eq!(tokens_to_text(&tokens), source);
    }
}
