use fern_compiler::{
    get_values_in_block_scope, get_values_in_top_level_scope, infer_type, into_blocks, parse,
    parse_block, parse_expression, validate_type, Block, ScopedValues, Type,
};

fn errors_of(source: &str) -> Vec<String> {
    parse(source, "Main").errors
}

fn assert_clean(source: &str) {
    let errors = errors_of(source);
    assert!(errors.is_empty(), "expected no errors, got {errors:#?}");
}

fn assert_single_error(source: &str, needle: &str) -> String {
    let errors = errors_of(source);
    assert_eq!(errors.len(), 1, "expected one error, got {errors:#?}");
    assert!(
        errors[0].contains(needle),
        "expected {needle:?} in {:?}",
        errors[0]
    );
    errors[0].clone()
}

fn infer(source: &str) -> anyhow::Result<Type> {
    infer_type(&parse_expression(source)?, None, &[], &[], &ScopedValues::new())
}

// ==== Inference ====

#[test]
fn infers_literals_and_operators() -> anyhow::Result<()> {
    assert_eq!(infer("1 + 2")?, Type::number());
    assert_eq!(infer("\"a\" + \"b\"")?, Type::string());
    assert_eq!(infer("1 < 2 && true")?, Type::boolean());
    assert_eq!(infer("[1..3]")?, Type::list(Type::number()));
    assert_eq!(infer("1 :: [2, 3]")?, Type::list(Type::number()));
    assert_eq!(infer("`hello ${name}`")?, Type::string());
    assert_eq!(infer("\\x -> x")?.to_string(), "any -> any");
    Ok(())
}

#[test]
fn mixing_strings_and_numbers_suggests_a_format_string() {
    let err = infer("\"a\" + 1").expect_err("string plus number");
    let message = err.to_string();
    assert!(message.contains("addition operator"), "{message}");
    assert!(message.contains("`a${1}`"), "{message}");
}

#[test]
fn mixed_lists_are_rejected() {
    let err = infer("[1, \"a\"]").expect_err("mixed list");
    assert_eq!(err.to_string(), "Mixed types in list: `number` and `string`");
}

#[test]
fn comparisons_need_matching_sides() {
    let err = infer("1 == \"a\"").expect_err("mismatched comparison");
    assert_eq!(err.to_string(), "Cannot compare `number` with `string` using `==`");
}

// ==== Declarations ====

#[test]
fn well_typed_functions_have_no_errors() {
    assert_clean(
        "\
add: number -> number -> number
add x y =
    x + y

increment: number -> number
increment =
    add 1
",
    );
}

#[test]
fn bodies_must_match_the_declared_type() {
    let message = assert_single_error(
        "\
greeting: number
greeting =
    \"hello\"
",
        "Expected `number` but got `string` in the body of the const `greeting`",
    );
    assert!(message.starts_with("Error on lines 1 - 3\n"), "{message}");
}

#[test]
fn addition_of_string_and_number_is_located() {
    assert_single_error(
        "\
label: string
label =
    \"a\" + 1
",
        "Try using a format string instead, for example `a${1}`",
    );
}

#[test]
fn unknown_types_must_be_imported() {
    assert_single_error(
        "\
widget: Widget
widget =
    1
",
        "Cannot find the type `Widget`. Did you forget to import it?",
    );
}

#[test]
fn exposed_imports_count_as_known_types() {
    assert_clean(
        "\
import \"./Maybe\" exposing (Maybe, Just)

wrapped: Maybe number
wrapped =
    Just { value: 1 }
",
    );
}

#[test]
fn if_predicates_must_be_booleans() {
    assert_single_error(
        "\
pick: number -> string
pick x =
    if x then
        \"a\"
    else
        \"b\"
",
        "The predicate of an `if` must be a `boolean` but got `number`",
    );
}

#[test]
fn calls_are_checked_against_the_signature() {
    let source = "\
add: number -> number -> number
add x y =
    x + y

three: number
three =
    add 1 2 3

named: number
named =
    add \"one\" 2
";
    let errors = errors_of(source);
    assert_eq!(errors.len(), 2, "{errors:#?}");
    assert!(errors[0].contains("Too many arguments for `add`: expected 2 but got 3"));
    assert!(errors[1].contains("Argument 1 of `add` should be `number` but got `string`"));
}

// ==== Object literals ====

const PERSON: &str = "\
type alias Person = {
    name: string,
    age: number
}
";

#[test]
fn object_literals_match_their_alias() {
    assert_clean(&format!(
        "{PERSON}
person: Person
person =
    {{ name: \"Ada\", age: 36 }}
"
    ));
}

#[test]
fn mismatched_properties_are_listed_in_order() {
    let message = assert_single_error(
        &format!(
            "{PERSON}
person: Person
person =
    {{ name: 1, age: \"old\" }}
"
        ),
        "Mismatching property types for `Person`",
    );
    assert!(message.contains(
        "`name` expected `string` but got `number` | `age` expected `number` but got `string`"
    ));
}

#[test]
fn missing_and_extra_properties_are_reported() {
    let message = assert_single_error(
        &format!(
            "{PERSON}
person: Person
person =
    {{ name: \"Ada\", height: 2 }}
"
        ),
        "The following properties were missing from `Person`: `age`",
    );
    assert!(message.contains("The following properties are not part of `Person`: `height`"));
}

#[test]
fn spreads_fill_in_missing_properties() {
    assert_clean(&format!(
        "{PERSON}
birthday: Person -> Person
birthday person =
    {{ ...person, age: person.age + 1 }}
"
    ));
}

// ==== Unions ====

const ANIMAL: &str = "\
type Animal =
    \"cat\"
    | \"dog\"
";

#[test]
fn untagged_unions_accept_their_members() {
    assert_clean(&format!(
        "{ANIMAL}
pet: Animal
pet =
    \"cat\"
"
    ));
}

#[test]
fn untagged_unions_reject_other_strings() {
    assert_single_error(
        &format!(
            "{ANIMAL}
pet: Animal
pet =
    \"cow\"
"
        ),
        "Expected `Animal`, composed of \"cat\" | \"dog\", but got \"cow\"",
    );
}

const MAYBE: &str = "\
type Maybe a =
    Just { value: a }
    | Nothing
";

#[test]
fn constructors_bind_generics() {
    assert_clean(&format!(
        "{MAYBE}
name: Maybe string
name =
    Just {{ value: \"x\" }}

nothing: Maybe number
nothing =
    Nothing
"
    ));
}

#[test]
fn constructor_payloads_must_fit_the_declared_type() {
    assert_single_error(
        &format!(
            "{MAYBE}
name: Maybe number
name =
    Just {{ value: \"x\" }}
"
        ),
        "Expected `Maybe number` but got `Maybe string` in the body of the const `name`",
    );
}

#[test]
fn conflicting_generic_bindings_are_errors() {
    assert_single_error(
        "\
type Pair a =
    Pair { first: a, second: a }

pair: Pair string
pair =
    Pair { first: \"x\", second: 1 }
",
        "Conflicting types for `a` in `Pair`: `string` and `number`",
    );
}

#[test]
fn unknown_constructors_must_be_imported() {
    assert_single_error(
        "\
thing: number
thing =
    Foo { a: 1 }
",
        "Could not find a constructor named `Foo`. Did you forget to import it?",
    );
}

// ==== Scopes ====

#[test]
fn scopes_collect_declarations_arguments_and_lets() -> anyhow::Result<()> {
    let source = "\
scale: number -> number -> number
scale factor x =
    let
        scaled: number
        scaled =
            x * factor
    in
    scaled

pi: number
pi =
    3.14
";
    let blocks = into_blocks(source)
        .iter()
        .map(parse_block)
        .collect::<anyhow::Result<Vec<Block>>>()?;

    let top = get_values_in_top_level_scope(&blocks);
    assert_eq!(top.len(), 2);
    assert_eq!(top["pi"], Type::number());
    assert_eq!(top["scale"].to_string(), "number -> number -> number");

    let inner = get_values_in_block_scope(&blocks[0], &top);
    for name in ["scale", "pi", "factor", "x", "scaled"] {
        assert!(inner.contains_key(name), "missing {name} in {inner:?}");
    }

    let Block::Function(function) = &blocks[0] else {
        panic!("expected a function");
    };
    let validated = validate_type(&blocks[0], &blocks, &[], &top)?;
    assert_eq!(validated, function.type_());
    Ok(())
}
