use fern_compiler::{collisions, into_blocks, parse, parse_block, Block, Collision};

fn blocks_of(source: &str) -> anyhow::Result<Vec<Block>> {
    into_blocks(source).iter().map(parse_block).collect()
}

#[test]
fn distinct_names_do_not_collide() -> anyhow::Result<()> {
    let blocks = blocks_of(
        "\
import \"./Maybe\" exposing (Maybe, Just)

type Color =
    Red
    | Green

color: Color
color =
    Red
",
    )?;
    assert!(collisions(&blocks).is_empty());
    Ok(())
}

#[test]
fn repeated_declarations_collide() -> anyhow::Result<()> {
    let blocks = blocks_of(
        "\
value: number
value =
    1

-- again
value: string
value =
    \"a\"
",
    )?;
    assert_eq!(
        collisions(&blocks),
        vec![Collision {
            name: "value".to_string(),
            indexes: vec![0, 2],
        }]
    );
    Ok(())
}

#[test]
fn imports_collide_with_declarations() -> anyhow::Result<()> {
    let blocks = blocks_of(
        "\
import \"./Shapes\" as S exposing (Circle)

type alias Circle = {
    radius: number
}

type S =
    Square
",
    )?;
    let found = collisions(&blocks);
    let names = found
        .iter()
        .map(|collision| collision.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["S", "Circle"]);
    assert_eq!(found[0].indexes, vec![0, 2]);
    assert_eq!(found[1].indexes, vec![0, 1]);
    Ok(())
}

#[test]
fn collisions_point_at_every_location() {
    let module = parse(
        "\
value: number
value =
    1

value: string
value =
    \"a\"
",
        "Main",
    );
    assert_eq!(module.errors.len(), 1, "{:#?}", module.errors);
    let message = &module.errors[0];
    assert!(message.starts_with("The name `value` has been used for different things.\n"));
    assert!(message.contains("Error on lines 1 - 3\n`value` is introduced here"));
    assert!(message.contains("Error on lines 5 - 7\n`value` is introduced here"));
}
