//! random, choose, color, name

use rand::Rng;

use crate::builtin::pick;
use crate::context::Invocation;
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::{Embed, colors};
use crate::table::{Category, CommandSpec, CommandTable, HandlerResult};

const FIRST_NAMES: &[&str] = &[
    "Alex", "Sam", "Jordan", "Casey", "Riley", "Avery", "Quinn", "Blake", "Cameron", "Devon",
    "Emery", "Finley", "Harper", "Kai", "Logan", "Sage", "Taylor", "River",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore",
];

pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    table.register(
        CommandSpec::new("random", "<min> <max>", "Random number", Category::Random),
        random_number,
    )?;
    table.register(
        CommandSpec::new(
            "choose",
            "<option1> <option2> ...",
            "Choose from options",
            Category::Random,
        ),
        choose,
    )?;
    table.register(
        CommandSpec::new("color", "", "Random color", Category::Random),
        color,
    )?;
    table.register(
        CommandSpec::new("name", "", "Random name", Category::Random),
        name,
    )
}

fn random_number(inv: &Invocation) -> HandlerResult {
    let min: i64 = inv.args.parse(0)?.unwrap_or(1);
    let max: i64 = inv.args.parse(1)?.unwrap_or(100);
    if min >= max {
        return Err(CommandError::invalid("Minimum value must be less than maximum!"));
    }
    let result = rand::thread_rng().gen_range(min..=max);
    Ok(CommandOutput::reply(
        Embed::new("🎲 Random Number")
            .description(format!(
                "Random number between {} and {}: **{}**",
                min, max, result
            ))
            .color(colors::PURPLE),
    ))
}

fn choose(inv: &Invocation) -> HandlerResult {
    let options = inv.args.positional();
    if options.len() < 2 {
        return Err(CommandError::invalid("Give me at least 2 options to choose from!"));
    }
    Ok(CommandOutput::reply(
        Embed::new("🎯 Choice Made")
            .description(format!("I choose: **{}**", pick(&options)))
            .color(0xff6347)
            .field("Options were", options.join(", "), false),
    ))
}

fn color(_: &Invocation) -> HandlerResult {
    let mut rng = rand::thread_rng();
    let [r, g, b]: [u8; 3] = std::array::from_fn(|_| rng.gen_range(0..=255));
    let value = u32::from_be_bytes([0, r, g, b]);
    Ok(CommandOutput::reply(
        Embed::new("🎨 Random Color")
            .description(format!(
                "**Hex:** #{:06x}\n**RGB:** ({}, {}, {})",
                value, r, g, b
            ))
            .color(value),
    ))
}

fn name(_: &Invocation) -> HandlerResult {
    Ok(CommandOutput::reply(
        Embed::new("📝 Random Name")
            .description(format!(
                "Generated name: **{} {}**",
                pick(FIRST_NAMES),
                pick(LAST_NAMES)
            ))
            .color(0xdda0dd),
    ))
}

#[cfg(test)]
mod tests {
    use crate::builtin::testing::{run, table};

    #[test]
    fn random_respects_bounds() {
        let table = table();
        for _ in 0..20 {
            let output = run(&table, "random", "5 7");
            let description = output.first_embed().unwrap().description.clone().unwrap();
            let n: i64 = description
                .rsplit("**")
                .nth(1)
                .unwrap()
                .parse()
                .unwrap();
            assert!((5..=7).contains(&n));
        }
    }

    #[test]
    fn random_defaults_and_invalid_range() {
        let table = table();
        let output = run(&table, "random", "");
        assert!(output
            .first_embed()
            .unwrap()
            .description
            .as_ref()
            .unwrap()
            .starts_with("Random number between 1 and 100: "));
        assert_eq!(
            run(&table, "random", "10 10").first_text(),
            Some("Minimum value must be less than maximum!")
        );
    }

    #[test]
    fn choose_needs_two_options() {
        let table = table();
        assert_eq!(
            run(&table, "choose", "tea").first_text(),
            Some("Give me at least 2 options to choose from!")
        );
        let output = run(&table, "choose", "tea coffee");
        let embed = output.first_embed().unwrap();
        assert_eq!(embed.field_value("Options were"), Some("tea, coffee"));
        let description = embed.description.as_deref().unwrap();
        assert!(description == "I choose: **tea**" || description == "I choose: **coffee**");
    }

    #[test]
    fn color_hex_matches_embed_color() {
        let output = run(&table(), "color", "");
        let embed = output.first_embed().unwrap();
        let hex = embed
            .description
            .as_ref()
            .unwrap()
            .trim_start_matches("**Hex:** #")
            .split('\n')
            .next()
            .unwrap()
            .to_string();
        assert_eq!(u32::from_str_radix(&hex, 16).unwrap(), embed.color.unwrap());
    }
}
