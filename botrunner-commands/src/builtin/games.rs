//! rps, dice, coinflip, 8ball, trivia, hangman, wordguess, numguess

use rand::Rng;

use crate::builtin::{pick, title_case};
use crate::context::Invocation;
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::{Embed, colors};
use crate::table::{Category, CommandSpec, CommandTable, HandlerResult};

const RPS_CHOICES: [&str; 3] = ["rock", "paper", "scissors"];

const EIGHT_BALL: &[&str] = &[
    "It is certain",
    "Reply hazy, try again",
    "Don't count on it",
    "It is decidedly so",
    "Ask again later",
    "My reply is no",
    "Without a doubt",
    "Better not tell you now",
    "My sources say no",
    "Yes definitely",
    "Cannot predict now",
    "Outlook not so good",
    "You may rely on it",
    "Concentrate and ask again",
    "Very doubtful",
    "As I see it, yes",
    "Most likely",
    "Outlook good",
    "Yes",
    "Signs point to yes",
];

/// (question, answer)
const TRIVIA: &[(&str, &str)] = &[
    ("What is the capital of Japan?", "Tokyo"),
    ("Which planet is known as the Red Planet?", "Mars"),
    ("What is the largest mammal in the world?", "Blue whale"),
    ("In which year did World War II end?", "1945"),
    ("What is the chemical symbol for gold?", "Au"),
    ("Which ocean is the largest?", "Pacific Ocean"),
    ("What is the smallest country in the world?", "Vatican City"),
    ("Who painted the Mona Lisa?", "Leonardo da Vinci"),
    ("What is the fastest land animal?", "Cheetah"),
    ("How many continents are there?", "7"),
];

const HANGMAN_WORDS: &[&str] = &[
    "python",
    "discord",
    "computer",
    "programming",
    "challenge",
    "amazing",
    "awesome",
    "fantastic",
];

/// (word, scrambled)
const SCRAMBLES: &[(&str, &str)] = &[
    ("PYTHON", "NYTHOP"),
    ("DISCORD", "CDODSIR"),
    ("COMPUTER", "PMOCTURE"),
    ("PROGRAMMING", "GRAMPGMORIN"),
];

pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    table.register(
        CommandSpec::new("rps", "<choice>", "Rock, Paper, Scissors", Category::Games),
        rps,
    )?;
    table.register(
        CommandSpec::new("dice", "[sides]", "Roll dice (default 6 sides)", Category::Games),
        dice,
    )?;
    table.register(
        CommandSpec::new("coinflip", "", "Flip a coin", Category::Games),
        coinflip,
    )?;
    table.register(
        CommandSpec::new("8ball", "<question>", "Magic 8-ball answers", Category::Games),
        eight_ball,
    )?;
    table.register(
        CommandSpec::new("trivia", "", "Random trivia question", Category::Games),
        trivia,
    )?;
    table.register(
        CommandSpec::new("hangman", "", "Play hangman", Category::Games),
        hangman,
    )?;
    table.register(
        CommandSpec::new("wordguess", "", "Guess the scrambled word", Category::Games),
        wordguess,
    )?;
    table.register(
        CommandSpec::new("numguess", "", "Number guessing game", Category::Games),
        numguess,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Tie,
    Win,
    Lose,
}

fn rps_outcome(player: &str, bot: &str) -> Outcome {
    match (player, bot) {
        _ if player == bot => Outcome::Tie,
        ("rock", "scissors") | ("paper", "rock") | ("scissors", "paper") => Outcome::Win,
        _ => Outcome::Lose,
    }
}

fn rps(inv: &Invocation) -> HandlerResult {
    let Some(choice) = inv.args.get(0) else {
        return Ok(CommandOutput::reply(
            Embed::new("✋ Rock Paper Scissors")
                .description(format!("Usage: `{}rps <rock/paper/scissors>`", inv.prefix))
                .color(colors::RED),
        ));
    };
    let choice = choice.to_lowercase();
    if !RPS_CHOICES.contains(&choice.as_str()) {
        return Err(CommandError::invalid("Choose rock, paper, or scissors!"));
    }

    let bot_choice = pick(&RPS_CHOICES);
    let (result, color) = match rps_outcome(&choice, bot_choice) {
        Outcome::Tie => ("It's a tie!", colors::YELLOW),
        Outcome::Win => ("You win! 🎉", colors::GREEN),
        Outcome::Lose => ("I win! 😄", colors::RED),
    };
    Ok(CommandOutput::reply(
        Embed::new("✋ Rock Paper Scissors")
            .description(format!(
                "You: {}\nMe: {}\n\n{}",
                title_case(&choice),
                title_case(bot_choice),
                result
            ))
            .color(color),
    ))
}

fn dice(inv: &Invocation) -> HandlerResult {
    let sides: i64 = inv.args.parse(0)?.unwrap_or(6);
    if !(2..=100).contains(&sides) {
        return Err(CommandError::invalid("Dice must have between 2 and 100 sides!"));
    }
    let rolled = rand::thread_rng().gen_range(1..=sides);
    Ok(CommandOutput::reply(
        Embed::new("🎲 Dice Roll")
            .description(format!("You rolled a {} on a {}-sided dice!", rolled, sides))
            .color(colors::PURPLE),
    ))
}

fn coinflip(_: &Invocation) -> HandlerResult {
    let result = pick(&["Heads", "Tails"]);
    let emoji = if result == "Heads" { "🪙" } else { "🥈" };
    Ok(CommandOutput::reply(
        Embed::new(format!("{} Coin Flip", emoji))
            .description(format!("The coin landed on **{}**!", result))
            .color(colors::GOLD),
    ))
}

fn eight_ball(inv: &Invocation) -> HandlerResult {
    let question = inv.args.text().ok_or_else(|| {
        CommandError::usage(format!("Ask me a question! Usage: `{}8ball <question>`", inv.prefix))
    })?;
    Ok(CommandOutput::reply(
        Embed::new("🎱 Magic 8-Ball")
            .description(format!(
                "**Question:** {}\n**Answer:** {}",
                question,
                pick(EIGHT_BALL)
            ))
            .color(0x000000),
    ))
}

fn trivia(_: &Invocation) -> HandlerResult {
    let (question, answer) = pick(TRIVIA);
    Ok(CommandOutput::reply(
        Embed::new("🧩 Trivia Question")
            .description(format!("**{}**", question))
            .color(0x4169e1)
            .footer(format!("Answer: {}", answer)),
    ))
}

fn hangman(_: &Invocation) -> HandlerResult {
    let word = pick(HANGMAN_WORDS).to_uppercase();
    let blanks = vec!["_"; word.chars().count()].join(" ");
    Ok(CommandOutput::reply(
        Embed::new("🎮 Hangman Game")
            .description(format!(
                "Word: {}\nTries left: 6\n\nGuess letters by typing them!",
                blanks
            ))
            .color(colors::PURPLE)
            .footer(format!("Answer: {} - This is a simplified demo version!", word)),
    ))
}

fn wordguess(_: &Invocation) -> HandlerResult {
    let (word, scrambled) = pick(SCRAMBLES);
    Ok(CommandOutput::reply(
        Embed::new("🔤 Word Scramble")
            .description(format!("Unscramble this word: **{}**", scrambled))
            .color(0xff6347)
            .footer(format!("Answer: {}", word)),
    ))
}

fn numguess(_: &Invocation) -> HandlerResult {
    let number = rand::thread_rng().gen_range(1..=100);
    Ok(CommandOutput::reply(
        Embed::new("🔢 Number Guessing Game")
            .description("I'm thinking of a number between 1 and 100!\nTry to guess it!")
            .color(0x32cd32)
            .footer(format!("The number was: {}", number)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing::{run, table};

    #[test]
    fn rps_rules() {
        assert_eq!(rps_outcome("rock", "rock"), Outcome::Tie);
        assert_eq!(rps_outcome("rock", "scissors"), Outcome::Win);
        assert_eq!(rps_outcome("paper", "rock"), Outcome::Win);
        assert_eq!(rps_outcome("scissors", "paper"), Outcome::Win);
        assert_eq!(rps_outcome("rock", "paper"), Outcome::Lose);
        assert_eq!(rps_outcome("scissors", "rock"), Outcome::Lose);
    }

    #[test]
    fn rps_without_choice_shows_usage_embed() {
        let output = run(&table(), "rps", "");
        let embed = output.first_embed().unwrap();
        assert_eq!(embed.description.as_deref(), Some("Usage: `!rps <rock/paper/scissors>`"));
    }

    #[test]
    fn rps_rejects_unknown_choice() {
        let output = run(&table(), "rps", "lizard");
        assert_eq!(output.first_text(), Some("Choose rock, paper, or scissors!"));
    }

    #[test]
    fn rps_accepts_mixed_case() {
        let output = run(&table(), "rps", "ROCK");
        let embed = output.first_embed().unwrap();
        assert!(embed.description.as_ref().unwrap().starts_with("You: Rock\n"));
    }

    #[test]
    fn dice_defaults_to_six_sides() {
        let output = run(&table(), "dice", "");
        let description = output.first_embed().unwrap().description.clone().unwrap();
        assert!(description.ends_with("on a 6-sided dice!"));
        let rolled: i64 = description
            .trim_start_matches("You rolled a ")
            .split(' ')
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=6).contains(&rolled));
    }

    #[test]
    fn dice_bounds_are_enforced() {
        let table = table();
        for sides in ["1", "101", "-5"] {
            let output = run(&table, "dice", sides);
            assert_eq!(output.first_text(), Some("Dice must have between 2 and 100 sides!"));
        }
        assert!(run(&table, "dice", "100").first_embed().is_some());
    }

    #[test]
    fn eight_ball_requires_question() {
        let output = run(&table(), "8ball", "");
        assert_eq!(output.first_text(), Some("Ask me a question! Usage: `!8ball <question>`"));

        let output = run(&table(), "8ball", "will it build?");
        let description = output.first_embed().unwrap().description.clone().unwrap();
        assert!(description.starts_with("**Question:** will it build?\n**Answer:** "));
    }

    #[test]
    fn hangman_hides_every_letter() {
        let output = run(&table(), "hangman", "");
        let embed = output.first_embed().unwrap();
        let footer = &embed.footer.as_ref().unwrap().text;
        let word = footer
            .trim_start_matches("Answer: ")
            .split(' ')
            .next()
            .unwrap();
        let blanks = vec!["_"; word.len()].join(" ");
        assert!(embed.description.as_ref().unwrap().starts_with(&format!("Word: {}\n", blanks)));
    }

    #[test]
    fn numguess_number_in_range() {
        let output = run(&table(), "numguess", "");
        let footer = &output.first_embed().unwrap().footer.as_ref().unwrap().text;
        let n: u32 = footer.trim_start_matches("The number was: ").parse().unwrap();
        assert!((1..=100).contains(&n));
    }
}
