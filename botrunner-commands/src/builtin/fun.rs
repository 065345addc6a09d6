//! joke, fact, quote, roast, compliment

use crate::builtin::pick;
use crate::context::Invocation;
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::{Embed, colors};
use crate::table::{Category, CommandSpec, CommandTable, HandlerResult};

const JOKES: &[&str] = &[
    "Why don't scientists trust atoms? Because they make up everything!",
    "Why did the scarecrow win an award? He was outstanding in his field!",
    "Why don't eggs tell jokes? They'd crack each other up!",
    "What do you call a fake noodle? An impasta!",
    "Why did the coffee file a police report? It got mugged!",
    "What's the best thing about Switzerland? I don't know, but the flag is a big plus!",
    "Why don't programmers like nature? It has too many bugs!",
    "How does a penguin build its house? Igloos it together!",
    "What do you call a bear with no teeth? A gummy bear!",
    "Why did the math book look so sad? Because it had too many problems!",
];

const FACTS: &[&str] = &[
    "Honey never spoils. Archaeologists have found pots of honey in ancient Egyptian tombs that are over 3,000 years old and still perfectly edible.",
    "A group of flamingos is called a 'flamboyance'.",
    "The shortest war in history was between Britain and Zanzibar on August 27, 1896. Zanzibar surrendered after 38 minutes.",
    "Bananas are berries, but strawberries aren't.",
    "A day on Venus is longer than its year.",
    "There are more possible games of chess than there are atoms in the observable universe.",
    "Octopuses have three hearts and blue blood.",
    "The Great Wall of China isn't visible from space with the naked eye.",
    "Sharks have been around longer than trees.",
    "Your brain uses about 20% of your body's total energy.",
];

const QUOTES: &[&str] = &[
    "The only way to do great work is to love what you do. - Steve Jobs",
    "Innovation distinguishes between a leader and a follower. - Steve Jobs",
    "Life is what happens to you while you're busy making other plans. - John Lennon",
    "The future belongs to those who believe in the beauty of their dreams. - Eleanor Roosevelt",
    "It is during our darkest moments that we must focus to see the light. - Aristotle",
    "Success is not final, failure is not fatal: it is the courage to continue that counts. - Winston Churchill",
    "The only impossible journey is the one you never begin. - Tony Robbins",
    "In the end, we will remember not the words of our enemies, but the silence of our friends. - Martin Luther King Jr.",
    "The way to get started is to quit talking and begin doing. - Walt Disney",
    "Don't let yesterday take up too much of today. - Will Rogers",
];

/// `{}` is replaced by the target's mention
const ROASTS: &[&str] = &[
    "{} is so bright, they could light up a room... if someone turned off the sun first!",
    "{} is like a software update. Whenever I see them, I think 'not now'.",
    "{} brings everyone so much joy... when they leave the room!",
    "{} is proof that even mistakes can be amazing!",
    "{} is like a Monday morning - nobody's happy to see them!",
    "{} has a face for radio... and a voice for silent movies!",
    "{} is so unique, just like everybody else!",
    "{} is living proof that anyone can be extraordinary... extraordinarily ordinary!",
];

const COMPLIMENTS: &[&str] = &[
    "{} has an amazing personality that lights up any room!",
    "{} is incredibly thoughtful and kind!",
    "{} has a great sense of humor that makes everyone smile!",
    "{} is such a positive influence on everyone around them!",
    "{} is incredibly talented and creative!",
    "{} has such a warm and welcoming presence!",
    "{} is an amazing friend who always knows what to say!",
    "{} is absolutely awesome and deserves all the best things in life!",
];

pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    table.register(
        CommandSpec::new("joke", "", "Get a random joke", Category::Fun),
        |_: &Invocation| Ok(canned("😂 Random Joke", JOKES, colors::YELLOW)),
    )?;
    table.register(
        CommandSpec::new("fact", "", "Get a random fact", Category::Fun),
        |_: &Invocation| Ok(canned("🧠 Fun Fact", FACTS, 0x00ffff)),
    )?;
    table.register(
        CommandSpec::new("quote", "", "Get an inspirational quote", Category::Fun),
        |_: &Invocation| Ok(canned("💭 Inspirational Quote", QUOTES, 0xff69b4)),
    )?;
    table.register(
        CommandSpec::new("roast", "[@user]", "Roast someone (friendly)", Category::Fun),
        roast,
    )?;
    table.register(
        CommandSpec::new("compliment", "[@user]", "Give a compliment", Category::Fun),
        compliment,
    )
}

fn canned(title: &str, lines: &[&str], color: u32) -> CommandOutput {
    CommandOutput::reply(Embed::new(title).description(pick(lines)).color(color))
}

fn roast(inv: &Invocation) -> HandlerResult {
    let target = inv.member_or_author(0)?;
    Ok(CommandOutput::reply(
        Embed::new("🔥 Friendly Roast")
            .description(pick(ROASTS).replace("{}", &target.mention()))
            .color(0xff4500)
            .footer("Just kidding! You're awesome! 😄"),
    ))
}

fn compliment(inv: &Invocation) -> HandlerResult {
    let target = inv.member_or_author(0)?;
    Ok(CommandOutput::reply(
        Embed::new("💝 Compliment")
            .description(pick(COMPLIMENTS).replace("{}", &target.mention()))
            .color(colors::GREEN),
    ))
}
