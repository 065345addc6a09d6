//! help [category]

use crate::context::Invocation;
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::{Embed, colors};
use crate::table::{Category, CommandSpec, CommandTable};

const FOOTER: &str = "🎉 Acceso GRATIS a funciones premium durante mantenimiento - ¡Disfrútalo!";

fn heading(category: Category) -> &'static str {
    match category {
        Category::Basic => "🛠️ Basic Commands",
        Category::Fun => "🎮 Fun Commands",
        Category::Games => "🎯 Game Commands",
        Category::Utility => "⚙️ Utility Commands",
        Category::User => "👤 User Commands",
        Category::Tools => "🔧 Tool Commands",
        Category::Random => "🎲 Random Commands",
        Category::Math => "📊 Math Commands",
        Category::Text => "🔤 Text Commands",
        Category::Security => "🔒 Security/Moderation Commands",
        Category::Music => "🎵 Music Commands",
        Category::Economy => "💰 Economy Commands",
    }
}

/// Registers `help` over a snapshot of what is registered so far
pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    let spec = CommandSpec::new("help", "[category]", "Show available commands", Category::Basic);
    let mut catalog = table.specs();
    catalog.push(spec.clone());
    catalog.sort_by(|a, b| a.category.cmp(&b.category).then(a.name.cmp(b.name)));

    table.register(spec, move |inv: &Invocation| Ok(render(&catalog, inv)))
}

fn render(catalog: &[CommandSpec], inv: &Invocation) -> CommandOutput {
    let prefix = inv.prefix.as_str();
    let Some(key) = inv.args.get(0) else {
        let embed = Category::ALL.into_iter().fold(
            Embed::new("📖 Bot Commands Categories")
                .description(format!("Use `{}help <category>` for specific commands", prefix))
                .color(colors::BLUE),
            |embed, category| {
                embed.field(
                    category.label(),
                    format!("`{}help {}`", prefix, category.key()),
                    true,
                )
            },
        );
        return CommandOutput::reply(embed.footer(FOOTER));
    };

    let Some(category) = Category::parse(key) else {
        return CommandOutput::reply(
            Embed::new("❌ Unknown Category")
                .description(format!("Use `{}help` to see all categories", prefix))
                .color(colors::BLUE),
        );
    };

    let embed = catalog
        .iter()
        .filter(|spec| spec.category == category)
        .fold(
            Embed::new(heading(category)).color(colors::BLUE),
            |embed, spec| embed.field(spec.synopsis(prefix), spec.description, false),
        );
    CommandOutput::reply(embed)
}

#[cfg(test)]
mod tests {
    use crate::builtin::testing::{run, table};

    #[test]
    fn overview_lists_every_category() {
        let output = run(&table(), "help", "");
        let embed = output.first_embed().unwrap();
        assert_eq!(embed.title.as_deref(), Some("📖 Bot Commands Categories"));
        assert_eq!(embed.fields.len(), 12);
        assert_eq!(embed.field_value("🎯 Games"), Some("`!help games`"));
    }

    #[test]
    fn category_page_lists_its_commands() {
        let output = run(&table(), "help", "GAMES");
        let embed = output.first_embed().unwrap();
        assert_eq!(embed.title.as_deref(), Some("🎯 Game Commands"));
        assert_eq!(embed.field_value("!dice [sides]"), Some("Roll dice (default 6 sides)"));
        assert!(embed.field_value("!hangman").is_some());
        assert!(embed.field_value("!ping").is_none());
    }

    #[test]
    fn basic_page_includes_help_itself() {
        let output = run(&table(), "help", "basic");
        let embed = output.first_embed().unwrap();
        assert!(embed.field_value("!help [category]").is_some());
    }

    #[test]
    fn unknown_category_points_back_to_overview() {
        let output = run(&table(), "help", "cooking");
        let embed = output.first_embed().unwrap();
        assert_eq!(embed.title.as_deref(), Some("❌ Unknown Category"));
    }
}
