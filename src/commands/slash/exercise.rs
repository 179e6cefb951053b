//! Exercise slash commands

use serenity::builder::CreateApplicationCommand;

/// Creates exercise commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        CreateApplicationCommand::default()
            .name("log_exercise")
            .description("Log today's exercise (name → minutes)")
            .to_owned(),
        CreateApplicationCommand::default()
            .name("delete_exercise")
            .description("Delete a logged exercise entry")
            .to_owned(),
    ]
}
