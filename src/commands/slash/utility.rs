//! Utility slash commands

use serenity::builder::CreateApplicationCommand;

/// Creates utility commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        CreateApplicationCommand::default()
            .name("start")
            .description("Register with Healthally and see what I can do")
            .to_owned(),
        CreateApplicationCommand::default()
            .name("cancel")
            .description("Stop the question I'm currently asking you")
            .to_owned(),
        CreateApplicationCommand::default()
            .name("progress")
            .description("Your last 7 days: medicine adherence and exercise")
            .to_owned(),
    ]
}
