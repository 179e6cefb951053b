//! Medicine slash commands

use serenity::builder::CreateApplicationCommand;

/// Creates medicine commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        CreateApplicationCommand::default()
            .name("add_medicine")
            .description("Add a medicine and get daily reminders (name → dose → times)")
            .to_owned(),
        CreateApplicationCommand::default()
            .name("delete_medicine")
            .description("Cancel future reminders for a medicine")
            .to_owned(),
    ]
}
