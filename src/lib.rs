// Core layer - shared types, configuration and errors
pub mod core;

// Features layer - scheduling, adherence and conversation flows
pub mod features;

// Persistence
pub mod database;

// Discord interaction layer
pub mod message_components;

// Application layer
pub mod command_handler;
pub mod commands;

pub use core::Config;

pub use features::{
    AdherenceAggregator, ConversationManager, ReminderScheduler, ResponseCorrelator,
    SerenityTransport,
};
