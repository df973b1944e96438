// Core moderation module - contains the content screening business logic.

pub mod moderation_models;
pub mod moderation_rules;
pub mod moderation_service;

pub use moderation_models::*;
pub use moderation_rules::*;
pub use moderation_service::*;
