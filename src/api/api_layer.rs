// API layer - HTTP routes and handlers.

#[path = "moderation/routes.rs"]
pub mod moderation;
