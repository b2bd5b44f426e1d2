/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `tasks`: Task CRUD endpoints
/// - `users`: Account endpoints (register, login, logout, auth-check)

pub mod health;
pub mod tasks;
pub mod users;
