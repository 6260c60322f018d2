// External collaborators the dialogs talk to
pub mod auth;
pub mod calendar;
pub mod recognizer;
pub mod redis_service;

pub use auth::{Authenticator, TokenManager};
pub use calendar::{CalendarHandle, CalendarService};
pub use recognizer::{Domain, Recognizer, RecognizerRegistry};
pub use redis_service::RedisActorHandle;
