pub mod auth;
pub mod model;
pub mod prediction;
pub mod user;
