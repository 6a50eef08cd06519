pub mod auth;
pub mod generation;
pub mod health;
pub mod payments;
pub mod salons;
pub mod sessions;
pub mod styles;
