pub mod auth;
pub mod dashboard;
pub mod files;
pub mod health;
pub mod shares;
pub mod users;
