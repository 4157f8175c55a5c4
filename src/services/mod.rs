pub mod auth;
pub mod posts;
pub mod recommendations;
pub mod uploads;
