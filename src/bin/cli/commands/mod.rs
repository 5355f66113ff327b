pub mod asset;
pub mod auth;
pub mod cron;
pub mod inventory;
pub mod report;
