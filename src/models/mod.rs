pub mod daily_log;
pub mod notification;
pub mod user;
