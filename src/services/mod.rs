pub mod daily_logs;
pub mod date_window;
pub mod insights;
pub mod push;
pub mod reconcile;
pub mod reminders;
pub mod scheduler;
pub mod text_gen;
