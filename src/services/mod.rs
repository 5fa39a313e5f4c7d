pub mod homework;
pub mod init;
pub mod notifications;
pub mod telegram;
pub mod watcher;
