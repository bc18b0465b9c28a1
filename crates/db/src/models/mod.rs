pub mod notification;
pub mod settings;
