pub mod exchange_service;
pub mod history_service;
