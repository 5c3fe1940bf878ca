pub mod config;
pub mod database;
pub mod email_notifier;
pub mod http_image_fetcher;
pub mod local_blob_store;
pub mod logging_notifier;
pub mod telemetry;
