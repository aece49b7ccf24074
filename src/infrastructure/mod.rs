pub mod axum_http;
pub mod content;
pub mod postgres;
pub mod telegram;
