// Data models and request/response schemas

pub mod rutina;

pub use rutina::*;
