// Business logic services

pub mod rutina_service;

pub use rutina_service::RutinaService;
