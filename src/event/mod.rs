pub mod enrich;
pub mod event_model;
