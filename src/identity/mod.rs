pub mod hash;
pub mod registry;
pub mod user;
