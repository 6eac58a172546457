pub mod entity;
pub mod permissions;
pub mod repository;
pub mod value_object;
