//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (random values, constant-time compare)
//! - Password hashing (bcrypt, cost 12)
//! - Cookie management

pub mod cookie;
pub mod crypto;
pub mod password;
