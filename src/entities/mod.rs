//! Sea-ORM entities for the directory schema.
//!
//! The schema itself (DDL, the optional `employees_fts` index and its sync
//! triggers) is owned by the storage layer. These definitions only describe
//! what the search core reads.

pub mod column_configuration;
pub mod company;
pub mod department;
pub mod employee;
pub mod position;
