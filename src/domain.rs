//! Domain module - Core harvesting entities
//!
//! This module contains the values that flow through the harvest pipeline
//! (identifiers, listing pages, person records) and the persistence contract
//! the pipeline writes through.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod identifier;
pub mod page;
pub mod person;
pub mod repositories;

pub use identifier::Identifier;
pub use page::Page;
pub use person::{MalformedPayload, PERSON_ATTRIBUTES, PersonRecord};
pub use repositories::{PersistenceSink, StoreError};
