//! Documents Module
//!
//! A document collection interface with an in-memory backend, and the school
//! and student helpers built on it.

mod collection;
mod queries;

pub use collection::{matches_filter, Document, DocumentCollection, MemoryCollection};
pub use queries::{insert_school, list_all, schools_by_topic, top_students, update_topics};
