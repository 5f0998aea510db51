//! Core business logic for Khata.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All invoice types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `invoice` - Line items, GST rates, the totals calculator, editing drafts,
//!   and the persisted record schema

pub mod invoice;
