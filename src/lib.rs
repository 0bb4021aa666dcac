//! Lifecycle engine for concern and feedback tickets.
//!
//! The pure core is [`lifecycle`], [`aging`], and [`scope`]: plain functions
//! over ticket values with explicit actor and clock arguments. [`storage`]
//! and [`notify`] are the collaborators at the boundary, and [`desk`] is the
//! adapter that runs an operation against them.

pub mod aging;
pub mod config;
pub mod desk;
pub mod identity;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod scope;
pub mod storage;
