//! Paginated listing over the secondary indexes.
//!
//! A listing picks one [`Strategy`] from its filters, turns the caller's
//! continuation cursor into a start key for that strategy's index with
//! [`project`], and drives the store with [`paginate`].

mod paginate;
mod projector;
mod strategy;
pub mod token;

pub use paginate::{paginate, PageResult, Paginator, QueryPlan};
pub use projector::project;
pub use strategy::{ListFilter, Strategy, CREATED_AFTER_DEFAULT, CREATED_BEFORE_DEFAULT};
pub use token::TokenError;
