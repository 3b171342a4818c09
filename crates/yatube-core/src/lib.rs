//! Core types and trait definitions for Yatube.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend (`yatube-store-sqlite`) implements [`store::BlogStore`];
//! the web layer (`yatube-web`) depends only on that abstraction plus the feed
//! assembler defined here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod feed;
pub mod follow;
pub mod group;
pub mod paginate;
pub mod post;
pub mod store;
pub mod user;

pub use error::{Error, Result};
