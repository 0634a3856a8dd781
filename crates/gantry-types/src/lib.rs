//! Core types for the Gantry event pipeline.
//!
//! This crate is the bottom of the workspace: it carries the topic
//! grammar used for routing and the [`ErrorCode`] convention shared by
//! every other crate.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Device SDK Layer                    │
//! ├─────────────────────────────────────────────────────┤
//! │  gantry-types     : Topic grammar, ErrorCode ◄─HERE │
//! │  gantry-event     : packets, codec, EventSession    │
//! │  gantry-component : device traits, Context          │
//! └─────────────────────────────────────────────────────┘
//!                          ↓
//! ┌─────────────────────────────────────────────────────┐
//! │  gantry-runtime   : registry, dispatcher, pipeline  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Topics
//!
//! A topic is a slash-separated routing string such as `/room/1/lamp`.
//! Interceptors and drivers subscribe with [`TopicExpr`] patterns over
//! the same grammar, where `*` matches exactly one segment and `#`
//! matches the (possibly empty) trailing remainder:
//!
//! ```
//! use gantry_types::TopicExpr;
//!
//! let expr = TopicExpr::parse("/room/*/lamp").unwrap();
//! assert!(expr.matches("/room/1/lamp"));
//! assert!(!expr.matches("/room/1/fan"));
//!
//! let all = TopicExpr::parse("/room/#").unwrap();
//! assert!(all.matches("/room"));
//! assert!(all.matches("/room/1/lamp"));
//! ```

mod error;
mod topic;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use topic::{any_match, TopicError, TopicExpr};
