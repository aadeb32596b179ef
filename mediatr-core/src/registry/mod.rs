//! # Registries
//!
//! Process-lifetime tables populated during setup and read on every
//! dispatch:
//!
//! - [`RequestRegistry`]: exactly one binding per request shape
//! - [`NotificationRegistry`]: an ordered list of bindings per notification shape
//! - [`PipelineRegistry`]: one ordered, deduplicated list of behaviors
//!
//! The request and notification tables are `DashMap`s so registration and
//! resolution for unrelated shapes never contend on one lock. The pipeline
//! list sits behind a read-write lock and is read as a snapshot copy.
//!
//! Bindings are stored type-erased and recovered by downcasting at resolve
//! time; a failed downcast is reported as a "not valid" dispatch error.
//!
//! `clear` on any registry is meant for test setup and teardown. Clearing
//! while dispatches are in flight is not supported.

mod notification;
mod pipeline;
mod request;

pub(crate) use notification::NotificationRegistry;
pub(crate) use pipeline::PipelineRegistry;
pub(crate) use request::RequestRegistry;
