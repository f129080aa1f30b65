//! # Operation abstractions.
//!
//! Closures are the usual way to hand work to a [`Group`](crate::Group)
//! ([`Group::go`](crate::Group::go), [`Group::go_named`](crate::Group::go_named)).
//! This module adds a reusable, named form:
//! - [`Operation`] - trait for async cancelable operations
//! - [`OpFn`] - function-backed operation
//! - [`OpRef`] - shared reference to an operation (`Arc<dyn Operation>`)

mod op_fn;
mod operation;

pub use op_fn::OpFn;
pub use operation::{BoxOpFuture, DEFAULT_OP_NAME, OpRef, Operation};
