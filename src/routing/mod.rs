//! Routing module
//!
//! Provides the route table used by the dispatcher:
//! - Path patterns with `{name}` and `{name:d}` placeholders
//! - First-match-wins lookup in registration order

mod pattern;
mod table;

pub use pattern::{Coercion, ParamValue, Params, RoutePattern};
pub use table::{RouteEntry, RouteTable};
