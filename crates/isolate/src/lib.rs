//! Isolation domains bound to serial executors.
//!
//! An [`Isolated`] domain owns a unit of mutable state and routes every
//! access through the one executor it was constructed with. Callers on a
//! different execution context hop (enqueue a job and suspend); callers
//! already on the bound executor run inline. The scheduling primitives live
//! in `strand-executor`.

mod isolated;

pub use isolated::Isolated;
