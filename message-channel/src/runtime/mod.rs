//! Runtime integration layer.
//!
//! Isolates the background distribution loop so task spawning and shutdown
//! ordering stay localized and predictable for the rest of the crate.

pub(crate) mod distribution_loop;
