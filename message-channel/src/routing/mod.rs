//! Routing layer.
//!
//! Holds the predicate/buffer pairs registered by subchannels and the ordered,
//! first-match dispatch over them.
//!
//! ```
//! use std::sync::Arc;
//! use message_channel::{Dispatch, Route, Router};
//!
//! let router = Router::new();
//! let hello = Arc::new(Route::new(|m: &&str| *m == "hello"));
//! router.register(hello.clone());
//!
//! assert!(router.distribute("hello").is_routed());
//! assert!(matches!(router.distribute("world"), Dispatch::Unrouted("world")));
//! assert_eq!(hello.buffer().try_pop(), Some("hello"));
//! ```

pub(crate) mod route;
pub(crate) mod router;
