//! Canonical structured event names used across `message-channel`.

// Lifecycle events.
pub const CHANNEL_OPEN: &str = "channel_open";
pub const CHANNEL_OPEN_REJECTED: &str = "channel_open_rejected";
pub const CHANNEL_CLOSE_START: &str = "channel_close_start";
pub const CHANNEL_CLOSE_OK: &str = "channel_close_ok";
pub const CHANNEL_CLOSE_FAILED: &str = "channel_close_failed";
pub const CHANNEL_DROPPED_OPEN: &str = "channel_dropped_open";
pub const CHANNEL_SPLIT: &str = "channel_split";

// Distribution loop events.
pub const LOOP_START: &str = "loop_start";
pub const LOOP_STOP: &str = "loop_stop";
pub const LOOP_READ_FAILED: &str = "loop_read_failed";
pub const MESSAGE_ROUTED: &str = "message_routed";
pub const MESSAGE_BUFFERED: &str = "message_buffered";
pub const RESIDUAL_DRAINED: &str = "residual_drained";
pub const DESCENDANTS_QUIESCED: &str = "descendants_quiesced";

// Route registration events.
pub const ROUTE_REGISTER: &str = "route_register";
pub const ROUTE_UNREGISTER: &str = "route_unregister";
pub const ROUTE_UNREGISTER_ORPHANED: &str = "route_unregister_orphaned";

// Writer events.
pub const SEND_ATTEMPT: &str = "send_attempt";
pub const SEND_OK: &str = "send_ok";
pub const SEND_FAILED: &str = "send_failed";
