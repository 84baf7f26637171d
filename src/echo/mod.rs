//! WebSocket echo service.
//!
//! Every data frame a client sends is written back on the same connection:
//! - Client sends: text or binary message
//! - Server echoes: the same payload with the same frame type
//!
//! ## Per-connection lifecycle
//!
//! ```text
//! Open --(text/binary)--> log + echo --> Open
//! Open --(close/error/eof)--> Closed
//! ```
//!
//! Messages on one connection are handled strictly in receipt order: the
//! echo of a message is written before the next one is read. There is no
//! ordering between different connections and nothing is shared between
//! them.
//!
//! Control frames are not echoed. Pings are answered by tungstenite itself
//! and a close frame from the peer ends the session once the close reply
//! has been flushed.

pub mod handler;
pub mod message;

pub use handler::{handle_connection, websocket_config};
