//! Single-session browser automation relay.
//!
//! One persistent browser session, many uncoordinated HTTP callers: the relay
//! admits exactly one operation at a time in strict FIFO order, keeps
//! introspection answerable while the session is busy, and resolves
//! out-of-band browser events (dialogs, downloads) through latched mailboxes.

pub mod classify;
pub mod cli;
pub mod driver;
pub mod error;
pub mod events;
pub mod logging;
pub mod queue;
pub mod server;
pub mod types;
