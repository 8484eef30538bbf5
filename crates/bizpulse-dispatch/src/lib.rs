//! # BizPulse Dispatch
//! `Dispatcher` sends one notification to one recipient; `FanOut` runs a
//! batch of dispatches with bounded concurrency and aggregates the outcomes.

pub mod dispatcher;
pub mod fanout;

pub use dispatcher::Dispatcher;
pub use fanout::{FanOut, FanOutConfig, FanOutReport};
