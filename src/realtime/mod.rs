//! # Real-Time Change Feed
//!
//! Committed writes surface as typed [`ChangeEvent`]s delivered through
//! tokio channels. Delivery is at-least-once per live subscriber and in
//! write order for any single document.

pub mod event;
pub mod feed;

pub use event::{ChangeEvent, ChangeKind};
pub use feed::{ChangeFeed, ChangeFilter, ChangeReceiver, PublishResult};
