//! # mediastore-realtime
//!
//! Process-wide change notification. Gateways publish a [`ChangeEvent`]
//! after every successful mutation; views subscribe and re-read through
//! their gateway when something they care about changed.
//!
//! [`ChangeEvent`]: mediastore_core::events::ChangeEvent

pub mod bus;
pub mod subscription;

pub use bus::ChangeBus;
pub use subscription::ChangeSubscription;
