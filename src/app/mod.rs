//! Application core boundary.
//!
//! [`ports`] holds the traits every hardware adapter implements, and
//! [`events`] the structured events the runtime reports through them.

pub mod events;
pub mod ports;
