// src/classifier/mod.rs
//! Destination address classification
//!
//! Maps every outbound destination to exactly one [`ClassLabel`]:
//!
//! ```text
//! IPv4 first octet   1..=127  → Class A
//!                  128..=191  → Class B
//!                  192..=223  → Class C
//!            0, 224..=255     → Unknown IPv4 class
//! any IPv6 address            → IPv6
//! ```
//!
//! Classification is total and pure: no state, no side effects, no errors.

pub mod address;
pub mod label;

pub use address::{AddressFamily, Destination};
pub use label::ClassLabel;

/// Classify a destination address
#[inline]
pub fn classify(destination: Destination) -> ClassLabel {
    match destination.first_octet() {
        Some(octet) => classify_v4_octet(octet),
        None => ClassLabel::V6,
    }
}

/// Classify an IPv4 address by its most significant (host-order) octet
#[inline]
pub fn classify_v4_octet(octet: u8) -> ClassLabel {
    match octet {
        1..=127 => ClassLabel::ClassA,
        128..=191 => ClassLabel::ClassB,
        192..=223 => ClassLabel::ClassC,
        _ => ClassLabel::ClassUnknownV4,
    }
}
