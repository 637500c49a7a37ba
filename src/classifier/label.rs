// src/classifier/label.rs
//! Classification labels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category assigned to a destination address
///
/// The set is closed: every address maps to exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassLabel {
    /// IPv4, first octet 1-127
    ClassA,

    /// IPv4, first octet 128-191
    ClassB,

    /// IPv4, first octet 192-223
    ClassC,

    /// IPv4, first octet 0 or 224-255
    ClassUnknownV4,

    /// Any IPv6 address
    #[serde(rename = "ipv6")]
    V6,
}

impl ClassLabel {
    /// Number of labels
    pub const COUNT: usize = 5;

    /// All labels, in counter index order
    pub const ALL: [ClassLabel; Self::COUNT] = [
        ClassLabel::ClassA,
        ClassLabel::ClassB,
        ClassLabel::ClassC,
        ClassLabel::ClassUnknownV4,
        ClassLabel::V6,
    ];

    /// Labels exposed by the stats report, in report order
    pub const REPORTED: [ClassLabel; 4] = [
        ClassLabel::ClassA,
        ClassLabel::ClassB,
        ClassLabel::ClassC,
        ClassLabel::V6,
    ];

    /// Dense index into per-label arrays
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            ClassLabel::ClassA => 0,
            ClassLabel::ClassB => 1,
            ClassLabel::ClassC => 2,
            ClassLabel::ClassUnknownV4 => 3,
            ClassLabel::V6 => 4,
        }
    }

    /// Stable machine-readable key (metrics labels, JSON fields)
    pub const fn key(self) -> &'static str {
        match self {
            ClassLabel::ClassA => "class_a",
            ClassLabel::ClassB => "class_b",
            ClassLabel::ClassC => "class_c",
            ClassLabel::ClassUnknownV4 => "class_unknown_v4",
            ClassLabel::V6 => "ipv6",
        }
    }

    /// Line prefix in the stats report, `None` for labels the report omits
    pub const fn report_name(self) -> Option<&'static str> {
        match self {
            ClassLabel::ClassA => Some("IPv4 Class A"),
            ClassLabel::ClassB => Some("IPv4 Class B"),
            ClassLabel::ClassC => Some("IPv4 Class C"),
            ClassLabel::ClassUnknownV4 => None,
            ClassLabel::V6 => Some("IPv6 Packets"),
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClassLabel::ClassA => "Class A",
            ClassLabel::ClassB => "Class B",
            ClassLabel::ClassC => "Class C",
            ClassLabel::ClassUnknownV4 => "Unknown Class",
            ClassLabel::V6 => "IPv6",
        };
        f.write_str(name)
    }
}
