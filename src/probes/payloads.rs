// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Synthetic input documents
//!
//! Every class maps to one fixed JSON document. Nothing in a payload depends on
//! the clock or on randomness, so runs are comparable byte for byte.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Input-size class, ordered by payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Tiny,
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub const ALL: [SizeClass; 4] = [
        SizeClass::Tiny,
        SizeClass::Small,
        SizeClass::Medium,
        SizeClass::Large,
    ];

    /// Classes that have a column in the tabular report.
    pub const REPORTED: [SizeClass; 3] = [SizeClass::Small, SizeClass::Medium, SizeClass::Large];

    pub fn name(self) -> &'static str {
        match self {
            SizeClass::Tiny => "tiny",
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        }
    }

    /// Column label, e.g. `Small`.
    pub fn title(self) -> &'static str {
        match self {
            SizeClass::Tiny => "Tiny",
            SizeClass::Small => "Small",
            SizeClass::Medium => "Medium",
            SizeClass::Large => "Large",
        }
    }

    pub fn document(self) -> Value {
        match self {
            SizeClass::Tiny => json!({ "name": "test", "value": 42 }),
            SizeClass::Small => json!({
                "users": (0..10)
                    .map(|i| json!({ "id": i, "name": format!("User{}", i) }))
                    .collect::<Vec<_>>()
            }),
            SizeClass::Medium => json!({
                "records": (0..100)
                    .map(|i| json!({ "id": i, "data": format!("Data{}", i).repeat(10) }))
                    .collect::<Vec<_>>()
            }),
            SizeClass::Large => json!({
                "items": (0..1000)
                    .map(|i| json!({ "id": i, "payload": format!("Payload{}", i).repeat(50) }))
                    .collect::<Vec<_>>()
            }),
        }
    }

    /// Compact JSON text handed to `transform`.
    pub fn payload(self) -> String {
        self.document().to_string()
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Default classes for the execution probe.
pub fn default_size_classes() -> Vec<SizeClass> {
    SizeClass::REPORTED.to_vec()
}
