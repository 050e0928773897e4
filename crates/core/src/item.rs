// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! References to purchasable content owned by the content subsystem

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Ebook,
    Chapter,
}

/// A single unlockable ebook or chapter, e.g. `ebook:42` or `chapter:7`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub id: String,
}

impl ItemRef {
    pub fn ebook(id: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Ebook,
            id: id.into(),
        }
    }

    pub fn chapter(id: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Chapter,
            id: id.into(),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ItemKind::Ebook => "ebook",
            ItemKind::Chapter => "chapter",
        };
        write!(f, "{}:{}", kind, self.id)
    }
}

impl FromStr for ItemRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid item '{}': expected ebook:<id> or chapter:<id>", s))?;
        if id.is_empty() {
            return Err(format!("invalid item '{}': missing id", s));
        }
        match kind {
            "ebook" => Ok(ItemRef::ebook(id)),
            "chapter" => Ok(ItemRef::chapter(id)),
            other => Err(format!("unknown item kind: {}", other)),
        }
    }
}
