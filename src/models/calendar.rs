// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Provider calendar listing entries (never stored).

use serde::Serialize;

/// A calendar on the user's provider account, as shown in the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarItem {
    pub id: String,
    pub summary: String,
    pub primary: bool,
    pub access_role: String,
    pub background_color: Option<String>,
    pub description: Option<String>,
    /// True when a feed already references this calendar.
    pub selected: bool,
}
