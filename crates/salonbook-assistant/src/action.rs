// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Action kinds, their entity requirements, and entity normalization.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Entity map: field name to value. Values are never empty.
pub type Entities = BTreeMap<String, String>;

/// The action a turn resolved to, as reported to the client: the intent and
/// every entity collected for it so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAction {
    pub intent: ActionKind,
    pub entities: Entities,
}

impl TurnAction {
    pub fn new(intent: ActionKind, entities: Entities) -> Self {
        Self { intent, entities }
    }

    pub fn chat() -> Self {
        Self::default()
    }
}

/// The database operations the assistant can perform, plus plain chat.
///
/// Wire names are `SCREAMING_SNAKE_CASE` (`ADD_EMPLOYEE`, `GET_REVENUE`, ...).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    AddEmployee,
    GetRevenue,
    ReassignAppointments,
    AssignBooking,
    CancelBooking,
    #[default]
    Chat,
}

impl ActionKind {
    /// Parses a wire name leniently: case-insensitive, `NONE` and unknown
    /// names become [`ActionKind::Chat`]. Wit-style `snake_case` names work
    /// as well.
    pub fn from_wire(name: &str) -> Self {
        let name = name.trim().replace(['-', ' '], "_");
        name.parse().unwrap_or(ActionKind::Chat)
    }

    /// Fields that must be present and non-empty before execution.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            ActionKind::AddEmployee => &["name", "role", "phone", "email"],
            ActionKind::GetRevenue => &["date"],
            ActionKind::ReassignAppointments => &["employeeName", "date"],
            ActionKind::AssignBooking => &["bookingId", "stylistName"],
            ActionKind::CancelBooking => &["bookingId"],
            ActionKind::Chat => &[],
        }
    }

    /// Fields that refine execution without affecting completeness.
    pub fn optional_fields(self) -> &'static [&'static str] {
        match self {
            ActionKind::GetRevenue => &["endDate"],
            ActionKind::ReassignAppointments => &["toEmployeeName"],
            _ => &[],
        }
    }

    /// Required fields absent from `entities`, in declaration order.
    pub fn missing_fields(self, entities: &Entities) -> Vec<&'static str> {
        self.required_fields()
            .iter()
            .copied()
            .filter(|f| entities.get(*f).is_none_or(|v| v.trim().is_empty()))
            .collect()
    }

    pub fn is_action(self) -> bool {
        self != ActionKind::Chat
    }

    /// Short phrase describing the action, for follow-up prompts.
    pub fn describe(self) -> &'static str {
        match self {
            ActionKind::AddEmployee => "add a new employee",
            ActionKind::GetRevenue => "look up revenue",
            ActionKind::ReassignAppointments => "reassign appointments",
            ActionKind::AssignBooking => "assign a booking",
            ActionKind::CancelBooking => "cancel a booking",
            ActionKind::Chat => "help",
        }
    }
}

/// Human wording for an entity field.
pub fn field_label(field: &str) -> &str {
    match field {
        "name" => "name",
        "role" => "role",
        "phone" => "phone number",
        "email" => "email address",
        "date" => "date",
        "endDate" => "end date",
        "employeeName" => "employee's name",
        "toEmployeeName" => "stylist to move them to",
        "bookingId" => "booking ID",
        "stylistName" => "stylist's name",
        other => other,
    }
}

/// A question asking for one missing field.
pub fn follow_up_question(kind: ActionKind, field: &str) -> String {
    match (kind, field) {
        (ActionKind::AddEmployee, "name") => "What is the new employee's name?".to_string(),
        (ActionKind::AddEmployee, f) => format!("What is their {}?", field_label(f)),
        (ActionKind::GetRevenue, "date") => {
            "Which date should I check revenue for (YYYY-MM-DD, today or yesterday)?".to_string()
        }
        (ActionKind::ReassignAppointments, "employeeName") => {
            "Whose appointments should I reassign?".to_string()
        }
        (ActionKind::ReassignAppointments, "date") => {
            "For which date (YYYY-MM-DD, today or tomorrow)?".to_string()
        }
        (_, "bookingId") => "What is the booking ID?".to_string(),
        (_, "stylistName") => "Which stylist should take this booking?".to_string(),
        (_, f) => format!("What is the {}?", field_label(f)),
    }
}

/// Converts a JSON value to an entity string. Strings are trimmed, numbers
/// and booleans are rendered; null, empty strings, objects and arrays are
/// absent.
pub fn entity_value(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Normalizes a JSON `entities` object. Non-object input yields no entities.
pub fn normalize_entities(value: &serde_json::Value) -> Entities {
    let Some(map) = value.as_object() else {
        return Entities::new();
    };
    map.iter()
        .filter_map(|(k, v)| entity_value(v).map(|v| (k.trim().to_string(), v)))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Trims string entities and drops empty ones.
pub fn clean_entities<'a>(pairs: impl IntoIterator<Item = (&'a String, &'a String)>) -> Entities {
    pairs
        .into_iter()
        .filter_map(|(k, v)| {
            let v = v.trim();
            (!k.trim().is_empty() && !v.is_empty()).then(|| (k.trim().to_string(), v.to_string()))
        })
        .collect()
}

/// Parses `YYYY-MM-DD` (an ISO datetime's date prefix is accepted),
/// `today`, `yesterday` or `tomorrow` relative to `today`.
pub fn parse_date(value: &str, today: NaiveDate) -> Option<NaiveDate> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "today" => return Some(today),
        "yesterday" => return today.checked_sub_days(Days::new(1)),
        "tomorrow" => return today.checked_add_days(Days::new(1)),
        _ => {}
    }
    let prefix = value.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
