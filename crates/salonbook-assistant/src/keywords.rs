// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic intent and entity extraction.
//!
//! Last link of the extraction chain: no network, no API key, never fails.
//! It recognizes the phrasing admins actually use ("add new stylist Rahul",
//! "revenue for yesterday", "cancel booking 4512") and leaves anything else
//! as a chat turn. A chat turn still carries the fields that mean the same
//! thing for every action (contact details, role, date, booking id), so a
//! follow-up like "Stylist, 9876543210, rahul@x.com" can complete a pending
//! action.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use salonbook_core::types::ExtractionReply;
use salonbook_core::{
    AdapterType, Capability, HealthStatus, PluginAdapter, ProviderAdapter, ProviderFailure,
    SalonError,
};

use crate::action::ActionKind;

/// Roles recognized in free text, longest first.
const ROLES: &[&str] = &[
    "nail technician",
    "makeup artist",
    "receptionist",
    "beautician",
    "colorist",
    "therapist",
    "stylist",
    "manager",
    "barber",
];

const REVENUE_WORDS: &[&str] = &["revenue", "earnings", "earned", "income", "sales", "takings"];
const BOOKING_WORDS: &[&str] = &["booking", "appointment"];

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").expect("valid email regex"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d[\d\s-]{6,}\d").expect("valid phone regex"));
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("valid date regex"));
static RELATIVE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(today|yesterday|tomorrow)\b").expect("valid date regex"));
static BOOKING_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:booking|appointment)\s*(?:id\s*)?#?\s*([A-Za-z0-9][\w-]*\d[\w-]*)")
        .expect("valid booking id regex")
});
static NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:named|called|stylist|employee|staff member|to)\s+([A-Z][a-zA-Z]+)")
        .expect("valid name regex")
});
static CALLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:named|called|name is)\s+([A-Z][a-zA-Z]+)").expect("valid called regex")
});
static BARE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#?([A-Za-z0-9][\w-]*\d[\w-]*)$").expect("valid bare id regex")
});
static POSSESSIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][a-zA-Z]+)'s\b").expect("valid possessive regex"));
static FROM_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfrom\s+([A-Z][a-zA-Z]+)").expect("valid from regex"));
static TO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bto\s+([A-Z][a-zA-Z]+)").expect("valid to regex"));

/// Words that look like names at the start of a capture but are not.
const NOT_NAMES: &[&str] = &["Today", "Tomorrow", "Yesterday", "The", "A", "An", "Booking"];

fn capture_name(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|name| {
            name.chars().next().is_some_and(char::is_uppercase)
                && !NOT_NAMES.contains(name)
                && !ROLES.contains(&name.to_lowercase().as_str())
        })
        .map(String::from)
}

/// Keyword-based extractor, registered as the `keywords` provider.
#[derive(Debug, Default, Clone)]
pub struct KeywordExtractor;

impl KeywordExtractor {
    pub fn new() -> Self {
        Self
    }

    fn classify(lower: &str) -> ActionKind {
        let mentions_booking = BOOKING_WORDS.iter().any(|w| lower.contains(w));
        if lower.contains("cancel") && mentions_booking {
            ActionKind::CancelBooking
        } else if (lower.contains("reassign") || lower.contains("move"))
            && mentions_booking
        {
            ActionKind::ReassignAppointments
        } else if lower.contains("assign") && mentions_booking {
            ActionKind::AssignBooking
        } else if REVENUE_WORDS.iter().any(|w| lower.contains(w)) {
            ActionKind::GetRevenue
        } else if ["add", "hire", "new", "onboard"].iter().any(|w| lower.contains(w))
            && (["employee", "staff", "team"].iter().any(|w| lower.contains(w))
                || ROLES.iter().any(|r| lower.contains(r)))
        {
            ActionKind::AddEmployee
        } else {
            ActionKind::Chat
        }
    }

    /// Extracts intent and entities from `text`.
    pub fn extract(&self, text: &str) -> ExtractionReply {
        let lower = text.to_lowercase();
        let kind = Self::classify(&lower);
        let mut entities = BTreeMap::new();

        let date = ISO_DATE
            .find(text)
            .map(|m| m.as_str().to_string())
            .or_else(|| RELATIVE_DATE.find(text).map(|m| m.as_str().to_lowercase()));

        match kind {
            ActionKind::AddEmployee => {
                insert_contact_details(text, &lower, &mut entities);
                if let Some(name) = capture_name(&NAMED, text) {
                    entities.insert("name".to_string(), name);
                }
            }
            ActionKind::GetRevenue => {
                if let Some(date) = date {
                    entities.insert("date".to_string(), date);
                }
            }
            ActionKind::ReassignAppointments => {
                if let Some(name) =
                    capture_name(&POSSESSIVE, text).or_else(|| capture_name(&FROM_NAME, text))
                {
                    entities.insert("employeeName".to_string(), name);
                }
                if let Some(to) = capture_name(&TO_NAME, text) {
                    entities.insert("toEmployeeName".to_string(), to);
                }
                if let Some(date) = date {
                    entities.insert("date".to_string(), date);
                }
            }
            ActionKind::AssignBooking => {
                if let Some(id) = BOOKING_ID.captures(text).and_then(|c| c.get(1)) {
                    entities.insert("bookingId".to_string(), id.as_str().to_string());
                }
                if let Some(name) = capture_name(&TO_NAME, text) {
                    entities.insert("stylistName".to_string(), name);
                }
            }
            ActionKind::CancelBooking => {
                if let Some(id) = BOOKING_ID.captures(text).and_then(|c| c.get(1)) {
                    entities.insert("bookingId".to_string(), id.as_str().to_string());
                }
            }
            ActionKind::Chat => {
                insert_contact_details(text, &lower, &mut entities);
                if let Some(name) = capture_name(&CALLED, text) {
                    entities.insert("name".to_string(), name);
                }
                if let Some(date) = date {
                    entities.insert("date".to_string(), date);
                }
                // A lone token is a booking id unless it already read as a phone or date.
                let bare = !entities.contains_key("phone") && !entities.contains_key("date");
                let id = BOOKING_ID
                    .captures(text)
                    .or_else(|| bare.then(|| BARE_ID.captures(text.trim())).flatten())
                    .and_then(|c| c.get(1));
                if let Some(id) = id {
                    entities.insert("bookingId".to_string(), id.as_str().to_string());
                }
            }
        }

        ExtractionReply {
            intent: kind.is_action().then(|| kind.to_string()),
            confidence: if kind.is_action() { 0.6 } else { 0.0 },
            entities,
        }
    }
}

/// Email, phone (digits only) and role, wherever they appear.
fn insert_contact_details(text: &str, lower: &str, entities: &mut BTreeMap<String, String>) {
    if let Some(email) = EMAIL.find(text) {
        entities.insert("email".to_string(), email.as_str().to_string());
    }
    if let Some(phone) = PHONE.find(text) {
        let digits: String = phone
            .as_str()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        entities.insert("phone".to_string(), digits);
    }
    if let Some(role) = ROLES.iter().find(|r| lower.contains(*r)) {
        entities.insert("role".to_string(), capitalize(role));
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl PluginAdapter for KeywordExtractor {
    fn name(&self) -> &str {
        "keywords"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SalonError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter<String, ExtractionReply> for KeywordExtractor {
    fn capability(&self) -> Capability {
        Capability::EntityExtraction
    }

    async fn invoke(&self, text: String) -> Result<ExtractionReply, ProviderFailure> {
        Ok(self.extract(&text))
    }
}
