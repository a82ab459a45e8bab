// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types that exist only at the storage layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

/// Fields for inserting a booking. The storefront owns booking creation;
/// this exists for seeding and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub customer_name: String,
    pub service: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub stylist_name: Option<String>,
    pub status: BookingStatus,
    pub amount: Option<f64>,
    pub price: Option<f64>,
}

impl NewBooking {
    pub fn new(customer_name: &str, service: &str, date: NaiveDate) -> Self {
        Self {
            customer_name: customer_name.to_string(),
            service: service.to_string(),
            date,
            time: None,
            stylist_name: None,
            status: BookingStatus::Pending,
            amount: None,
            price: None,
        }
    }
}

/// A persisted booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: String,
    pub customer_name: String,
    pub service: String,
    pub date: String,
    pub time: Option<String>,
    pub stylist_name: Option<String>,
    pub status: BookingStatus,
    pub amount: Option<f64>,
    pub price: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}
