//! Per-container timing status relative to a reference day.
//!
//! Every dimension follows the same window rule on the fractional day
//! distance `d` from midnight of `today` to the event:
//! `d < 0` reached, `d < 1` today, `d < 4` soon, otherwise later.
//! A missing date always lands in the dimension's default state.

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates;
use crate::model::Container;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Reached,
    Today,
    Soon,
    Later,
}

impl Window {
    pub fn classify(days: f64) -> Self {
        if days < 0.0 {
            Window::Reached
        } else if days < 1.0 {
            Window::Today
        } else if days < 4.0 {
            Window::Soon
        } else {
            Window::Later
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArrivalStatus {
    #[serde(rename = "ARRIVED")]
    Arrived,
    #[serde(rename = "ARRIVING_TODAY")]
    ArrivingToday,
    #[serde(rename = "ARRIVING_SOON_3_DAYS")]
    ArrivingSoon,
    #[serde(rename = "PENDING_ARRIVAL")]
    PendingArrival,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RailOutStatus {
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "SCHEDULED")]
    Scheduled,
    #[serde(rename = "OVERDUE")]
    Overdue,
    #[serde(rename = "NOT_SET")]
    NotSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DoValidityStatus {
    #[serde(rename = "EXPIRED")]
    Expired,
    #[serde(rename = "EXPIRES_TODAY")]
    ExpiresToday,
    #[serde(rename = "EXPIRES_SOON_3_DAYS")]
    ExpiresSoon,
    #[serde(rename = "VALID")]
    Valid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DetentionStatus {
    #[serde(rename = "ON_DETENTION")]
    OnDetention,
    #[serde(rename = "STARTS_TODAY")]
    StartsToday,
    #[serde(rename = "STARTS_SOON_3_DAYS")]
    StartsSoon,
    #[serde(rename = "SAFE")]
    Safe,
}

impl ArrivalStatus {
    pub const ALL: [ArrivalStatus; 4] = [
        ArrivalStatus::Arrived,
        ArrivalStatus::ArrivingToday,
        ArrivalStatus::ArrivingSoon,
        ArrivalStatus::PendingArrival,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArrivalStatus::Arrived => "ARRIVED",
            ArrivalStatus::ArrivingToday => "ARRIVING_TODAY",
            ArrivalStatus::ArrivingSoon => "ARRIVING_SOON_3_DAYS",
            ArrivalStatus::PendingArrival => "PENDING_ARRIVAL",
        }
    }
}

impl RailOutStatus {
    pub const ALL: [RailOutStatus; 4] = [
        RailOutStatus::Completed,
        RailOutStatus::Scheduled,
        RailOutStatus::Overdue,
        RailOutStatus::NotSet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RailOutStatus::Completed => "COMPLETED",
            RailOutStatus::Scheduled => "SCHEDULED",
            RailOutStatus::Overdue => "OVERDUE",
            RailOutStatus::NotSet => "NOT_SET",
        }
    }
}

impl DoValidityStatus {
    pub const ALL: [DoValidityStatus; 4] = [
        DoValidityStatus::Expired,
        DoValidityStatus::ExpiresToday,
        DoValidityStatus::ExpiresSoon,
        DoValidityStatus::Valid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DoValidityStatus::Expired => "EXPIRED",
            DoValidityStatus::ExpiresToday => "EXPIRES_TODAY",
            DoValidityStatus::ExpiresSoon => "EXPIRES_SOON_3_DAYS",
            DoValidityStatus::Valid => "VALID",
        }
    }
}

impl DetentionStatus {
    pub const ALL: [DetentionStatus; 4] = [
        DetentionStatus::OnDetention,
        DetentionStatus::StartsToday,
        DetentionStatus::StartsSoon,
        DetentionStatus::Safe,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DetentionStatus::OnDetention => "ON_DETENTION",
            DetentionStatus::StartsToday => "STARTS_TODAY",
            DetentionStatus::StartsSoon => "STARTS_SOON_3_DAYS",
            DetentionStatus::Safe => "SAFE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerStatus {
    pub arrival: ArrivalStatus,
    pub rail_out: RailOutStatus,
    pub do_validity: DoValidityStatus,
    pub detention: DetentionStatus,
    pub days_until_arrival: Option<f64>,
    pub days_until_do_expiry: Option<f64>,
    pub days_until_detention: Option<f64>,
}

impl ContainerStatus {
    pub fn needs_action(&self) -> bool {
        matches!(
            self.arrival,
            ArrivalStatus::ArrivingToday | ArrivalStatus::ArrivingSoon
        ) || self.rail_out == RailOutStatus::Overdue
            || self.do_validity != DoValidityStatus::Valid
            || self.detention != DetentionStatus::Safe
    }
}

fn days_to(raw: &str, today: NaiveDate) -> Option<f64> {
    dates::parse_loose(raw).map(|event| dates::days_until(event, today))
}

pub fn arrival_status(days: Option<f64>) -> ArrivalStatus {
    match days.map(Window::classify) {
        Some(Window::Reached) => ArrivalStatus::Arrived,
        Some(Window::Today) => ArrivalStatus::ArrivingToday,
        Some(Window::Soon) => ArrivalStatus::ArrivingSoon,
        Some(Window::Later) | None => ArrivalStatus::PendingArrival,
    }
}

pub fn rail_out_status(days: Option<f64>, arrival: ArrivalStatus) -> RailOutStatus {
    match days.map(Window::classify) {
        Some(Window::Reached) => RailOutStatus::Completed,
        Some(_) => RailOutStatus::Scheduled,
        None if arrival == ArrivalStatus::Arrived => RailOutStatus::Overdue,
        None => RailOutStatus::NotSet,
    }
}

pub fn do_validity_status(days: Option<f64>) -> DoValidityStatus {
    match days.map(Window::classify) {
        Some(Window::Reached) => DoValidityStatus::Expired,
        Some(Window::Today) => DoValidityStatus::ExpiresToday,
        Some(Window::Soon) => DoValidityStatus::ExpiresSoon,
        Some(Window::Later) | None => DoValidityStatus::Valid,
    }
}

pub fn detention_status(days: Option<f64>) -> DetentionStatus {
    match days.map(Window::classify) {
        Some(Window::Reached) => DetentionStatus::OnDetention,
        Some(Window::Today) => DetentionStatus::StartsToday,
        Some(Window::Soon) => DetentionStatus::StartsSoon,
        Some(Window::Later) | None => DetentionStatus::Safe,
    }
}

pub fn derive(container: &Container, today: NaiveDate) -> ContainerStatus {
    let days_until_arrival = days_to(&container.arrival_date, today);
    let days_until_rail_out = days_to(&container.container_rail_out_date, today);
    let days_until_do_expiry = days_to(&container.do_validity_upto_container_level, today);
    let days_until_detention = days_to(&container.detention_from, today);

    let arrival = arrival_status(days_until_arrival);
    ContainerStatus {
        arrival,
        rail_out: rail_out_status(days_until_rail_out, arrival),
        do_validity: do_validity_status(days_until_do_expiry),
        detention: detention_status(days_until_detention),
        days_until_arrival,
        days_until_do_expiry,
        days_until_detention,
    }
}

/// Whole days for display, rounded towards the past.
pub fn whole_days(days: Option<f64>) -> Option<i64> {
    days.map(|d| d.floor() as i64)
}
