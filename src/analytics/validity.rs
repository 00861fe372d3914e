use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::dates;
use crate::model::Job;
use crate::status::{
    self, ArrivalStatus, DetentionStatus, DoValidityStatus, RailOutStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateValidityReport {
    pub importer: String,
    pub date: String,
    pub summary: ValiditySummary,
    pub action_required: ActionRequired,
    pub details: Vec<ValidityRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValiditySummary {
    pub total_jobs: u64,
    pub total_containers: u64,
    pub arrival_status: BTreeMap<&'static str, u64>,
    pub rail_out_status: BTreeMap<&'static str, u64>,
    pub do_validity_status: BTreeMap<&'static str, u64>,
    pub detention_status: BTreeMap<&'static str, u64>,
}

impl ValiditySummary {
    fn zeroed() -> Self {
        Self {
            total_jobs: 0,
            total_containers: 0,
            arrival_status: ArrivalStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect(),
            rail_out_status: RailOutStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect(),
            do_validity_status: DoValidityStatus::ALL
                .iter()
                .map(|s| (s.as_str(), 0))
                .collect(),
            detention_status: DetentionStatus::ALL
                .iter()
                .map(|s| (s.as_str(), 0))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequired {
    pub arriving_today: u64,
    pub arriving_soon: u64,
    pub rail_out_overdue: u64,
    pub do_expired: u64,
    pub do_expires_today: u64,
    pub do_expires_soon: u64,
    pub on_detention: u64,
    pub detention_starts_today: u64,
    pub detention_starts_soon: u64,
    pub containers_needing_action: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityRow {
    pub job_no: String,
    pub importer: String,
    pub custom_house: String,
    pub container_number: String,
    pub size: String,
    pub arrival_date: String,
    pub rail_out_date: String,
    pub do_validity: String,
    pub detention_from: String,
    pub arrival_status: ArrivalStatus,
    pub rail_out_status: RailOutStatus,
    pub do_validity_status: DoValidityStatus,
    pub detention_status: DetentionStatus,
    pub days_until_arrival: Option<i64>,
    pub days_until_do_expiry: Option<i64>,
    pub days_until_detention: Option<i64>,
    pub needs_action: bool,
}

/// Operational dashboard over every container of every job that is not
/// completed. `jobs` must already be scoped to one importer.
pub fn date_validity(jobs: &[Job], importer: &str, today: NaiveDate) -> DateValidityReport {
    let mut summary = ValiditySummary::zeroed();
    let mut action = ActionRequired::default();
    let mut details = Vec::new();

    for job in jobs.iter().filter(|j| !j.is_completed()) {
        summary.total_jobs += 1;
        for c in &job.container_nos {
            summary.total_containers += 1;
            let s = status::derive(c, today);

            *summary.arrival_status.entry(s.arrival.as_str()).or_default() += 1;
            *summary.rail_out_status.entry(s.rail_out.as_str()).or_default() += 1;
            *summary
                .do_validity_status
                .entry(s.do_validity.as_str())
                .or_default() += 1;
            *summary
                .detention_status
                .entry(s.detention.as_str())
                .or_default() += 1;

            match s.arrival {
                ArrivalStatus::ArrivingToday => action.arriving_today += 1,
                ArrivalStatus::ArrivingSoon => action.arriving_soon += 1,
                _ => {}
            }
            if s.rail_out == RailOutStatus::Overdue {
                action.rail_out_overdue += 1;
            }
            match s.do_validity {
                DoValidityStatus::Expired => action.do_expired += 1,
                DoValidityStatus::ExpiresToday => action.do_expires_today += 1,
                DoValidityStatus::ExpiresSoon => action.do_expires_soon += 1,
                DoValidityStatus::Valid => {}
            }
            match s.detention {
                DetentionStatus::OnDetention => action.on_detention += 1,
                DetentionStatus::StartsToday => action.detention_starts_today += 1,
                DetentionStatus::StartsSoon => action.detention_starts_soon += 1,
                DetentionStatus::Safe => {}
            }
            let needs_action = s.needs_action();
            if needs_action {
                action.containers_needing_action += 1;
            }

            details.push(ValidityRow {
                job_no: job.job_no.clone(),
                importer: job.importer.clone(),
                custom_house: job.custom_house.clone(),
                container_number: c.container_number.clone(),
                size: c.size.clone(),
                arrival_date: c.arrival_date.clone(),
                rail_out_date: c.container_rail_out_date.clone(),
                do_validity: c.do_validity_upto_container_level.clone(),
                detention_from: c.detention_from.clone(),
                arrival_status: s.arrival,
                rail_out_status: s.rail_out,
                do_validity_status: s.do_validity,
                detention_status: s.detention,
                days_until_arrival: status::whole_days(s.days_until_arrival),
                days_until_do_expiry: status::whole_days(s.days_until_do_expiry),
                days_until_detention: status::whole_days(s.days_until_detention),
                needs_action,
            });
        }
    }

    DateValidityReport {
        importer: importer.to_string(),
        date: dates::iso_date(today),
        summary,
        action_required: action,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Container;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).expect("date")
    }

    fn job(no: &str, status: &str, containers: Vec<Container>) -> Job {
        Job {
            year: "24-25".into(),
            job_no: no.into(),
            importer: "ACME".into(),
            status: status.into(),
            container_nos: containers,
            ..Job::default()
        }
    }

    fn container(no: &str, arrival: &str, do_validity: &str, detention: &str) -> Container {
        Container {
            container_number: no.into(),
            size: "40".into(),
            arrival_date: arrival.into(),
            do_validity_upto_container_level: do_validity.into(),
            detention_from: detention.into(),
            ..Container::default()
        }
    }

    #[test]
    fn empty_input_has_all_status_keys() {
        let r = date_validity(&[], "ACME", today());
        assert_eq!(r.summary.total_jobs, 0);
        assert_eq!(r.summary.arrival_status.len(), 4);
        assert_eq!(r.summary.rail_out_status.len(), 4);
        assert_eq!(r.summary.do_validity_status.len(), 4);
        assert_eq!(r.summary.detention_status.len(), 4);
        assert!(r.summary.arrival_status.values().all(|v| *v == 0));
        assert_eq!(r.action_required, ActionRequired::default());
        assert_eq!(r.date, "2024-07-15");
    }

    #[test]
    fn completed_jobs_are_excluded() {
        let jobs = vec![
            job("1", "Pending", vec![container("A", "2024-07-10", "", "")]),
            job("2", "Completed", vec![container("B", "2024-07-10", "", "")]),
        ];
        let r = date_validity(&jobs, "ACME", today());
        assert_eq!(r.summary.total_jobs, 1);
        assert_eq!(r.summary.total_containers, 1);
        assert_eq!(r.details[0].container_number, "A");
    }

    #[test]
    fn counts_action_required_per_dimension() {
        let jobs = vec![job(
            "1",
            "Pending",
            vec![
                container("A", "2024-07-10", "2024-07-14", "2024-07-12"),
                container("B", "2024-07-15", "2024-07-15", "2024-07-16"),
                container("C", "2024-07-17", "2024-07-18", "2024-07-15"),
                container("D", "", "", ""),
            ],
        )];
        let r = date_validity(&jobs, "ACME", today());

        assert_eq!(r.summary.arrival_status["ARRIVED"], 1);
        assert_eq!(r.summary.arrival_status["ARRIVING_TODAY"], 1);
        assert_eq!(r.summary.arrival_status["ARRIVING_SOON_3_DAYS"], 1);
        assert_eq!(r.summary.arrival_status["PENDING_ARRIVAL"], 1);
        assert_eq!(r.summary.rail_out_status["OVERDUE"], 1);
        assert_eq!(r.summary.rail_out_status["NOT_SET"], 3);
        assert_eq!(r.summary.do_validity_status["VALID"], 1);

        let a = r.action_required;
        assert_eq!(a.arriving_today, 1);
        assert_eq!(a.arriving_soon, 1);
        assert_eq!(a.rail_out_overdue, 1);
        assert_eq!(a.do_expired, 1);
        assert_eq!(a.do_expires_today, 1);
        assert_eq!(a.do_expires_soon, 1);
        assert_eq!(a.on_detention, 1);
        assert_eq!(a.detention_starts_today, 1);
        assert_eq!(a.detention_starts_soon, 1);
        assert_eq!(a.containers_needing_action, 3);

        assert_eq!(r.details[0].days_until_arrival, Some(-5));
        assert_eq!(r.details[3].days_until_do_expiry, None);
        assert!(!r.details[3].needs_action);
    }
}
