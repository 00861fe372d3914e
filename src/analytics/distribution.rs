use serde::Serialize;

use super::percent;
use crate::model::Job;

/// Detailed statuses the dashboard always charts, in workflow order.
pub const STATUS_VOCABULARY: [&str; 10] = [
    "ETA Date Pending",
    "Estimated Time of Arrival",
    "Gateway IGM Filed",
    "Discharged",
    "BE Noted, Arrival Pending",
    "BE Noted, Clearance Pending",
    "PCV Done, Duty Payment Pending",
    "Custom Clearance Completed",
    "Billing Pending",
    "Status Completed",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDistribution {
    pub total_jobs: u64,
    pub statuses: Vec<StatusBucket>,
    pub unclassified: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBucket {
    pub status: &'static str,
    pub count: u64,
    pub percentage: f64,
}

/// Lowercase alphanumerics only, so "BE Noted Arrival Pending" and
/// "BE Noted, Arrival Pending" compare equal.
fn status_key(status: &str) -> String {
    status
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn status_distribution(jobs: &[Job]) -> StatusDistribution {
    let known: Vec<String> = STATUS_VOCABULARY.iter().map(|s| status_key(s)).collect();
    let mut counts = [0u64; STATUS_VOCABULARY.len()];
    let mut unclassified = 0u64;

    for job in jobs {
        let key = status_key(&job.detailed_status);
        match known.iter().position(|k| !key.is_empty() && *k == key) {
            Some(i) => counts[i] += 1,
            None => unclassified += 1,
        }
    }

    let total_jobs = jobs.len() as u64;
    StatusDistribution {
        total_jobs,
        statuses: STATUS_VOCABULARY
            .iter()
            .zip(counts)
            .map(|(status, count)| StatusBucket {
                status: *status,
                count,
                percentage: percent(count, total_jobs),
            })
            .collect(),
        unclassified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: &str) -> Job {
        Job {
            detailed_status: status.into(),
            ..Job::default()
        }
    }

    #[test]
    fn all_ten_statuses_present_when_empty() {
        let d = status_distribution(&[]);
        assert_eq!(d.statuses.len(), 10);
        assert!(d.statuses.iter().all(|b| b.count == 0 && b.percentage == 0.0));
        assert_eq!(d.unclassified, 0);
    }

    #[test]
    fn vocabulary_is_fixed_and_ordered() {
        let names: Vec<&str> = status_distribution(&[]).statuses.iter().map(|b| b.status).collect();
        assert_eq!(
            names,
            [
                "ETA Date Pending",
                "Estimated Time of Arrival",
                "Gateway IGM Filed",
                "Discharged",
                "BE Noted, Arrival Pending",
                "BE Noted, Clearance Pending",
                "PCV Done, Duty Payment Pending",
                "Custom Clearance Completed",
                "Billing Pending",
                "Status Completed",
            ]
        );
    }

    #[test]
    fn punctuation_and_spacing_are_ignored() {
        let jobs = vec![
            job("BE Noted Arrival Pending"),
            job("be noted,clearance pending"),
            job("PCV  Done Duty Payment Pending"),
            job("ETA-Date-Pending"),
            job("---"),
        ];
        let d = status_distribution(&jobs);
        assert_eq!(d.unclassified, 1);
        assert_eq!(d.statuses[0].count, 1);
        assert_eq!(d.statuses[4].count, 1);
        assert_eq!(d.statuses[5].count, 1);
        assert_eq!(d.statuses[6].count, 1);
    }

    #[test]
    fn counts_known_and_unknown_statuses() {
        let jobs = vec![
            job("Discharged"),
            job(" discharged "),
            job("Billing Pending"),
            job(""),
        ];
        let d = status_distribution(&jobs);
        assert_eq!(d.total_jobs, 4);
        let discharged = d.statuses.iter().find(|b| b.status == "Discharged").expect("bucket");
        assert_eq!(discharged.count, 2);
        assert_eq!(discharged.percentage, 50.0);
        assert_eq!(d.unclassified, 1);
        assert_eq!(d.statuses.iter().map(|b| b.count).sum::<u64>(), 3);
    }
}
