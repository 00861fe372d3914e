use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{is_scrap_commodity, percent, round_to, size_breakdown, SizeTally};
use crate::dates;
use crate::model::Job;

pub const SCRAP_BUCKET: &str = "Scrap/Waste";
pub const OTHER_BUCKET: &str = "Other";
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// (first day, last day) of each weekly bucket in a month.
const WEEKS: [(u32, u32); 5] = [(1, 7), (8, 14), (15, 21), (22, 28), (29, 31)];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearanceReport {
    pub month: u32,
    pub summary: ClearanceSummary,
    pub charts: ClearanceCharts,
    pub job_details: Vec<ClearanceJobRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearanceSummary {
    pub total_jobs: u64,
    pub total_containers: u64,
    pub container20: u64,
    pub container40: u64,
    pub other_containers: u64,
    pub total_teu: u64,
    pub ratio20: f64,
    pub ratio40: f64,
    pub scrap_jobs: u64,
    pub avg_containers_per_job: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearanceCharts {
    pub daily: Vec<DailyBucket>,
    pub weekly: Vec<WeeklyBucket>,
    pub commodities: Vec<NamedBucket>,
    pub locations: Vec<NamedBucket>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub jobs: u64,
    pub containers: u64,
    pub teu: u64,
}

impl Counts {
    fn add(&mut self, tally: &SizeTally) {
        self.jobs += 1;
        self.containers += tally.containers;
        self.teu += tally.teu;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub date: String,
    #[serde(flatten)]
    pub counts: Counts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyBucket {
    pub week: u32,
    pub label: String,
    pub start_day: u32,
    pub end_day: u32,
    #[serde(flatten)]
    pub counts: Counts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedBucket {
    pub name: String,
    #[serde(flatten)]
    pub counts: Counts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearanceJobRow {
    pub job_no: String,
    pub importer: String,
    pub ie_code_no: String,
    pub custom_house: String,
    pub description: String,
    pub be_no: String,
    pub be_date: String,
    pub out_of_charge: String,
    pub container_count: u64,
    pub teu: u64,
    pub container_sizes: String,
    pub is_scrap: bool,
}

fn week_index(day: u32) -> usize {
    WEEKS
        .iter()
        .position(|(start, end)| day >= *start && day <= *end)
        .unwrap_or(WEEKS.len() - 1)
}

/// Clearance report for jobs whose out-of-charge date falls in `month`.
/// Year/importer/IE-code scoping is expected to have happened at load time.
pub fn import_clearance(jobs: &[Job], month: u32) -> ClearanceReport {
    let mut cleared: Vec<(NaiveDate, &Job)> = jobs
        .iter()
        .filter_map(|job| {
            let ooc = dates::parse_loose_date(&job.out_of_charge)?;
            (ooc.month() == month).then_some((ooc, job))
        })
        .collect();
    cleared.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.job_no.cmp(&b.job_no)));

    let mut totals = SizeTally::default();
    let mut scrap_jobs = 0u64;
    let mut daily: BTreeMap<NaiveDate, Counts> = BTreeMap::new();
    let mut weekly = [Counts::default(); WEEKS.len()];
    let mut scrap = Counts::default();
    let mut other = Counts::default();
    let mut locations: BTreeMap<String, Counts> = BTreeMap::new();
    let mut job_details = Vec::with_capacity(cleared.len());

    for (ooc, job) in &cleared {
        let tally = SizeTally::of(&job.container_nos);
        for c in &job.container_nos {
            totals.add(&c.size);
        }

        daily.entry(*ooc).or_default().add(&tally);
        weekly[week_index(ooc.day())].add(&tally);

        let is_scrap = is_scrap_commodity(&job.description);
        if is_scrap {
            scrap_jobs += 1;
            scrap.add(&tally);
        } else {
            other.add(&tally);
        }

        let location = match job.custom_house.trim() {
            "" => UNKNOWN_LOCATION.to_string(),
            v => v.to_string(),
        };
        locations.entry(location).or_default().add(&tally);

        job_details.push(ClearanceJobRow {
            job_no: job.job_no.clone(),
            importer: job.importer.clone(),
            ie_code_no: job.ie_code_no.clone(),
            custom_house: job.custom_house.clone(),
            description: job.description.clone(),
            be_no: job.be_no.clone(),
            be_date: job.be_date.clone(),
            out_of_charge: job.out_of_charge.clone(),
            container_count: tally.containers,
            teu: tally.teu,
            container_sizes: size_breakdown(&job.container_nos),
            is_scrap,
        });
    }

    let total_jobs = cleared.len() as u64;
    let sized = totals.twenty + totals.forty;
    let summary = ClearanceSummary {
        total_jobs,
        total_containers: totals.containers,
        container20: totals.twenty,
        container40: totals.forty,
        other_containers: totals.other,
        total_teu: totals.teu,
        ratio20: percent(totals.twenty, sized),
        ratio40: percent(totals.forty, sized),
        scrap_jobs,
        avg_containers_per_job: if total_jobs == 0 {
            0.0
        } else {
            round_to(totals.containers as f64 / total_jobs as f64, 2)
        },
    };

    let mut locations: Vec<NamedBucket> = locations
        .into_iter()
        .map(|(name, counts)| NamedBucket { name, counts })
        .collect();
    locations.sort_by(|a, b| {
        b.counts
            .jobs
            .cmp(&a.counts.jobs)
            .then_with(|| a.name.cmp(&b.name))
    });

    ClearanceReport {
        month,
        summary,
        charts: ClearanceCharts {
            daily: daily
                .into_iter()
                .map(|(d, counts)| DailyBucket {
                    date: dates::iso_date(d),
                    counts,
                })
                .collect(),
            weekly: WEEKS
                .iter()
                .zip(weekly)
                .enumerate()
                .map(|(i, ((start, end), counts))| WeeklyBucket {
                    week: i as u32 + 1,
                    label: format!("Week {}", i + 1),
                    start_day: *start,
                    end_day: *end,
                    counts,
                })
                .collect(),
            commodities: vec![
                NamedBucket {
                    name: SCRAP_BUCKET.to_string(),
                    counts: scrap,
                },
                NamedBucket {
                    name: OTHER_BUCKET.to_string(),
                    counts: other,
                },
            ],
            locations,
        },
        job_details,
    }
}
