use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::dates;
use crate::model::Job;

pub const TIMELINE_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTimeline {
    pub start_date: String,
    pub end_date: String,
    pub days: Vec<TimelineDay>,
    pub totals: EventCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDay {
    pub date: String,
    #[serde(flatten)]
    pub counts: EventCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCounts {
    pub out_of_charge: u64,
    pub arrivals: u64,
    pub rail_outs: u64,
    pub deliveries: u64,
    pub total: u64,
}

#[derive(Clone, Copy)]
enum Event {
    OutOfCharge,
    Arrival,
    RailOut,
    Delivery,
}

impl EventCounts {
    fn bump(&mut self, event: Event) {
        match event {
            Event::OutOfCharge => self.out_of_charge += 1,
            Event::Arrival => self.arrivals += 1,
            Event::RailOut => self.rail_outs += 1,
            Event::Delivery => self.deliveries += 1,
        }
        self.total += 1;
    }
}

/// Daily event counts for the 30 days ending at `today`, inclusive. The
/// window is clipped at the earliest representable date.
pub fn event_timeline(jobs: &[Job], today: NaiveDate) -> EventTimeline {
    let start = today
        .checked_sub_signed(Duration::days(TIMELINE_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);
    let span = (today - start).num_days() + 1;
    let mut buckets = vec![EventCounts::default(); span as usize];
    let mut totals = EventCounts::default();

    let mut record = |raw: &str, event: Event| {
        let Some(d) = dates::parse_loose_date(raw) else {
            return;
        };
        if d < start || d > today {
            return;
        }
        let idx = (d - start).num_days() as usize;
        buckets[idx].bump(event);
        totals.bump(event);
    };

    for job in jobs {
        record(&job.out_of_charge, Event::OutOfCharge);
        for c in &job.container_nos {
            record(&c.arrival_date, Event::Arrival);
            record(&c.container_rail_out_date, Event::RailOut);
            record(&c.delivery_date, Event::Delivery);
        }
    }

    let days = buckets
        .into_iter()
        .enumerate()
        .filter_map(|(i, counts)| {
            let date = start.checked_add_signed(Duration::days(i as i64))?;
            Some(TimelineDay {
                date: dates::iso_date(date),
                counts,
            })
        })
        .collect();

    EventTimeline {
        start_date: dates::iso_date(start),
        end_date: dates::iso_date(today),
        days,
        totals,
    }
}
