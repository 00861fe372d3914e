mod test_support;

use serde_json::json;
use test_support::{sample_jobs, spawn_with_workspace};

#[test]
fn status_distribution_always_lists_ten_statuses() {
    let mut sidecar = spawn_with_workspace("eximd-distribution");

    let empty = sidecar.request_ok("analytics.statusDistribution", json!({ "year": "24-25" }));
    let statuses = empty["statuses"].as_array().expect("statuses");
    assert_eq!(statuses.len(), 10);
    assert!(statuses.iter().all(|s| s["count"] == 0));

    sidecar.upsert(sample_jobs());
    let all = sidecar.request_ok("analytics.statusDistribution", json!({ "year": "24-25" }));
    assert_eq!(all["totalJobs"], 4);
    assert_eq!(all["unclassified"], 0);
    let count_of = |v: &serde_json::Value, name: &str| {
        v["statuses"]
            .as_array()
            .and_then(|arr| arr.iter().find(|s| s["status"] == name))
            .map(|s| s["count"].clone())
            .expect("status bucket")
    };
    assert_eq!(count_of(&all, "Discharged"), 1);
    assert_eq!(count_of(&all, "Gateway IGM Filed"), 1);
    assert_eq!(count_of(&all, "Billing Pending"), 0);

    let acme = sidecar.request_ok(
        "analytics.statusDistribution",
        json!({ "year": "24-25", "importer": "ACME Metals" }),
    );
    assert_eq!(acme["totalJobs"], 3);
    assert_eq!(count_of(&acme, "Gateway IGM Filed"), 0);
    assert_eq!(acme["statuses"].as_array().map(|a| a.len()), Some(10));
}

#[test]
fn event_timeline_covers_thirty_days() {
    let mut sidecar = spawn_with_workspace("eximd-timeline");
    sidecar.upsert(sample_jobs());

    let t = sidecar.request_ok(
        "analytics.eventTimeline",
        json!({ "year": "24-25", "importer": "ACME Metals", "date": "2024-07-15" }),
    );
    assert_eq!(t["startDate"], "2024-06-16");
    assert_eq!(t["endDate"], "2024-07-15");
    let days = t["days"].as_array().expect("days");
    assert_eq!(days.len(), 30);

    let totals = &t["totals"];
    assert_eq!(totals["outOfCharge"], 2);
    assert_eq!(totals["arrivals"], 3);
    assert_eq!(totals["railOuts"], 1);
    assert_eq!(totals["deliveries"], 1);
    assert_eq!(totals["total"], 7);

    assert_eq!(days[29]["date"], "2024-07-15");
    assert_eq!(days[29]["arrivals"], 1);
}

#[test]
fn event_timeline_defaults_to_all_importers() {
    let mut sidecar = spawn_with_workspace("eximd-timeline-all");
    sidecar.upsert(sample_jobs());

    let t = sidecar.request_ok(
        "analytics.eventTimeline",
        json!({ "year": "24-25", "importer": "All Importers", "date": "2024-07-15" }),
    );
    assert!(t["importer"].is_null());
    // Beta Traders adds one OOC and one arrival.
    assert_eq!(t["totals"]["outOfCharge"], 3);
    assert_eq!(t["totals"]["arrivals"], 4);
}

#[test]
fn out_of_range_reference_dates_are_rejected() {
    let mut sidecar = spawn_with_workspace("eximd-timeline-range");
    sidecar.upsert(sample_jobs());

    for date in ["-262143-01-05", "0001-01-01", "+10000-01-01"] {
        let code = sidecar.request_err(
            "analytics.eventTimeline",
            json!({ "year": "24-25", "date": date }),
        );
        assert_eq!(code, "bad_params", "date {}", date);
        let code = sidecar.request_err(
            "analytics.dateValidity",
            json!({ "year": "24-25", "importer": "ACME Metals", "date": date }),
        );
        assert_eq!(code, "bad_params", "date {}", date);
    }

    // The loop survives and keeps answering.
    let t = sidecar.request_ok(
        "analytics.eventTimeline",
        json!({ "year": "24-25", "date": "1900-01-01" }),
    );
    assert_eq!(t["days"].as_array().map(|d| d.len()), Some(30));
    assert_eq!(t["totals"]["total"], 0);
}

#[test]
fn status_spellings_without_punctuation_are_classified() {
    let mut sidecar = spawn_with_workspace("eximd-distribution-spelling");
    sidecar.upsert(json!([
        { "year": "24-25", "job_no": "1", "detailed_status": "BE Noted Arrival Pending" },
        { "year": "24-25", "job_no": "2", "detailed_status": "pcv done,duty payment pending" }
    ]));

    let d = sidecar.request_ok("analytics.statusDistribution", json!({ "year": "24-25" }));
    assert_eq!(d["unclassified"], 0);
    let names: Vec<&str> = d["statuses"]
        .as_array()
        .expect("statuses")
        .iter()
        .filter_map(|s| s["status"].as_str())
        .collect();
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
    assert_eq!(d["statuses"][4]["count"], 1);
    assert_eq!(d["statuses"][6]["count"], 1);
}
