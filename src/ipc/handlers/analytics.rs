use super::{db_conn, optional_str, year_param};
use crate::analytics::{self, clearance, distribution, timeline, validity};
use crate::cache::CacheKey;
use crate::dates;
use crate::db;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::{Job, JobFilter};
use chrono::NaiveDate;
use serde_json::json;

fn load(state: &AppState, req: &Request, filter: &JobFilter) -> Result<Vec<Job>, serde_json::Value> {
    let conn = db_conn(state, req)?;
    db::load_jobs(conn, filter)
        .map_err(|e| store_err(&req.id, "db_query_failed", "failed to load jobs", &e))
}

fn parse_month(req: &Request) -> Result<u32, serde_json::Value> {
    let month = match req.params.get("month") {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => return Err(err(&req.id, "bad_params", "missing month", None)),
    };
    match month {
        Some(m @ 1..=12) => Ok(m as u32),
        _ => Err(err(
            &req.id,
            "bad_params",
            "month must be between 1 and 12",
            Some(json!({ "month": req.params.get("month") })),
        )),
    }
}

fn parse_reference_date(req: &Request) -> Result<NaiveDate, serde_json::Value> {
    let raw = req.params.get("date").and_then(|v| v.as_str());
    dates::reference_date(raw).map_err(|message| err(&req.id, "bad_params", message, None))
}

fn importer_param(req: &Request) -> Option<String> {
    analytics::importer_filter(req.params.get("importer").and_then(|v| v.as_str()))
}

fn handle_import_clearance(state: &mut AppState, req: &Request) -> serde_json::Value {
    let year = match year_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let month = match parse_month(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let filter = JobFilter::year(year.clone())
        .with_importer(importer_param(req))
        .with_ie_code(optional_str(req, "ieCode"));
    let jobs = match load(state, req, &filter) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let report = clearance::import_clearance(&jobs, month);
    let mut result = json!(report);
    result["year"] = json!(year);
    result["importer"] = json!(filter.importer);
    result["ieCode"] = json!(filter.ie_code);
    ok(&req.id, result)
}

fn handle_date_validity(state: &mut AppState, req: &Request) -> serde_json::Value {
    let year = match year_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    // The dashboard is per importer; "All Importers" is not allowed here.
    let Some(importer) = importer_param(req) else {
        return err(
            &req.id,
            "bad_params",
            "importer is required and cannot be 'All Importers'",
            None,
        );
    };
    let today = match parse_reference_date(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let key = CacheKey::new(&year, &importer, &dates::iso_date(today));
    if let Some(mut cached) = state.cache.get(&key) {
        tracing::debug!(year = %year, importer = %importer, "date validity cache hit");
        // Entries are shared across importer spellings; echo this caller's.
        cached["importer"] = json!(importer);
        return ok(&req.id, cached);
    }

    let filter = JobFilter::year(year.clone()).with_importer(Some(importer.clone()));
    let jobs = match load(state, req, &filter) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let report = validity::date_validity(&jobs, &importer, today);
    let mut result = json!(report);
    result["year"] = json!(year);

    state.cache.insert(key, result.clone());
    ok(&req.id, result)
}

fn handle_event_timeline(state: &mut AppState, req: &Request) -> serde_json::Value {
    let year = match year_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let today = match parse_reference_date(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let filter = JobFilter::year(year.clone()).with_importer(importer_param(req));
    let jobs = match load(state, req, &filter) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut result = json!(timeline::event_timeline(&jobs, today));
    result["year"] = json!(year);
    result["importer"] = json!(filter.importer);
    ok(&req.id, result)
}

fn handle_status_distribution(state: &mut AppState, req: &Request) -> serde_json::Value {
    let year = match year_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let filter = JobFilter::year(year.clone()).with_importer(importer_param(req));
    let jobs = match load(state, req, &filter) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut result = json!(distribution::status_distribution(&jobs));
    result["year"] = json!(year);
    result["importer"] = json!(filter.importer);
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.importClearance" => Some(handle_import_clearance(state, req)),
        "analytics.dateValidity" => Some(handle_date_validity(state, req)),
        "analytics.eventTimeline" => Some(handle_event_timeline(state, req)),
        "analytics.statusDistribution" => Some(handle_status_distribution(state, req)),
        _ => None,
    }
}
