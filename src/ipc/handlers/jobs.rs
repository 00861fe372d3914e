use super::{db_conn, optional_str, required_str, year_param};
use crate::analytics::importer_filter;
use crate::db;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::model::{Job, JobFilter};
use serde_json::json;

fn parse_jobs(req: &Request) -> Result<Vec<Job>, serde_json::Value> {
    let raw = if let Some(list) = req.params.get("jobs") {
        list.clone()
    } else if let Some(one) = req.params.get("job") {
        json!([one])
    } else {
        return Err(err(&req.id, "bad_params", "missing jobs", None));
    };

    let jobs: Vec<Job> = serde_json::from_value(raw).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid job payload: {}", e),
            None,
        )
    })?;
    if jobs.is_empty() {
        return Err(err(&req.id, "bad_params", "jobs must not be empty", None));
    }
    for (i, job) in jobs.iter().enumerate() {
        if job.year.trim().is_empty() || job.job_no.trim().is_empty() {
            return Err(err(
                &req.id,
                "bad_params",
                "every job needs year and job_no",
                Some(json!({ "index": i })),
            ));
        }
        for c in &job.container_nos {
            let size = c.size.trim();
            if !size.is_empty() && size != "20" && size != "40" {
                tracing::warn!(job_no = %job.job_no, size, "container size outside 20/40 carries no TEU");
            }
        }
    }
    Ok(jobs)
}

fn handle_jobs_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let jobs = match parse_jobs(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };

    let (created, updated) = match db::upsert_jobs(conn, &jobs) {
        Ok(counts) => counts,
        Err(e) => return store_err(&req.id, "db_write_failed", "failed to save jobs", &e),
    };
    state.cache.clear();
    tracing::info!(created, updated, "jobs saved");
    ok(&req.id, json!({ "created": created, "updated": updated }))
}

fn handle_jobs_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let year = match year_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let job_no = match required_str(req, "jobNo") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match db::get_job(conn, &year, &job_no) {
        Ok(Some(job)) => ok(&req.id, json!({ "job": job })),
        Ok(None) => err(
            &req.id,
            "not_found",
            "job not found",
            Some(json!({ "year": year, "jobNo": job_no })),
        ),
        Err(e) => store_err(&req.id, "db_query_failed", "failed to load job", &e),
    }
}

fn handle_jobs_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let year = match year_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let filter = JobFilter::year(year)
        .with_importer(importer_filter(req.params.get("importer").and_then(|v| v.as_str())))
        .with_ie_code(optional_str(req, "ieCode"));

    match db::load_jobs(conn, &filter) {
        Ok(jobs) => ok(&req.id, json!({ "total": jobs.len(), "jobs": jobs })),
        Err(e) => store_err(&req.id, "db_query_failed", "failed to load jobs", &e),
    }
}

fn handle_jobs_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let year = match year_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let job_no = match required_str(req, "jobNo") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };

    match db::delete_job(conn, &year, &job_no) {
        Ok(true) => {
            state.cache.clear();
            ok(&req.id, json!({ "deleted": true }))
        }
        Ok(false) => err(&req.id, "not_found", "job not found", None),
        Err(e) => store_err(&req.id, "db_write_failed", "failed to delete job", &e),
    }
}

fn handle_importers_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let year = match year_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    match db::list_importers(conn, &year) {
        Ok(importers) => ok(&req.id, json!({ "importers": importers })),
        Err(e) => store_err(&req.id, "db_query_failed", "failed to list importers", &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "jobs.upsert" => Some(handle_jobs_upsert(state, req)),
        "jobs.get" => Some(handle_jobs_get(state, req)),
        "jobs.list" => Some(handle_jobs_list(state, req)),
        "jobs.delete" => Some(handle_jobs_delete(state, req)),
        "importers.list" => Some(handle_importers_list(state, req)),
        _ => None,
    }
}
