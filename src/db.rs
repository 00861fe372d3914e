use rusqlite::{params_from_iter, types::Value, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use crate::model::{Container, ImporterSummary, Job, JobFilter};

pub const DB_FILE_NAME: &str = "exim.sqlite3";

const JOB_COLUMNS: &str = "j.id, j.year, j.job_no, j.importer, j.ie_code_no, j.custom_house,
    j.status, j.detailed_status, j.description, j.be_no, j.be_date, j.out_of_charge,
    j.discharge_date";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS jobs(
            id TEXT PRIMARY KEY,
            year TEXT NOT NULL,
            job_no TEXT NOT NULL,
            importer TEXT NOT NULL DEFAULT '',
            ie_code_no TEXT NOT NULL DEFAULT '',
            custom_house TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT '',
            detailed_status TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            be_no TEXT NOT NULL DEFAULT '',
            be_date TEXT NOT NULL DEFAULT '',
            out_of_charge TEXT NOT NULL DEFAULT '',
            discharge_date TEXT NOT NULL DEFAULT '',
            updated_at TEXT,
            UNIQUE(year, job_no)
        )",
        [],
    )?;
    // Existing workspaces may predate commodity reporting. Add if needed.
    ensure_jobs_description(&conn)?;
    ensure_jobs_be_no(&conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_jobs_year_importer ON jobs(year, importer)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS containers(
            job_id TEXT NOT NULL,
            seq INTEGER NOT NULL,
            container_number TEXT NOT NULL DEFAULT '',
            size TEXT NOT NULL DEFAULT '',
            arrival_date TEXT NOT NULL DEFAULT '',
            container_rail_out_date TEXT NOT NULL DEFAULT '',
            delivery_date TEXT NOT NULL DEFAULT '',
            detention_from TEXT NOT NULL DEFAULT '',
            do_validity_upto_container_level TEXT NOT NULL DEFAULT '',
            empty_container_off_load_date TEXT NOT NULL DEFAULT '',
            rms TEXT NOT NULL DEFAULT '',
            PRIMARY KEY(job_id, seq),
            FOREIGN KEY(job_id) REFERENCES jobs(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_containers_job ON containers(job_id)",
        [],
    )?;

    Ok(conn)
}

/// Insert or replace jobs keyed by (year, job_no), all-or-nothing.
/// Containers are replaced wholesale. Returns (created, updated).
pub fn upsert_jobs(conn: &Connection, jobs: &[Job]) -> anyhow::Result<(usize, usize)> {
    let tx = conn.unchecked_transaction()?;
    let mut created = 0usize;
    let mut updated = 0usize;
    for job in jobs {
        match write_job(&tx, job) {
            Ok(true) => created += 1,
            Ok(false) => updated += 1,
            Err(e) => {
                return Err(e.context(format!("job {} {}", job.year.trim(), job.job_no.trim())));
            }
        }
    }
    tx.commit()?;
    Ok((created, updated))
}

fn write_job(tx: &Connection, job: &Job) -> anyhow::Result<bool> {
    let existing: Option<String> = tx
        .query_row(
            "SELECT id FROM jobs WHERE year = ? AND job_no = ?",
            (job.year.trim(), job.job_no.trim()),
            |r| r.get(0),
        )
        .optional()?;
    let created = existing.is_none();
    let id = existing.unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = chrono::Utc::now().to_rfc3339();

    tx.execute(
        "INSERT INTO jobs(id, year, job_no, importer, ie_code_no, custom_house, status,
            detailed_status, description, be_no, be_date, out_of_charge, discharge_date, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            importer = excluded.importer,
            ie_code_no = excluded.ie_code_no,
            custom_house = excluded.custom_house,
            status = excluded.status,
            detailed_status = excluded.detailed_status,
            description = excluded.description,
            be_no = excluded.be_no,
            be_date = excluded.be_date,
            out_of_charge = excluded.out_of_charge,
            discharge_date = excluded.discharge_date,
            updated_at = excluded.updated_at",
        rusqlite::params![
            id,
            job.year.trim(),
            job.job_no.trim(),
            job.importer.trim(),
            job.ie_code_no.trim(),
            job.custom_house.trim(),
            job.status,
            job.detailed_status,
            job.description,
            job.be_no,
            job.be_date,
            job.out_of_charge,
            job.discharge_date,
            now,
        ],
    )?;

    tx.execute("DELETE FROM containers WHERE job_id = ?", [&id])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO containers(job_id, seq, container_number, size, arrival_date,
                container_rail_out_date, delivery_date, detention_from,
                do_validity_upto_container_level, empty_container_off_load_date, rms)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        for (seq, c) in job.container_nos.iter().enumerate() {
            stmt.execute(rusqlite::params![
                id,
                seq as i64,
                c.container_number.trim(),
                c.size.trim(),
                c.arrival_date,
                c.container_rail_out_date,
                c.delivery_date,
                c.detention_from,
                c.do_validity_upto_container_level,
                c.empty_container_off_load_date,
                c.rms,
            ])?;
        }
    }
    Ok(created)
}

fn filter_clause(filter: &JobFilter) -> (String, Vec<Value>) {
    let mut sql = String::from("j.year = ?");
    let mut values = vec![Value::Text(filter.year.trim().to_string())];
    if let Some(importer) = &filter.importer {
        sql.push_str(" AND lower(trim(j.importer)) = lower(trim(?))");
        values.push(Value::Text(importer.clone()));
    }
    if let Some(ie_code) = &filter.ie_code {
        sql.push_str(" AND upper(trim(j.ie_code_no)) = upper(trim(?))");
        values.push(Value::Text(ie_code.clone()));
    }
    (sql, values)
}

fn job_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<(String, Job)> {
    Ok((
        r.get(0)?,
        Job {
            year: r.get(1)?,
            job_no: r.get(2)?,
            importer: r.get(3)?,
            ie_code_no: r.get(4)?,
            custom_house: r.get(5)?,
            status: r.get(6)?,
            detailed_status: r.get(7)?,
            description: r.get(8)?,
            be_no: r.get(9)?,
            be_date: r.get(10)?,
            out_of_charge: r.get(11)?,
            discharge_date: r.get(12)?,
            container_nos: Vec::new(),
        },
    ))
}

fn container_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<(String, Container)> {
    Ok((
        r.get(0)?,
        Container {
            container_number: r.get(1)?,
            size: r.get(2)?,
            arrival_date: r.get(3)?,
            container_rail_out_date: r.get(4)?,
            delivery_date: r.get(5)?,
            detention_from: r.get(6)?,
            do_validity_upto_container_level: r.get(7)?,
            empty_container_off_load_date: r.get(8)?,
            rms: r.get(9)?,
        },
    ))
}

/// Jobs matching `filter` with their containers, ordered by job number.
pub fn load_jobs(conn: &Connection, filter: &JobFilter) -> anyhow::Result<Vec<Job>> {
    let (where_sql, values) = filter_clause(filter);

    let sql = format!(
        "SELECT {} FROM jobs j WHERE {} ORDER BY j.job_no",
        JOB_COLUMNS, where_sql
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), job_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let sql = format!(
        "SELECT c.job_id, c.container_number, c.size, c.arrival_date,
                c.container_rail_out_date, c.delivery_date, c.detention_from,
                c.do_validity_upto_container_level, c.empty_container_off_load_date, c.rms
         FROM containers c
         JOIN jobs j ON j.id = c.job_id
         WHERE {}
         ORDER BY c.job_id, c.seq",
        where_sql
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut by_job: HashMap<String, Vec<Container>> = HashMap::new();
    for row in stmt.query_map(params_from_iter(values.iter()), container_from_row)? {
        let (job_id, c) = row?;
        by_job.entry(job_id).or_default().push(c);
    }

    Ok(rows
        .into_iter()
        .map(|(id, mut job)| {
            job.container_nos = by_job.remove(&id).unwrap_or_default();
            job
        })
        .collect())
}

pub fn get_job(conn: &Connection, year: &str, job_no: &str) -> anyhow::Result<Option<Job>> {
    let sql = format!(
        "SELECT {} FROM jobs j WHERE j.year = ? AND j.job_no = ?",
        JOB_COLUMNS
    );
    let Some((id, mut job)) = conn
        .query_row(&sql, (year.trim(), job_no.trim()), job_from_row)
        .optional()?
    else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT job_id, container_number, size, arrival_date, container_rail_out_date,
                delivery_date, detention_from, do_validity_upto_container_level,
                empty_container_off_load_date, rms
         FROM containers
         WHERE job_id = ?
         ORDER BY seq",
    )?;
    job.container_nos = stmt
        .query_map([&id], container_from_row)?
        .map(|r| r.map(|(_, c)| c))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(job))
}

/// Returns false when no such job exists.
pub fn delete_job(conn: &Connection, year: &str, job_no: &str) -> anyhow::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    let id: Option<String> = tx
        .query_row(
            "SELECT id FROM jobs WHERE year = ? AND job_no = ?",
            (year.trim(), job_no.trim()),
            |r| r.get(0),
        )
        .optional()?;
    let Some(id) = id else {
        return Ok(false);
    };
    // No ON DELETE CASCADE; children first.
    tx.execute("DELETE FROM containers WHERE job_id = ?", [&id])?;
    tx.execute("DELETE FROM jobs WHERE id = ?", [&id])?;
    tx.commit()?;
    Ok(true)
}

pub fn list_importers(conn: &Connection, year: &str) -> anyhow::Result<Vec<ImporterSummary>> {
    let mut stmt = conn.prepare(
        "SELECT importer, MAX(ie_code_no), COUNT(*)
         FROM jobs
         WHERE year = ? AND importer <> ''
         GROUP BY importer
         ORDER BY importer",
    )?;
    let rows = stmt
        .query_map([year.trim()], |r| {
            Ok(ImporterSummary {
                importer: r.get(0)?,
                ie_code_no: r.get(1)?,
                job_count: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn ensure_jobs_description(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "jobs", "description")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE jobs ADD COLUMN description TEXT NOT NULL DEFAULT ''",
        [],
    )?;
    Ok(())
}

fn ensure_jobs_be_no(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "jobs", "be_no")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE jobs ADD COLUMN be_no TEXT NOT NULL DEFAULT ''", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
