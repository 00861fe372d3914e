#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub struct Sidecar {
    pub child: Child,
    pub stdin: ChildStdin,
    pub reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn spawn_sidecar() -> Sidecar {
    let exe = env!("CARGO_BIN_EXE_eximd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn eximd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Sidecar {
        child,
        stdin,
        reader: BufReader::new(stdout),
        next_id: 0,
    }
}

/// Spawn a sidecar with a fresh workspace already selected.
pub fn spawn_with_workspace(prefix: &str) -> Sidecar {
    let workspace = temp_dir(prefix);
    let mut sidecar = spawn_sidecar();
    let _ = sidecar.request_ok(
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    sidecar
}

impl Sidecar {
    pub fn request(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let payload = json!({
            "id": id,
            "method": method,
            "params": params,
        });
        writeln!(self.stdin, "{}", payload).expect("write request");
        self.stdin.flush().expect("flush request");

        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read response line");
        assert!(!line.trim().is_empty(), "empty response for {}", method);
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).expect("parse response json");
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        value
    }

    pub fn request_raw_line(&mut self, line: &str) -> serde_json::Value {
        writeln!(self.stdin, "{}", line).expect("write line");
        self.stdin.flush().expect("flush line");
        let mut out = String::new();
        self.reader.read_line(&mut out).expect("read response line");
        serde_json::from_str(out.trim()).expect("parse response json")
    }

    pub fn request_ok(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            value
        );
        value.get("result").cloned().expect("result")
    }

    /// Returns the error code of a failed request.
    pub fn request_err(&mut self, method: &str, params: serde_json::Value) -> String {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .expect("error code")
            .to_string()
    }

    pub fn upsert(&mut self, jobs: serde_json::Value) -> serde_json::Value {
        self.request_ok("jobs.upsert", json!({ "jobs": jobs }))
    }
}

/// Jobs for importer "ACME Metals" and "Beta Traders" in year 24-25, with
/// dates relative to a reference day of 2024-07-15.
pub fn sample_jobs() -> serde_json::Value {
    json!([
        {
            "year": "24-25",
            "job_no": "00001",
            "importer": "ACME Metals",
            "ie_code_no": "0301001234",
            "custom_house": "ICD KHODIYAR",
            "status": "Pending",
            "detailed_status": "BE Noted, Clearance Pending",
            "description": "HMS 1&2 Steel Scrap",
            "be_date": "2024-07-01",
            "out_of_charge": "2024-07-03",
            "container_nos": [
                {
                    "container_number": "MSKU0000001",
                    "size": "20",
                    "arrival_date": "2024-07-10",
                    "do_validity_upto_container_level": "2024-07-14",
                    "detention_from": "2024-07-12"
                },
                {
                    "container_number": "MSKU0000002",
                    "size": "40",
                    "arrival_date": "2024-07-15",
                    "container_rail_out_date": "",
                    "do_validity_upto_container_level": "2024-07-17",
                    "detention_from": "2024-07-25"
                }
            ]
        },
        {
            "year": "24-25",
            "job_no": "00002",
            "importer": "ACME Metals",
            "ie_code_no": "0301001234",
            "custom_house": "ICD SACHANA",
            "status": "Pending",
            "detailed_status": "Discharged",
            "description": "Copper cathodes",
            "out_of_charge": "2024-07-29",
            "container_nos": [
                { "container_number": "TGHU0000003", "size": "40" },
                { "container_number": "TGHU0000004", "size": "40", "arrival_date": "2024-07-05", "container_rail_out_date": "2024-07-08", "delivery_date": "2024-07-12" }
            ]
        },
        {
            "year": "24-25",
            "job_no": "00003",
            "importer": "ACME Metals",
            "ie_code_no": "0301001234",
            "custom_house": "ICD KHODIYAR",
            "status": "Completed",
            "detailed_status": "Status Completed",
            "description": "Aluminium waste",
            "out_of_charge": "2024-06-20",
            "container_nos": [
                { "container_number": "CMAU0000005", "size": "20", "arrival_date": "2024-06-10" }
            ]
        },
        {
            "year": "24-25",
            "job_no": "00004",
            "importer": "Beta Traders",
            "ie_code_no": "0501009999",
            "custom_house": "ICD SACHANA",
            "status": "Pending",
            "detailed_status": "Gateway IGM Filed",
            "description": "Recyclable paper",
            "out_of_charge": "2024-07-10",
            "container_nos": [
                { "container_number": "OOLU0000006", "size": "20", "arrival_date": "2024-07-01" }
            ]
        }
    ])
}
