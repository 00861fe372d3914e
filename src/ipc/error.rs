use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Store failures are logged in full and reported with a generic message.
pub fn store_err(id: &str, code: &str, context: &str, e: &anyhow::Error) -> serde_json::Value {
    tracing::error!(request_id = id, error = ?e, "{}", context);
    err(id, code, context, None)
}
