//! Template model shared by every engine.

use crate::mapping::Mapping;
use crate::model::{HeaderMultiMap, RequestMessage, ResponseMessage};
use serde_json::{json, Value};

/// Build the JSON model templates render against: the mapping identity,
/// the original request and the original response.
pub fn build_model(mapping: &Mapping, request: &RequestMessage, response: &ResponseMessage) -> Value {
    json!({
        "mapping": {
            "id": mapping.id.to_string(),
            "title": mapping.title,
        },
        "request": {
            "url": request.url.to_string(),
            "path": request.path(),
            "method": request.method,
            "client_ip": request.client_ip,
            "timestamp": request.timestamp.to_rfc3339(),
            "query": request.query(),
            "headers": header_model(&request.headers),
            "body": request.body_text(),
            "body_json": request.body.as_ref().and_then(|b| b.json.clone()),
        },
        "response": {
            "status_code": response.status_code,
            "headers": header_model(&response.headers),
            "body": response.body_text(),
        },
    })
}

/// Headers as a JSON object: single-value headers become strings, repeated
/// headers become arrays.
fn header_model(headers: &HeaderMultiMap) -> Value {
    let mut map = serde_json::Map::new();
    for (name, values) in headers.iter() {
        let value = if values.len() == 1 {
            Value::String(values[0].clone())
        } else {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        };
        map.insert(name.to_string(), value);
    }
    Value::Object(map)
}
