//! CCP JSON wire format
//!
//! Every call is a POST of `{"action": ..., "param": {...}}`; every answer
//! carries `statuscode`, `longmessage` and `responsedata`. On failure the
//! API sends `responsedata` as an empty string rather than an object.

use ddns_bridge_core::traits::Envelope;
use ddns_bridge_core::{Error, RecordType, RemoteRecord, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request body
#[derive(Debug, Serialize)]
pub(crate) struct ApiRequest<'a> {
    pub action: &'a str,
    pub param: Value,
}

/// Response body
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    pub statuscode: i64,
    #[serde(default)]
    pub longmessage: Option<String>,
    #[serde(default)]
    pub responsedata: Value,
}

impl ApiResponse {
    /// Convert into the provider-neutral envelope
    pub fn into_envelope(self) -> Result<Envelope> {
        let mut envelope = Envelope {
            status_code: self.statuscode,
            message: self.longmessage.unwrap_or_default(),
            session_id: None,
            records: None,
        };

        // Anything but an object (usually "") means "no data"
        let Value::Object(mut data) = self.responsedata else {
            return Ok(envelope);
        };

        if let Some(Value::String(session_id)) = data.remove("apisessionid")
            && !session_id.is_empty()
        {
            envelope.session_id = Some(session_id);
        }

        if let Some(Value::Array(records)) = data.remove("dnsrecords") {
            let records = records
                .into_iter()
                .map(record_from_wire)
                .collect::<Result<Vec<_>>>()?;
            envelope.records = Some(records);
        }

        Ok(envelope)
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Result<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(Error::transport(format!(
            "malformed dns record: field '{}' is not a string ({})",
            key, other
        ))),
        None => Err(Error::transport(format!(
            "malformed dns record: missing field '{}'",
            key
        ))),
    }
}

/// Map one wire record onto a [`RemoteRecord`]
///
/// `hostname`, `type` and `destination` become first-class fields, all
/// remaining keys (`id`, `priority`, `deleterecord`, `state`, ...) are kept
/// as metadata.
pub(crate) fn record_from_wire(value: Value) -> Result<RemoteRecord> {
    let Value::Object(mut fields) = value else {
        return Err(Error::transport("malformed dns record: not an object"));
    };

    let sublabel = take_string(&mut fields, "hostname")?;
    let record_type = RecordType::from(take_string(&mut fields, "type")?);
    let destination = take_string(&mut fields, "destination")?;

    Ok(RemoteRecord {
        sublabel,
        record_type,
        destination,
        metadata: fields,
    })
}

/// Map a [`RemoteRecord`] back onto its wire form
pub(crate) fn record_to_wire(record: &RemoteRecord) -> Value {
    let mut fields = record.metadata.clone();
    fields.insert("hostname".to_string(), Value::from(record.sublabel.clone()));
    fields.insert("type".to_string(), Value::from(record.record_type.as_str()));
    fields.insert(
        "destination".to_string(),
        Value::from(record.destination.clone()),
    );
    Value::Object(fields)
}
