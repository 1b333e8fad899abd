// # Record Reconciler
//
// Compares a freshly fetched record set with the desired addresses of one
// update request and produces the record set to submit.
//
// ## Rules
//
// 1. A record's real name is the apex when its sub-label is one of the
//    matcher placeholders, `<sublabel>.<apex>` otherwise.
// 2. A record is in scope when its real name equals the requested domain
//    exactly (case-sensitive).
// 3. In-scope `A` records take the request's IPv4, in-scope `AAAA` records
//    its IPv6, when the value differs or `force` is set.
// 4. Every other record type is left alone, in scope or not.
//
// The reconciler owns the fetched list for the duration of the call and
// hands the (possibly mutated) list back; nothing is cached between runs.

use crate::domain::DomainDescriptor;
use crate::record::{RecordType, RemoteRecord};
use crate::request::UpdateRequest;

/// One destination rewrite performed during reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    /// `<sublabel>.<apex>` of the rewritten record
    pub name: String,
    /// `A` or `AAAA`
    pub record_type: RecordType,
    /// Destination before the rewrite
    pub previous: String,
    /// Destination after the rewrite
    pub new: String,
}

/// Outcome of reconciling one request against one record set
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationResult {
    /// Some record resolved to the requested domain
    pub matched: bool,
    /// At least one destination was rewritten
    pub changed: bool,
    /// IP to report; an IPv4 change wins over an IPv6 change
    pub effective_ip: Option<String>,
    /// The full record set; identical to the input when `changed` is false
    pub updated_records: Vec<RemoteRecord>,
    /// Rewrites in record order
    pub changes: Vec<RecordChange>,
}

impl ReconciliationResult {
    /// Whether the record set has to be submitted back
    pub fn needs_submission(&self) -> bool {
        self.matched && self.changed
    }
}

/// Reconcile `records` against `request`
pub fn reconcile(
    mut records: Vec<RemoteRecord>,
    request: &UpdateRequest,
    descriptor: &DomainDescriptor,
) -> ReconciliationResult {
    let mut matched = false;
    let mut effective_ip: Option<String> = None;
    let mut changes = Vec::new();

    for record in records.iter_mut() {
        if descriptor.real_name(&record.sublabel) != request.domain() {
            continue;
        }
        matched = true;

        let desired = match record.record_type {
            RecordType::A => request.ipv4(),
            RecordType::Aaaa => request.ipv6(),
            _ => None,
        };
        let Some(desired) = desired else {
            continue;
        };

        if !request.force() && record.destination == desired {
            continue;
        }

        changes.push(RecordChange {
            name: format!("{}.{}", record.sublabel, descriptor.apex),
            record_type: record.record_type.clone(),
            previous: std::mem::replace(&mut record.destination, desired.to_string()),
            new: desired.to_string(),
        });

        match record.record_type {
            RecordType::A => effective_ip = Some(desired.to_string()),
            _ => {
                if effective_ip.is_none() {
                    effective_ip = Some(desired.to_string());
                }
            }
        }
    }

    ReconciliationResult {
        matched,
        changed: !changes.is_empty(),
        effective_ip,
        updated_records: records,
        changes,
    }
}
