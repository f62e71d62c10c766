/// Append-only audit log.
///
/// Mutation pipelines call `record` inside the same transaction as the
/// change that produced the entry, so audit and mutation commit or roll
/// back together.

use chrono::{DateTime, Local};

use crate::access;
use crate::error::{ClinicError, ClinicResult};
use crate::models::{LogEntry, PersonId};
use crate::store::{Clinic, Store};

/// Append one entry. Entries are never updated or deleted afterwards.
pub fn record(store: &mut Store, actor: PersonId, action: impl Into<String>, date: DateTime<Local>) {
    store.append_log(LogEntry {
        user: actor,
        action: action.into(),
        date,
    });
}

/// Entries in reverse-chronological order, newest first. Entries with
/// the same timestamp keep their append order.
pub fn recent(store: &Store, limit: Option<usize>) -> Vec<LogEntry> {
    let mut entries: Vec<LogEntry> = store.log_entries().to_vec();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

/// The log page is admin-only.
pub fn recent_for(
    clinic: &Clinic,
    actor: PersonId,
    limit: Option<usize>,
) -> ClinicResult<Vec<LogEntry>> {
    clinic.read(|store| {
        let actor = store.person(actor).ok_or(ClinicError::NotFound)?;
        if !access::can_view_logs(actor) {
            return Err(ClinicError::Denied);
        }
        Ok(recent(store, limit))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    #[test]
    fn test_recent_is_reverse_chronological() {
        let mut store = Store::new();
        let actor = Uuid::new_v4();
        let base = Local::now();
        record(&mut store, actor, "first", base);
        record(&mut store, actor, "second", base + Duration::minutes(5));
        record(&mut store, actor, "third", base + Duration::minutes(10));

        let entries = recent(&store, None);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].action, "third");
        assert_eq!(entries[2].action, "first");

        let limited = recent(&store, Some(2));
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].action, "third");
    }
}
