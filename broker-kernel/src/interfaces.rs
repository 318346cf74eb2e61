//! Project-owned registry of shared type/contract definitions.

use broker_primitives::{InterfaceRecord, ProjectId, SessionName};
use serde_json::Value;

use crate::context::BrokerContext;
use crate::error::{BrokerError, BrokerResult};
use crate::keys;
use crate::similarity::find_similar;
use crate::time::now_iso8601;

/// Registers (or overwrites) an interface definition under `interface_name`.
pub async fn register_interface(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
    interface_name: &str,
    definition: Value,
    file_path: Option<String>,
) -> BrokerResult<()> {
    let record = InterfaceRecord {
        definition,
        registered_by: session.clone(),
        file_path,
        timestamp: now_iso8601(),
    };
    let payload = serde_json::to_string(&record).expect("InterfaceRecord always serializes");
    let key = keys::interfaces(project_id);
    ctx.store.hash_set(&key, interface_name, &payload).await?;
    Ok(())
}

/// Outcome of [`query_interface`].
#[derive(Debug)]
pub enum QueryOutcome {
    /// The interface was found.
    Found(InterfaceRecord),
    /// No exact match; candidate names judged similar to the query.
    NotFound {
        /// "Did you mean?" suggestions, ordered by ascending edit distance.
        similar: Vec<String>,
    },
}

/// Looks up an interface by exact name, falling back to a fuzzy "did you
/// mean?" suggestion list on miss.
pub async fn query_interface(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    interface_name: &str,
) -> BrokerResult<QueryOutcome> {
    let key = keys::interfaces(project_id);
    if let Some(raw) = ctx.store.hash_get(&key, interface_name).await? {
        let record: InterfaceRecord = serde_json::from_str(&raw)
            .map_err(|err| BrokerError::Invalid(format!("corrupt interface record: {err}")))?;
        return Ok(QueryOutcome::Found(record));
    }

    let all = ctx.store.hash_get_all(&key).await?;
    let candidates: Vec<String> = all.into_iter().map(|(name, _)| name).collect();
    Ok(QueryOutcome::NotFound {
        similar: find_similar(interface_name, &candidates),
    })
}

/// Returns every registered interface, keyed by name.
pub async fn list_interfaces(
    ctx: &BrokerContext,
    project_id: &ProjectId,
) -> BrokerResult<Vec<(String, InterfaceRecord)>> {
    let key = keys::interfaces(project_id);
    let all = ctx.store.hash_get_all(&key).await?;
    all.into_iter()
        .map(|(name, raw)| {
            serde_json::from_str(&raw)
                .map(|record| (name, record))
                .map_err(|err| BrokerError::Invalid(format!("corrupt interface record: {err}")))
        })
        .collect()
}
