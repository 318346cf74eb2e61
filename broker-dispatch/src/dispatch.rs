//! Routes a validated tool-call request to its coordination handler and
//! lowers the result to the wire-level `{status, ...}` / `{status: "error",
//! error}` JSON shape.

use std::sync::Arc;

use broker_kernel::{
    add_todo, announce_file_change, broadcast_message, check_messages, get_all_todos,
    get_my_todos, get_recent_changes, heartbeat, list_active_agents, list_interfaces,
    mark_task_completed, query_agent, query_interface, register_agent, register_interface,
    release_file_lock, respond_to_query, unregister_agent, update_todo, AnnounceOutcome,
    BrokerContext, InterfaceQueryOutcome, QueryOutcomeExternal,
};
use serde_json::{json, Value};

use crate::args::{
    optional_bool, optional_str, optional_u64, optional_u8, require_project_id,
    require_session_name, require_str, require_u64,
};
use crate::error::DispatchError;
use crate::registry::{HEARTBEAT_ON_CALL, TOOLS};

/// Dispatches a `(tool_name, arguments)` pair against the given context,
/// refreshing the caller's heartbeat as a side effect on mutating calls that
/// carry a `session_name`, and always returning a JSON value — never an `Err`
/// that would cross the transport boundary.
pub async fn call_tool(ctx: &Arc<BrokerContext>, tool_name: &str, args: Value) -> Value {
    if !TOOLS.iter().any(|t| t.name == tool_name) {
        return error_json(&DispatchError::UnknownTool(tool_name.to_string()));
    }

    for required in TOOLS
        .iter()
        .find(|t| t.name == tool_name)
        .map(|t| t.required_args)
        .unwrap_or_default()
    {
        if args.get(required).is_none() {
            return error_json(&DispatchError::MissingArg(required));
        }
    }

    maybe_refresh_heartbeat(ctx, tool_name, &args).await;

    match route(ctx, tool_name, args).await {
        Ok(value) => value,
        Err(err) => error_json(&err),
    }
}

async fn maybe_refresh_heartbeat(ctx: &Arc<BrokerContext>, tool_name: &str, args: &Value) {
    if !HEARTBEAT_ON_CALL.contains(&tool_name) {
        return;
    }
    let (Some(project_raw), Some(session_raw)) = (
        args.get("project_id").and_then(Value::as_str),
        args.get("session_name").and_then(Value::as_str),
    ) else {
        return;
    };
    let (Ok(project_id), Ok(session)) = (
        broker_primitives::ProjectId::new(project_raw),
        broker_primitives::SessionName::new(session_raw),
    ) else {
        return;
    };
    // Best-effort: an agent that isn't registered yet simply isn't refreshed.
    let _ = heartbeat(ctx, &project_id, &session).await;
}

fn error_json(err: &DispatchError) -> Value {
    match err {
        DispatchError::Broker(broker_err) => {
            let mut body = json!({
                "status": broker_err.tag(),
                "error": broker_err.to_string(),
            });
            match broker_err {
                broker_kernel::BrokerError::Conflict { lock_info } => {
                    body["lock_info"] = lock_info.clone();
                }
                broker_kernel::BrokerError::NotFound { similar } => {
                    body["similar"] = json!(similar);
                }
                _ => {}
            }
            body
        }
        other => json!({"status": "error", "error": other.to_string()}),
    }
}

async fn route(ctx: &Arc<BrokerContext>, tool_name: &str, args: Value) -> Result<Value, DispatchError> {
    match tool_name {
        "register_agent" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let task_id = require_str(&args, "task_id")?;
            let branch = require_str(&args, "branch")?;
            let description = require_str(&args, "description")?;
            let outcome = register_agent(ctx, &project_id, &session, task_id, branch, description).await?;
            Ok(json!({
                "status": outcome.status,
                "other_active_agents": outcome.other_active_agents,
                "message": format!("{session} registered"),
            }))
        }

        "heartbeat" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let timestamp = heartbeat(ctx, &project_id, &session).await?;
            Ok(json!({
                "status": "ok",
                "timestamp": timestamp,
                "message": format!("heartbeat refreshed for {session}"),
            }))
        }

        "unregister_agent" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let summary = unregister_agent(ctx, &project_id, &session).await?;
            Ok(json!({
                "status": "unregistered",
                "message": format!("{session} unregistered"),
                "todo_summary": {
                    "total": summary.total,
                    "completed": summary.completed,
                    "pending": summary.pending,
                    "in_progress": summary.in_progress,
                },
            }))
        }

        "list_active_agents" => {
            let project_id = require_project_id(&args)?;
            Ok(list_active_agents(ctx, &project_id).await?)
        }

        "mark_task_completed" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let task_id = require_str(&args, "task_id")?;
            mark_task_completed(ctx, &project_id, &session, task_id).await?;
            Ok(json!({"status": "completed", "message": format!("{task_id} marked complete")}))
        }

        "add_todo" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let text = require_str(&args, "todo_item")?;
            let priority = optional_u8(&args, "priority", 2);
            let todo_id = add_todo(ctx, &project_id, &session, text, priority).await?;
            Ok(json!({
                "status": "added",
                "todo_id": todo_id,
                "message": format!("todo {todo_id} added"),
            }))
        }

        "update_todo" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let todo_id = require_u64(&args, "todo_id")?;
            let status_raw = require_str(&args, "status")?;
            let new_status: broker_primitives::TodoStatus =
                serde_json::from_value(Value::String(status_raw.to_string())).map_err(|err| {
                    DispatchError::InvalidArg {
                        name: "status",
                        reason: err.to_string(),
                    }
                })?;
            update_todo(ctx, &project_id, &session, todo_id, new_status).await?;
            Ok(json!({
                "status": "updated",
                "new_status": status_raw,
                "message": format!("todo {todo_id} updated to {status_raw}"),
            }))
        }

        "get_my_todos" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let todos = get_my_todos(ctx, &project_id, &session).await?;
            Ok(json!({
                "session_name": session.to_string(),
                "total": todos.len(),
                "todos": todos,
            }))
        }

        "get_all_todos" => {
            let project_id = require_project_id(&args)?;
            Ok(get_all_todos(ctx, &project_id).await?)
        }

        "query_agent" => {
            let project_id = require_project_id(&args)?;
            let from_session = require_session_name(&args, "from_session")?;
            let to_session = require_session_name(&args, "to_session")?;
            let query_type = require_str(&args, "query_type")?;
            let query = args.get("query").cloned().unwrap_or(Value::Null);
            let wait_for_response = optional_bool(&args, "wait_for_response", true);
            let timeout_secs = optional_u64(&args, "timeout", 30);

            let outcome = query_agent(
                ctx,
                &project_id,
                &from_session,
                &to_session,
                query_type,
                query,
                wait_for_response,
                timeout_secs,
            )
            .await?;
            Ok(match outcome {
                QueryOutcomeExternal::Received(response) => json!({"status": "received", "response": response}),
                QueryOutcomeExternal::TimedOut => json!({"status": "timeout"}),
                QueryOutcomeExternal::Pending { message_id } => json!({"status": "pending", "message_id": message_id}),
                QueryOutcomeExternal::AgentNotFound => json!({"status": "agent_not_found"}),
            })
        }

        "check_messages" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let messages = check_messages(ctx, &project_id, &session).await?;
            Ok(json!(messages))
        }

        "respond_to_query" => {
            let project_id = require_project_id(&args)?;
            let from_session = require_session_name(&args, "from_session")?;
            let to_session = require_session_name(&args, "to_session")?;
            let message_id = require_str(&args, "message_id")?;
            let response = args.get("response").cloned().unwrap_or(Value::Null);
            respond_to_query(ctx, &project_id, &from_session, &to_session, message_id, response).await?;
            Ok(json!({
                "status": "responded",
                "message": format!("response delivered to {to_session}"),
            }))
        }

        "broadcast_message" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let message_type = require_str(&args, "message_type")?;
            let content = args.get("content").cloned().unwrap_or(Value::Null);
            let recipients = broadcast_message(ctx, &project_id, &session, message_type, content).await?;
            Ok(json!({
                "status": "broadcast",
                "recipients": recipients,
                "message": format!("broadcast to {recipients} agent(s)"),
            }))
        }

        "announce_file_change" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let file_path = require_str(&args, "file_path")?;
            let change_type = require_str(&args, "change_type")?;
            let description = require_str(&args, "description")?;
            let outcome =
                announce_file_change(ctx, &project_id, &session, file_path, change_type, description).await?;
            Ok(match outcome {
                AnnounceOutcome::Locked => json!({
                    "status": "locked",
                    "message": format!("{file_path} locked by {session}"),
                }),
                AnnounceOutcome::Conflict { lock_info } => json!({
                    "status": "conflict",
                    "message": format!("{file_path} is locked by another session"),
                    "lock_info": broker_kernel::lock_info_json(&lock_info),
                }),
            })
        }

        "release_file_lock" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let file_path = require_str(&args, "file_path")?;
            release_file_lock(ctx, &project_id, &session, file_path).await?;
            Ok(json!({
                "status": "released",
                "message": format!("{file_path} released"),
            }))
        }

        "get_recent_changes" => {
            let project_id = require_project_id(&args)?;
            let limit = optional_u64(&args, "limit", 20) as usize;
            let changes = get_recent_changes(ctx, &project_id, limit).await?;
            Ok(json!(changes))
        }

        "register_interface" => {
            let project_id = require_project_id(&args)?;
            let session = require_session_name(&args, "session_name")?;
            let interface_name = require_str(&args, "interface_name")?;
            let definition = args.get("definition").cloned().unwrap_or(Value::Null);
            let file_path = optional_str(&args, "file_path").map(ToString::to_string);
            register_interface(ctx, &project_id, &session, interface_name, definition, file_path).await?;
            Ok(json!({
                "status": "registered",
                "message": format!("interface {interface_name} registered"),
            }))
        }

        "query_interface" => {
            let project_id = require_project_id(&args)?;
            let interface_name = require_str(&args, "interface_name")?;
            Ok(match query_interface(ctx, &project_id, interface_name).await? {
                InterfaceQueryOutcome::Found(record) => json!({
                    "status": "found",
                    "definition": record.definition,
                    "registered_by": record.registered_by,
                    "file_path": record.file_path,
                    "timestamp": record.timestamp,
                }),
                InterfaceQueryOutcome::NotFound { similar } => json!({"status": "not_found", "similar": similar}),
            })
        }

        "list_interfaces" => {
            let project_id = require_project_id(&args)?;
            let interfaces = list_interfaces(ctx, &project_id).await?;
            let map: serde_json::Map<String, Value> = interfaces
                .into_iter()
                .map(|(name, record)| (name, json!(record)))
                .collect();
            Ok(Value::Object(map))
        }

        unknown => Err(DispatchError::UnknownTool(unknown.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_config::Config;
    use broker_store::memory::MemoryStore;

    fn ctx() -> Arc<BrokerContext> {
        Arc::new(BrokerContext::new(Arc::new(MemoryStore::new()), Config::default()))
    }

    #[tokio::test]
    async fn missing_required_arg_yields_error_status() {
        let ctx = ctx();
        let result = call_tool(&ctx, "heartbeat", json!({"project_id": "p"})).await;
        assert_eq!(result["status"], "error");
        assert!(result["error"].as_str().unwrap().contains("session_name"));
    }

    #[tokio::test]
    async fn unknown_tool_yields_error_status() {
        let ctx = ctx();
        let result = call_tool(&ctx, "not_a_tool", json!({})).await;
        assert_eq!(result["status"], "error");
    }

    #[tokio::test]
    async fn register_then_heartbeat_roundtrip() {
        let ctx = ctx();
        let register = call_tool(
            &ctx,
            "register_agent",
            json!({
                "project_id": "p",
                "session_name": "task-001",
                "task_id": "001",
                "branch": "br/a",
                "description": "A",
            }),
        )
        .await;
        assert_eq!(register["status"], "registered");

        let hb = call_tool(
            &ctx,
            "heartbeat",
            json!({"project_id": "p", "session_name": "task-001"}),
        )
        .await;
        assert_eq!(hb["status"], "ok");
    }

    #[tokio::test]
    async fn lock_conflict_includes_lock_info() {
        let ctx = ctx();
        let claim = |session: &'static str| {
            call_tool(
                &ctx,
                "announce_file_change",
                json!({
                    "project_id": "p",
                    "session_name": session,
                    "file_path": "src/x.ts",
                    "change_type": "modify",
                    "description": "d",
                }),
            )
        };
        assert_eq!(claim("task-001").await["status"], "locked");
        let conflict = claim("task-002").await;
        assert_eq!(conflict["status"], "conflict");
        assert_eq!(conflict["lock_info"]["session_name"], "task-001");
    }
}
