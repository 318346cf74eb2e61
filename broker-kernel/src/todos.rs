//! Per-agent todo lists and their cross-project summary view.

use broker_primitives::{Priority, ProjectId, SessionName, Todo, TodoStatus, TodoSummary};
use serde_json::{json, Value};

use crate::context::BrokerContext;
use crate::error::{BrokerError, BrokerResult};
use crate::keys;
use crate::registration::active_agents;
use crate::time::now_iso8601;

async fn load_todos(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
) -> BrokerResult<Vec<Todo>> {
    let key = keys::todos(project_id, session);
    ctx.store
        .list_tail(&key, None)
        .await?
        .into_iter()
        .rev()
        .map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|err| BrokerError::Invalid(format!("corrupt todo record: {err}")))
        })
        .collect()
}

async fn save_todos(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
    todos: &[Todo],
) -> BrokerResult<()> {
    let key = keys::todos(project_id, session);
    ctx.store.delete(&key).await?;
    for todo in todos {
        let payload = serde_json::to_string(todo).expect("Todo always serializes");
        ctx.store.list_append_bounded(&key, &payload, None).await?;
    }
    Ok(())
}

/// Appends a new todo with a monotonic `id` (one greater than the agent's
/// current todo count) and `pending` status.
///
/// # Errors
///
/// Returns [`BrokerError::Invalid`] if `priority` is outside `1..=3`.
pub async fn add_todo(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
    text: &str,
    priority: u8,
) -> BrokerResult<u64> {
    let priority = Priority::new(priority).map_err(|err| BrokerError::Invalid(err.to_string()))?;
    let mut todos = load_todos(ctx, project_id, session).await?;
    let id = todos.len() as u64 + 1;
    todos.push(Todo {
        id,
        text: text.to_string(),
        status: TodoStatus::Pending,
        priority,
        created_at: now_iso8601(),
        completed_at: None,
    });
    save_todos(ctx, project_id, session, &todos).await?;
    Ok(id)
}

/// Rewrites the status of todo `todo_id`, stamping `completed_at` on
/// transition into `completed`.
///
/// # Errors
///
/// Returns [`BrokerError::NotFound`] if no todo with `todo_id` exists for
/// `session`.
pub async fn update_todo(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
    todo_id: u64,
    new_status: TodoStatus,
) -> BrokerResult<()> {
    let mut todos = load_todos(ctx, project_id, session).await?;
    let Some(todo) = todos.iter_mut().find(|t| t.id == todo_id) else {
        return Err(BrokerError::NotFound { similar: Vec::new() });
    };
    let was_completed = todo.status == TodoStatus::Completed;
    todo.status = new_status;
    if !was_completed && new_status == TodoStatus::Completed {
        todo.completed_at = Some(now_iso8601());
    }
    save_todos(ctx, project_id, session, &todos).await?;
    Ok(())
}

/// Returns `session`'s own todo list, unfiltered.
pub async fn get_my_todos(
    ctx: &BrokerContext,
    project_id: &ProjectId,
    session: &SessionName,
) -> BrokerResult<Vec<Todo>> {
    load_todos(ctx, project_id, session).await
}

/// Returns every active agent's todo list keyed by session name, each with
/// its summary counters attached.
pub async fn get_all_todos(ctx: &BrokerContext, project_id: &ProjectId) -> BrokerResult<Value> {
    let agents = active_agents(ctx, project_id).await?;
    let mut map = serde_json::Map::new();
    for agent in agents {
        let todos = load_todos(ctx, project_id, &agent.session_name).await?;
        let summary = TodoSummary::from_todos(&todos);
        map.insert(
            agent.session_name.to_string(),
            json!({
                "total": summary.total,
                "completed": summary.completed,
                "pending": summary.pending,
                "in_progress": summary.in_progress,
                "todos": todos,
            }),
        );
    }
    Ok(Value::Object(map))
}
