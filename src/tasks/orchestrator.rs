use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::nutrition::decision::decide;
use crate::nutrition::tags::{meal_tags, NutrientSnapshot};

use super::store::{TaskStore, TaskType};

// Simulated upstream-model latency per analysis kind.
const GLUCOSE_TREND_LATENCY: Duration = Duration::from_secs(2);
const EATING_ORDER_LATENCY: Duration = Duration::from_secs(3);
const HEALTH_SCORE_LATENCY: Duration = Duration::from_secs(1);

/// Launch-time input captured for the async handlers: the synchronous
/// analysis outcome the derived analyses start from.
#[derive(Debug, Clone, Default)]
pub struct MealAnalysis {
    pub nutrition: Option<NutrientSnapshot>,
    pub ai_balanced: bool,
    pub high_risk: bool,
}

/// Launches one background task per analysis kind against the shared
/// [`TaskStore`] and hands the id map back without waiting on any of them.
pub struct TaskOrchestrator {
    store: Arc<TaskStore>,
}

impl TaskOrchestrator {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    /// Create and dispatch every statically known task type for one meal
    /// record. Returns task-type code -> task id immediately; handlers run
    /// on the runtime and report through the store.
    pub fn launch(
        &self,
        analysis: &MealAnalysis,
        user_id: Uuid,
        record_id: Uuid,
    ) -> HashMap<&'static str, Uuid> {
        let mut handles = HashMap::with_capacity(TaskType::ALL.len());

        for task_type in TaskType::ALL {
            let task = self.store.create(task_type, user_id, record_id);
            let input = analysis.clone();
            spawn_supervised(
                Arc::clone(&self.store),
                task.id,
                run_handler(task_type, input),
            );
            handles.insert(task_type.code(), task.id);
        }

        tracing::info!(
            launched = handles.len(),
            %user_id,
            %record_id,
            "async analysis tasks launched"
        );
        handles
    }
}

/// Run one handler body under supervision: mark the task RUNNING, execute
/// the work on its own runtime task, and fold every outcome -- success,
/// handler error, or panic -- into exactly one terminal transition. A
/// misbehaving handler can therefore never crash the orchestrator or leave
/// a task stuck in RUNNING.
pub(crate) fn spawn_supervised<F>(
    store: Arc<TaskStore>,
    task_id: Uuid,
    work: F,
) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    tokio::spawn(async move {
        store.mark_running(task_id);
        match tokio::spawn(work).await {
            Ok(Ok(result)) => store.mark_completed(task_id, result),
            Ok(Err(e)) => store.mark_failed(task_id, e.to_string()),
            Err(e) => store.mark_failed(task_id, format!("analysis handler aborted: {e}")),
        }
    })
}

async fn run_handler(task_type: TaskType, input: MealAnalysis) -> anyhow::Result<Value> {
    match task_type {
        TaskType::GlucoseTrend => run_glucose_trend(input).await,
        TaskType::EatingOrder => run_eating_order(input).await,
        TaskType::HealthScore => run_health_score(input).await,
    }
}

/// Post-meal glucose curve estimate. Placeholder payload until the real
/// model endpoint is wired in; the latency is simulated to keep client
/// polling behavior honest.
async fn run_glucose_trend(_input: MealAnalysis) -> anyhow::Result<Value> {
    tokio::time::sleep(GLUCOSE_TREND_LATENCY).await;

    Ok(json!({
        "peak_value": 7.8,
        "peak_time": "30-60 min after the meal",
        "recovery_time": "1-3 h after the meal",
        "trend_data": [5.5, 6.2, 7.8, 7.2, 6.5, 5.8],
        "trend_labels": ["before", "0-30 min", "30-60 min", "1 h", "2 h", "3 h"],
        "impact_level": "moderate",
    }))
}

/// Eating-order advice. Placeholder payload, same caveat as above.
async fn run_eating_order(_input: MealAnalysis) -> anyhow::Result<Value> {
    tokio::time::sleep(EATING_ORDER_LATENCY).await;

    Ok(json!({
        "tips": [
            {
                "order": 1,
                "title": "Vegetables first",
                "description": "Dietary fiber slows carbohydrate absorption; start with the vegetables.",
            },
            {
                "order": 2,
                "title": "Protein second",
                "description": "Protein extends satiety and steadies blood glucose.",
            },
            {
                "order": 3,
                "title": "Staples last",
                "description": "Putting carbohydrates last measurably lowers the glucose peak.",
            },
        ],
        "summary": "Following this order typically lowers the glucose peak by 15-20%.",
    }))
}

/// Health-score analysis: classifies the launch-time snapshot and runs the
/// decision engine over it.
async fn run_health_score(input: MealAnalysis) -> anyhow::Result<Value> {
    tokio::time::sleep(HEALTH_SCORE_LATENCY).await;

    let tags = meal_tags(input.nutrition.as_ref(), input.ai_balanced, input.high_risk);
    let decision = decide(input.ai_balanced, &tags);

    let mut sorted: Vec<_> = tags.into_iter().collect();
    sorted.sort();

    Ok(json!({
        "tags": sorted,
        "decision": decision,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::store::TaskStatus;
    use std::time::Instant;

    fn analysis() -> MealAnalysis {
        // sodium in the HIGH band, fiber in a mild band so no tag reaches
        // very-high weight
        MealAnalysis {
            nutrition: Some(NutrientSnapshot {
                sodium_mg: Some(1500.0),
                fiber_g: Some(9.0),
                ..Default::default()
            }),
            ai_balanced: false,
            high_risk: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn launch_returns_one_handle_per_task_type() {
        let store = Arc::new(TaskStore::new());
        let orchestrator = TaskOrchestrator::new(Arc::clone(&store));

        let started = Instant::now();
        let handles = orchestrator.launch(&analysis(), Uuid::new_v4(), Uuid::new_v4());
        // launch must not await handler latency
        assert!(started.elapsed() < Duration::from_millis(100));

        assert_eq!(handles.len(), TaskType::ALL.len());
        for task_type in TaskType::ALL {
            let id = handles[task_type.code()];
            let task = store.get(id).unwrap();
            assert_eq!(task.task_type, task_type);
            assert!(!task.status.is_terminal());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn all_tasks_reach_completed_with_results() {
        let store = Arc::new(TaskStore::new());
        let orchestrator = TaskOrchestrator::new(Arc::clone(&store));
        let handles = orchestrator.launch(&analysis(), Uuid::new_v4(), Uuid::new_v4());

        // paused time fast-forwards through the simulated latencies
        tokio::time::sleep(Duration::from_secs(10)).await;

        for (_, id) in handles {
            let task = store.get(id).unwrap();
            assert_eq!(task.status, TaskStatus::Completed);
            assert!(task.result.is_some());
            assert!(task.completed_at.is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn health_score_handler_runs_the_decision_engine() {
        let store = Arc::new(TaskStore::new());
        let orchestrator = TaskOrchestrator::new(Arc::clone(&store));
        let handles = orchestrator.launch(&analysis(), Uuid::new_v4(), Uuid::new_v4());

        tokio::time::sleep(Duration::from_secs(10)).await;

        let task = store.get(handles["healthScore"]).unwrap();
        let result = task.result.unwrap();
        // HIGH_SODIUM is the only high-weight tag -> moderate risk, full analysis
        assert_eq!(result["decision"]["risk_level"], "MODERATE");
        assert_eq!(result["decision"]["strategy"], "FULL_RISK_ANALYSIS");
        assert!(result["tags"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t.as_str() == Some("HIGH_SODIUM")));
    }

    #[tokio::test]
    async fn handler_error_marks_the_task_failed() {
        let store = Arc::new(TaskStore::new());
        let task = store.create(TaskType::HealthScore, Uuid::new_v4(), Uuid::new_v4());

        let supervisor = spawn_supervised(Arc::clone(&store), task.id, async {
            Err(anyhow::anyhow!("model endpoint unreachable"))
        });
        supervisor.await.unwrap();

        let task = store.get(task.id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(
            task.error_message.as_deref(),
            Some("model endpoint unreachable")
        );
        assert!(task.result.is_none());
    }

    #[tokio::test]
    async fn handler_panic_marks_the_task_failed() {
        let store = Arc::new(TaskStore::new());
        let task = store.create(TaskType::GlucoseTrend, Uuid::new_v4(), Uuid::new_v4());

        let supervisor = spawn_supervised(Arc::clone(&store), task.id, async {
            panic!("handler bug");
        });
        supervisor.await.unwrap();

        let task = store.get(task.id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error_message.unwrap().contains("aborted"));
        assert!(task.completed_at.is_some());
    }
}
