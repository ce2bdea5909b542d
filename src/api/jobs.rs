//! Purpose: Jobs 2.1 wrappers (`/api/2.1/jobs/*`) for job definitions and runs.
//! Exports: `JobsApi`, `JobSettings`, `JobTask`, task kinds, `Job`, `Run`, `RunState`,
//! `RunLifeCycleState`, `RunResultState`, list/page and run-output types.
//! Role: Typed request/response mapping; list pages expose `next_page_token` untouched.
//! Invariants: Job and run ids are `i64`; timestamps use the epoch-millisecond codec.
#![allow(clippy::result_large_err)]

use super::client::{ApiResult, DatabricksClient, Endpoint};
use super::clusters::ClusterAttributes;
use super::libraries::Library;
use crate::core::epoch_ms;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NotebookTask {
    pub notebook_path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub base_parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SparkJarTask {
    pub main_class_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SparkPythonTask {
    pub python_file: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SparkSubmitTask {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PythonWheelTask {
    pub package_name: String,
    pub entry_point: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub named_parameters: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PipelineTask {
    pub pipeline_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_refresh: Option<bool>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunJobTask {
    pub job_id: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub job_parameters: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskDependency {
    pub task_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

/// One task of a multi-task job; exactly one task kind is expected to be set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobTask {
    pub task_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<TaskDependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_cluster: Option<ClusterAttributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_cluster_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<Library>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_task: Option<NotebookTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_jar_task: Option<SparkJarTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_python_task: Option<SparkPythonTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spark_submit_task: Option<SparkSubmitTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_wheel_task: Option<PythonWheelTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_task: Option<PipelineTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_job_task: Option<RunJobTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_retry_interval_millis: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_on_timeout: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobCluster {
    pub job_cluster_key: String,
    pub new_cluster: ClusterAttributes,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PauseStatus {
    Paused,
    Unpaused,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CronSchedule {
    pub quartz_cron_expression: String,
    pub timezone_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_status: Option<PauseStatus>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct JobEmailNotifications {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_start: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_success: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_failure: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<JobTask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_clusters: Vec<JobCluster>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<CronSchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<JobEmailNotifications>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_runs: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_user_name: Option<String>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub created_time: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<JobSettings>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunLifeCycleState {
    Queued,
    Pending,
    Running,
    Terminating,
    Terminated,
    Skipped,
    InternalError,
    Blocked,
    WaitingForRetry,
}

impl RunLifeCycleState {
    /// True once the run can no longer change state.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            RunLifeCycleState::Terminated
                | RunLifeCycleState::Skipped
                | RunLifeCycleState::InternalError
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunResultState {
    Success,
    Failed,
    Timedout,
    Canceled,
    MaximumConcurrentRunsReached,
    Excluded,
    SuccessWithFailures,
    UpstreamFailed,
    UpstreamCanceled,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_cycle_state: Option<RunLifeCycleState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_state: Option<RunResultState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_cancelled_or_timedout: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<i64>,
    pub task_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RunState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_cluster_id: Option<String>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_number: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<i64>,
    pub run_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_in_job: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RunState>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "epoch_ms", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<RunTask>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NotebookOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Run>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_output: Option<NotebookOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_truncated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_trace: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobsPage {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunsPage {
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ListJobsRequest {
    pub limit: Option<u32>,
    pub page_token: Option<String>,
    pub name: Option<String>,
    pub expand_tasks: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ListRunsRequest {
    pub job_id: Option<i64>,
    pub active_only: bool,
    pub completed_only: bool,
    pub limit: Option<u32>,
    pub page_token: Option<String>,
    pub start_time_from: Option<OffsetDateTime>,
    pub start_time_to: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateJobRequest {
    pub job_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_settings: Option<JobSettings>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields_to_remove: Vec<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunNowRequest {
    #[serde(default)]
    pub job_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_token: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub job_parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub notebook_params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jar_params: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub python_params: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunNowResponse {
    pub run_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_in_job: Option<i64>,
}

#[derive(Serialize)]
struct ResetJobBody<'a> {
    job_id: i64,
    new_settings: &'a JobSettings,
}

#[derive(Serialize)]
struct JobIdBody {
    job_id: i64,
}

#[derive(Serialize)]
struct RunIdBody {
    run_id: i64,
}

#[derive(Deserialize)]
struct JobIdEnvelope {
    job_id: i64,
}

pub struct JobsApi<'a> {
    client: &'a DatabricksClient,
}

impl<'a> JobsApi<'a> {
    pub(crate) fn new(client: &'a DatabricksClient) -> Self {
        Self { client }
    }

    pub fn create(&self, settings: &JobSettings) -> ApiResult<i64> {
        let envelope: JobIdEnvelope = self
            .client
            .post(Endpoint::new("/api/2.1/jobs/create"), settings)?;
        Ok(envelope.job_id)
    }

    pub fn list(&self, request: &ListJobsRequest) -> ApiResult<JobsPage> {
        let endpoint = Endpoint::new("/api/2.1/jobs/list")
            .query_opt("limit", request.limit)
            .query_opt("page_token", request.page_token.as_deref())
            .query_opt("name", request.name.as_deref())
            .query_flag("expand_tasks", request.expand_tasks);
        self.client.get(endpoint)
    }

    pub fn get(&self, job_id: i64) -> ApiResult<Job> {
        self.client
            .get(Endpoint::new("/api/2.1/jobs/get").query("job_id", job_id))
    }

    /// Replaces all settings of the job.
    pub fn reset(&self, job_id: i64, settings: &JobSettings) -> ApiResult<()> {
        let body = ResetJobBody {
            job_id,
            new_settings: settings,
        };
        self.client
            .post_unit(Endpoint::new("/api/2.1/jobs/reset"), &body)
    }

    /// Merges top-level fields of `new_settings` and drops `fields_to_remove`.
    pub fn update(&self, request: &UpdateJobRequest) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.1/jobs/update"), request)
    }

    pub fn delete(&self, job_id: i64) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.1/jobs/delete"), &JobIdBody { job_id })
    }

    pub fn run_now(&self, request: &RunNowRequest) -> ApiResult<RunNowResponse> {
        self.client
            .post(Endpoint::new("/api/2.1/jobs/run-now"), request)
    }

    pub fn list_runs(&self, request: &ListRunsRequest) -> ApiResult<RunsPage> {
        let endpoint = Endpoint::new("/api/2.1/jobs/runs/list")
            .query_opt("job_id", request.job_id)
            .query_flag("active_only", request.active_only)
            .query_flag("completed_only", request.completed_only)
            .query_opt("limit", request.limit)
            .query_opt("page_token", request.page_token.as_deref())
            .query_opt("start_time_from", request.start_time_from.map(epoch_ms::to_millis))
            .query_opt("start_time_to", request.start_time_to.map(epoch_ms::to_millis));
        self.client.get(endpoint)
    }

    pub fn get_run(&self, run_id: i64) -> ApiResult<Run> {
        self.client
            .get(Endpoint::new("/api/2.1/jobs/runs/get").query("run_id", run_id))
    }

    pub fn cancel_run(&self, run_id: i64) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.1/jobs/runs/cancel"), &RunIdBody { run_id })
    }

    pub fn delete_run(&self, run_id: i64) -> ApiResult<()> {
        self.client
            .post_unit(Endpoint::new("/api/2.1/jobs/runs/delete"), &RunIdBody { run_id })
    }

    /// `run_id` must name a task run; multi-task parent runs are rejected by the service.
    pub fn get_run_output(&self, run_id: i64) -> ApiResult<RunOutput> {
        self.client
            .get(Endpoint::new("/api/2.1/jobs/runs/get-output").query("run_id", run_id))
    }
}

#[cfg(test)]
mod tests {
    use super::{JobSettings, JobsPage, RunLifeCycleState, RunResultState, Run};
    use crate::api::libraries::Library;
    use serde_json::json;

    #[test]
    fn run_state_and_times_decode() {
        let run: Run = serde_json::from_value(json!({
            "job_id": 11,
            "run_id": 455644833,
            "state": {
                "life_cycle_state": "TERMINATED",
                "result_state": "SUCCESS",
                "state_message": ""
            },
            "start_time": 1625060460483i64,
            "end_time": 1625060863413i64,
            "tasks": [{"run_id": 2112892, "task_key": "Orders_Ingest"}]
        }))
        .expect("decode");
        let state = run.state.expect("state");
        assert_eq!(state.life_cycle_state, Some(RunLifeCycleState::Terminated));
        assert_eq!(state.result_state, Some(RunResultState::Success));
        assert!(RunLifeCycleState::Terminated.is_final());
        assert!(!RunLifeCycleState::Running.is_final());
        assert_eq!(
            run.end_time.map(|t| t.unix_timestamp()),
            Some(1625060863)
        );
        assert_eq!(run.tasks[0].task_key, "Orders_Ingest");
    }

    #[test]
    fn task_libraries_use_library_union() {
        let settings: JobSettings = serde_json::from_value(json!({
            "name": "nightly",
            "tasks": [{
                "task_key": "ingest",
                "existing_cluster_id": "0923-164208-meows279",
                "spark_jar_task": {"main_class_name": "com.example.Main"},
                "libraries": [{"jar": "dbfs:/libs/foo.jar"}, {"pypi": {"package": "requests"}}]
            }]
        }))
        .expect("decode");
        let task = &settings.tasks[0];
        assert_eq!(task.libraries[0], Library::Jar("dbfs:/libs/foo.jar".to_string()));
        assert_eq!(
            task.spark_jar_task.as_ref().map(|t| t.main_class_name.as_str()),
            Some("com.example.Main")
        );
    }

    #[test]
    fn jobs_page_keeps_next_page_token() {
        let page: JobsPage = serde_json::from_value(json!({
            "jobs": [{"job_id": 1, "created_time": 1601370337343i64}],
            "has_more": true,
            "next_page_token": "CAEomPuciYcxMKbM9JvMlwU="
        }))
        .expect("decode");
        assert!(page.has_more);
        assert_eq!(
            page.next_page_token.as_deref(),
            Some("CAEomPuciYcxMKbM9JvMlwU=")
        );
        assert!(page.jobs[0].created_time.is_some());
    }
}
