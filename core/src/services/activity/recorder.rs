//! Best-effort writer for the session activity log

use std::sync::Arc;
use std::time::Duration;

use tokio::task;
use tracing::warn;
use uuid::Uuid;

use crate::domain::entities::SessionActivity;
use crate::errors::StoreError;
use crate::repositories::SessionActivityRepository;
use crate::services::storage::bounded;

/// Configuration for the activity recorder
#[derive(Debug, Clone)]
pub struct ActivityRecorderConfig {
    /// Write in a background task instead of awaiting the store
    pub async_writes: bool,
    /// Upper bound for one write
    pub write_timeout: Duration,
}

impl Default for ActivityRecorderConfig {
    fn default() -> Self {
        Self {
            async_writes: false,
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Records session lifecycle events
pub struct ActivityRecorder<A>
where
    A: SessionActivityRepository,
{
    repository: Arc<A>,
    config: ActivityRecorderConfig,
}

impl<A> ActivityRecorder<A>
where
    A: SessionActivityRepository + 'static,
{
    pub fn new(repository: Arc<A>, config: ActivityRecorderConfig) -> Self {
        Self { repository, config }
    }

    /// Write one activity, logging instead of returning any failure
    pub async fn record(&self, activity: SessionActivity) {
        if self.config.async_writes {
            let repository = Arc::clone(&self.repository);
            let limit = self.config.write_timeout;
            task::spawn(async move {
                let result = bounded(limit, "record_activity", repository.record(&activity)).await;
                report_failure(&activity, result);
            });
        } else {
            let result = bounded(self.config.write_timeout, "record_activity", self.repository.record(&activity)).await;
            report_failure(&activity, result);
        }
    }

    /// Recent activity for a user, newest first
    pub async fn recent_for_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<SessionActivity>, StoreError> {
        bounded(
            self.config.write_timeout,
            "find_activity_by_user",
            self.repository.find_by_user(user_id, limit),
        )
        .await
    }
}

fn report_failure(activity: &SessionActivity, result: Result<(), StoreError>) {
    if let Err(e) = result {
        warn!(
            error = %e,
            session_id = %activity.session_id,
            action = activity.action.as_str(),
            "Failed to record session activity"
        );
    }
}
