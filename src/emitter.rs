//! Job emission: a process-wide broadcast bus carrying prepared jobs to
//! whatever schedules builds.

use tokio::sync::broadcast;

use crate::policy::Job;

pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Fire-and-forget handoff of finalized jobs. Sending when nobody is
/// subscribed is not a fault; the job is simply dropped.
#[derive(Debug, Clone)]
pub struct JobBus {
    tx: broadcast::Sender<Job>,
}

impl JobBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcasts a job for preparation by the downstream scheduler.
    pub fn prepare(&self, job: Job) {
        let _ = self.tx.send(job);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Job> {
        self.tx.subscribe()
    }
}

impl Default for JobBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{RefSpec, Trigger, TriggerAuthor, TriggerKind, TriggerSource};
    use crate::policy::{Job, JobKind};
    use chrono::Utc;
    use uuid::Uuid;

    fn job() -> Job {
        Job {
            id: Uuid::now_v7(),
            kind: JobKind::TestOnly,
            trigger: Trigger {
                kind: TriggerKind::Commit,
                author: TriggerAuthor {
                    login: None,
                    email: Some("dev@example.com".to_string()),
                    image: "img".to_string(),
                },
                url: "u".to_string(),
                message: "m".to_string(),
                timestamp: "t".to_string(),
                source: TriggerSource { kind: "plugin", plugin: "github" },
            },
            project: "widget".to_string(),
            ref_spec: RefSpec::Fetch { fetch: "refs/pull/1/merge".to_string() },
            user_id: "u-1".to_string(),
            created: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_prepared_job() {
        let bus = JobBus::default();
        let mut rx = bus.subscribe();
        bus.prepare(job());
        let received = rx.recv().await.unwrap();
        assert_eq!(received.project, "widget");
    }

    #[test]
    fn prepare_without_subscribers_is_silent() {
        let bus = JobBus::default();
        bus.prepare(job());
    }
}
