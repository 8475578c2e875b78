use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::domain::models::job::{Job, Notification};
use crate::error::AppError;
use crate::state::AppState;

/// Delivers the notification outbox. Jobs are written in the same transaction
/// as the RSVP mutation they describe; this worker picks them up afterwards so
/// request handling never blocks on delivery.
pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting notification outbox worker...");

    loop {
        match state.job_repo.find_pending(10).await {
            Ok(jobs) => {
                for job in jobs {
                    let span = info_span!(
                        "notification_job",
                        job_id = %job.id,
                        job_type = %job.job_type,
                        event_id = %job.payload.event_id,
                    );

                    let state = state.clone();

                    async move {
                        match process_job(&state, &job).await {
                            Ok(_) => {
                                info!("Notification dispatched");
                                if let Err(e) = state.job_repo.update_status(&job.id, "COMPLETED", None).await {
                                    error!("Failed to mark job as completed: {:?}", e);
                                }
                            }
                            Err(e) => {
                                let err_msg = format!("{}", e);
                                error!("Notification job failed: {}", err_msg);
                                if let Err(up_err) = state.job_repo.update_status(&job.id, "FAILED", Some(err_msg)).await {
                                    error!("Failed to mark job as failed: {:?}", up_err);
                                }
                            }
                        }
                    }
                        .instrument(span)
                        .await;
                }
            }
            Err(e) => error!("Failed to fetch pending jobs: {:?}", e),
        }
        sleep(Duration::from_secs(5)).await;
    }
}

async fn process_job(state: &Arc<AppState>, job: &Job) -> Result<(), AppError> {
    let payload = &job.payload;

    let member = state.member_repo.find_by_id(&payload.member_id).await?
        .ok_or(AppError::NotFound(format!("Member {} not found", payload.member_id)))?;

    let event = state.event_repo.find_by_id(&payload.event_id).await?
        .ok_or(AppError::NotFound(format!("Event {} not found", payload.event_id)))?;

    let notification = Notification {
        kind: job.job_type.clone(),
        rsvp_id: payload.rsvp_id.clone(),
        recipient_name: member.name,
        recipient_email: member.email,
        event_id: event.id,
        event_title: event.title,
        event_start_time: event.start_time,
    };

    state.notifier.dispatch(&notification).await
}
