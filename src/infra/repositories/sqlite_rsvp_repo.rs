use crate::domain::models::{event::Event, job::Job, rsvp::{EventRsvp, MemberRsvp, Rsvp, RsvpCancellation}};
use crate::domain::ports::RsvpRepository;
use crate::domain::services::capacity;
use crate::error::{is_unique_violation, map_tx_err, AppError};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool, Sqlite, Transaction};

pub struct SqliteRsvpRepo {
    pool: SqlitePool,
}

impl SqliteRsvpRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn enqueue_job(tx: &mut Transaction<'_, Sqlite>, job: &Job) -> Result<(), AppError> {
    sqlx::query("INSERT INTO jobs (id, job_type, payload, execute_at, status, error_message, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)")
        .bind(&job.id).bind(&job.job_type).bind(&job.payload).bind(job.execute_at)
        .bind(&job.status).bind(&job.error_message).bind(job.created_at)
        .execute(&mut **tx).await.map_err(map_tx_err)?;
    Ok(())
}

#[async_trait]
impl RsvpRepository for SqliteRsvpRepo {
    async fn create(&self, event_id: &str, member_id: &str) -> Result<Rsvp, AppError> {
        // SQLite serializes writers; a busy timeout plus the conflict mapping
        // covers the deferred-to-write lock upgrade.
        let mut tx = self.pool.begin().await.map_err(map_tx_err)?;

        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(event_id)
            .fetch_optional(&mut *tx).await.map_err(map_tx_err)?
            .ok_or(AppError::EventNotFound)?;

        if event.cancelled_at.is_some() {
            return Err(AppError::EventCancelled);
        }

        if let Some(existing) = sqlx::query_as::<_, Rsvp>(
            "SELECT * FROM rsvps WHERE event_id = ? AND member_id = ? AND status != 'CANCELLED'"
        )
            .bind(event_id).bind(member_id)
            .fetch_optional(&mut *tx).await.map_err(map_tx_err)?
        {
            return Err(AppError::AlreadyRsvpd(existing.status));
        }

        let confirmed = sqlx::query("SELECT COUNT(*) as count FROM rsvps WHERE event_id = ? AND status = 'CONFIRMED'")
            .bind(event_id)
            .fetch_one(&mut *tx).await.map_err(map_tx_err)?
            .get::<i64, _>("count");

        let status = match capacity::evaluate(event.max_capacity, confirmed) {
            capacity::Decision::Accept => "CONFIRMED",
            capacity::Decision::Waitlist => "WAITLISTED",
        };

        let rsvp = Rsvp::new(event_id.to_string(), member_id.to_string(), status.to_string());
        let created = match sqlx::query_as::<_, Rsvp>(
            "INSERT INTO rsvps (id, event_id, member_id, status, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&rsvp.id).bind(&rsvp.event_id).bind(&rsvp.member_id).bind(&rsvp.status).bind(rsvp.created_at)
            .fetch_one(&mut *tx).await
        {
            Ok(r) => r,
            // the partial unique index is the backstop for the duplicate check above
            Err(e) if is_unique_violation(&e) => {
                drop(tx);
                let existing = self.find_active(event_id, member_id).await?;
                return Err(AppError::AlreadyRsvpd(
                    existing.map(|r| r.status).unwrap_or_else(|| "CONFIRMED".to_string())
                ));
            }
            Err(e) => return Err(map_tx_err(e)),
        };

        let job_type = if status == "CONFIRMED" { "RSVP_CONFIRMED" } else { "RSVP_WAITLISTED" };
        let job = Job::new(job_type, created.id.clone(), event_id.to_string(), member_id.to_string(), Utc::now());
        enqueue_job(&mut tx, &job).await?;

        tx.commit().await.map_err(map_tx_err)?;
        Ok(created)
    }

    async fn cancel(&self, event_id: &str, member_id: &str) -> Result<RsvpCancellation, AppError> {
        let mut tx = self.pool.begin().await.map_err(map_tx_err)?;

        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(event_id)
            .fetch_optional(&mut *tx).await.map_err(map_tx_err)?
            .ok_or(AppError::EventNotFound)?;

        let active = sqlx::query_as::<_, Rsvp>(
            "SELECT * FROM rsvps WHERE event_id = ? AND member_id = ? AND status != 'CANCELLED'"
        )
            .bind(event_id).bind(member_id)
            .fetch_optional(&mut *tx).await.map_err(map_tx_err)?
            .ok_or(AppError::NoActiveRsvp)?;

        let cancelled = sqlx::query_as::<_, Rsvp>("UPDATE rsvps SET status = 'CANCELLED' WHERE id = ? RETURNING *")
            .bind(&active.id)
            .fetch_one(&mut *tx).await.map_err(map_tx_err)?;

        let job = Job::new("RSVP_CANCELLED", cancelled.id.clone(), event_id.to_string(), member_id.to_string(), Utc::now());
        enqueue_job(&mut tx, &job).await?;

        // only a freed confirmed slot can be reassigned, and never on an
        // event that has itself been cancelled; FIFO by created_at
        let mut promoted = None;
        if active.status == "CONFIRMED" && event.cancelled_at.is_none() {
            let next = sqlx::query_as::<_, Rsvp>(
                "SELECT * FROM rsvps WHERE event_id = ? AND status = 'WAITLISTED' ORDER BY created_at ASC, id ASC LIMIT 1"
            )
                .bind(event_id)
                .fetch_optional(&mut *tx).await.map_err(map_tx_err)?;

            if let Some(next) = next {
                let p = sqlx::query_as::<_, Rsvp>("UPDATE rsvps SET status = 'CONFIRMED' WHERE id = ? RETURNING *")
                    .bind(&next.id)
                    .fetch_one(&mut *tx).await.map_err(map_tx_err)?;

                let job = Job::new("RSVP_PROMOTED", p.id.clone(), event_id.to_string(), p.member_id.clone(), Utc::now());
                enqueue_job(&mut tx, &job).await?;
                promoted = Some(p);
            }
        }

        tx.commit().await.map_err(map_tx_err)?;
        Ok(RsvpCancellation { cancelled, promoted })
    }

    async fn find_active(&self, event_id: &str, member_id: &str) -> Result<Option<Rsvp>, AppError> {
        sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE event_id = ? AND member_id = ? AND status != 'CANCELLED'")
            .bind(event_id).bind(member_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str, status: Option<&str>) -> Result<Vec<EventRsvp>, AppError> {
        if let Some(status) = status {
            sqlx::query_as::<_, EventRsvp>(
                "SELECT r.id, r.event_id, r.member_id, r.status, r.created_at, m.name AS member_name, m.email AS member_email
                 FROM rsvps r JOIN members m ON m.id = r.member_id
                 WHERE r.event_id = ? AND r.status = ?
                 ORDER BY r.created_at ASC, r.id ASC"
            )
                .bind(event_id).bind(status)
                .fetch_all(&self.pool).await.map_err(AppError::Database)
        } else {
            sqlx::query_as::<_, EventRsvp>(
                "SELECT r.id, r.event_id, r.member_id, r.status, r.created_at, m.name AS member_name, m.email AS member_email
                 FROM rsvps r JOIN members m ON m.id = r.member_id
                 WHERE r.event_id = ?
                 ORDER BY r.created_at ASC, r.id ASC"
            )
                .bind(event_id)
                .fetch_all(&self.pool).await.map_err(AppError::Database)
        }
    }

    async fn list_by_member(&self, member_id: &str) -> Result<Vec<MemberRsvp>, AppError> {
        sqlx::query_as::<_, MemberRsvp>(
            "SELECT r.id, r.event_id, r.status, r.created_at, e.title AS event_title, e.start_time AS event_start_time,
                    (e.cancelled_at IS NOT NULL) AS event_cancelled
             FROM rsvps r JOIN events e ON e.id = r.event_id
             WHERE r.member_id = ?
             ORDER BY e.start_time ASC"
        )
            .bind(member_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn count_confirmed(&self, event_id: &str) -> Result<i64, AppError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM rsvps WHERE event_id = ? AND status = 'CONFIRMED'")
            .bind(event_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.get::<i64, _>("count"))
    }
}
