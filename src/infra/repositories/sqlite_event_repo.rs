use crate::domain::models::{event::Event, job::Job, rsvp::Rsvp};
use crate::domain::ports::EventRepository;
use crate::error::{map_tx_err, AppError};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, title, description, location, start_time, end_time, max_capacity, cancelled_at, created_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&event.id).bind(&event.title).bind(&event.description).bind(&event.location)
            .bind(event.start_time).bind(event.end_time).bind(event.max_capacity)
            .bind(event.cancelled_at).bind(&event.created_by).bind(event.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, include_cancelled: bool) -> Result<Vec<Event>, AppError> {
        if include_cancelled {
            sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY start_time ASC")
                .fetch_all(&self.pool).await.map_err(AppError::Database)
        } else {
            sqlx::query_as::<_, Event>("SELECT * FROM events WHERE cancelled_at IS NULL ORDER BY start_time ASC")
                .fetch_all(&self.pool).await.map_err(AppError::Database)
        }
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        // single transaction so the recount and the write cannot interleave
        // with an RSVP create confirming a member in between
        let mut tx = self.pool.begin().await.map_err(map_tx_err)?;

        sqlx::query("SELECT id FROM events WHERE id = ?")
            .bind(&event.id)
            .fetch_optional(&mut *tx).await.map_err(map_tx_err)?
            .ok_or(AppError::EventNotFound)?;

        if let Some(cap) = event.max_capacity {
            let confirmed = sqlx::query("SELECT COUNT(*) as count FROM rsvps WHERE event_id = ? AND status = 'CONFIRMED'")
                .bind(&event.id)
                .fetch_one(&mut *tx).await.map_err(map_tx_err)?
                .get::<i64, _>("count");

            if (cap as i64) < confirmed {
                return Err(AppError::Validation(format!(
                    "Capacity {} is below the current confirmed count {}", cap, confirmed
                )));
            }
        }

        let updated = sqlx::query_as::<_, Event>(
            "UPDATE events SET title=?, description=?, location=?, start_time=?, end_time=?, max_capacity=?
             WHERE id=?
             RETURNING *"
        )
            .bind(&event.title).bind(&event.description).bind(&event.location)
            .bind(event.start_time).bind(event.end_time).bind(event.max_capacity)
            .bind(&event.id)
            .fetch_one(&mut *tx).await.map_err(map_tx_err)?;

        tx.commit().await.map_err(map_tx_err)?;
        Ok(updated)
    }

    async fn cancel(&self, id: &str) -> Result<Event, AppError> {
        let mut tx = self.pool.begin().await.map_err(map_tx_err)?;

        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx).await.map_err(map_tx_err)?
            .ok_or(AppError::EventNotFound)?;

        if event.cancelled_at.is_some() {
            return Err(AppError::Conflict("Event already cancelled".into()));
        }

        let cancelled = sqlx::query_as::<_, Event>("UPDATE events SET cancelled_at = ? WHERE id = ? RETURNING *")
            .bind(Utc::now()).bind(id)
            .fetch_one(&mut *tx).await.map_err(map_tx_err)?;

        // active RSVP holders get notified
        let active = sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE event_id = ? AND status != 'CANCELLED'")
            .bind(id)
            .fetch_all(&mut *tx).await.map_err(map_tx_err)?;

        for rsvp in active {
            let job = Job::new("EVENT_CANCELLED", rsvp.id.clone(), id.to_string(), rsvp.member_id.clone(), Utc::now());
            sqlx::query("INSERT INTO jobs (id, job_type, payload, execute_at, status, error_message, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)")
                .bind(&job.id).bind(&job.job_type).bind(&job.payload).bind(job.execute_at)
                .bind(&job.status).bind(&job.error_message).bind(job.created_at)
                .execute(&mut *tx).await.map_err(map_tx_err)?;
        }

        tx.commit().await.map_err(map_tx_err)?;
        Ok(cancelled)
    }
}
