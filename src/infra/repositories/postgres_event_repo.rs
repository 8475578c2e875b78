use crate::domain::models::{event::Event, job::Job, rsvp::Rsvp};
use crate::domain::ports::EventRepository;
use crate::error::{map_tx_err, AppError};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, title, description, location, start_time, end_time, max_capacity, cancelled_at, created_by, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *"
        )
            .bind(&event.id).bind(&event.title).bind(&event.description).bind(&event.location)
            .bind(event.start_time).bind(event.end_time).bind(event.max_capacity)
            .bind(event.cancelled_at).bind(&event.created_by).bind(event.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
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
        let mut tx = self.pool.begin().await.map_err(map_tx_err)?;

        // same event row lock as the RSVP path: a concurrent create cannot
        // confirm a member between the recount and the write
        sqlx::query("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(&event.id)
            .fetch_optional(&mut *tx).await.map_err(map_tx_err)?
            .ok_or(AppError::EventNotFound)?;

        if let Some(cap) = event.max_capacity {
            let confirmed = sqlx::query("SELECT COUNT(*) as count FROM rsvps WHERE event_id = $1 AND status = 'CONFIRMED'")
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
            "UPDATE events SET title=$1, description=$2, location=$3, start_time=$4, end_time=$5, max_capacity=$6
             WHERE id=$7
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

        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx).await.map_err(map_tx_err)?
            .ok_or(AppError::EventNotFound)?;

        if event.cancelled_at.is_some() {
            return Err(AppError::Conflict("Event already cancelled".into()));
        }

        let cancelled = sqlx::query_as::<_, Event>("UPDATE events SET cancelled_at = $1 WHERE id = $2 RETURNING *")
            .bind(Utc::now()).bind(id)
            .fetch_one(&mut *tx).await.map_err(map_tx_err)?;

        // active RSVP holders get notified
        let active = sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE event_id = $1 AND status != 'CANCELLED'")
            .bind(id)
            .fetch_all(&mut *tx).await.map_err(map_tx_err)?;

        for rsvp in active {
            let job = Job::new("EVENT_CANCELLED", rsvp.id.clone(), id.to_string(), rsvp.member_id.clone(), Utc::now());
            sqlx::query("INSERT INTO jobs (id, job_type, payload, execute_at, status, error_message, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
                .bind(&job.id).bind(&job.job_type).bind(&job.payload).bind(job.execute_at)
                .bind(&job.status).bind(&job.error_message).bind(job.created_at)
                .execute(&mut *tx).await.map_err(map_tx_err)?;
        }

        tx.commit().await.map_err(map_tx_err)?;
        Ok(cancelled)
    }
}
