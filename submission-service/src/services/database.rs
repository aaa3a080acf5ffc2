//! PostgreSQL implementation of the repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{Activity, Principal, ReviewStatus, Role, Submission};
use crate::services::error::ServiceError;
use crate::services::repository::{Page, Paged, Repository};

const UNIQUE_VIOLATION: &str = "23505";

fn db_error(e: sqlx::Error) -> ServiceError {
    tracing::error!(error = %e, "Database query failed");
    ServiceError::Database(anyhow::anyhow!(e))
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: Uuid,
    email: String,
    password_hash: String,
    nickname: String,
    role: String,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = ServiceError;

    fn try_from(row: PrincipalRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e: String| ServiceError::Database(anyhow::anyhow!(e)))?;
        Ok(Principal {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            nickname: row.nickname,
            role,
            created_utc: row.created_utc,
            updated_utc: row.updated_utc,
        })
    }
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: Uuid,
    name: String,
    description: String,
    deadline: Option<DateTime<Utc>>,
    max_uploads_per_user: i32,
    is_deleted: bool,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Activity {
            id: row.id,
            name: row.name,
            description: row.description,
            deadline: row.deadline,
            max_uploads_per_user: row.max_uploads_per_user,
            is_deleted: row.is_deleted,
            created_utc: row.created_utc,
            updated_utc: row.updated_utc,
        }
    }
}

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: Uuid,
    activity_id: Uuid,
    owner_id: Uuid,
    file_path: String,
    file_name: String,
    review_status: String,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = ServiceError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let review_status: ReviewStatus = row
            .review_status
            .parse()
            .map_err(|e: String| ServiceError::Database(anyhow::anyhow!(e)))?;
        Ok(Submission {
            id: row.id,
            activity_id: row.activity_id,
            owner_id: row.owner_id,
            file_path: row.file_path,
            file_name: row.file_name,
            review_status,
            created_utc: row.created_utc,
            updated_utc: row.updated_utc,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, ServiceError>
where
    T: TryFrom<R, Error = ServiceError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    // ==================== Principals ====================

    async fn get_principal_by_id(&self, id: Uuid) -> Result<Option<Principal>, ServiceError> {
        sqlx::query_as::<_, PrincipalRow>("SELECT * FROM principals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Principal::try_from)
            .transpose()
    }

    async fn get_principal_by_email(&self, email: &str) -> Result<Option<Principal>, ServiceError> {
        sqlx::query_as::<_, PrincipalRow>("SELECT * FROM principals WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Principal::try_from)
            .transpose()
    }

    async fn email_exists(&self, email: &str) -> Result<bool, ServiceError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM principals WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn create_principal(&self, principal: &Principal) -> Result<(), ServiceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO principals (id, email, password_hash, nickname, role, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(principal.id)
        .bind(&principal.email)
        .bind(&principal.password_hash)
        .bind(&principal.nickname)
        .bind(principal.role.as_str())
        .bind(principal.created_utc)
        .bind(principal.updated_utc)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                tracing::info!(email = %principal.email, "Concurrent registration lost the race");
                Err(ServiceError::EmailAlreadyRegistered)
            }
            Err(e) => Err(db_error(e)),
        }
    }

    async fn update_principal(&self, principal: &Principal) -> Result<(), ServiceError> {
        let result = sqlx::query(
            r#"
            UPDATE principals
            SET password_hash = $2, nickname = $3, role = $4, updated_utc = $5
            WHERE id = $1
            "#,
        )
        .bind(principal.id)
        .bind(&principal.password_hash)
        .bind(&principal.nickname)
        .bind(principal.role.as_str())
        .bind(principal.updated_utc)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Principal"));
        }
        Ok(())
    }

    async fn list_principals(&self, page: Page) -> Result<Paged<Principal>, ServiceError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM principals")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let rows = sqlx::query_as::<_, PrincipalRow>(
            "SELECT * FROM principals ORDER BY created_utc DESC, id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Paged {
            items: convert_all(rows)?,
            total,
        })
    }

    // ==================== Activities ====================

    async fn create_activity(&self, activity: &Activity) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO activities (id, name, description, deadline, max_uploads_per_user, is_deleted, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(activity.id)
        .bind(&activity.name)
        .bind(&activity.description)
        .bind(activity.deadline)
        .bind(activity.max_uploads_per_user)
        .bind(activity.is_deleted)
        .bind(activity.created_utc)
        .bind(activity.updated_utc)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn update_activity(&self, activity: &Activity) -> Result<(), ServiceError> {
        let result = sqlx::query(
            r#"
            UPDATE activities
            SET name = $2, description = $3, deadline = $4, max_uploads_per_user = $5, updated_utc = $6
            WHERE id = $1
            "#,
        )
        .bind(activity.id)
        .bind(&activity.name)
        .bind(&activity.description)
        .bind(activity.deadline)
        .bind(activity.max_uploads_per_user)
        .bind(activity.updated_utc)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Activity"));
        }
        Ok(())
    }

    async fn get_activity(&self, id: Uuid) -> Result<Option<Activity>, ServiceError> {
        Ok(
            sqlx::query_as::<_, ActivityRow>("SELECT * FROM activities WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?
                .map(Activity::from),
        )
    }

    async fn list_activities(&self, page: Page) -> Result<Paged<Activity>, ServiceError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM activities WHERE is_deleted = FALSE",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT * FROM activities
            WHERE is_deleted = FALSE
            ORDER BY created_utc DESC, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Paged {
            items: rows.into_iter().map(Activity::from).collect(),
            total,
        })
    }

    async fn soft_delete_activity(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            "UPDATE activities SET is_deleted = TRUE, updated_utc = $2 WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Submissions ====================

    async fn create_submission(&self, submission: &Submission) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO submissions (id, activity_id, owner_id, file_path, file_name, review_status, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(submission.id)
        .bind(submission.activity_id)
        .bind(submission.owner_id)
        .bind(&submission.file_path)
        .bind(&submission.file_name)
        .bind(submission.review_status.as_str())
        .bind(submission.created_utc)
        .bind(submission.updated_utc)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, ServiceError> {
        sqlx::query_as::<_, SubmissionRow>("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Submission::try_from)
            .transpose()
    }

    async fn delete_submission(&self, id: Uuid) -> Result<bool, ServiceError> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_submissions_by_owner(&self, owner_id: Uuid) -> Result<Vec<Submission>, ServiceError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            "SELECT * FROM submissions WHERE owner_id = $1 ORDER BY created_utc DESC, id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        convert_all(rows)
    }

    async fn count_submissions_by_owner_and_activity(
        &self,
        owner_id: Uuid,
        activity_id: Uuid,
    ) -> Result<i64, ServiceError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM submissions WHERE owner_id = $1 AND activity_id = $2",
        )
        .bind(owner_id)
        .bind(activity_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn review_queue(&self, page: Page) -> Result<Paged<Submission>, ServiceError> {
        let pending = ReviewStatus::Pending.as_str();

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM submissions WHERE review_status = $1",
        )
        .bind(pending)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT * FROM submissions
            WHERE review_status = $1
            ORDER BY created_utc ASC, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pending)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Paged {
            items: convert_all(rows)?,
            total,
        })
    }

    async fn update_review_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let result = sqlx::query(
            "UPDATE submissions SET review_status = $2, updated_utc = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn batch_update_review_status(
        &self,
        ids: &[Uuid],
        status: ReviewStatus,
        now: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let result = sqlx::query(
            "UPDATE submissions SET review_status = $2, updated_utc = $3 WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn count_submissions_by_owner(
        &self,
        owner_id: Uuid,
        status: Option<ReviewStatus>,
    ) -> Result<i64, ServiceError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM submissions WHERE owner_id = $1 AND ($2::TEXT IS NULL OR review_status = $2)",
        )
        .bind(owner_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }
}
