use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Principal, Submission};
use crate::services::access::AccessPolicy;
use crate::services::clock::Clock;
use crate::services::error::{PermissionError, ServiceError};
use crate::services::repository::Repository;
use crate::utils::password::{
    hash_password, is_strong_enough, verify_password, Password, PasswordHashString,
};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn Repository>,
    policy: AccessPolicy,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            policy: AccessPolicy,
            clock,
        }
    }

    async fn load(&self, id: Uuid) -> Result<Principal, ServiceError> {
        self.repo
            .get_principal_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Principal"))
    }

    pub async fn update_nickname(&self, id: Uuid, nickname: &str) -> Result<Principal, ServiceError> {
        let nickname = nickname.trim();
        let len = nickname.chars().count();
        if !(2..=50).contains(&len) {
            return Err(ServiceError::Validation(
                "Nickname must be 2-50 characters".to_string(),
            ));
        }

        let mut principal = self.load(id).await?;
        principal.nickname = nickname.to_string();
        principal.updated_utc = self.clock.now();
        self.repo.update_principal(&principal).await?;
        Ok(principal)
    }

    pub async fn change_password(
        &self,
        id: Uuid,
        old_password: Password,
        new_password: Password,
    ) -> Result<(), ServiceError> {
        if !is_strong_enough(new_password.as_str()) {
            return Err(ServiceError::Validation(
                "New password must be at least 8 characters with a letter and a digit".to_string(),
            ));
        }

        let mut principal = self.load(id).await?;
        let stored = PasswordHashString::new(principal.password_hash.clone());
        if verify_password(&old_password, &stored).is_err() {
            return Err(ServiceError::Validation("Old password is incorrect".to_string()));
        }

        principal.password_hash = hash_password(&new_password)?.into_string();
        principal.updated_utc = self.clock.now();
        self.repo.update_principal(&principal).await?;

        tracing::info!(principal_id = %id, "Password changed");
        Ok(())
    }

    /// Submissions owned by `owner_id`. Only the owner or an admin may ask,
    /// and non-admins only get what they are allowed to view.
    pub async fn list_submissions(
        &self,
        owner_id: Uuid,
        requester: &Principal,
    ) -> Result<Vec<Submission>, ServiceError> {
        if !requester.is_admin() && requester.id != owner_id {
            return Err(PermissionError::Forbidden.into());
        }

        self.load(owner_id).await?;
        let submissions = self.repo.list_submissions_by_owner(owner_id).await?;

        if requester.is_admin() {
            return Ok(submissions);
        }
        Ok(submissions
            .into_iter()
            .filter(|s| self.policy.can_view(s, requester))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReviewStatus, Role};
    use crate::services::clock::SystemClock;
    use crate::services::memory::InMemoryRepository;
    use chrono::Utc;

    async fn setup() -> (Arc<InMemoryRepository>, UserService, Principal) {
        let repo = Arc::new(InMemoryRepository::new());
        let svc = UserService::new(repo.clone(), Arc::new(SystemClock));
        let hash = hash_password(&Password::new("password123".into())).unwrap();
        let p = Principal::new("u@example.com".into(), hash.into_string(), "user".into(), Utc::now());
        repo.create_principal(&p).await.unwrap();
        (repo, svc, p)
    }

    #[tokio::test]
    async fn test_nickname_rules() {
        let (_, svc, p) = setup().await;
        assert!(svc.update_nickname(p.id, "x").await.is_err());
        assert!(svc.update_nickname(p.id, &"y".repeat(51)).await.is_err());
        assert_eq!(svc.update_nickname(p.id, " Zed ").await.unwrap().nickname, "Zed");
    }

    #[tokio::test]
    async fn test_change_password_requires_old() {
        let (_, svc, p) = setup().await;
        assert!(svc
            .change_password(p.id, Password::new("bad-old-1".into()), Password::new("newpass123".into()))
            .await
            .is_err());
        assert!(svc
            .change_password(p.id, Password::new("password123".into()), Password::new("short".into()))
            .await
            .is_err());
        svc.change_password(p.id, Password::new("password123".into()), Password::new("newpass123".into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_submissions_filters_for_owner() {
        let (repo, svc, owner) = setup().await;
        let mut admin = Principal::new("admin@example.com".into(), "h".into(), "admin".into(), Utc::now());
        admin.role = Role::Admin;
        let other = Principal::new("o@example.com".into(), "h".into(), "other".into(), Utc::now());

        let pending = Submission::new(Uuid::new_v4(), owner.id, "a".into(), "a.png".into(), Utc::now());
        let mut approved = Submission::new(Uuid::new_v4(), owner.id, "b".into(), "b.png".into(), Utc::now());
        approved.review_status = ReviewStatus::Approved;
        repo.create_submission(&pending).await.unwrap();
        repo.create_submission(&approved).await.unwrap();

        let own = svc.list_submissions(owner.id, &owner).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, approved.id);

        assert_eq!(svc.list_submissions(owner.id, &admin).await.unwrap().len(), 2);
        assert!(matches!(
            svc.list_submissions(owner.id, &other).await,
            Err(ServiceError::Permission(PermissionError::Forbidden))
        ));
    }
}
