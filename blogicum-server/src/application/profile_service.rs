use std::sync::Arc;

use tracing::info;

use crate::data::user_repository::{ProfilePatch, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::{UpdateProfileRequest, User};

pub(crate) struct ProfileService {
    users: Arc<dyn UserRepository>,
}

impl ProfileService {
    pub(crate) fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub(crate) async fn get_profile(&self, user_id: i64) -> Result<User, DomainError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|creds| creds.user)
            .ok_or_else(|| DomainError::NotFound(format!("user id: {user_id}")))
    }

    pub(crate) async fn update_profile(
        &self,
        user_id: i64,
        req: UpdateProfileRequest,
    ) -> Result<User, DomainError> {
        let req = req.validate()?;
        let patch = ProfilePatch {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
        };

        let user = self
            .users
            .update_profile(user_id, patch)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {user_id}")))?;
        info!(user_id, "profile updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::ProfileService;
    use crate::data::repositories::memory::InMemoryStore;
    use crate::data::user_repository::{NewUser, UserRepository};
    use crate::domain::error::DomainError;
    use crate::domain::user::UpdateProfileRequest;

    async fn seed(store: &InMemoryStore, username: &str) -> i64 {
        store
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "hash".to_string(),
            })
            .await
            .expect("user must be created")
            .id
    }

    fn request(username: &str, email: &str) -> UpdateProfileRequest {
        UpdateProfileRequest {
            username: username.to_string(),
            email: email.to_string(),
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn update_profile_applies_normalized_fields() {
        let store = InMemoryStore::new();
        let user_id = seed(&store, "ada").await;
        let service = ProfileService::new(Arc::new(store));

        let user = service
            .update_profile(user_id, request("countess", "ADA@Example.com"))
            .await
            .expect("update must succeed");
        assert_eq!(user.username, "countess");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.first_name, "Ada");

        let reloaded = service.get_profile(user_id).await.expect("profile must load");
        assert_eq!(reloaded.last_name, "Lovelace");
    }

    #[tokio::test]
    async fn update_profile_rejects_taken_username() {
        let store = InMemoryStore::new();
        let user_id = seed(&store, "ada").await;
        seed(&store, "charles").await;
        let service = ProfileService::new(Arc::new(store));

        let err = service
            .update_profile(user_id, request("charles", "ada@example.com"))
            .await
            .expect_err("username is taken");
        assert!(matches!(err, DomainError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn get_profile_of_unknown_user_is_not_found() {
        let service = ProfileService::new(Arc::new(InMemoryStore::new()));
        let err = service.get_profile(404).await.expect_err("no such user");
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
