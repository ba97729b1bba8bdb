use crate::error::{AppError, Result};
use crate::models::agent::normalize_email;
use crate::models::{User, UserPage, UserStatus};
use crate::observability::mask_email;
use crate::repositories::UserRepository;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

pub const MAX_PAGE_SIZE: i64 = 100;

/// Request to create a user under an agent.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
}

impl CreateUserRequest {
    /// Trims the name and normalises the e-mail before validation.
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
        }
    }
}

/// Service for the users an agent manages.
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repo: UserRepository::new(pool),
        }
    }

    /// Creates a user. E-mails are unique per agent.
    pub async fn create_user(&self, agent_id: Uuid, request: CreateUserRequest) -> Result<User> {
        let request = request.normalized();
        request
            .validate()
            .map_err(|errors| AppError::InvalidArgument(validation_message(&errors)))?;

        if self.user_repo.exists_by_email(agent_id, &request.email).await? {
            return Err(AppError::AlreadyExists(
                "A user with this email already exists".to_string(),
            ));
        }

        let user = self
            .user_repo
            .create(&User::new(agent_id, request.name, &request.email))
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AppError::AlreadyExists("A user with this email already exists".to_string())
                } else {
                    e
                }
            })?;

        info!(agent_id = %agent_id, user_id = %user.id, email = %mask_email(&user.email), "User created");
        Ok(user)
    }

    /// Finds one of the agent's users.
    pub async fn get_user(&self, agent_id: Uuid, user_id: Uuid) -> Result<User> {
        self.user_repo
            .find_for_agent(agent_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Lists the agent's users, newest first. `page` starts at 1.
    pub async fn list_users(&self, agent_id: Uuid, page: i64, limit: i64) -> Result<UserPage> {
        if page < 1 {
            return Err(AppError::InvalidArgument("page must be at least 1".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(AppError::InvalidArgument(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| AppError::InvalidArgument("page is out of range".to_string()))?;
        let users = self.user_repo.list_by_agent(agent_id, limit, offset).await?;
        let total = self.user_repo.count_by_agent(agent_id).await?;

        Ok(UserPage::new(users, total, page, limit))
    }

    pub async fn set_user_status(
        &self,
        agent_id: Uuid,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<User> {
        let user = self
            .user_repo
            .update_status(agent_id, user_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        info!(agent_id = %agent_id, user_id = %user_id, status = ?status, "User status changed");
        Ok(user)
    }
}

/// Flattens `validator` errors into one human-readable reason.
pub(crate) fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();

    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_normalization() {
        let request = CreateUserRequest {
            name: "  Player One ".to_string(),
            email: " Player1@Example.COM ".to_string(),
        }
        .normalized();

        assert_eq!(request.name, "Player One");
        assert_eq!(request.email, "player1@example.com");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validation_message_lists_every_field() {
        let request = CreateUserRequest {
            name: "   ".to_string(),
            email: "not-an-email".to_string(),
        }
        .normalized();

        let errors = request.validate().unwrap_err();
        assert_eq!(
            validation_message(&errors),
            "Email must be a valid address; Name is required"
        );
    }
}
