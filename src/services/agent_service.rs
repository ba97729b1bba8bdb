use crate::error::{AppError, Result};
use crate::models::agent::normalize_email;
use crate::models::{Agent, AgentStatus};
use crate::observability::mask_email;
use crate::repositories::AgentRepository;
use crate::services::user_service::validation_message;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Request to register a new agent.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterAgentRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
}

/// Service for the agent directory.
///
/// The identity collaborator calls [`AgentService::ensure_active`] before
/// handing an agent id to the ledger services.
pub struct AgentService {
    agent_repo: AgentRepository,
}

impl AgentService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            agent_repo: AgentRepository::new(pool),
        }
    }

    pub async fn register_agent(&self, request: RegisterAgentRequest) -> Result<Agent> {
        let request = RegisterAgentRequest {
            name: request.name.trim().to_string(),
            email: normalize_email(&request.email),
        };
        request
            .validate()
            .map_err(|errors| AppError::InvalidArgument(validation_message(&errors)))?;

        if self.agent_repo.exists_by_email(&request.email).await? {
            return Err(AppError::AlreadyExists(
                "An agent with this email already exists".to_string(),
            ));
        }

        let agent = self
            .agent_repo
            .create(&Agent::new(request.name, &request.email))
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AppError::AlreadyExists("An agent with this email already exists".to_string())
                } else {
                    e
                }
            })?;

        info!(agent_id = %agent.id, email = %mask_email(&agent.email), "Agent registered");
        Ok(agent)
    }

    pub async fn find_agent(&self, agent_id: Uuid) -> Result<Agent> {
        self.agent_repo
            .find_by_id(agent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Agent '{}' not found", agent_id)))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Agent> {
        self.agent_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::NotFound("Agent not found".to_string()))
    }

    /// Updates the display name. Blank names are rejected.
    pub async fn update_profile(&self, agent_id: Uuid, name: &str) -> Result<Agent> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidArgument("Name is required".to_string()));
        }

        self.agent_repo
            .update_name(agent_id, name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Agent '{}' not found", agent_id)))
    }

    pub async fn set_agent_status(&self, agent_id: Uuid, status: AgentStatus) -> Result<Agent> {
        let agent = self
            .agent_repo
            .update_status(agent_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Agent '{}' not found", agent_id)))?;

        info!(agent_id = %agent_id, status = ?status, "Agent status changed");
        Ok(agent)
    }

    /// Returns the agent if it may transact.
    pub async fn ensure_active(&self, agent_id: Uuid) -> Result<Agent> {
        let agent = self.find_agent(agent_id).await?;
        if !agent.is_active() {
            return Err(AppError::InvalidState(format!("Agent '{}' is inactive", agent_id)));
        }
        Ok(agent)
    }
}
