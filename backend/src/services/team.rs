//! Team membership service
//!
//! The supply pipeline consults teams only as an authorization predicate:
//! who belongs to a team and with which role. Membership management itself
//! (invites, joins, role changes) lives outside this service.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{Team, TeamRole};

use crate::error::{AppError, AppResult};

/// Team service for membership lookups
#[derive(Clone)]
pub struct TeamService {
    db: PgPool,
}

impl TeamService {
    /// Create a new TeamService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get a team by ID
    pub async fn get_team(&self, team_id: Uuid) -> AppResult<Team> {
        let row = sqlx::query_as::<_, (Uuid, String, Uuid, DateTime<Utc>)>(
            "SELECT id, name, owner_id, created_at FROM teams WHERE id = $1",
        )
        .bind(team_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team".to_string()))?;

        Ok(Team {
            id: row.0,
            name: row.1,
            owner_id: row.2,
            created_at: row.3,
        })
    }

    /// Role of a user within a team, if any
    pub async fn role_of(&self, team_id: Uuid, user_id: Uuid) -> AppResult<Option<TeamRole>> {
        let owner_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT owner_id FROM teams WHERE id = $1",
        )
        .bind(team_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(owner_id) = owner_id else {
            return Ok(None);
        };
        if owner_id == user_id {
            return Ok(Some(TeamRole::Owner));
        }

        let role = sqlx::query_scalar::<_, String>(
            "SELECT role FROM team_members WHERE team_id = $1 AND user_id = $2",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(role.as_deref().and_then(TeamRole::from_str))
    }

    /// Whether a user belongs to a team
    pub async fn is_member(&self, team_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self.role_of(team_id, user_id).await?.is_some())
    }

    /// Require team membership, returning the member's role
    pub async fn require_member(&self, team_id: Uuid, user_id: Uuid) -> AppResult<TeamRole> {
        self.role_of(team_id, user_id)
            .await?
            .ok_or(AppError::InsufficientPermissions)
    }

    /// Require a role allowed to archive or delete supplies (admin or owner)
    pub async fn require_manager(&self, team_id: Uuid, user_id: Uuid) -> AppResult<TeamRole> {
        let role = self.require_member(team_id, user_id).await?;
        if !role.can_manage_supplies() {
            return Err(AppError::InsufficientPermissions);
        }
        Ok(role)
    }

    /// Require the team owner (maintenance endpoints)
    pub async fn require_owner(&self, team_id: Uuid, user_id: Uuid) -> AppResult<()> {
        match self.require_member(team_id, user_id).await? {
            TeamRole::Owner => Ok(()),
            _ => Err(AppError::InsufficientPermissions),
        }
    }
}
