use crate::auth::rbac::{Permission, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the caller, already validated upstream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: Role,
    pub email: Option<String>,
}

impl UserContext {
    pub fn new(user_id: Uuid, organization_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            organization_id,
            role,
            email: None,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn is_admin_or_manager(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }

    /// Fails unless `organization_id` is the caller's own organization.
    pub fn ensure_organization(&self, organization_id: Uuid) -> Result<(), crate::error::ApiError> {
        if self.organization_id != organization_id {
            return Err(crate::error::ApiError::authorization(
                "Access to another organization is not allowed",
            ));
        }
        Ok(())
    }
}
