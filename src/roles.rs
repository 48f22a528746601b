//! Role lookup and the post-sign-in redirect.

use std::{fmt, str::FromStr};

use crate::{
    api::ApiClient,
    error::{ApiError, ApiResult},
    traits::{PENDING_ROLE_KEY, SessionStorage},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Landlord,
    Tenant,
    Agent,
    Manager,
    Owner,
    Admin,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Landlord,
        Role::Tenant,
        Role::Agent,
        Role::Manager,
        Role::Owner,
        Role::Admin,
    ];

    pub fn id(self) -> i64 {
        match self {
            Self::Landlord => 1,
            Self::Tenant => 2,
            Self::Agent => 3,
            Self::Manager => 4,
            Self::Owner => 5,
            Self::Admin => 6,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Landlord => "landlord",
            Self::Tenant => "tenant",
            Self::Agent => "agent",
            Self::Manager => "manager",
            Self::Owner => "owner",
            Self::Admin => "admin",
        }
    }

    pub fn dashboard_path(self) -> &'static str {
        match self {
            Self::Landlord => "/Dash/landlord",
            Self::Tenant => "/Dash/tenant",
            Self::Agent => "/Dash/agent",
            Self::Manager => "/Dash/manager",
            Self::Owner => "/Dash/owner",
            Self::Admin => "/Dash/admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<i64>() {
            return Self::from_id(id).ok_or_else(|| format!("unknown role id {id}"));
        }
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown role {s:?}"))
    }
}

/// Dashboard for a backend role id. Unknown ids land on the home page.
pub fn dashboard_path(role_id: i64) -> &'static str {
    match Role::from_id(role_id) {
        Some(role) => role.dashboard_path(),
        None => {
            tracing::warn!(role_id, "Unknown role id, redirecting home");
            "/"
        }
    }
}

/// Where a freshly signed-in user should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Landing {
    /// Not signed in; send the browser to the identity provider.
    SignIn(String),
    Redirect(&'static str),
    /// Signed in but no role yet; show the role picker.
    SelectRole,
}

/// Remember a role picked before sign-in so it can be applied afterwards.
pub fn remember_pending_role(storage: &dyn SessionStorage, role: Role) -> anyhow::Result<()> {
    storage.set(PENDING_ROLE_KEY, &role.id().to_string())
}

fn take_pending_role(storage: &dyn SessionStorage) -> Option<Role> {
    let raw = storage.get(PENDING_ROLE_KEY)?;
    if let Err(e) = storage.remove(PENDING_ROLE_KEY) {
        tracing::warn!("Failed to clear pending role: {e:#}");
    }
    match raw.parse::<Role>() {
        Ok(role) => Some(role),
        Err(e) => {
            tracing::warn!("Ignoring stored pending role: {e}");
            None
        }
    }
}

/// Decide the landing page from the profile and role-status endpoints.
pub async fn resolve_landing(client: &ApiClient) -> ApiResult<Landing> {
    let profile = match client.profile().await {
        Ok(profile) => profile,
        Err(ApiError::NotAuthenticated) => return Ok(Landing::SignIn(client.login_url())),
        Err(e) => return Err(e),
    };

    let status = client.role_status().await?;
    let role_id = status
        .role_id
        .filter(|_| status.has_role)
        .or(profile.role_id);

    if let Some(id) = role_id {
        tracing::debug!(role_id = id, "Role already assigned");
        return Ok(Landing::Redirect(dashboard_path(id)));
    }

    if let Some(role) = take_pending_role(client.storage()) {
        tracing::info!(%role, "Applying role chosen before sign-in");
        return choose_role(client, role).await;
    }

    Ok(Landing::SelectRole)
}

/// Assign `role` and return the matching redirect.
pub async fn choose_role(client: &ApiClient, role: Role) -> ApiResult<Landing> {
    client.assign_role(role).await?;
    Ok(Landing::Redirect(role.dashboard_path()))
}
