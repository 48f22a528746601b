use serde_json::json;

use super::ApiClient;
use crate::{error::ApiResult, models::RoleStatus, roles::Role};

impl ApiClient {
    pub async fn role_status(&self) -> ApiResult<RoleStatus> {
        let request = self.http().get(self.url("/api/user/role-status"));
        self.send_json(request, "Failed to fetch role status").await
    }

    pub async fn assign_role(&self, role: Role) -> ApiResult<()> {
        let request = self
            .http()
            .post(self.url("/api/user/assign-role"))
            .json(&json!({ "role_id": role.id() }));
        self.send_unit(request, "Failed to assign role").await
    }
}
