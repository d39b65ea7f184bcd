use serde::{Deserialize, Serialize};

use crate::{
    auth::repo_types::{Role, UserPatch},
    error::ApiError,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn into_patch(self) -> Result<UserPatch, ApiError> {
        let mut errors = Vec::new();

        let full_name = self.full_name.map(|n| n.trim().to_string());
        if full_name.as_deref() == Some("") {
            errors.push("Full name cannot be empty".to_string());
        }
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => raw.parse::<Role>().map_err(|e| errors.push(e)).ok(),
        };

        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }
        Ok(UserPatch { full_name, role })
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: i64,
    pub total_admins: i64,
    pub total_all_users: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_parses_role() {
        let patch = UpdateUserRequest {
            full_name: Some(" Grace Hopper ".into()),
            role: Some("admin".into()),
        }
        .into_patch()
        .unwrap();
        assert_eq!(patch.full_name.as_deref(), Some("Grace Hopper"));
        assert_eq!(patch.role, Some(Role::Admin));
    }

    #[test]
    fn patch_rejects_unknown_role() {
        let err = UpdateUserRequest {
            full_name: None,
            role: Some("root".into()),
        }
        .into_patch()
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref errors, .. } if errors.len() == 1));
    }

    #[test]
    fn stats_serialize_camel_case() {
        let json = serde_json::to_value(UserStats {
            total_users: 3,
            total_admins: 1,
            total_all_users: 4,
        })
        .unwrap();
        assert_eq!(json["totalAllUsers"], 4);
    }
}
