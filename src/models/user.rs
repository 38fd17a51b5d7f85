use serde::{Deserialize, Serialize};

pub const CHRIST_MEMBER: &str = "christ_member";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub campus: Option<String>,
    #[serde(default)]
    pub organization_type: Option<String>,
    #[serde(default)]
    pub register_number: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl UserProfile {
    /// Christ members without a saved campus get the campus prompt.
    pub fn needs_campus(&self) -> bool {
        self.organization_type.as_deref() == Some(CHRIST_MEMBER)
            && self.campus.as_deref().map_or(true, |c| c.trim().is_empty())
    }
}

/// `GET /api/users/{email}` answers either the profile or `{"user": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProfileBody {
    Wrapped { user: UserProfile },
    Bare(UserProfile),
}

impl ProfileBody {
    pub(crate) fn into_profile(self) -> UserProfile {
        match self {
            ProfileBody::Wrapped { user } => user,
            ProfileBody::Bare(user) => user,
        }
    }
}
