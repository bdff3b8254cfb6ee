use serde::Serialize;

/// Directory entry for a device user.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserDetail {
    pub user_id: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl UserDetail {
    /// Build a detail, turning blank directory cells into `None`.
    pub fn new(user_id: impl Into<String>, name: Option<String>, phone: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: non_blank(name),
            phone: non_blank(phone),
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Name-Not-Found ({})", self.user_id))
    }

    /// Phone number if one is on file and not blank.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().filter(|p| !p.trim().is_empty())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
