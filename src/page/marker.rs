use serde::Serialize;

/// Structure of a convention-based marker value:
/// `{component}--{role}--{slug}`, e.g. `login-page--input--email`.
///
/// Values with fewer segments still parse; missing parts are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerPattern {
    pub component: Option<String>,
    pub role: Option<String>,
    pub slug: String,
}

impl MarkerPattern {
    pub fn parse(value: &str) -> Option<MarkerPattern> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        let parts: Vec<&str> = value.split("--").collect();
        let pattern = match parts.as_slice() {
            [slug] => MarkerPattern {
                component: None,
                role: None,
                slug: (*slug).to_string(),
            },
            [component, slug] => MarkerPattern {
                component: Some((*component).to_string()),
                role: None,
                slug: (*slug).to_string(),
            },
            [component, role, rest @ ..] => MarkerPattern {
                component: Some((*component).to_string()),
                role: Some((*role).to_string()),
                slug: rest.join("--"),
            },
            [] => return None,
        };
        Some(pattern)
    }

    /// True if `slug` names this marker's last segment, or is a dash-bounded
    /// suffix of it (`email` matches `user-email`).
    pub fn slug_matches(&self, slug: &str) -> bool {
        if slug.is_empty() {
            return false;
        }
        let own = self.slug.to_lowercase();
        own == slug || own.ends_with(&format!("-{slug}"))
    }
}
