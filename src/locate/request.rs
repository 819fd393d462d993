use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the raw identifier of a request is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierType {
    /// Value of the page's test-marker attribute.
    #[serde(alias = "data_attr_id", alias = "data-attr-id")]
    Marker,
    /// Visible label or ARIA label.
    #[serde(alias = "semantic", alias = "text")]
    Label,
    /// Visual or semantic category of the component (`primary`, `checkbox`, ...).
    #[serde(alias = "type")]
    Variant,
    /// 1-based position among candidates of the kind, in document order.
    #[serde(alias = "index")]
    Position,
    /// Marker, then exact label, then fuzzy label.
    #[default]
    Auto,
}

impl IdentifierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::Marker => "marker",
            IdentifierType::Label => "label",
            IdentifierType::Variant => "variant",
            IdentifierType::Position => "position",
            IdentifierType::Auto => "auto",
        }
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownIdentifierType(pub String);

impl fmt::Display for UnknownIdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown identifier type '{}'", self.0)
    }
}

impl std::error::Error for UnknownIdentifierType {}

impl FromStr for IdentifierType {
    type Err = UnknownIdentifierType;

    /// Accepts the canonical names plus the aliases scenario authors use
    /// (`data_attr_id`, `semantic`, `text`, `type`, `index`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marker" | "data_attr_id" | "data-attr-id" => Ok(IdentifierType::Marker),
            "label" | "semantic" | "text" => Ok(IdentifierType::Label),
            "variant" | "type" => Ok(IdentifierType::Variant),
            "position" | "index" => Ok(IdentifierType::Position),
            "auto" | "" => Ok(IdentifierType::Auto),
            other => Err(UnknownIdentifierType(other.to_string())),
        }
    }
}

/// What the caller wants found. Immutable and built per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentificationRequest {
    pub raw_identifier: String,
    #[serde(default)]
    pub identifier_type: IdentifierType,
    pub component_kind: String,
    /// Only consider elements inside the group or container of this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl IdentificationRequest {
    pub fn new(
        raw_identifier: impl Into<String>,
        identifier_type: IdentifierType,
        component_kind: impl Into<String>,
    ) -> Self {
        IdentificationRequest {
            raw_identifier: raw_identifier.into(),
            identifier_type,
            component_kind: component_kind.into(),
            scope: None,
        }
    }

    pub fn auto(raw_identifier: impl Into<String>, component_kind: impl Into<String>) -> Self {
        Self::new(raw_identifier, IdentifierType::Auto, component_kind)
    }

    pub fn marker(raw_identifier: impl Into<String>, component_kind: impl Into<String>) -> Self {
        Self::new(raw_identifier, IdentifierType::Marker, component_kind)
    }

    pub fn label(raw_identifier: impl Into<String>, component_kind: impl Into<String>) -> Self {
        Self::new(raw_identifier, IdentifierType::Label, component_kind)
    }

    pub fn variant(raw_identifier: impl Into<String>, component_kind: impl Into<String>) -> Self {
        Self::new(raw_identifier, IdentifierType::Variant, component_kind)
    }

    pub fn position(position: usize, component_kind: impl Into<String>) -> Self {
        Self::new(position.to_string(), IdentifierType::Position, component_kind)
    }

    /// Restrict resolution to the group or container named `scope`.
    pub fn within(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

impl fmt::Display for IdentificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' by {}",
            self.component_kind, self.raw_identifier, self.identifier_type
        )?;
        if let Some(scope) = &self.scope {
            write!(f, " within '{scope}'")?;
        }
        Ok(())
    }
}
