// Endpoint Identifier
//
// `owner/app[/path..]`, optionally prefixed by a reserved namespace.

use crate::error::SunraError;
use std::fmt;
use std::str::FromStr;

/// Namespaces that precede the owner segment
pub const RESERVED_NAMESPACES: [&str; 2] = ["workflows", "comfy"];

/// Parsed endpoint identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointId {
    namespace: Option<String>,
    owner: String,
    app: String,
    path: Option<String>,
}

impl EndpointId {
    pub fn new(
        owner: impl Into<String>,
        app: impl Into<String>,
        path: Option<String>,
        namespace: Option<String>,
    ) -> Self {
        Self {
            namespace,
            owner: owner.into(),
            app: app.into(),
            path: path.filter(|p| !p.is_empty()),
        }
    }

    /// Parse an endpoint identifier
    ///
    /// Accepts `owner/app`, `owner/app/sub/path`, `<namespace>/owner/app[/path]` and the
    /// legacy `<digits>-<alias>` form (normalized to `<digits>/<alias>`).
    pub fn parse(id: &str) -> Result<Self, SunraError> {
        let normalized = normalize(id)?;
        let parts: Vec<&str> = normalized.split('/').collect();

        let (namespace, rest) = if RESERVED_NAMESPACES.contains(&parts[0]) {
            (Some(parts[0].to_string()), &parts[1..])
        } else {
            (None, &parts[..])
        };

        if rest.len() < 2 || rest[0].is_empty() || rest[1].is_empty() {
            return Err(SunraError::validation(format!(
                "Invalid endpoint id: {}. Must be in the format <owner>/<app>[/<path>]",
                id
            )));
        }

        let path = if rest.len() > 2 {
            Some(rest[2..].join("/"))
        } else {
            None
        };

        Ok(Self::new(rest[0], rest[1], path, namespace))
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

/// Legacy ids (`12345-my-app`) carry owner and alias in one segment
fn normalize(id: &str) -> Result<String, SunraError> {
    let id = id.trim().trim_matches('/');
    if id.is_empty() {
        return Err(SunraError::validation("Endpoint id must not be empty"));
    }
    if id.contains('/') {
        return Ok(id.to_string());
    }

    if let Some((owner, alias)) = id.split_once('-') {
        let owner_ok = !owner.is_empty() && owner.chars().all(|c| c.is_ascii_digit());
        let alias_ok = !alias.is_empty()
            && alias
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if owner_ok && alias_ok {
            return Ok(format!("{}/{}", owner, alias));
        }
    }

    Err(SunraError::validation(format!(
        "Invalid endpoint id: {}. Must be in the format <owner>/<app>",
        id
    )))
}

impl FromStr for EndpointId {
    type Err = SunraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{}/", namespace)?;
        }
        write!(f, "{}/{}", self.owner, self.app)?;
        if let Some(path) = &self.path {
            write!(f, "/{}", path)?;
        }
        Ok(())
    }
}
