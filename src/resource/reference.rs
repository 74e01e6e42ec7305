//! Resource references and their resolution from user input.

use crate::error::ResolveError;
use std::fmt;

/// Where a resource lives below its project
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Directly under the project (`projects/p/jobs/j`)
    Project,
    /// Under `global/`
    Global,
    Region(String),
    Zone(String),
}

impl Scope {
    /// Human-readable scope type (`zone`, `region`, `global`, `project`)
    pub fn kind(&self) -> &'static str {
        match self {
            Scope::Project => "project",
            Scope::Global => "global",
            Scope::Region(_) => "region",
            Scope::Zone(_) => "zone",
        }
    }

    /// Scope value (region or zone name); empty for unscoped references
    pub fn value(&self) -> &str {
        match self {
            Scope::Region(r) => r,
            Scope::Zone(z) => z,
            Scope::Project | Scope::Global => "",
        }
    }
}

/// A fully-qualified remote resource: project, scope, collection and name.
///
/// Resolved once per invocation and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceReference {
    project: String,
    scope: Scope,
    collection: String,
    name: String,
}

impl ResourceReference {
    pub fn new(project: &str, scope: Scope, collection: &str, name: &str) -> Self {
        Self {
            project: project.to_string(),
            scope,
            collection: collection.to_string(),
            name: name.to_string(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relative resource name, e.g. `projects/p/zones/z/instanceGroups/g`
    pub fn relative_name(&self) -> String {
        let scope = match &self.scope {
            Scope::Project => String::new(),
            Scope::Global => "global/".to_string(),
            Scope::Region(r) => format!("regions/{}/", r),
            Scope::Zone(z) => format!("zones/{}/", z),
        };
        format!(
            "projects/{}/{}{}/{}",
            self.project, scope, self.collection, self.name
        )
    }

    /// Absolute URL of the resource under an API root
    pub fn self_link(&self, api_base: &str) -> String {
        format!("{}/{}", api_base.trim_end_matches('/'), self.relative_name())
    }

    /// Parse a full URL or a relative `projects/...` path
    pub fn parse(link: &str) -> Result<Self, ResolveError> {
        let path = if link.starts_with("https://") || link.starts_with("http://") {
            url::Url::parse(link)
                .map_err(|e| ResolveError::invalid(link, e.to_string()))?
                .path()
                .to_string()
        } else {
            link.to_string()
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let start = segments
            .iter()
            .position(|s| *s == "projects")
            .ok_or_else(|| ResolveError::invalid(link, "missing projects/ segment"))?;
        let rest = &segments[start + 1..];

        let (project, scope, tail) = match rest {
            [project, "global", tail @ ..] => (*project, Scope::Global, tail),
            [project, "regions", region, tail @ ..] => {
                (*project, Scope::Region(region.to_string()), tail)
            }
            [project, "zones", zone, tail @ ..] => (*project, Scope::Zone(zone.to_string()), tail),
            [project, tail @ ..] => (*project, Scope::Project, tail),
            [] => return Err(ResolveError::invalid(link, "missing project")),
        };

        match tail {
            [collection, name] => Ok(Self::new(project, scope, collection, name)),
            _ => Err(ResolveError::invalid(
                link,
                "expected <collection>/<name> after the scope",
            )),
        }
    }

    /// True when `link` names this resource, whatever API host or version it uses
    pub fn matches_link(&self, link: &str) -> bool {
        Self::parse(link).map(|r| r == *self).unwrap_or(false)
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_name())
    }
}

/// Which scopes a resource kind may be resolved into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeKinds {
    pub zonal: bool,
    pub regional: bool,
}

impl ScopeKinds {
    pub const ZONAL: ScopeKinds = ScopeKinds {
        zonal: true,
        regional: false,
    };
    pub const ZONAL_OR_REGIONAL: ScopeKinds = ScopeKinds {
        zonal: true,
        regional: true,
    };
}

/// Explicit scope flags supplied alongside a name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeHints {
    pub zone: Option<String>,
    pub region: Option<String>,
}

/// Turns names and scope flags into [`ResourceReference`]s
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    project: String,
    default_zone: Option<String>,
    default_region: Option<String>,
}

impl ReferenceResolver {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            default_zone: None,
            default_region: None,
        }
    }

    pub fn with_defaults(mut self, zone: Option<String>, region: Option<String>) -> Self {
        self.default_zone = zone.filter(|z| !z.is_empty());
        self.default_region = region.filter(|r| !r.is_empty());
        self
    }

    /// Resolve a reference living under `global/`
    pub fn resolve_global(
        &self,
        collection: &str,
        name: &str,
    ) -> Result<ResourceReference, ResolveError> {
        self.resolve_unscoped(collection, name, Scope::Global)
    }

    /// Resolve a reference living directly under the project
    pub fn resolve_project(
        &self,
        collection: &str,
        name: &str,
    ) -> Result<ResourceReference, ResolveError> {
        self.resolve_unscoped(collection, name, Scope::Project)
    }

    fn resolve_unscoped(
        &self,
        collection: &str,
        name: &str,
        scope: Scope,
    ) -> Result<ResourceReference, ResolveError> {
        if let Some(parsed) = self.parse_path(collection, name)? {
            if *parsed.scope() != scope {
                return Err(ResolveError::invalid(
                    name,
                    format!("expected a {} resource", scope.kind()),
                ));
            }
            return Ok(parsed);
        }
        Ok(ResourceReference::new(&self.project, scope, collection, name))
    }

    /// Resolve a zonal or regional reference
    pub fn resolve_scoped(
        &self,
        collection: &str,
        name: &str,
        hints: &ScopeHints,
        allowed: ScopeKinds,
    ) -> Result<ResourceReference, ResolveError> {
        if let Some(parsed) = self.parse_path(collection, name)? {
            let permitted = match parsed.scope() {
                Scope::Zone(_) => allowed.zonal,
                Scope::Region(_) => allowed.regional,
                _ => false,
            };
            if !permitted {
                return Err(ResolveError::invalid(
                    name,
                    format!("{} scope is not supported here", parsed.scope().kind()),
                ));
            }
            return Ok(parsed);
        }

        let scope = match (&hints.zone, &hints.region) {
            (Some(_), Some(_)) => {
                return Err(ResolveError::ambiguous(
                    name,
                    "both a zone and a region were given",
                ));
            }
            (Some(zone), None) => Scope::Zone(zone.clone()),
            (None, Some(region)) => {
                if !allowed.regional {
                    return Err(ResolveError::invalid(
                        name,
                        "region scope is not supported here",
                    ));
                }
                Scope::Region(region.clone())
            }
            (None, None) => self.default_scope(name, allowed)?,
        };

        Ok(ResourceReference::new(&self.project, scope, collection, name))
    }

    fn default_scope(&self, name: &str, allowed: ScopeKinds) -> Result<Scope, ResolveError> {
        if allowed.zonal {
            if let Some(zone) = &self.default_zone {
                tracing::debug!("Using default zone {} for [{}]", zone, name);
                return Ok(Scope::Zone(zone.clone()));
            }
        }
        if allowed.regional {
            if let Some(region) = &self.default_region {
                tracing::debug!("Using default region {} for [{}]", region, name);
                return Ok(Scope::Region(region.clone()));
            }
        }

        let flags = if allowed.regional {
            "a zone or a region"
        } else {
            "a zone"
        };
        Err(ResolveError::ambiguous(
            name,
            format!("no scope given; specify {} or configure a default", flags),
        ))
    }

    /// Parse `name` if it is a URL or `projects/...` path
    fn parse_path(
        &self,
        collection: &str,
        name: &str,
    ) -> Result<Option<ResourceReference>, ResolveError> {
        if name.is_empty() {
            return Err(ResolveError::invalid(name, "name must not be empty"));
        }
        if !name.contains('/') {
            return Ok(None);
        }

        let parsed = ResourceReference::parse(name)?;
        if parsed.collection() != collection {
            return Err(ResolveError::invalid(
                name,
                format!(
                    "expected a {} reference, got {}",
                    collection,
                    parsed.collection()
                ),
            ));
        }
        Ok(Some(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ReferenceResolver {
        ReferenceResolver::new("my-project-123")
    }

    #[test]
    fn test_relative_name_per_scope() {
        let zonal = ResourceReference::new("p", Scope::Zone("z".into()), "instanceGroups", "g");
        assert_eq!(zonal.relative_name(), "projects/p/zones/z/instanceGroups/g");

        let job = ResourceReference::new("p", Scope::Project, "jobs", "j");
        assert_eq!(job.relative_name(), "projects/p/jobs/j");
    }

    #[test]
    fn test_parse_full_url() {
        let reference = ResourceReference::parse(
            "https://www.googleapis.com/compute/v1/projects/p/regions/us-east1/instanceGroups/ig",
        )
        .unwrap();
        assert_eq!(reference.project(), "p");
        assert_eq!(reference.scope(), &Scope::Region("us-east1".to_string()));
        assert_eq!(reference.collection(), "instanceGroups");
        assert_eq!(reference.name(), "ig");
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        assert!(ResourceReference::parse("global/backendServices/web").is_err());
        assert!(ResourceReference::parse("projects/p/zones/z/instanceGroups").is_err());
        assert!(ResourceReference::parse("projects").is_err());
    }

    #[test]
    fn test_matches_link_ignores_host_and_version() {
        let reference = ResourceReference::new(
            "p",
            Scope::Zone("us-central1-a".into()),
            "instanceGroups",
            "ig",
        );
        assert!(reference.matches_link(
            "https://www.googleapis.com/compute/alpha/projects/p/zones/us-central1-a/instanceGroups/ig"
        ));
        assert!(reference.matches_link("projects/p/zones/us-central1-a/instanceGroups/ig"));
        assert!(!reference.matches_link(
            "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-b/instanceGroups/ig"
        ));
        assert!(!reference.matches_link("not a link"));
    }

    #[test]
    fn test_resolve_global_bare_name() {
        let reference = resolver().resolve_global("backendServices", "web").unwrap();
        assert_eq!(
            reference.relative_name(),
            "projects/my-project-123/global/backendServices/web"
        );
    }

    #[test]
    fn test_resolve_global_rejects_wrong_collection() {
        let err = resolver()
            .resolve_global("backendServices", "projects/p/global/urlMaps/web")
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidReference { .. }));
    }

    #[test]
    fn test_resolve_scoped_with_hints() {
        let zone_hint = ScopeHints {
            zone: Some("us-central1-a".into()),
            region: None,
        };
        let reference = resolver()
            .resolve_scoped("instanceGroups", "ig", &zone_hint, ScopeKinds::ZONAL)
            .unwrap();
        assert_eq!(reference.scope(), &Scope::Zone("us-central1-a".into()));

        let region_hint = ScopeHints {
            zone: None,
            region: Some("us-central1".into()),
        };
        let reference = resolver()
            .resolve_scoped(
                "instanceGroups",
                "ig",
                &region_hint,
                ScopeKinds::ZONAL_OR_REGIONAL,
            )
            .unwrap();
        assert_eq!(reference.scope(), &Scope::Region("us-central1".into()));
    }

    #[test]
    fn test_resolve_scoped_region_not_allowed() {
        let region_hint = ScopeHints {
            zone: None,
            region: Some("us-central1".into()),
        };
        let err = resolver()
            .resolve_scoped("instanceGroups", "ig", &region_hint, ScopeKinds::ZONAL)
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidReference { .. }));
    }

    #[test]
    fn test_resolve_scoped_ambiguous() {
        let both = ScopeHints {
            zone: Some("us-central1-a".into()),
            region: Some("us-central1".into()),
        };
        let err = resolver()
            .resolve_scoped("instanceGroups", "ig", &both, ScopeKinds::ZONAL_OR_REGIONAL)
            .unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousOrNotFound { .. }));

        let err = resolver()
            .resolve_scoped(
                "instanceGroups",
                "ig",
                &ScopeHints::default(),
                ScopeKinds::ZONAL,
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousOrNotFound { .. }));
    }

    #[test]
    fn test_resolve_scoped_falls_back_to_defaults() {
        let resolver = resolver().with_defaults(None, Some("europe-west1".into()));
        let reference = resolver
            .resolve_scoped(
                "instanceGroups",
                "ig",
                &ScopeHints::default(),
                ScopeKinds::ZONAL_OR_REGIONAL,
            )
            .unwrap();
        assert_eq!(reference.scope(), &Scope::Region("europe-west1".into()));

        // A default region is no help when only zones are allowed
        assert!(resolver
            .resolve_scoped(
                "instanceGroups",
                "ig",
                &ScopeHints::default(),
                ScopeKinds::ZONAL
            )
            .is_err());
    }
}
