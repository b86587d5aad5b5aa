use crate::error::{Result, ScaffoldError};
use crate::ident::DottedId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Endpoint serving the latest action definitions on the internal network.
pub const DEFAULT_CATALOG_URL: &str =
    "http://aus02niserv001.dev.volusion.com/Mozu.InstalledApplications.WebApi/platform/extensions/actionsManifest";

/// Environment variable that overrides [`DEFAULT_CATALOG_URL`].
pub const CATALOG_URL_ENV: &str = "ACTION_DEFS_URL";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const BUNDLED_DEFINITIONS: &str = include_str!("../catalog/action-definitions.json");

// ---------------------------------------------------------------------------
// ActionDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    #[serde(rename = "action")]
    pub action_id: DottedId,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub context: serde_json::Value,
    #[serde(default)]
    pub supports_multiple_custom_functions: bool,
    #[serde(default)]
    pub beta: bool,
}

#[derive(Debug, Deserialize)]
struct BundledDefinitions {
    domains: Vec<String>,
    actions: Vec<ActionDefinition>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    pub internal: bool,
    pub remote_url: Option<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    domains: Vec<String>,
    actions: IndexMap<DottedId, ActionDefinition>,
}

impl Catalog {
    /// Load the catalog for one generator run.
    ///
    /// Internal runs try the remote endpoint first and keep beta actions; any
    /// fetch failure falls back to the bundled definitions without them.
    pub fn load(opts: &CatalogOptions) -> Result<Self> {
        if opts.internal {
            let url = opts
                .remote_url
                .clone()
                .or_else(|| std::env::var(CATALOG_URL_ENV).ok())
                .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());
            match fetch_remote(&url, opts.timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT)) {
                Ok(actions) => {
                    info!(url = %url, count = actions.len(), "using remote action definitions");
                    let bundled = parse_bundled(BUNDLED_DEFINITIONS)?;
                    return Ok(Self::from_definitions(&bundled.domains, actions, true));
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "remote action definitions unavailable, using bundled set");
                }
            }
        }
        Self::bundled()
    }

    /// The definitions shipped with the binary, beta actions excluded.
    pub fn bundled() -> Result<Self> {
        Self::from_bundled_str(BUNDLED_DEFINITIONS)
    }

    fn from_bundled_str(raw: &str) -> Result<Self> {
        let bundled = parse_bundled(raw)?;
        let catalog = Self::from_definitions(&bundled.domains, bundled.actions.clone(), false);
        let dropped = bundled
            .actions
            .iter()
            .filter(|a| !a.beta && !catalog.contains(&a.action_id))
            .map(|a| a.action_id.to_string())
            .collect::<Vec<_>>();
        if !dropped.is_empty() {
            return Err(ScaffoldError::CatalogLoad(format!(
                "bundled actions without a known domain: {}",
                dropped.join(", ")
            )));
        }
        debug!(actions = catalog.actions.len(), "using bundled action definitions");
        Ok(catalog)
    }

    /// Build a catalog from raw definitions.
    ///
    /// Definitions without a `domain` get one inferred from `known_domains`;
    /// those that still have none are dropped. Domains with no remaining
    /// action are left out.
    pub fn from_definitions(
        known_domains: &[String],
        definitions: Vec<ActionDefinition>,
        include_beta: bool,
    ) -> Self {
        let mut all_domains: Vec<String> = known_domains.to_vec();
        for def in &definitions {
            if !def.domain.is_empty() && !all_domains.contains(&def.domain) {
                all_domains.push(def.domain.clone());
            }
        }

        let mut actions: IndexMap<DottedId, ActionDefinition> = IndexMap::new();
        for mut def in definitions {
            if def.beta && !include_beta {
                continue;
            }
            if def.domain.is_empty() {
                match infer_domain(&all_domains, &def.action_id) {
                    Some(domain) => def.domain = domain.to_string(),
                    None => {
                        warn!(action = %def.action_id, "no domain for action definition, skipping");
                        continue;
                    }
                }
            }
            actions.insert(def.action_id.clone(), def);
        }

        let domains = all_domains
            .into_iter()
            .filter(|d| actions.values().any(|a| &a.domain == d))
            .collect();

        Self { domains, actions }
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn get(&self, id: &DottedId) -> Option<&ActionDefinition> {
        self.actions.get(id)
    }

    pub fn contains(&self, id: &DottedId) -> bool {
        self.actions.contains_key(id)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.values()
    }

    pub fn actions_in<'a>(&'a self, domain: &'a str) -> impl Iterator<Item = &'a ActionDefinition> {
        self.actions.values().filter(move |a| a.domain == domain)
    }

    pub fn supports_multiple(&self, id: &DottedId) -> bool {
        self.get(id)
            .map(|a| a.supports_multiple_custom_functions)
            .unwrap_or(false)
    }

    /// Domain of `id`: the catalog entry's domain when known, otherwise the
    /// longest catalog domain that prefixes the identifier.
    pub fn domain_of(&self, id: &DottedId) -> Option<&str> {
        if let Some(def) = self.actions.get(id) {
            return Some(def.domain.as_str());
        }
        infer_domain(&self.domains, id)
    }

    pub fn require_domain(&self, id: &DottedId) -> Result<&str> {
        self.domain_of(id)
            .ok_or_else(|| ScaffoldError::UnknownAction(id.to_string()))
    }
}

fn parse_bundled(raw: &str) -> Result<BundledDefinitions> {
    serde_json::from_str(raw)
        .map_err(|e| ScaffoldError::CatalogLoad(format!("bundled definitions are malformed: {e}")))
}

fn fetch_remote(url: &str, timeout: Duration) -> Result<Vec<ActionDefinition>> {
    let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
    let response = client.get(url).send()?.error_for_status()?;
    let body = response.text()?;
    Ok(serde_json::from_str(&body)?)
}

/// Longest domain matching the tail after the type segment, falling back to
/// the whole identifier. Matches end on a segment boundary.
fn infer_domain<'a>(domains: &'a [String], id: &DottedId) -> Option<&'a str> {
    longest_prefix(domains, id.tail()).or_else(|| longest_prefix(domains, id.as_str()))
}

fn longest_prefix<'a>(domains: &'a [String], name: &str) -> Option<&'a str> {
    domains
        .iter()
        .filter(|d| {
            name == d.as_str()
                || (name.starts_with(d.as_str()) && name[d.len()..].starts_with('.'))
        })
        .max_by_key(|d| d.len())
        .map(String::as_str)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, domain: &str, multi: bool, beta: bool) -> ActionDefinition {
        ActionDefinition {
            action_id: DottedId::new(id),
            domain: domain.to_string(),
            context: serde_json::Value::Null,
            supports_multiple_custom_functions: multi,
            beta,
        }
    }

    #[test]
    fn bundled_catalog_excludes_beta_and_empty_domains() {
        let catalog = Catalog::bundled().unwrap();
        assert!(!catalog.contains(&"embedded.commerce.payments.action.before".into()));
        assert!(!catalog.domains().iter().any(|d| d == "commerce.payments"));
        assert!(!catalog.domains().iter().any(|d| d == "commerce.return"));
        assert!(catalog.domains().iter().any(|d| d == "platform.applications"));
    }

    #[test]
    fn every_action_domain_is_listed() {
        let catalog = Catalog::bundled().unwrap();
        for action in catalog.actions() {
            assert!(
                catalog.domains().contains(&action.domain),
                "{} has unlisted domain {}",
                action.action_id,
                action.domain
            );
        }
    }

    #[test]
    fn infers_domain_from_tail() {
        let catalog = Catalog::bundled().unwrap();
        let id = DottedId::new("embedded.platform.applications.install");
        assert_eq!(catalog.get(&id).unwrap().domain, "platform.applications");
        let route = DottedId::new("http.storefront.routes");
        assert_eq!(catalog.get(&route).unwrap().domain, "storefront");
    }

    #[test]
    fn longest_domain_wins() {
        let domains = vec!["commerce".to_string(), "commerce.carts".to_string()];
        let id = DottedId::new("embedded.commerce.carts.addItem.before");
        assert_eq!(infer_domain(&domains, &id), Some("commerce.carts"));
    }

    #[test]
    fn prefix_match_respects_segment_boundary() {
        let domains = vec!["platform.app".to_string()];
        let id = DottedId::new("embedded.platform.applications.install");
        assert_eq!(infer_domain(&domains, &id), None);
    }

    #[test]
    fn whole_identifier_matches_when_tail_does_not() {
        let catalog = Catalog::from_definitions(
            &["platform.applications".to_string()],
            vec![def("platform.applications.install", "", true, false)],
            false,
        );
        assert_eq!(
            catalog.domain_of(&"platform.applications.install".into()),
            Some("platform.applications")
        );
    }

    #[test]
    fn unknown_action_is_an_error() {
        let catalog = Catalog::bundled().unwrap();
        let err = catalog
            .require_domain(&"embedded.nowhere.at.all".into())
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::UnknownAction(ref id) if id == "embedded.nowhere.at.all"));
    }

    #[test]
    fn malformed_bundled_source_is_fatal() {
        let err = Catalog::from_bundled_str("{ not json").unwrap_err();
        assert!(matches!(err, ScaffoldError::CatalogLoad(_)));
    }

    #[test]
    fn remote_definitions_keep_beta() {
        let mut server = mockito::Server::new();
        let body = serde_json::json!([
            {
                "action": "embedded.commerce.payments.action.before",
                "domain": "commerce.payments",
                "context": {},
                "beta": true,
                "supportsMultipleCustomFunctions": false
            },
            {
                "action": "embedded.platform.applications.install",
                "domain": "platform.applications",
                "context": {},
                "beta": false,
                "supportsMultipleCustomFunctions": true
            }
        ]);
        let mock = server
            .mock("GET", "/defs")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create();

        let catalog = Catalog::load(&CatalogOptions {
            internal: true,
            remote_url: Some(format!("{}/defs", server.url())),
            timeout: None,
        })
        .unwrap();

        mock.assert();
        assert!(catalog.contains(&"embedded.commerce.payments.action.before".into()));
        assert_eq!(catalog.domains(), ["commerce.payments", "platform.applications"]);
    }

    #[test]
    fn server_error_falls_back_to_bundled() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/defs").with_status(500).create();

        let catalog = Catalog::load(&CatalogOptions {
            internal: true,
            remote_url: Some(format!("{}/defs", server.url())),
            timeout: None,
        })
        .unwrap();

        assert!(catalog.contains(&"embedded.platform.applications.install".into()));
        assert!(!catalog.actions().any(|a| a.beta));
    }

    #[test]
    fn malformed_remote_body_falls_back_to_bundled() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/defs")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create();

        let catalog = Catalog::load(&CatalogOptions {
            internal: true,
            remote_url: Some(format!("{}/defs", server.url())),
            timeout: None,
        })
        .unwrap();

        assert!(!catalog.actions().any(|a| a.beta));
    }

    #[test]
    fn non_internal_runs_never_fetch() {
        let mut server = mockito::Server::new();
        let mock = server.mock("GET", "/defs").expect(0).create();

        Catalog::load(&CatalogOptions {
            internal: false,
            remote_url: Some(format!("{}/defs", server.url())),
            timeout: None,
        })
        .unwrap();

        mock.assert();
    }
}
