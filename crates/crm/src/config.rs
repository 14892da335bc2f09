use std::path::PathBuf;

/// Default domain hosting the amoCRM authorize page and connect button.
const DEFAULT_AUTH_DOMAIN: &str = "www.amocrm.ru";
/// Default location of the token file.
const DEFAULT_TOKEN_FILE: &str = "/tmp/token_info.json";
/// Default lifetime of an issued OAuth `state` value, in seconds.
const DEFAULT_STATE_TTL_SECS: u64 = 600;
/// Account domains amoCRM hands out. A leading dot matches any subdomain.
const DEFAULT_ALLOWED_DOMAINS: &str = ".amocrm.ru,.amocrm.com,.kommo.com";

/// amoCRM integration settings.
///
/// The client id, secret and redirect URI identify the integration as
/// registered in the amoCRM account and must match it exactly.
#[derive(Debug, Clone)]
pub struct CrmConfig {
    /// Integration id.
    pub client_id: String,
    /// Integration secret.
    pub client_secret: String,
    /// Redirect URI registered for the integration.
    pub redirect_uri: String,
    /// Domain used for the authorize page and as the account domain when
    /// the callback carries no `referer` (default: `www.amocrm.ru`).
    pub auth_domain: String,
    /// URL scheme for every amoCRM request (default: `https`).
    pub scheme: String,
    /// Path of the JSON token file.
    pub token_file: PathBuf,
    /// Refresh an expired stored token before using it (default: `false`).
    pub eager_refresh: bool,
    /// How long an issued `state` stays acceptable, in seconds.
    pub state_ttl_secs: u64,
    /// Account domains a callback `referer` may name. Entries starting with
    /// `.` match by suffix, others must match exactly (`host` or `host:port`).
    pub allowed_domains: Vec<String>,
}

impl CrmConfig {
    /// Load amoCRM configuration from environment variables.
    ///
    /// | Env Var                  | Required | Default                             |
    /// |--------------------------|----------|-------------------------------------|
    /// | `AMOCRM_CLIENT_ID`       | **yes**  | --                                  |
    /// | `AMOCRM_CLIENT_SECRET`   | **yes**  | --                                  |
    /// | `AMOCRM_REDIRECT_URI`    | **yes**  | --                                  |
    /// | `AMOCRM_AUTH_DOMAIN`     | no       | `www.amocrm.ru`                     |
    /// | `AMOCRM_SCHEME`          | no       | `https`                             |
    /// | `AMOCRM_TOKEN_FILE`      | no       | `/tmp/token_info.json`              |
    /// | `AMOCRM_EAGER_REFRESH`   | no       | `false`                             |
    /// | `OAUTH_STATE_TTL_SECS`   | no       | `600`                               |
    /// | `AMOCRM_ALLOWED_DOMAINS` | no       | `.amocrm.ru,.amocrm.com,.kommo.com` |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or empty, or if an
    /// optional one does not parse.
    pub fn from_env() -> Self {
        let client_id = required_var("AMOCRM_CLIENT_ID");
        let client_secret = required_var("AMOCRM_CLIENT_SECRET");
        let redirect_uri = required_var("AMOCRM_REDIRECT_URI");

        let auth_domain =
            std::env::var("AMOCRM_AUTH_DOMAIN").unwrap_or_else(|_| DEFAULT_AUTH_DOMAIN.into());
        let scheme = std::env::var("AMOCRM_SCHEME").unwrap_or_else(|_| "https".into());
        let token_file = std::env::var("AMOCRM_TOKEN_FILE")
            .unwrap_or_else(|_| DEFAULT_TOKEN_FILE.into())
            .into();

        let eager_refresh: bool = std::env::var("AMOCRM_EAGER_REFRESH")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("AMOCRM_EAGER_REFRESH must be `true` or `false`");

        let state_ttl_secs: u64 = std::env::var("OAUTH_STATE_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_STATE_TTL_SECS.to_string())
            .parse()
            .expect("OAUTH_STATE_TTL_SECS must be a valid u64");

        let allowed_domains = parse_domain_list(
            &std::env::var("AMOCRM_ALLOWED_DOMAINS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_DOMAINS.into()),
        );

        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_domain,
            scheme,
            token_file,
            eager_refresh,
            state_ttl_secs,
            allowed_domains,
        }
    }

    /// Build an absolute URL for `path` on the given amoCRM domain.
    pub fn url(&self, domain: &str, path: &str) -> String {
        format!("{}://{}{}", self.scheme, domain, path)
    }

    /// Whether `domain` may be used as an account base domain. It must be a
    /// bare `host` or `host:port` and match one of [`Self::allowed_domains`].
    pub fn is_allowed_domain(&self, domain: &str) -> bool {
        let domain = domain.to_ascii_lowercase();
        if !is_bare_host(&domain) {
            return false;
        }
        self.allowed_domains.iter().any(|allowed| {
            let allowed = allowed.to_ascii_lowercase();
            if allowed.starts_with('.') {
                domain.len() > allowed.len() && domain.ends_with(&allowed)
            } else {
                domain == allowed
            }
        })
    }
}

fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `host` or `host:port` with no userinfo, path, query or fragment.
fn is_bare_host(domain: &str) -> bool {
    let (host, port) = match domain.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (domain, None),
    };
    let host_ok = !host.is_empty()
        && !host.starts_with('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let port_ok = match port {
        Some(port) => !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()),
        None => true,
    };
    host_ok && port_ok
}

fn required_var(name: &str) -> String {
    let value = std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set in the environment"));
    assert!(!value.is_empty(), "{name} must not be empty");
    value
}
