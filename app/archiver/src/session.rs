use framework::exception;
use framework::exception::CoreRsResult;
use framework::exception::Severity;
use framework::log;
use url::Url;
use url::form_urlencoded;

use crate::box_api::BoxApi;
use crate::box_api::BoxSession;
use crate::request::Params;

pub const STATE_OK: &str = "ok";
pub const REDIRECT_CONSTRUCTION_FAILED: &str = "REDIRECT_CONSTRUCTION_FAILED";

/// Code and state passed back by the provider consent redirect.
#[derive(Debug, Default)]
pub struct AuthorizationEvidence {
    pub authorization_code: Option<String>,
    pub state_token: Option<String>,
}

impl AuthorizationEvidence {
    pub fn new(params: &Params) -> Self {
        AuthorizationEvidence {
            authorization_code: params.get("code").map(str::to_owned),
            state_token: params.get("state").map(str::to_owned),
        }
    }

    fn accepted_code(&self) -> Option<&str> {
        if self.state_token.as_deref() != Some(STATE_OK) {
            return None;
        }
        self.authorization_code.as_deref().filter(|code| !code.is_empty())
    }
}

/// Returns a session for this request only, or none if the caller has to go through login again.
pub async fn try_establish_session<'a>(
    api: &'a BoxApi,
    evidence: &AuthorizationEvidence,
    client_id: &str,
    client_secret: &str,
) -> Option<BoxSession<'a>> {
    let code = evidence.accepted_code()?;
    match api.exchange_code(client_id, client_secret, code).await {
        Ok(session) => Some(session),
        Err(e) => {
            log::log_exception(&exception!(
                severity = Severity::Warn,
                message = "failed to establish session, redirect to login",
                source = e
            ));
            None
        }
    }
}

/// Builds the consent page url, the provider calls back `request_url` with the original query minus code and state.
pub fn build_login_redirect(
    request_url: &str,
    query_string: Option<&str>,
    client_id: &str,
    authorize_uri: &str,
) -> CoreRsResult<Url> {
    let mut redirect_uri = request_url.to_owned();
    let query = query_string.map(strip_authorization).unwrap_or_default();
    if !query.is_empty() {
        redirect_uri.push('?');
        redirect_uri.push_str(&query);
    }
    let redirect_uri = Url::parse(&redirect_uri).map_err(|err| {
        exception!(
            code = REDIRECT_CONSTRUCTION_FAILED,
            message = format!("invalid redirect uri, uri={redirect_uri}"),
            source = err
        )
    })?;

    Url::parse_with_params(
        authorize_uri,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri.as_str()),
            ("state", STATE_OK),
        ],
    )
    .map_err(|err| {
        exception!(
            code = REDIRECT_CONSTRUCTION_FAILED,
            message = format!("invalid authorize uri, uri={authorize_uri}"),
            source = err
        )
    })
}

// consumed oauth artifacts must not be replayed on the next callback
fn strip_authorization(query: &str) -> String {
    query
        .trim()
        .split('&')
        .filter(|pair| {
            let name = form_urlencoded::parse(pair.as_bytes()).next().map(|(name, _)| name);
            !matches!(name.as_deref(), None | Some("code" | "state"))
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use framework::http::HttpClient;
    use url::Url;

    use super::AuthorizationEvidence;
    use super::REDIRECT_CONSTRUCTION_FAILED;
    use crate::box_api::BoxApi;
    use crate::box_api::BoxEndpoints;
    use crate::request::Params;

    const AUTHORIZE_URI: &str = "https://account.box.com/api/oauth2/authorize";

    fn query_param(url: &Url, name: &str) -> Option<String> {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    fn unreachable_api() -> BoxApi {
        let endpoints = BoxEndpoints {
            api_uri: "http://127.0.0.1:9".to_owned(),
            ..BoxEndpoints::default()
        };
        BoxApi::new(endpoints, HttpClient::new(Duration::from_secs(5)).unwrap())
    }

    #[test]
    fn strip_authorization() {
        assert_eq!(super::strip_authorization("code=abc&state=ok&foo=bar"), "foo=bar");
        assert_eq!(super::strip_authorization(" foo=1&code=&bar=2 "), "foo=1&bar=2");
        assert_eq!(super::strip_authorization("zipcode=1&state"), "zipcode=1");
        assert_eq!(super::strip_authorization("code=abc"), "");
        assert_eq!(super::strip_authorization("c%6Fde=abc&st%61te=ok&foo=bar"), "foo=bar");
        assert_eq!(super::strip_authorization("foo=%63ode"), "foo=%63ode");
    }

    #[test]
    fn build_login_redirect() {
        let url = super::build_login_redirect(
            "http://localhost:8080/archive",
            Some("code=abc&state=ok&foo=bar"),
            "client-id",
            AUTHORIZE_URI,
        )
        .unwrap();

        assert_eq!(url.host_str(), Some("account.box.com"));
        assert_eq!(url.path(), "/api/oauth2/authorize");
        assert_eq!(query_param(&url, "client_id").as_deref(), Some("client-id"));
        assert_eq!(query_param(&url, "response_type").as_deref(), Some("code"));
        assert_eq!(query_param(&url, "state").as_deref(), Some("ok"));
        assert_eq!(
            query_param(&url, "redirect_uri").as_deref(),
            Some("http://localhost:8080/archive?foo=bar")
        );
    }

    #[test]
    fn build_login_redirect_without_query() {
        for query in [None, Some(""), Some("   "), Some("state=expired")] {
            let url =
                super::build_login_redirect("http://localhost:8080/archive", query, "client-id", AUTHORIZE_URI).unwrap();
            assert_eq!(
                query_param(&url, "redirect_uri").as_deref(),
                Some("http://localhost:8080/archive")
            );
        }
    }

    #[test]
    fn build_login_redirect_is_idempotent() {
        let first = super::build_login_redirect(
            "http://localhost:8080/archive",
            Some("minagedays=5&preserve=true"),
            "client-id",
            AUTHORIZE_URI,
        )
        .unwrap();
        let second = super::build_login_redirect(
            "http://localhost:8080/archive",
            Some("minagedays=5&preserve=true"),
            "client-id",
            AUTHORIZE_URI,
        )
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn build_login_redirect_with_invalid_uri() {
        let result = super::build_login_redirect("/archive", Some("foo=bar"), "client-id", AUTHORIZE_URI);
        let error = result.err().unwrap();
        assert_eq!(error.code.as_deref(), Some(REDIRECT_CONSTRUCTION_FAILED));
    }

    #[test]
    fn accepted_code() {
        let evidence = AuthorizationEvidence::new(&Params::parse(Some("code=abc&state=ok"), None));
        assert_eq!(evidence.accepted_code(), Some("abc"));

        let evidence = AuthorizationEvidence::new(&Params::parse(Some("code=abc&state=OK"), None));
        assert_eq!(evidence.accepted_code(), None);

        let evidence = AuthorizationEvidence::new(&Params::parse(Some("code=&state=ok"), None));
        assert_eq!(evidence.accepted_code(), None);

        let evidence = AuthorizationEvidence::new(&Params::parse(Some("code=abc"), None));
        assert_eq!(evidence.accepted_code(), None);
    }

    #[tokio::test]
    async fn try_establish_session_without_evidence() {
        let api = unreachable_api();
        let evidence = AuthorizationEvidence::default();
        let session = super::try_establish_session(&api, &evidence, "client-id", "secret").await;
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn try_establish_session_with_failed_exchange() {
        let api = unreachable_api();
        let evidence = AuthorizationEvidence::new(&Params::parse(Some("code=abc&state=ok"), None));
        let session = super::try_establish_session(&api, &evidence, "client-id", "secret").await;
        assert!(session.is_none());
    }
}
