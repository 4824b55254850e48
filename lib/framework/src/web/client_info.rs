use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::http::header;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub client_ip: String,
    pub user_agent: Option<String>,
}

pub fn client_info(request: &Request, max_forwarded_ips: usize) -> ClientInfo {
    let remote_address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip().to_string());
    from_headers(request.headers(), remote_address, max_forwarded_ips)
}

fn from_headers(headers: &HeaderMap, remote_address: Option<String>, max_forwarded_ips: usize) -> ClientInfo {
    let forwarded_ip = headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| forwarded_client_ip(value, max_forwarded_ips));

    let client_ip = forwarded_ip
        .or(remote_address)
        .unwrap_or_else(|| "unknown".to_owned());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    ClientInfo { client_ip, user_agent }
}

// trust at most max_forwarded_ips proxies from the right, anything further left can be spoofed by client
fn forwarded_client_ip(value: &str, max_forwarded_ips: usize) -> Option<String> {
    let ips: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .collect();
    let index = ips.len().saturating_sub(max_forwarded_ips);
    ips.get(index).map(|ip| (*ip).to_owned())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderMap;
    use axum::http::HeaderValue;
    use axum::http::header;

    #[test]
    fn forwarded_client_ip() {
        assert_eq!(
            super::forwarded_client_ip("10.0.0.1, 10.0.0.2, 10.0.0.3", 2),
            Some("10.0.0.2".to_owned())
        );
        assert_eq!(super::forwarded_client_ip("10.0.0.1", 2), Some("10.0.0.1".to_owned()));
        assert_eq!(super::forwarded_client_ip(" , ", 2), None);
    }

    #[test]
    fn from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        let info = super::from_headers(&headers, Some("127.0.0.1".to_owned()), 2);
        assert_eq!(info.client_ip, "127.0.0.1");
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));

        headers.insert(super::X_FORWARDED_FOR, HeaderValue::from_static("192.168.1.9"));
        let info = super::from_headers(&headers, Some("127.0.0.1".to_owned()), 2);
        assert_eq!(info.client_ip, "192.168.1.9");
    }
}
