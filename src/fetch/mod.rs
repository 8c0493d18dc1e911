mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use anyhow::Result;

use crate::error::SourceError;

pub async fn fetch_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse()?,
    );

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: redact_query(url),
        }
        .into());
    }
    Ok(resp.bytes().await?.to_vec())
}

// Query strings may carry API keys.
fn redact_query(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{base}?…"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_query_hides_parameters() {
        assert_eq!(
            redact_query("https://api.example.com/v1/units?key=secret"),
            "https://api.example.com/v1/units?…"
        );
        assert_eq!(
            redact_query("https://api.example.com/v1/units"),
            "https://api.example.com/v1/units"
        );
    }
}
