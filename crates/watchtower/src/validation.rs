use url::Url;

use crate::model::KEY_PREFIX;

/// Check that `target` can be monitored, returning the reason when it cannot.
///
/// Targets must be absolute http(s) URLs with a host. They must not start
/// with the store key prefix, which would make their key collide with the
/// listing scan.
pub fn validate_target_url(target: &str) -> Result<(), String> {
    if target.trim().is_empty() {
        return Err("URL is required".into());
    }

    if target.starts_with(KEY_PREFIX) {
        return Err(format!("URL must not start with the reserved prefix '{KEY_PREFIX}'"));
    }

    match Url::parse(target) {
        Ok(url) => {
            let scheme = url.scheme();
            if scheme != "http" && scheme != "https" {
                return Err(format!("Invalid scheme '{scheme}'. Must be http or https"));
            }

            if url.host_str().is_none_or(str::is_empty) {
                return Err("URL must have a valid host".into());
            }

            Ok(())
        }
        Err(e) => {
            if !target.contains("://") {
                Err("URL must include scheme (http:// or https://)".into())
            } else {
                Err(format!("Invalid URL: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_target_url("https://example.com").is_ok());
        assert!(validate_target_url("http://example.com:8080/health?deep=1").is_ok());
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(validate_target_url("  ").unwrap_err(), "URL is required");
    }

    #[test]
    fn test_rejects_reserved_prefix() {
        assert!(validate_target_url("websites_https://example.com").unwrap_err().contains("reserved prefix"));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(validate_target_url("ftp://example.com").unwrap_err().contains("Invalid scheme"));
    }

    #[test]
    fn test_rejects_missing_scheme() {
        assert!(validate_target_url("example.com").unwrap_err().contains("must include scheme"));
    }
}
