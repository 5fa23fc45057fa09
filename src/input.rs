//! Account token and proxy list loading
//!
//! Thin file readers: newline-delimited values, blank lines and `#` comments
//! ignored. Malformed proxy lines are logged and skipped rather than failing
//! the whole startup.

use std::io;
use std::path::Path;

use tracing::warn;

use crate::proxy::{ProxyConfig, ProxyRecord};

fn meaningful_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Load account bearer tokens, one per line.
pub fn load_tokens(path: &Path) -> io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(meaningful_lines(&content).map(str::to_string).collect())
}

/// Load and translate proxy list entries, one per line.
///
/// See [`ProxyRecord::parse`] for accepted formats.
pub fn load_proxies(path: &Path) -> io::Result<Vec<ProxyConfig>> {
    let content = std::fs::read_to_string(path)?;
    let mut proxies = Vec::new();

    for line in meaningful_lines(&content) {
        let config = ProxyRecord::parse(line).and_then(|record| ProxyConfig::from_record(&record));
        match config {
            Ok(Some(proxy)) => proxies.push(proxy),
            Ok(None) => {}
            Err(e) => warn!(line, error = %e, "Skipping malformed proxy entry"),
        }
    }

    Ok(proxies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("nodepay-keeper-{}-{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_tokens_skip_comments_and_blanks() {
        let path = write_temp(
            "tokens.txt",
            "# main account\neyJhbGciOi.first\n\n  eyJhbGciOi.second  \n",
        );
        let tokens = load_tokens(&path).unwrap();
        assert_eq!(tokens, vec!["eyJhbGciOi.first", "eyJhbGciOi.second"]);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_proxies_parse_and_skip_malformed() {
        let path = write_temp(
            "proxies.txt",
            "10.0.0.1:3128\nnot a proxy line\nsocks5://u:p@10.0.0.2:1080\n",
        );
        let proxies = load_proxies(&path).unwrap();
        assert_eq!(proxies.len(), 2);
        assert_eq!(proxies[0].url(), "http://10.0.0.1:3128");
        assert_eq!(proxies[1].url(), "socks5://10.0.0.2:1080");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_tokens(Path::new("/nonexistent/tokens.txt")).is_err());
    }
}
