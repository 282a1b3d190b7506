//! Platform-matched browser identity strings.

/// Chrome versions to present as.
pub const CHROME_VERSIONS: &[&str] = &["119.0.0.0", "120.0.0.0", "121.0.0.0"];

/// Pick a Chrome version from [`CHROME_VERSIONS`].
pub fn random_chrome_version() -> &'static str {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as usize)
        .unwrap_or(0);
    CHROME_VERSIONS[nanos % CHROME_VERSIONS.len()]
}

/// Chrome user agent for the given OS and architecture.
///
/// `os` and `arch` use the names from [`std::env::consts`].
pub fn user_agent_for(os: &str, arch: &str, chrome_version: &str) -> String {
    let platform = match os {
        "linux" if arch == "x86_64" => "X11; Linux x86_64".to_string(),
        "linux" => format!("X11; Linux {}", arch),
        "macos" => "Macintosh; Intel Mac OS X 10_15_7".to_string(),
        "windows" => "Windows NT 10.0; Win64; x64".to_string(),
        _ => "X11; Linux x86_64".to_string(),
    };
    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
        platform, chrome_version
    )
}

/// User agent matching the host this process runs on.
pub fn platform_user_agent() -> String {
    user_agent_for(
        std::env::consts::OS,
        std::env::consts::ARCH,
        random_chrome_version(),
    )
}

/// Resolve the user agent from config: an explicit value wins.
pub fn resolve_user_agent(configured: Option<&str>) -> String {
    match configured {
        Some(ua) if !ua.trim().is_empty() => ua.to_string(),
        _ => platform_user_agent(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_variants() {
        let ua = user_agent_for("linux", "x86_64", "120.0.0.0");
        assert!(ua.contains("X11; Linux x86_64"));
        assert!(ua.contains("Chrome/120.0.0.0"));

        let arm = user_agent_for("linux", "aarch64", "119.0.0.0");
        assert!(arm.contains("X11; Linux aarch64"));
    }

    #[test]
    fn test_other_platforms() {
        assert!(user_agent_for("macos", "aarch64", "121.0.0.0").contains("Macintosh"));
        assert!(user_agent_for("windows", "x86_64", "121.0.0.0").contains("Windows NT 10.0"));
        assert!(user_agent_for("freebsd", "x86_64", "121.0.0.0").contains("X11; Linux x86_64"));
    }

    #[test]
    fn test_resolve_user_agent() {
        assert_eq!(resolve_user_agent(Some("MyBot/1.0")), "MyBot/1.0");
        let ua = resolve_user_agent(None);
        assert!(ua.starts_with("Mozilla/5.0"));
        assert!(CHROME_VERSIONS.iter().any(|v| ua.contains(v)));
    }
}
