//! Fingerprint patches injected before any page script runs.
//! Based on puppeteer-extra-plugin-stealth techniques.

pub const STEALTH_SCRIPTS: &[&str] = &[
    // Hide webdriver flag
    r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => false,
        configurable: true
    });
    "#,
    // Fix languages
    r#"
    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en'],
        configurable: true
    });
    "#,
    // Fix plugins (make it look like regular Chrome)
    r#"
    Object.defineProperty(navigator, 'plugins', {
        get: () => [
            { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer', description: 'Portable Document Format' },
            { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai', description: '' },
            { name: 'Native Client', filename: 'internal-nacl-plugin', description: '' }
        ],
        configurable: true
    });
    "#,
    // Fix permissions
    r#"
    try {
        const originalQuery = window.navigator.permissions.query;
        window.navigator.permissions.query = (parameters) => (
            parameters.name === 'notifications' ?
            Promise.resolve({ state: Notification.permission }) :
            originalQuery(parameters)
        );
    } catch (e) {}
    "#,
    // Chrome runtime mimic
    r#"
    window.chrome = window.chrome || { runtime: {} };
    "#,
    // PhantomJS probe used by some bot checks
    r#"
    Object.defineProperty(window, 'callPhantom', {
        get: () => undefined,
        configurable: true
    });
    "#,
];

/// URL patterns aborted when a page profile blocks heavy resources.
///
/// Each extension is listed bare and with a query string. Webfont hosts
/// serve stylesheets and fonts without extensions, so they are blocked by
/// host.
pub const BLOCKED_RESOURCE_PATTERNS: &[&str] = &[
    "*.png", "*.png?*", "*.jpg", "*.jpg?*", "*.jpeg", "*.jpeg?*", "*.gif", "*.gif?*",
    "*.webp", "*.webp?*", "*.avif", "*.avif?*", "*.svg", "*.svg?*", "*.ico", "*.ico?*",
    "*.css", "*.css?*", "*.woff", "*.woff?*", "*.woff2", "*.woff2?*", "*.ttf", "*.ttf?*",
    "*.otf", "*.otf?*", "*.eot", "*.eot?*",
    "*://fonts.googleapis.com/*", "*://fonts.gstatic.com/*", "*://use.typekit.net/*",
];

/// Client-hint headers matching the default desktop Chrome user agent.
pub fn extra_headers() -> serde_json::Value {
    serde_json::json!({
        "accept-language": "en-US,en;q=0.9",
        "sec-ch-ua": "\"Chromium\";v=\"120\", \"Not=A?Brand\";v=\"24\"",
        "sec-ch-ua-platform": "\"Windows\"",
        "sec-ch-ua-mobile": "?0",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_advertise_desktop_chrome() {
        let headers = extra_headers();
        assert_eq!(headers["sec-ch-ua-mobile"], "?0");
        assert!(headers["sec-ch-ua"].as_str().unwrap().contains("Chromium"));
    }

    /// `Network.setBlockedURLs` wildcard semantics: `*` matches any run.
    fn glob_match(pattern: &str, url: &str) -> bool {
        let parts: Vec<&str> = pattern.split('*').collect();
        let mut rest = url;
        for (i, part) in parts.iter().enumerate() {
            if i == 0 {
                match rest.strip_prefix(part) {
                    Some(r) => rest = r,
                    None => return false,
                }
            } else if i == parts.len() - 1 {
                return part.is_empty() || rest.ends_with(part);
            } else {
                match rest.find(part) {
                    Some(at) => rest = &rest[at + part.len()..],
                    None => return false,
                }
            }
        }
        rest.is_empty()
    }

    fn blocked(url: &str) -> bool {
        BLOCKED_RESOURCE_PATTERNS.iter().any(|p| glob_match(p, url))
    }

    #[test]
    fn test_blocked_patterns_cover_images_styles_fonts() {
        for url in [
            "https://example.com/hero.png",
            "https://example.com/app.css",
            "https://example.com/static/app.css?v=3",
            "https://cdn.example.com/img/banner.webp?w=1200&q=80",
            "https://example.com/fonts/inter.woff2?display=swap",
            "https://fonts.googleapis.com/css2?family=Inter",
            "https://fonts.gstatic.com/s/inter/v12/abc",
        ] {
            assert!(blocked(url), "{} should be blocked", url);
        }
    }

    #[test]
    fn test_documents_and_scripts_still_load() {
        for url in [
            "https://example.com/",
            "https://example.com/pricing",
            "https://example.com/app.js",
            "https://example.com/app.js?v=3",
            "https://example.com/icons.json",
            "https://example.com/robots.txt",
        ] {
            assert!(!blocked(url), "{} should load", url);
        }
    }
}
