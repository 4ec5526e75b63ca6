//! Tech stack logos and interview cover images
//!
//! Tech names typed by users ("Next.js", "Tailwind CSS", "Postgres") are
//! normalized to devicon slugs and resolved to logo URLs. Any logo that can't
//! be confirmed with a HEAD request falls back to [`FALLBACK_LOGO`].

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Devicon CDN root
pub const TECH_ICON_BASE_URL: &str = "https://cdn.jsdelivr.net/gh/devicons/devicon/icons";

/// Logo used when a tech has no known or reachable icon
pub const FALLBACK_LOGO: &str = "/tech.svg";

/// Cover image files served under `/covers`
pub const INTERVIEW_COVERS: &[&str] = &[
    "/adobe.png",
    "/amazon.png",
    "/facebook.png",
    "/hostinger.png",
    "/pinterest.png",
    "/quora.png",
    "/reddit.png",
    "/skype.png",
    "/spotify.png",
    "/telegram.png",
    "/tiktok.png",
    "/yahoo.png",
];

static JS_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.js$").expect("Valid .js suffix regex"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Valid whitespace regex"));

static SLUGS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("react", "react"),
        ("reactjs", "react"),
        ("next", "nextjs"),
        ("nextjs", "nextjs"),
        ("vue", "vuejs"),
        ("vuejs", "vuejs"),
        ("nuxt", "nuxtjs"),
        ("angular", "angularjs"),
        ("angularjs", "angularjs"),
        ("svelte", "svelte"),
        ("express", "express"),
        ("node", "nodejs"),
        ("nodejs", "nodejs"),
        ("typescript", "typescript"),
        ("ts", "typescript"),
        ("javascript", "javascript"),
        ("js", "javascript"),
        ("html", "html5"),
        ("html5", "html5"),
        ("css", "css3"),
        ("css3", "css3"),
        ("sass", "sass"),
        ("scss", "sass"),
        ("tailwind", "tailwindcss"),
        ("tailwindcss", "tailwindcss"),
        ("bootstrap", "bootstrap"),
        ("redux", "redux"),
        ("graphql", "graphql"),
        ("python", "python"),
        ("django", "django"),
        ("flask", "flask"),
        ("java", "java"),
        ("spring", "spring"),
        ("kotlin", "kotlin"),
        ("swift", "swift"),
        ("go", "go"),
        ("golang", "go"),
        ("rust", "rust"),
        ("c++", "cplusplus"),
        ("cpp", "cplusplus"),
        ("c#", "csharp"),
        ("csharp", "csharp"),
        ("php", "php"),
        ("laravel", "laravel"),
        ("ruby", "ruby"),
        ("rails", "rails"),
        ("mongodb", "mongodb"),
        ("mongo", "mongodb"),
        ("mysql", "mysql"),
        ("postgresql", "postgresql"),
        ("postgres", "postgresql"),
        ("sqlite", "sqlite"),
        ("redis", "redis"),
        ("firebase", "firebase"),
        ("docker", "docker"),
        ("kubernetes", "kubernetes"),
        ("k8s", "kubernetes"),
        ("aws", "amazonwebservices"),
        ("amazonwebservices", "amazonwebservices"),
        ("azure", "azure"),
        ("gcp", "googlecloud"),
        ("googlecloud", "googlecloud"),
        ("git", "git"),
        ("github", "github"),
        ("gitlab", "gitlab"),
        ("figma", "figma"),
        ("jest", "jest"),
        ("webpack", "webpack"),
        ("vite", "vitejs"),
        ("flutter", "flutter"),
        ("dart", "dart"),
        ("linux", "linux"),
    ]
    .into_iter()
    .collect()
});

/// Map a free-form tech name to its devicon slug
///
/// Lowercases, drops a trailing `.js` and removes whitespace before looking
/// the key up. Unknown names return `None`.
pub fn normalize_tech_name(tech: &str) -> Option<&'static str> {
    let lower = tech.to_lowercase();
    let key = JS_SUFFIX.replace(&lower, "");
    let key = WHITESPACE.replace_all(&key, "");
    SLUGS.get(&*key).copied()
}

/// Candidate logo URL for a devicon slug under `base_url`
pub fn logo_url(base_url: &str, slug: &str) -> String {
    format!("{}/{}/{}-original.svg", base_url, slug, slug)
}

/// Resolved logo for one tech entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechLogo {
    pub tech: String,
    pub url: String,
}

/// Resolves tech names to reachable logo URLs
#[derive(Clone)]
pub struct TechLogoResolver {
    client: Client,
    base_url: String,
}

impl TechLogoResolver {
    pub fn new() -> Self {
        Self::with_base_url(TECH_ICON_BASE_URL)
    }

    /// Point probes at a different icon host
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Resolve every name concurrently, preserving input order
    pub async fn resolve(&self, tech_stack: &[String]) -> Vec<TechLogo> {
        let mut probes = JoinSet::new();

        for (index, tech) in tech_stack.iter().enumerate() {
            let Some(slug) = normalize_tech_name(tech) else {
                debug!("No icon mapping for {:?}", tech);
                continue;
            };
            let url = logo_url(&self.base_url, slug);
            let client = self.client.clone();
            probes.spawn(async move {
                let found = icon_exists(&client, &url).await;
                (index, found.then_some(url))
            });
        }

        let mut urls: Vec<Option<String>> = vec![None; tech_stack.len()];
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((index, url)) => urls[index] = url,
                Err(e) => warn!("Icon probe task failed: {}", e),
            }
        }

        tech_stack
            .iter()
            .zip(urls)
            .map(|(tech, url)| TechLogo {
                tech: tech.clone(),
                url: url.unwrap_or_else(|| FALLBACK_LOGO.to_string()),
            })
            .collect()
    }
}

impl Default for TechLogoResolver {
    fn default() -> Self {
        Self::new()
    }
}

async fn icon_exists(client: &Client, url: &str) -> bool {
    match client.head(url).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            debug!("HEAD {} failed: {}", url, e);
            false
        }
    }
}

/// Pick a random cover image path, e.g. `/covers/spotify.png`
pub fn random_interview_cover() -> String {
    let file = INTERVIEW_COVERS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(INTERVIEW_COVERS[0]);
    format!("/covers{}", file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tech_name() {
        assert_eq!(normalize_tech_name("Next.js"), Some("nextjs"));
        assert_eq!(normalize_tech_name("React"), Some("react"));
        assert_eq!(normalize_tech_name("Tailwind CSS"), Some("tailwindcss"));
        assert_eq!(normalize_tech_name("  Node.js"), Some("nodejs"));
        assert_eq!(normalize_tech_name("Postgres"), Some("postgresql"));
        assert_eq!(normalize_tech_name("COBOL on Cogs"), None);
    }

    #[test]
    fn test_js_suffix_only_stripped_at_end() {
        // "vue.js" -> "vue", but ".jsx" stays
        assert_eq!(normalize_tech_name("Vue.js"), Some("vuejs"));
        assert_eq!(normalize_tech_name("react.jsx"), None);
    }

    #[test]
    fn test_logo_url() {
        assert_eq!(
            logo_url(TECH_ICON_BASE_URL, "react"),
            "https://cdn.jsdelivr.net/gh/devicons/devicon/icons/react/react-original.svg"
        );
        assert_eq!(
            logo_url("http://localhost:8080/icons", "go"),
            "http://localhost:8080/icons/go/go-original.svg"
        );
    }

    #[test]
    fn test_random_cover_is_known() {
        for _ in 0..20 {
            let cover = random_interview_cover();
            let file = cover.strip_prefix("/covers").unwrap();
            assert!(INTERVIEW_COVERS.contains(&file));
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_falls_back() {
        // Port 9 (discard) on localhost refuses connections
        let resolver = TechLogoResolver::with_base_url("http://127.0.0.1:9/icons");
        let stack = vec!["React".to_string(), "Nonexistent Tech".to_string()];
        let logos = resolver.resolve(&stack).await;

        assert_eq!(logos.len(), 2);
        assert_eq!(logos[0].tech, "React");
        assert_eq!(logos[0].url, FALLBACK_LOGO);
        assert_eq!(logos[1].url, FALLBACK_LOGO);
    }

    #[tokio::test]
    async fn test_empty_stack() {
        let logos = TechLogoResolver::new().resolve(&[]).await;
        assert!(logos.is_empty());
    }
}
