use crate::error::ProfileError;
use url::Url;

/// TLDs after which the second-level label is taken as the company name
const COMMON_TLDS: [&str; 16] = [
    "com", "co", "org", "net", "gov", "edu", "io", "ai", "tech", "app", "uk", "ca", "de", "fr",
    "jp", "au",
];

/// Host labels that never name a company
const SERVICE_LABELS: [&str; 3] = ["www", "ftp", "mail"];

/// The organization a run is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prospect {
    pub company_name: String,
    /// Lowercased host, given or guessed
    pub domain: Option<String>,
    /// Whether `domain` was guessed from the company name
    pub domain_guessed: bool,
}

impl Prospect {
    /// `https://<domain>`, when a domain is known
    pub fn website(&self) -> Option<String> {
        self.domain.as_ref().map(|domain| format!("https://{}", domain))
    }
}

fn looks_like_domain(identifier: &str) -> bool {
    identifier.contains('.')
        && !identifier.contains(' ')
        && identifier.chars().count() > 3
        && !identifier.ends_with('.')
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Company name derived from a host such as `www.acme.co`
pub fn company_from_domain(domain: &str) -> String {
    let labels: Vec<&str> = domain.split('.').filter(|label| !label.is_empty()).collect();
    let Some(last) = labels.last() else {
        return capitalize(domain);
    };

    let mut candidate = if labels.len() > 1 && COMMON_TLDS.contains(last) {
        labels[labels.len() - 2]
    } else {
        labels[0]
    };
    if SERVICE_LABELS.contains(&candidate) {
        if let Some(label) = labels.iter().find(|label| !SERVICE_LABELS.contains(*label)) {
            candidate = *label;
        }
    }
    capitalize(candidate)
}

/// `.com` domain guessed from a company name
pub fn guess_domain(company_name: &str) -> Option<String> {
    let stem: String = company_name
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | ',' | '.'))
        .collect();
    if stem.is_empty() {
        None
    } else {
        Some(format!("{}.com", stem))
    }
}

/// Turn a user-supplied domain or company name into a [`Prospect`]
pub fn identify(identifier: &str) -> Result<Prospect, ProfileError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(ProfileError::EmptyIdentifier);
    }

    if looks_like_domain(identifier) {
        let with_scheme = if identifier.starts_with("http://") || identifier.starts_with("https://") {
            identifier.to_string()
        } else {
            format!("http://{}", identifier)
        };
        let domain = Url::parse(&with_scheme)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .unwrap_or_else(|| identifier.to_lowercase());
        let company_name = company_from_domain(&domain);
        ::log::info!(
            "Input identified as domain: {}, derived company name: {}",
            domain,
            company_name
        );
        return Ok(Prospect {
            company_name,
            domain: Some(domain),
            domain_guessed: false,
        });
    }

    let domain = guess_domain(identifier);
    match &domain {
        Some(domain) => ::log::info!("Guessed domain {} for {}", domain, identifier),
        None => ::log::warn!("Could not guess a domain for {}", identifier),
    }
    Ok(Prospect {
        company_name: identifier.to_string(),
        domain,
        domain_guessed: true,
    })
}

/// Convert an identifier to a filename stem
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' | '.'))
        .map(|c| if c == ' ' { '_' } else { c })
        .take(100)
        .collect()
}
