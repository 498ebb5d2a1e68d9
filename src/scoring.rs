//! Keyword-based relevance ranking of links discovered on a homepage.
//!
//! Every candidate is tested against an ordered keyword taxonomy. The first
//! keyword that matches decides the candidate's [`PriorityScore`]; lower ranks
//! are crawled first and candidates matching nothing are never queued.

use crate::filter::{NormalizedUrl, resolve_href};
use crate::parsers::html::Anchor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Built-in taxonomy, highest priority first
const DEFAULT_TAXONOMY: &[(&str, &[&str])] = &[
    (
        "about",
        &[
            "about", "about-us", "company", "who-we-are", "our-story", "mission", "vision",
            "values", "history", "overview",
        ],
    ),
    (
        "team",
        &[
            "team", "our-team", "leadership", "management", "our-management", "executives",
            "board", "directors", "people", "our-people", "staff", "personnel",
            "staff-directory", "faculty", "meet-the-team", "members", "consultants",
        ],
    ),
    (
        "contact",
        &[
            "contact", "contact-us", "contact-information", "locations", "offices",
            "get-in-touch",
        ],
    ),
    (
        "products",
        &[
            "products", "services", "solutions", "platform", "offerings", "expertise",
            "what-we-do",
        ],
    ),
    (
        "news",
        &[
            "news", "press", "media", "updates", "blog", "articles", "insights", "resources",
            "publications", "newsletter",
        ],
    ),
    ("careers", &["careers", "jobs", "join-us", "hiring"]),
    ("investors", &["investor-relations", "investors"]),
    (
        "customers",
        &[
            "clients", "customers", "partners", "portfolio", "case-studies", "testimonials",
            "reviews", "client-stories", "work", "projects", "brands",
        ],
    ),
    ("support", &["support", "faq", "help", "governance"]),
];

/// How a keyword match is turned into a rank
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Rank is the index of the matching keyword in the flattened taxonomy
    #[default]
    BestKeyword,
    /// Rank is the index of the matching keyword's category; keywords of one
    /// category tie and keep discovery order
    CategoryTier,
}

/// Which test matched a keyword, in the order the tests are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchRule {
    PathExact,
    PathSegment,
    PathSubstring,
    AnchorText,
    TitleAttribute,
}

/// Crawl priority of a candidate, lower is better
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriorityScore {
    pub rank: usize,
    pub keyword_index: usize,
    pub rule: MatchRule,
}

/// One category of the keyword taxonomy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordCategory {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Ordered keyword taxonomy: earlier categories and earlier keywords rank higher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordTaxonomy {
    pub categories: Vec<KeywordCategory>,
}

impl Default for KeywordTaxonomy {
    fn default() -> Self {
        Self {
            categories: DEFAULT_TAXONOMY
                .iter()
                .map(|(name, keywords)| KeywordCategory {
                    name: name.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        }
    }
}

/// A discovered hyperlink, derived once per anchor
#[derive(Debug, Clone)]
pub struct LinkCandidate {
    pub raw_href: String,
    pub url: Url,
    pub normalized_url: NormalizedUrl,
    pub anchor_text: String,
    pub title_attr: String,
    pub path: String,
    pub path_segments: Vec<String>,
}

impl LinkCandidate {
    /// Build a candidate from an anchor found on the page at `base`.
    ///
    /// Returns `None` when the href cannot be resolved to an http(s) URL.
    pub fn from_anchor(anchor: &Anchor, base: &Url) -> Option<Self> {
        let url = resolve_href(&anchor.href, base)?;
        let normalized_url = NormalizedUrl::from_url(&url)?;
        let path = url.path().to_lowercase();
        let path_segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        Some(Self {
            raw_href: anchor.href.clone(),
            normalized_url,
            anchor_text: anchor.text.trim().to_lowercase(),
            title_attr: anchor
                .title
                .as_deref()
                .map(|t| t.trim().to_lowercase())
                .unwrap_or_default(),
            path,
            path_segments,
            url,
        })
    }

    /// First rule under which `keyword` matches this candidate
    fn match_rule(&self, keyword: &str) -> Option<MatchRule> {
        if self.path.trim_matches('/') == keyword {
            return Some(MatchRule::PathExact);
        }
        if self.path_segments.iter().any(|segment| segment == keyword) {
            return Some(MatchRule::PathSegment);
        }
        let bounded = [
            format!("/{}", keyword),
            format!("{}/", keyword),
            format!("-{}", keyword),
            format!("{}-", keyword),
        ];
        if bounded.iter().any(|needle| self.path.contains(needle.as_str())) {
            return Some(MatchRule::PathSubstring);
        }
        if !self.anchor_text.is_empty() && self.anchor_text.contains(keyword) {
            return Some(MatchRule::AnchorText);
        }
        if !self.title_attr.is_empty() && self.title_attr.contains(keyword) {
            return Some(MatchRule::TitleAttribute);
        }
        None
    }
}

/// A deduplicated candidate with its resolved priority
#[derive(Debug, Clone)]
pub struct RankedLink {
    pub url: Url,
    pub normalized_url: NormalizedUrl,
    pub score: PriorityScore,
}

/// Scores candidates against a keyword taxonomy
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    keywords: Vec<(String, usize)>,
    policy: ScoringPolicy,
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::new(&KeywordTaxonomy::default(), ScoringPolicy::default())
    }
}

impl RelevanceScorer {
    pub fn new(taxonomy: &KeywordTaxonomy, policy: ScoringPolicy) -> Self {
        let keywords = taxonomy
            .categories
            .iter()
            .enumerate()
            .flat_map(|(tier, category)| {
                category
                    .keywords
                    .iter()
                    .map(move |keyword| (keyword.to_lowercase(), tier))
            })
            .collect();

        Self { keywords, policy }
    }

    /// Score of a single candidate, `None` when no keyword matches
    pub fn score(&self, candidate: &LinkCandidate) -> Option<PriorityScore> {
        // keywords are ordered, so the first hit is also the minimum under both policies
        self.keywords
            .iter()
            .enumerate()
            .find_map(|(index, (keyword, tier))| {
                candidate.match_rule(keyword).map(|rule| PriorityScore {
                    rank: match self.policy {
                        ScoringPolicy::BestKeyword => index,
                        ScoringPolicy::CategoryTier => *tier,
                    },
                    keyword_index: index,
                    rule,
                })
            })
    }

    /// Score, deduplicate and order candidates for traversal.
    ///
    /// Candidates collapsing to the same normalized URL keep the best score and
    /// the first-seen URL. Equal scores keep discovery order.
    pub fn rank(&self, candidates: &[LinkCandidate]) -> Vec<RankedLink> {
        let mut ranked: Vec<RankedLink> = Vec::new();
        let mut positions: HashMap<NormalizedUrl, usize> = HashMap::new();

        for candidate in candidates {
            let Some(score) = self.score(candidate) else {
                ::log::trace!("No keyword matched {}", candidate.url);
                continue;
            };

            match positions.get(&candidate.normalized_url) {
                Some(&pos) => {
                    let existing = &mut ranked[pos];
                    if score < existing.score {
                        ::log::debug!(
                            "Updating priority for {} from {} to {}",
                            existing.normalized_url,
                            existing.score.rank,
                            score.rank
                        );
                        existing.score = score;
                    }
                }
                None => {
                    ::log::debug!(
                        "Adding candidate {} with priority {} ({:?})",
                        candidate.normalized_url,
                        score.rank,
                        score.rule
                    );
                    positions.insert(candidate.normalized_url.clone(), ranked.len());
                    ranked.push(RankedLink {
                        url: candidate.url.clone(),
                        normalized_url: candidate.normalized_url.clone(),
                        score,
                    });
                }
            }
        }

        ranked.sort_by_key(|link| link.score.rank);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    fn candidate(href: &str, text: &str, title: Option<&str>) -> LinkCandidate {
        let anchor = Anchor {
            href: href.to_string(),
            text: text.to_string(),
            title: title.map(str::to_string),
        };
        LinkCandidate::from_anchor(&anchor, &base()).unwrap()
    }

    fn keyword_index(keyword: &str) -> usize {
        KeywordTaxonomy::default()
            .categories
            .iter()
            .flat_map(|c| c.keywords.iter())
            .position(|k| k == keyword)
            .unwrap()
    }

    #[test]
    fn test_rules_in_precedence_order() {
        let scorer = RelevanceScorer::default();

        let exact = scorer.score(&candidate("/careers/", "", None)).unwrap();
        assert_eq!(exact.rule, MatchRule::PathExact);
        assert_eq!(exact.rank, keyword_index("careers"));

        let segment = scorer.score(&candidate("/en/careers/open", "", None)).unwrap();
        assert_eq!(segment.rule, MatchRule::PathSegment);

        let substring = scorer.score(&candidate("/global-careers", "", None)).unwrap();
        assert_eq!(substring.rule, MatchRule::PathSubstring);

        let text = scorer.score(&candidate("/x1", "Open Careers", None)).unwrap();
        assert_eq!(text.rule, MatchRule::AnchorText);

        let title = scorer.score(&candidate("/x2", "", Some("Careers at ACME"))).unwrap();
        assert_eq!(title.rule, MatchRule::TitleAttribute);
    }

    #[test]
    fn test_exact_path_never_scores_worse_than_substring() {
        let scorer = RelevanceScorer::default();
        for keyword in ["team", "contact", "products", "news", "careers", "faq"] {
            let exact = scorer.score(&candidate(&format!("/{}", keyword), "", None)).unwrap();
            let substring = scorer
                .score(&candidate(&format!("/zz-{}x", keyword), "", None))
                .unwrap();
            assert!(exact.rank <= substring.rank, "{}", keyword);
        }
    }

    #[test]
    fn test_earliest_keyword_wins() {
        let scorer = RelevanceScorer::default();
        // "about" appears in the anchor text, "careers" in the path
        let score = scorer
            .score(&candidate("/careers", "About our careers", None))
            .unwrap();
        assert_eq!(score.rank, 0);
        assert_eq!(score.rule, MatchRule::AnchorText);
    }

    #[test]
    fn test_unmatched_candidate_is_excluded() {
        let scorer = RelevanceScorer::default();
        assert!(scorer.score(&candidate("/random-page", "Random page", None)).is_none());
    }

    #[test]
    fn test_rank_dedups_and_keeps_best_score() {
        let scorer = RelevanceScorer::default();
        let candidates = vec![
            candidate("/products", "Products", None),
            candidate("/random-page", "Random", None),
            candidate("/contact/", "Reach out", None),
            candidate("https://www.example.com/contact#form", "Contact us", None),
            candidate("/about", "About", None),
        ];

        let ranked = scorer.rank(&candidates);
        let order: Vec<&str> = ranked.iter().map(|l| l.normalized_url.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "https://example.com/about",
                "https://example.com/contact",
                "https://example.com/products",
            ]
        );
        // first-seen URL is kept for navigation
        assert_eq!(ranked[1].url.as_str(), "https://example.com/contact/");
        assert_eq!(ranked[1].score.rank, keyword_index("contact"));
    }

    #[test]
    fn test_rank_lowers_score_for_better_duplicate() {
        let scorer = RelevanceScorer::default();
        let candidates = vec![
            candidate("/x9", "Support", None),
            candidate("/x9/", "History", None),
        ];
        let ranked = scorer.rank(&candidates);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score.rank, keyword_index("history"));
    }

    #[test]
    fn test_category_tier_policy_ties_within_category() {
        let scorer = RelevanceScorer::new(&KeywordTaxonomy::default(), ScoringPolicy::CategoryTier);
        let candidates = vec![
            candidate("/staff", "", None),
            candidate("/faq", "", None),
            candidate("/team", "", None),
        ];
        let ranked = scorer.rank(&candidates);

        assert_eq!(ranked[0].score.rank, 1);
        assert_eq!(ranked[1].score.rank, 1);
        assert_eq!(ranked[2].score.rank, 8);
        // same tier keeps discovery order
        assert_eq!(ranked[0].normalized_url.as_str(), "https://example.com/staff");
        assert_eq!(ranked[1].normalized_url.as_str(), "https://example.com/team");
    }

    #[test]
    fn test_custom_taxonomy() {
        let taxonomy = KeywordTaxonomy {
            categories: vec![KeywordCategory {
                name: "pricing".to_string(),
                keywords: vec!["Pricing".to_string()],
            }],
        };
        let scorer = RelevanceScorer::new(&taxonomy, ScoringPolicy::BestKeyword);
        assert_eq!(scorer.score(&candidate("/pricing", "", None)).unwrap().rank, 0);
        assert!(scorer.score(&candidate("/about", "", None)).is_none());
    }
}
