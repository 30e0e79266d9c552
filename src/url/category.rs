use crate::config::ContentType;
use crate::ConfigError;
use url::Url;

/// A topical grouping of the catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Code accepted on the command line and used as the URL slug
    pub code: &'static str,

    /// Human readable label
    pub label: &'static str,
}

/// Fixed table of supported category codes
pub const CATEGORIES: &[Category] = &[
    Category {
        code: "news",
        label: "News and media",
    },
    Category {
        code: "blogs",
        label: "Blogs",
    },
    Category {
        code: "tech",
        label: "Technology",
    },
    Category {
        code: "crypto",
        label: "Cryptocurrencies",
    },
    Category {
        code: "economics",
        label: "Economics",
    },
    Category {
        code: "business",
        label: "Business and startups",
    },
    Category {
        code: "marketing",
        label: "Marketing, PR, advertising",
    },
    Category {
        code: "education",
        label: "Education",
    },
    Category {
        code: "politics",
        label: "Politics",
    },
    Category {
        code: "entertainment",
        label: "Entertainment",
    },
    Category {
        code: "humor",
        label: "Humor",
    },
    Category {
        code: "music",
        label: "Music",
    },
    Category {
        code: "video",
        label: "Video and films",
    },
    Category {
        code: "games",
        label: "Games",
    },
    Category {
        code: "sport",
        label: "Sport",
    },
    Category {
        code: "travel",
        label: "Travel",
    },
    Category {
        code: "health",
        label: "Health and fitness",
    },
    Category {
        code: "food",
        label: "Food and cooking",
    },
    Category {
        code: "fashion",
        label: "Fashion and beauty",
    },
    Category {
        code: "art",
        label: "Art and photo",
    },
    Category {
        code: "books",
        label: "Books",
    },
    Category {
        code: "languages",
        label: "Languages",
    },
    Category {
        code: "career",
        label: "Career",
    },
    Category {
        code: "psychology",
        label: "Psychology",
    },
    Category {
        code: "religion",
        label: "Religion",
    },
    Category {
        code: "law",
        label: "Law",
    },
    Category {
        code: "medicine",
        label: "Medicine",
    },
    Category {
        code: "quotes",
        label: "Quotes",
    },
    Category {
        code: "other",
        label: "Other",
    },
];

/// Looks up a category by code, case-insensitively
///
/// # Example
///
/// ```
/// use tgscout::url::resolve_category;
///
/// assert_eq!(resolve_category("Tech").unwrap().code, "tech");
/// assert!(resolve_category("astrology").is_err());
/// ```
pub fn resolve_category(code: &str) -> Result<&'static Category, ConfigError> {
    let wanted = code.trim().to_lowercase();

    CATEGORIES
        .iter()
        .find(|category| category.code == wanted)
        .ok_or(ConfigError::UnknownCategory(wanted))
}

/// Builds the base listing URL of a category
///
/// The result has the form `<site>/ratings/<channels|chats>/<code>` and no
/// page parameter yet; see [`super::page_url`]. A path on `site` is kept.
pub fn category_url(site: &Url, content_type: ContentType, code: &str) -> Result<Url, ConfigError> {
    let category = resolve_category(code)?;

    let mut site_root = site.clone();
    if !site_root.path().ends_with('/') {
        let dir = format!("{}/", site_root.path());
        site_root.set_path(&dir);
    }

    let path = format!("ratings/{}/{}", content_type.as_str(), category.code);
    site_root
        .join(&path)
        .map_err(|e| ConfigError::InvalidUrl(format!("category '{}': {}", category.code, e)))
}
