/// Keyword rules, checked in order; the first matching category wins.
const RULES: &[(&str, &[&str])] = &[
    (
        "disaster",
        &[
            "earthquake", "typhoon", "tsunami", "flood", "wildfire", "landslide", "eruption",
            "heavy rain", "rain warning", "evacuation",
        ],
    ),
    (
        "politics",
        &[
            "election", "parliament", "minister", "cabinet", "president", "prime minister",
            "government", "diet", "lawmaker", "policy",
        ],
    ),
    (
        "economy",
        &[
            "economy", "inflation", "stocks", "yen", "dollar", "interest rate", "boj",
            "bank of japan", "gdp", "tariff", "market",
        ],
    ),
    (
        "technology",
        &[
            "ai", "artificial intelligence", "semiconductor", "chip", "software", "smartphone",
            "startup", "cyberattack", "robot",
        ],
    ),
    (
        "science",
        &["research", "study finds", "space", "rocket", "satellite", "vaccine", "climate"],
    ),
    (
        "sports",
        &[
            "olympic", "world cup", "baseball", "soccer", "football", "tennis", "sumo",
            "marathon", "champion",
        ],
    ),
    (
        "world",
        &["united nations", "ukraine", "gaza", "summit", "border", "embassy", "treaty"],
    ),
];

/// Derive a category label from a headline title. Pure, no I/O.
/// Returns None when no rule matches; callers apply their own default.
pub fn categorize_title(title: &str) -> Option<String> {
    let lowered = title.to_lowercase();
    for (category, keywords) in RULES {
        for keyword in *keywords {
            if contains_word(&lowered, keyword) {
                return Some((*category).to_string());
            }
        }
    }
    None
}

/// Substring match that will not fire inside a larger word, so "ai" does not
/// match "rain" or "air".
fn contains_word(text: &str, keyword: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = text[start..].find(keyword) {
        let begin = start + pos;
        let end = begin + keyword.len();
        let before_ok = begin == 0
            || !text[..begin]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let after_ok = end == text.len()
            || !text[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = end;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_disaster_keywords() {
        assert_eq!(
            categorize_title("Tokyo rain warning issued").as_deref(),
            Some("disaster")
        );
        assert_eq!(
            categorize_title("Magnitude 6 earthquake strikes off Fukushima").as_deref(),
            Some("disaster")
        );
    }

    #[test]
    fn matches_economy_keywords_case_insensitively() {
        assert_eq!(
            categorize_title("BOJ holds interest rate steady").as_deref(),
            Some("economy")
        );
    }

    #[test]
    fn short_keywords_do_not_match_inside_words() {
        // "ai" must not fire inside "air" or "rain".
        assert_eq!(categorize_title("Airport reopens after fog clears"), None);
    }

    #[test]
    fn unmatched_title_yields_none() {
        assert_eq!(categorize_title("Local cat wins beauty contest"), None);
    }
}
