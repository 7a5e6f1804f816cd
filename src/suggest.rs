//! "Did you mean" hints for unknown names

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Best fuzzy match for `query` among `candidates`
pub fn closest<'a, I>(query: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let matcher = SkimMatcherV2::default();
    let mut best: Option<(i64, &str)> = None;

    for candidate in candidates {
        // Score both directions so typos and truncations both match
        let score = matcher
            .fuzzy_match(candidate, query)
            .into_iter()
            .chain(matcher.fuzzy_match(query, candidate))
            .max();

        if let Some(score) = score {
            if best.map(|(s, _)| score > s).unwrap_or(true) {
                best = Some((score, candidate));
            }
        }
    }

    best.map(|(_, name)| name.to_string())
}
