//! "Did you mean?" interface-name suggestions for a missed `query_interface` lookup.

use std::collections::HashSet;

/// Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, val) in dp[0].iter_mut().enumerate() {
        *val = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[a.len()][b.len()]
}

fn trigrams(s: &str) -> HashSet<[char; 3]> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 3 {
        return HashSet::new();
    }
    chars.windows(3).map(|w| [w[0], w[1], w[2]]).collect()
}

fn shares_trigram(a: &str, b: &str) -> bool {
    !trigrams(a).is_disjoint(&trigrams(b))
}

const MAX_DISTANCE: usize = 3;

/// Finds candidate interface names "similar" to `query`, per the pinned
/// metric: Levenshtein distance <= 3 OR a shared lowercase 3-gram, ordered by
/// ascending distance then lexicographically.
#[must_use]
pub fn find_similar(query: &str, candidates: &[String]) -> Vec<String> {
    let query_lower = query.to_lowercase();
    let mut matches: Vec<(usize, &str)> = candidates
        .iter()
        .filter(|candidate| candidate.as_str() != query)
        .filter_map(|candidate| {
            let candidate_lower = candidate.to_lowercase();
            let distance = edit_distance(&query_lower, &candidate_lower);
            if distance <= MAX_DISTANCE || shares_trigram(&query_lower, &candidate_lower) {
                Some((distance, candidate.as_str()))
            } else {
                None
            }
        })
        .collect();

    matches.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.cmp(b)));
    matches.into_iter().map(|(_, name)| name.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_close_edit_distance() {
        let candidates = vec!["UserProfile".to_string(), "OrderSummary".to_string()];
        let similar = find_similar("UserProfil", &candidates);
        assert_eq!(similar, vec!["UserProfile".to_string()]);
    }

    #[test]
    fn finds_shared_trigram_beyond_edit_budget() {
        let candidates = vec!["XyzUserAccountBundle".to_string()];
        let similar = find_similar("UserAcc", &candidates);
        assert_eq!(similar, vec!["XyzUserAccountBundle".to_string()]);
    }

    #[test]
    fn orders_by_distance_then_lexicographic() {
        let candidates = vec!["Userr".to_string(), "Usera".to_string(), "User".to_string()];
        let similar = find_similar("User1", &candidates);
        assert_eq!(
            similar,
            vec!["User".to_string(), "Usera".to_string(), "Userr".to_string()]
        );
    }

    #[test]
    fn excludes_unrelated_names() {
        let candidates = vec!["CompletelyDifferentThing".to_string()];
        assert!(find_similar("UserProfile", &candidates).is_empty());
    }
}
