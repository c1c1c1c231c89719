// Fuzzy matching utilities for stage name and field name suggestions

/// Edit distance between two names (insertions, deletions, substitutions),
/// computed over chars with a single rolling row
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == *cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }

    row[b.len()]
}

/// Check if s2 is a substring of s1 (case-insensitive)
pub fn is_substring_match(s1: &str, s2: &str) -> bool {
    s1.to_lowercase().contains(&s2.to_lowercase())
}

/// Find near matches for a name among candidates.
/// Returns up to 5 matches sorted by distance (closest first)
pub fn find_near_matches(
    search_name: &str,
    candidates: &[String],
    max_distance: usize,
) -> Vec<(String, usize)> {
    let search_lower = search_name.to_lowercase();
    let mut matches: Vec<(String, usize)> = Vec::new();

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();
        let distance = levenshtein_distance(&search_lower, &candidate_lower);

        if distance <= max_distance {
            matches.push((candidate.clone(), distance));
        } else if search_lower.len() < candidate_lower.len() && is_substring_match(candidate, search_name) {
            // Prefix matches rank ahead of other substring matches
            let substring_distance = if candidate_lower.starts_with(&search_lower) {
                candidate_lower.len() - search_lower.len()
            } else {
                candidate_lower.len() - search_lower.len() + 1
            };

            if substring_distance <= max_distance + 2 {
                matches.push((candidate.clone(), substring_distance.min(max_distance)));
            }
        }
    }

    matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    matches.into_iter().take(5).collect()
}
