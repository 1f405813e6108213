#![allow(dead_code)]

//! Result Filter Engine: the library form of the interactive filtering the
//! client applies to an already-fetched result set. Pure function of its
//! inputs; recomputed in full on every query/selection change rather than
//! incrementally patched.

use crate::models::job::JobMatch;

/// Computes the visible subset of `results` under two independent
/// predicates, preserving the original order:
///
/// - free-text: the trimmed, case-insensitive query must be a substring of
///   the title, the company (when present), or the location;
/// - skills: every selected skill must case-insensitively substring-match
///   at least one of the job's matching skills (a job without skills is
///   excluded by any non-empty selection).
///
/// An empty query and an empty selection each pass everything, so
/// `compute_visible(results, "", &[])` is the identity.
pub fn compute_visible<'a>(
    results: &'a [JobMatch],
    query: &str,
    selected_skills: &[String],
) -> Vec<&'a JobMatch> {
    let query = query.trim().to_lowercase();
    results
        .iter()
        .filter(|job| matches_query(job, &query) && matches_skills(job, selected_skills))
        .collect()
}

fn matches_query(job: &JobMatch, query_lower: &str) -> bool {
    if query_lower.is_empty() {
        return true;
    }
    job.title.to_lowercase().contains(query_lower)
        || job
            .company
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(query_lower))
        || job.location.to_lowercase().contains(query_lower)
}

fn matches_skills(job: &JobMatch, selected_skills: &[String]) -> bool {
    selected_skills.iter().all(|wanted| {
        let wanted = wanted.to_lowercase();
        job.skills()
            .iter()
            .any(|skill| skill.to_lowercase().contains(&wanted))
    })
}
