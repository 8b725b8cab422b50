//! Built-in report definitions embedded in the binary
//!
//! Lets users run `gh-harvest run repo-activity` instead of pointing at a
//! YAML file.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in report YAML definitions
pub static BUILTIN_REPORTS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        // Organization inventories
        m.insert(
            "repo-activity",
            include_str!("../../reports/repo-activity.yaml"),
        );
        m.insert("inclusivity", include_str!("../../reports/inclusivity.yaml"));
        m.insert("org-members", include_str!("../../reports/org-members.yaml"));
        m.insert(
            "enterprise-owners",
            include_str!("../../reports/enterprise-owners.yaml"),
        );
        m.insert("mystery-orgs", include_str!("../../reports/mystery-orgs.yaml"));
        m.insert("pinned-repos", include_str!("../../reports/pinned-repos.yaml"));
        m.insert("rest-repos", include_str!("../../reports/rest-repos.yaml"));

        // Repository deep dives
        m.insert("commits", include_str!("../../reports/commits.yaml"));
        m.insert("pr-activity", include_str!("../../reports/pr-activity.yaml"));
        m.insert("forks", include_str!("../../reports/forks.yaml"));

        // Search
        m.insert(
            "keyword-search",
            include_str!("../../reports/keyword-search.yaml"),
        );

        m
    });

/// Get a built-in report by name
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_REPORTS.get(name).copied()
}

/// Check if a name refers to a built-in report
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_REPORTS.contains_key(name)
}

/// List all built-in report names, sorted
pub fn list_builtin() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BUILTIN_REPORTS.keys().copied().collect();
    names.sort_unstable();
    names
}
