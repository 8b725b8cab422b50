//! Work item types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// What a report iterates over
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// GitHub organization login
    #[default]
    Org,
    /// Repository as owner/name
    Repo,
    /// Free-text search keyword
    Keyword,
}

impl ItemKind {
    /// Fields items of this kind expose to templates under `item`
    pub fn template_fields(self) -> &'static [&'static str] {
        match self {
            ItemKind::Org => &["org", "name"],
            ItemKind::Repo => &["owner", "org", "repo", "name"],
            ItemKind::Keyword => &["keyword", "name"],
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Org => f.write_str("org"),
            ItemKind::Repo => f.write_str("repo"),
            ItemKind::Keyword => f.write_str("keyword"),
        }
    }
}

/// One unit of work: everything paginated for it lands under its label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkItem {
    /// An organization
    Org(String),
    /// A repository
    Repo {
        /// Owning user or organization
        owner: String,
        /// Repository name
        name: String,
    },
    /// A search keyword
    Keyword(String),
}

impl WorkItem {
    /// Organization item
    pub fn org(login: impl Into<String>) -> Self {
        WorkItem::Org(login.into())
    }

    /// Repository item
    pub fn repo(owner: impl Into<String>, name: impl Into<String>) -> Self {
        WorkItem::Repo {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Keyword item
    pub fn keyword(keyword: impl Into<String>) -> Self {
        WorkItem::Keyword(keyword.into())
    }

    /// The kind of this item
    pub fn kind(&self) -> ItemKind {
        match self {
            WorkItem::Org(_) => ItemKind::Org,
            WorkItem::Repo { .. } => ItemKind::Repo,
            WorkItem::Keyword(_) => ItemKind::Keyword,
        }
    }

    /// Display label, also the key in results and the `work_item` column
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Fields exposed to templates under `item`
    ///
    /// Every item has `name`; orgs add `org`, repositories add `owner`,
    /// `org` (same as owner) and `repo`, keywords add `keyword`.
    pub fn template_value(&self) -> Value {
        match self {
            WorkItem::Org(login) => json!({ "org": login, "name": login }),
            WorkItem::Repo { owner, name } => json!({
                "owner": owner,
                "org": owner,
                "repo": name,
                "name": format!("{owner}/{name}"),
            }),
            WorkItem::Keyword(keyword) => json!({ "keyword": keyword, "name": keyword }),
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItem::Org(login) => f.write_str(login),
            WorkItem::Repo { owner, name } => write!(f, "{owner}/{name}"),
            WorkItem::Keyword(keyword) => f.write_str(keyword),
        }
    }
}
