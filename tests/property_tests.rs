//! Property-based tests for URL parsing and change sets.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::BTreeSet;

use proptest::prelude::*;

use treeline::core::types::{BranchName, FileChangeSet, ObjectId, RefName};
use treeline::core::url::{parse_content_url, parse_repository_url, DEFAULT_BRANCH};

/// Strategy for a single URL path segment (owner or repository name).
fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9._-]{0,24}"
}

/// Strategy for hosts.
fn host() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("github.com".to_string()),
        "[a-z]{1,10}\\.[a-z]{2,5}",
        "[a-z]{1,10}\\.[a-z]{1,10}\\.com",
    ]
}

/// Strategy for branch names, including ones with `/`.
fn branch() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9][a-z0-9_-]{0,12}", 1..4).prop_map(|parts| parts.join("/"))
}

/// Strategy for hex object ids.
fn object_id() -> impl Strategy<Value = String> {
    "[0-9a-f]{40}"
}

/// Strategy for ids mixing hex, other ASCII and multi-byte characters.
fn any_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            prop::char::range('0', '9'),
            prop::char::range('a', 'f'),
            Just('/'),
            Just(' '),
            Just('é'),
            Just('日'),
            Just('🦀'),
            any::<char>(),
        ],
        0..20,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for repository-relative file paths.
fn file_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,6}", 1..4).prop_map(|parts| parts.join("/"))
}

proptest! {
    /// A bare repository URL targets the default branch.
    #[test]
    fn repository_url_without_suffix(host in host(), owner in segment(), repo in segment()) {
        let url = format!("https://{host}/{owner}/{repo}");
        let location = parse_repository_url(&url).unwrap();

        prop_assert_eq!(location.repo.owner, owner);
        prop_assert_eq!(location.repo.name, repo);
        prop_assert_eq!(location.branch, DEFAULT_BRANCH);
    }

    /// The `/tree/<branch>` suffix is taken verbatim, slashes included.
    #[test]
    fn repository_url_with_branch(
        host in host(),
        owner in segment(),
        repo in segment(),
        branch in branch(),
    ) {
        let url = format!("https://{host}/{owner}/{repo}/tree/{branch}");
        let location = parse_repository_url(&url).unwrap();

        prop_assert_eq!(location.repo.owner, owner);
        prop_assert_eq!(location.repo.name, repo);
        prop_assert_eq!(location.branch, branch);
    }

    /// Anything other than `tree/` after the repository is rejected.
    #[test]
    fn repository_url_with_other_suffix(
        owner in segment(),
        repo in segment(),
        kind in "(blob|commits|pulls|issues)",
        rest in branch(),
    ) {
        let url = format!("https://github.com/{owner}/{repo}/{kind}/{rest}");
        prop_assert!(parse_repository_url(&url).is_err());
    }

    /// Non-https schemes are rejected.
    #[test]
    fn repository_url_requires_https(
        scheme in "(http|ssh|git|ftp)",
        owner in segment(),
        repo in segment(),
    ) {
        let url = format!("{scheme}://github.com/{owner}/{repo}");
        prop_assert!(parse_repository_url(&url).is_err());
    }

    /// Owner, repository and id are read from fixed positions.
    #[test]
    fn content_url_positions(
        host in host(),
        owner in segment(),
        repo in segment(),
        id in object_id(),
    ) {
        let url = format!("https://{host}/api/v3/repos/{owner}/{repo}/git/blobs/{id}");
        let location = parse_content_url(&url).unwrap();

        prop_assert_eq!(location.repo.owner, owner);
        prop_assert_eq!(location.repo.name, repo);
        prop_assert_eq!(location.object.as_str(), id);
    }

    /// Dropping trailing segments below the fixed shape fails.
    #[test]
    fn content_url_truncated(
        owner in segment(),
        repo in segment(),
        id in object_id(),
        keep in 1usize..11,
    ) {
        let url = format!("https://github.com/api/v3/repos/{owner}/{repo}/git/blobs/{id}");
        let truncated = url.split('/').take(keep).collect::<Vec<_>>().join("/");
        prop_assert!(parse_content_url(&truncated).is_err());
    }

    /// Branch references always live under `refs/heads/`.
    #[test]
    fn branch_refs_are_heads(name in branch()) {
        let branch = BranchName::new(&name).unwrap();
        let reference = RefName::for_branch(&branch);

        prop_assert_eq!(reference.branch(), Some(name.as_str()));
        let expected = format!("heads/{name}");
        prop_assert_eq!(reference.short_path(), expected.as_str());
    }

    /// Short ids are prefixes of the full id.
    #[test]
    fn short_id_is_prefix(id in object_id(), len in 0usize..50) {
        let id = ObjectId::new(&id).unwrap();
        let short = id.short(len);

        prop_assert!(id.as_str().starts_with(short));
        prop_assert_eq!(short.len(), len.min(40));
    }

    /// Arbitrary text is either rejected or yields ids that abbreviate
    /// without splitting a character.
    #[test]
    fn short_id_of_arbitrary_text(raw in any_text(), len in 0usize..30) {
        match ObjectId::new(raw.clone()) {
            Ok(id) => {
                prop_assert!(raw.chars().all(|c| c.is_ascii_graphic() && c != '/'));
                let short = id.short(len);
                prop_assert!(raw.starts_with(short));
                prop_assert_eq!(short.chars().count(), len.min(raw.chars().count()));
            }
            Err(_) => {
                prop_assert!(raw.is_empty() || raw.chars().any(|c| !c.is_ascii_graphic() || c == '/'));
            }
        }
    }

    /// Every touched path appears exactly once in the tree request, and
    /// a path that is both added and deleted is sent as an addition.
    #[test]
    fn tree_entries_touch_each_path_once(
        additions in prop::collection::btree_map(file_path(), "[a-z ]{0,20}", 0..8),
        deletions in prop::collection::btree_set(file_path(), 0..8),
    ) {
        let mut changes = FileChangeSet::new();
        for (path, content) in &additions {
            changes = changes.add(path.clone(), content.clone());
        }
        for path in &deletions {
            changes = changes.delete(path.clone());
        }

        let entries = changes.tree_entries();
        let paths: BTreeSet<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        let touched: BTreeSet<&str> = additions
            .keys()
            .chain(deletions.iter())
            .map(String::as_str)
            .collect();

        prop_assert_eq!(entries.len(), paths.len());
        prop_assert_eq!(paths, touched);
        for entry in &entries {
            prop_assert_eq!(entry.is_deletion(), !additions.contains_key(&entry.path));
        }
    }
}
