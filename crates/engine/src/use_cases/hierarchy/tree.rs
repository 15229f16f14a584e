//! Tree reads shared by the cascades and the facade.
//!
//! The by-parent and by-ancestor views are keyed by bare placename, so a key
//! can also collect nodes from an unrelated subtree that reuses the name.
//! These helpers narrow the view results to the node's real subtree.

use std::collections::HashMap;

use placetree_domain::{HierarchyPath, Location, LocationId};

use crate::infrastructure::index::IndexQuery;
use crate::infrastructure::ports::{LocationRepo, RepoError};

/// A node below some subtree root, with the index at which the root's
/// placename sits in its hierarchy.
#[derive(Debug, Clone)]
pub(crate) struct Member {
    pub location: Location,
    pub anchor: usize,
}

/// Fetch records and order them by compound name.
pub(crate) async fn load_sorted(
    repo: &dyn LocationRepo,
    ids: &[LocationId],
) -> Result<Vec<Location>, RepoError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut locations = repo.get_many(ids).await?;
    locations.sort_by(|a, b| a.compound_name().cmp(b.compound_name()));
    Ok(locations)
}

/// Direct children of `node`, by compound name.
pub(crate) async fn direct_children(
    repo: &dyn LocationRepo,
    node: &Location,
) -> Result<Vec<Location>, RepoError> {
    let ids = repo
        .lookup(&IndexQuery::ByParent(node.placename().as_str().to_string()))
        .await?;
    let mut children = load_sorted(repo, &ids).await?;
    children.retain(|child| child.is_child_of(node));
    Ok(children)
}

/// Every node below `node`, shallowest first.
pub(crate) async fn descendants(
    repo: &dyn LocationRepo,
    node: &Location,
) -> Result<Vec<Location>, RepoError> {
    Ok(subtree(repo, node)
        .await?
        .into_iter()
        .map(|member| member.location)
        .collect())
}

/// Every node below `node`, ordered parents before children.
///
/// Besides nodes under `node`'s stored path this picks up nodes left behind
/// by an interrupted move of `node`: their hierarchy still names `node`'s
/// placename, but the path up to that name no longer resolves to any node.
pub(crate) async fn subtree(
    repo: &dyn LocationRepo,
    node: &Location,
) -> Result<Vec<Member>, RepoError> {
    let placename = node.placename().as_str();
    let ids = repo
        .lookup(&IndexQuery::ByAncestor(placename.to_string()))
        .await?;
    let candidates = load_sorted(repo, &ids).await?;

    let mut resolved: HashMap<String, bool> = HashMap::new();
    let mut members = Vec::new();
    for candidate in candidates {
        if candidate.id() == node.id() {
            continue;
        }
        if node.is_ancestor_of(&candidate) {
            members.push(Member {
                location: candidate,
                anchor: node.hierarchy().depth(),
            });
            continue;
        }
        if let Some(anchor) = detached_anchor(repo, &candidate, placename, &mut resolved).await? {
            tracing::warn!(
                location_id = %candidate.id(),
                compound_name = candidate.compound_name(),
                adopted_by = node.compound_name(),
                "Found a node detached by an interrupted move"
            );
            members.push(Member {
                location: candidate,
                anchor,
            });
        }
    }

    members.sort_by(|a, b| {
        let depth_a = a.location.hierarchy().depth() - a.anchor;
        let depth_b = b.location.hierarchy().depth() - b.anchor;
        depth_a
            .cmp(&depth_b)
            .then_with(|| a.location.compound_name().cmp(b.location.compound_name()))
    });
    Ok(members)
}

/// Position of the first link in `candidate`'s ancestor chain that does not
/// resolve, if that link is named `placename`.
async fn detached_anchor(
    repo: &dyn LocationRepo,
    candidate: &Location,
    placename: &str,
    resolved: &mut HashMap<String, bool>,
) -> Result<Option<usize>, RepoError> {
    let segments = candidate.hierarchy().segments();
    for (index, segment) in segments.iter().enumerate() {
        let prefix = HierarchyPath::new(segments[..index].to_vec()).compound_name(segment);
        let exists = match resolved.get(&prefix) {
            Some(&exists) => exists,
            None => {
                let exists = !repo
                    .lookup(&IndexQuery::ByCompoundName(prefix.clone()))
                    .await?
                    .is_empty();
                resolved.insert(prefix, exists);
                exists
            }
        };
        if !exists {
            return Ok((segment == placename).then_some(index));
        }
    }
    Ok(None)
}
