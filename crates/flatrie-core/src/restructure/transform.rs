//! Local merge decisions over four consecutive window elements

use crate::error::{Result, TrieError};
use crate::node::{StoredNode, WorkItem};
use crate::path::{common_prefix_len, Path};
use crate::storage::child_index;

/// A unit of the reduction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Subtree<'a> {
    /// Intact committed subtree rooted at `index`
    Stored { index: usize, node: &'a StoredNode },
    /// Pending leaf from the batch
    Pending { index: usize, item: &'a WorkItem },
    /// Branch assembled during the reduction
    Fork { path: Path, children: Vec<Subtree<'a>> },
}

impl<'a> Subtree<'a> {
    pub fn path(&self) -> &Path {
        match self {
            Subtree::Stored { node, .. } => node.path(),
            Subtree::Pending { item, .. } => &item.path,
            Subtree::Fork { path, .. } => path,
        }
    }

    /// Next symbol of the last child, for branches
    pub fn last_child_symbol(&self) -> Option<u8> {
        match self {
            Subtree::Stored { node, .. } => node
                .as_branch()
                .and_then(|branch| branch.children.last().copied()),
            Subtree::Pending { .. } => None,
            Subtree::Fork { path, children } => children
                .last()
                .and_then(|child| child.path().symbol(path.len())),
        }
    }
}

/// How an approved pair is fused
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Merge {
    /// The right element becomes the new last child of the left branch
    Extend,
    /// A new branch at `path` adopts both elements
    Fork { path: Path },
}

/// Decide whether `s2` and `s3` fuse, given their outer neighbors.
///
/// The pair is approved when its common prefix is strictly longer than the one
/// `s2` shares with `s1` and at least as long as the one `s3` shares with
/// `s4`. A missing neighbor never blocks. `Ok(None)` means no action.
pub fn transform(
    s1: Option<&Subtree<'_>>,
    s2: &Subtree<'_>,
    s3: &Subtree<'_>,
    s4: Option<&Subtree<'_>>,
) -> Result<Option<Merge>> {
    let (left, right) = (s2.path(), s3.path());
    if left == right {
        return Err(TrieError::structural(left, "two window elements share a path"));
    }
    if left > right {
        return Err(TrieError::UnsortedInput {
            first: left.clone(),
            second: right.clone(),
        });
    }

    let current = common_prefix_len(left, right);
    let outer_left_ok = s1.map_or(true, |s1| current > common_prefix_len(s1.path(), left));
    let outer_right_ok = s4.map_or(true, |s4| current >= common_prefix_len(right, s4.path()));
    if !(outer_left_ok && outer_right_ok) {
        return Ok(None);
    }

    if current < left.len() {
        return Ok(Some(Merge::Fork {
            path: left.truncated(current),
        }));
    }

    // `s2` is a prefix of `s3`: it has to be a branch `s3` can be appended to.
    let last = s2
        .last_child_symbol()
        .ok_or_else(|| TrieError::structural(left, format!("leaf is a prefix of {}", right)))?;
    match right.symbol(current) {
        Some(symbol) if symbol > last => Ok(Some(Merge::Extend)),
        _ => Err(TrieError::structural(
            left,
            format!("{} does not sort after the last child", right),
        )),
    }
}

/// Fuse `s2` and `s3` as decided by [`transform`].
///
/// Extending a committed branch opens it up: its children become intact
/// stored subtrees of the resulting fork.
pub fn apply_merge<'a>(
    merge: Merge,
    s2: Subtree<'a>,
    s3: Subtree<'a>,
    nodes: &'a [StoredNode],
) -> Result<Subtree<'a>> {
    match merge {
        Merge::Fork { path } => Ok(Subtree::Fork {
            path,
            children: vec![s2, s3],
        }),
        Merge::Extend => match s2 {
            Subtree::Fork { path, mut children } => {
                children.push(s3);
                Ok(Subtree::Fork { path, children })
            }
            Subtree::Stored {
                index,
                node: StoredNode::Branch(branch),
            } => {
                let mut children = (0..branch.children.len())
                    .map(|position| {
                        let child = child_index(nodes, index, position)?;
                        Ok(Subtree::Stored {
                            index: child,
                            node: &nodes[child],
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                children.push(s3);
                Ok(Subtree::Fork {
                    path: branch.path.clone(),
                    children,
                })
            }
            other => Err(TrieError::structural(
                other.path(),
                "only a branch can be extended",
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Leaves as pending work, so they need no backing array
    fn leaves(paths: &[&str]) -> Vec<WorkItem> {
        paths
            .iter()
            .map(|path| WorkItem::upsert(*path, &b""[..]))
            .collect()
    }

    fn pending(items: &[WorkItem], index: usize) -> Subtree<'_> {
        Subtree::Pending {
            index,
            item: &items[index],
        }
    }

    fn stored(nodes: &[StoredNode], index: usize) -> Subtree<'_> {
        Subtree::Stored {
            index,
            node: &nodes[index],
        }
    }

    fn fork(path: &str) -> Option<Merge> {
        Some(Merge::Fork {
            path: Path::from(path),
        })
    }

    #[test]
    fn test_merge_two_leaves() {
        let work = leaves(&["1234", "1235", "1237"]);
        let context = [StoredNode::branch("12", "12")];
        let s1 = stored(&context, 0);
        let (s2, s3, s4) = (pending(&work, 0), pending(&work, 1), pending(&work, 2));

        assert_eq!(transform(None, &s2, &s3, None).unwrap(), fork("123"));
        assert_eq!(transform(Some(&s1), &s2, &s3, None).unwrap(), fork("123"));
        assert_eq!(transform(None, &s2, &s3, Some(&s4)).unwrap(), fork("123"));
        assert_eq!(transform(Some(&s1), &s2, &s3, Some(&s4)).unwrap(), fork("123"));
    }

    #[test]
    fn test_no_action() {
        let context = [StoredNode::branch("123", "12"), StoredNode::branch("1234", "12")];
        let work = leaves(&["1234", "1235"]);
        assert_eq!(
            transform(Some(&stored(&context, 0)), &pending(&work, 0), &pending(&work, 1), None)
                .unwrap(),
            None
        );

        let work = leaves(&["12345", "12356", "12357"]);
        let (s2, s3, s4) = (pending(&work, 0), pending(&work, 1), pending(&work, 2));
        assert_eq!(transform(None, &s2, &s3, Some(&s4)).unwrap(), None);
        assert_eq!(
            transform(Some(&stored(&context, 1)), &s2, &s3, Some(&s4)).unwrap(),
            None
        );
    }

    #[test]
    fn test_extend_branch() {
        let nodes = [
            StoredNode::branch("12", "12"),
            StoredNode::branch("123", "12"),
            StoredNode::leaf("1231", &b""[..]),
            StoredNode::leaf("1232", &b""[..]),
        ];
        let work = leaves(&["1235", "1236"]);
        let (s1, s2) = (stored(&nodes, 0), stored(&nodes, 1));
        let (s3, s4) = (pending(&work, 0), pending(&work, 1));

        assert_eq!(transform(None, &s2, &s3, None).unwrap(), Some(Merge::Extend));
        assert_eq!(transform(None, &s2, &s3, Some(&s4)).unwrap(), Some(Merge::Extend));
        assert_eq!(
            transform(Some(&s1), &s2, &s3, Some(&s4)).unwrap(),
            Some(Merge::Extend)
        );

        let fused = apply_merge(Merge::Extend, s2, s3.clone(), &nodes).unwrap();
        assert_eq!(
            fused,
            Subtree::Fork {
                path: Path::from("123"),
                children: vec![stored(&nodes, 2), stored(&nodes, 3), s3],
            }
        );
        assert_eq!(fused.last_child_symbol(), Some(b'5'));
    }

    #[test]
    fn test_emit_new_branch() {
        let nodes = [
            StoredNode::branch("1", "12"),
            StoredNode::branch("11", "12"),
            StoredNode::branch("123", "12"),
            StoredNode::branch("124", "12"),
        ];
        let work = leaves(&["1245", "1256", "1268"]);
        let (s2, s3) = (stored(&nodes, 2), stored(&nodes, 3));
        let tail = pending(&work, 1);

        assert_eq!(transform(None, &s2, &s3, None).unwrap(), fork("12"));
        assert_eq!(transform(Some(&stored(&nodes, 0)), &s2, &s3, None).unwrap(), fork("12"));
        assert_eq!(transform(None, &s2, &s3, Some(&tail)).unwrap(), fork("12"));
        assert_eq!(
            transform(Some(&stored(&nodes, 0)), &s2, &s3, Some(&tail)).unwrap(),
            fork("12")
        );

        let s3 = pending(&work, 0);
        let tail = pending(&work, 2);
        let s1 = stored(&nodes, 1);
        assert_eq!(transform(None, &s2, &s3, None).unwrap(), fork("12"));
        assert_eq!(transform(Some(&s1), &s2, &s3, None).unwrap(), fork("12"));
        assert_eq!(transform(None, &s2, &s3, Some(&tail)).unwrap(), fork("12"));
        assert_eq!(transform(Some(&s1), &s2, &s3, Some(&tail)).unwrap(), fork("12"));

        let fused = apply_merge(Merge::Fork { path: Path::from("12") }, s2.clone(), s3.clone(), &nodes)
            .unwrap();
        assert_eq!(
            fused,
            Subtree::Fork {
                path: Path::from("12"),
                children: vec![s2, s3],
            }
        );
    }

    #[test]
    fn test_extend_fork_built_earlier() {
        let work = leaves(&["1231", "1232", "1235"]);
        let fork = Subtree::Fork {
            path: Path::from("123"),
            children: vec![pending(&work, 0), pending(&work, 1)],
        };
        let s3 = pending(&work, 2);
        assert_eq!(transform(None, &fork, &s3, None).unwrap(), Some(Merge::Extend));

        let fused = apply_merge(Merge::Extend, fork, s3, &[]).unwrap();
        assert!(matches!(&fused, Subtree::Fork { children, .. } if children.len() == 3));
    }

    #[test]
    fn test_malformed_pairs_are_rejected() {
        let work = leaves(&["12", "123", "1235"]);
        // a leaf cannot adopt children
        assert!(matches!(
            transform(None, &pending(&work, 0), &pending(&work, 1), None),
            Err(TrieError::StructuralInconsistency { .. })
        ));
        assert!(matches!(
            transform(None, &pending(&work, 2), &pending(&work, 1), None),
            Err(TrieError::UnsortedInput { .. })
        ));
        assert!(matches!(
            transform(None, &pending(&work, 1), &pending(&work, 1), None),
            Err(TrieError::StructuralInconsistency { .. })
        ));

        // "1232" would land inside the branch's last child
        let nodes = [StoredNode::branch("123", "12")];
        let inside = leaves(&["1232"]);
        assert!(matches!(
            transform(None, &stored(&nodes, 0), &pending(&inside, 0), None),
            Err(TrieError::StructuralInconsistency { .. })
        ));
    }
}
