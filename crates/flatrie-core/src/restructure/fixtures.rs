//! Shared node arrays for unit tests

use crate::node::{StoredNode, WorkItem};

/// Ten-entry trie over eight-symbol leaves, rooted at "0".
///
/// ```text
/// 0 ─┬─ 00 ─┬─ 00131211
///    │      └─ 00211002
///    ├─ 01 ─┬─ 01013302
///    │      ├─ 01202113
///    │      └─ 01321132
///    ├─ 02112220
///    └─ 03322130
/// ```
pub(crate) fn ten_nodes() -> Vec<StoredNode> {
    vec![
        StoredNode::branch("0", "0123"),
        StoredNode::branch("00", "12"),
        StoredNode::leaf("00131211", &b"a"[..]),
        StoredNode::leaf("00211002", &b"b"[..]),
        StoredNode::branch("01", "023"),
        StoredNode::leaf("01013302", &b"c"[..]),
        StoredNode::leaf("01202113", &b"d"[..]),
        StoredNode::leaf("01321132", &b"e"[..]),
        StoredNode::leaf("02112220", &b"f"[..]),
        StoredNode::leaf("03322130", &b"g"[..]),
    ]
}

/// Three leaves under "45", two of them under "452".
pub(crate) fn forty_five() -> Vec<StoredNode> {
    vec![
        StoredNode::branch("45", "12"),
        StoredNode::leaf("4511", &b"a"[..]),
        StoredNode::branch("452", "12"),
        StoredNode::leaf("4521", &b"b"[..]),
        StoredNode::leaf("4522", &b"c"[..]),
    ]
}

/// Upserts with empty values, in the given order
pub(crate) fn upserts(paths: &[&str]) -> Vec<WorkItem> {
    paths
        .iter()
        .map(|path| WorkItem::upsert(*path, &b""[..]))
        .collect()
}
