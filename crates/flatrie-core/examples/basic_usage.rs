//! Basic usage example for the flat trie
//!
//! This example demonstrates:
//! - Building a trie from a first batch of upserts
//! - Inserting next to an existing branch
//! - Updating a value in place
//! - Deleting leaves and watching branches collapse
//!
//! Run with: cargo run -p flatrie-core --example basic_usage

use flatrie_core::{Storage, Update, WorkItem};

fn show(label: &str, storage: &Storage, update: &Update) {
    println!("\n{}", label);
    println!(
        "   spliced {} new node(s) over {}..{}",
        update.replacement.len(),
        update.range.start,
        update.range.end
    );
    for node in storage.nodes() {
        let kind = if node.is_branch() { "branch" } else { "leaf" };
        let depth = node.path().len();
        println!("   {:width$}{} {}", "", kind, node.path(), width = depth);
    }
}

fn main() -> flatrie_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("flatrie_core=debug")
        .init();

    let mut storage = Storage::new();

    let update = storage.apply_batch(&[
        WorkItem::upsert("4511", &b"a"[..]),
        WorkItem::upsert("4521", &b"b"[..]),
        WorkItem::upsert("4522", &b"c"[..]),
    ])?;
    show("Initial batch", &storage, &update);

    let update = storage.apply_batch(&[
        WorkItem::upsert("4501", &b"d"[..]),
        WorkItem::upsert("4523", &b"e"[..]),
    ])?;
    show("Insert around branch 45/452", &storage, &update);

    let update = storage.apply_batch(&[WorkItem::upsert("4521", &b"updated"[..])])?;
    show("Update 4521 in place", &storage, &update);

    let update = storage.apply_batch(&[
        WorkItem::delete("4501"),
        WorkItem::delete("4511"),
    ])?;
    show("Delete both leaves under 45, branch 452 becomes the root", &storage, &update);

    storage.validate()?;
    println!("\nFinal trie holds {} leaves", storage.leaves().count());
    Ok(())
}
