//! Manifest normalization
//!
//! Post-processes adapter output so downstream consumers can rely on the
//! manifest invariants regardless of adapter correctness: unique ids,
//! position-matching order values, a stamped format tag, and a bounded
//! text-layer list.

use std::collections::HashSet;

use super::types::{ContentManifest, ContentManifestItem, DocumentFormat};

/// Normalize a draft manifest in place.
///
/// Runs after every adapter as a defense-in-depth pass; an adapter that
/// already assigned ids and order values comes through unchanged apart
/// from the invariant checks.
pub fn normalize_manifest(
    manifest: &mut ContentManifest,
    format: DocumentFormat,
    text_layer_page_limit: usize,
) {
    if manifest.format.is_none() {
        manifest.format = Some(format);
    }

    // Spine: ids unique across the manifest, order equals position
    let mut seen = HashSet::new();
    for (index, resource) in manifest.spine.iter_mut().enumerate() {
        if resource.id.is_empty() || !seen.insert(resource.id.clone()) {
            resource.id = fresh_id("spine", index, &mut seen);
        }
        resource.order = index;
    }

    // Table of contents: unique ids and depth levels at every tree level
    let mut counter = 0usize;
    let mut seen = HashSet::new();
    normalize_toc(&mut manifest.table_of_contents, 0, &mut counter, &mut seen);

    // Re-clamp even if an adapter ignored the limit
    if manifest.text_layers.len() > text_layer_page_limit {
        tracing::debug!(
            count = manifest.text_layers.len(),
            limit = text_layer_page_limit,
            "clamping text layers to configured page limit"
        );
        manifest.text_layers.truncate(text_layer_page_limit);
    }
}

fn normalize_toc(
    items: &mut [ContentManifestItem],
    level: usize,
    counter: &mut usize,
    seen: &mut HashSet<String>,
) {
    for (index, item) in items.iter_mut().enumerate() {
        if item.id.is_empty() || !seen.insert(item.id.clone()) {
            item.id = fresh_id("toc", *counter, seen);
        }
        *counter += 1;
        item.order = index;
        item.level = level;
        normalize_toc(&mut item.children, level + 1, counter, seen);
    }
}

/// Smallest `{prefix}-{n}` with `n >= start` not already taken by an
/// adapter-assigned id.
fn fresh_id(prefix: &str, start: usize, seen: &mut HashSet<String>) -> String {
    let mut n = start;
    loop {
        let candidate = format!("{prefix}-{n}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::types::{ManifestResource, TextLayer};

    fn toc_item(id: &str, children: Vec<ContentManifestItem>) -> ContentManifestItem {
        ContentManifestItem {
            id: id.to_string(),
            title: Some(id.to_string()),
            children,
            ..Default::default()
        }
    }

    #[test]
    fn stamps_format_and_spine_ids() {
        let mut manifest = ContentManifest {
            spine: vec![
                ManifestResource::default(),
                ManifestResource {
                    id: "ch2".into(),
                    order: 99,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        normalize_manifest(&mut manifest, DocumentFormat::Epub, 20);

        assert_eq!(manifest.format, Some(DocumentFormat::Epub));
        assert_eq!(manifest.spine[0].id, "spine-0");
        assert_eq!(manifest.spine[1].id, "ch2");
        assert_eq!(manifest.spine[0].order, 0);
        assert_eq!(manifest.spine[1].order, 1);
    }

    #[test]
    fn synthetic_ids_avoid_adapter_assigned_names() {
        let mut manifest = ContentManifest {
            spine: vec![
                ManifestResource {
                    id: "spine-1".into(),
                    ..Default::default()
                },
                ManifestResource::default(),
            ],
            table_of_contents: vec![toc_item("toc-1", vec![]), toc_item("", vec![])],
            ..Default::default()
        };

        normalize_manifest(&mut manifest, DocumentFormat::Epub, 20);

        assert_eq!(manifest.spine[0].id, "spine-1");
        assert_eq!(manifest.spine[1].id, "spine-2");
        assert_eq!(manifest.table_of_contents[0].id, "toc-1");
        assert_eq!(manifest.table_of_contents[1].id, "toc-2");
    }

    #[test]
    fn preserves_adapter_format() {
        let mut manifest = ContentManifest {
            format: Some(DocumentFormat::Pdf),
            ..Default::default()
        };
        normalize_manifest(&mut manifest, DocumentFormat::Text, 20);
        assert_eq!(manifest.format, Some(DocumentFormat::Pdf));
    }

    #[test]
    fn assigns_unique_toc_ids_at_every_level() {
        let mut manifest = ContentManifest {
            table_of_contents: vec![
                toc_item("", vec![toc_item("", vec![toc_item("", vec![])]), toc_item("dup", vec![])]),
                toc_item("dup", vec![]),
            ],
            ..Default::default()
        };

        normalize_manifest(&mut manifest, DocumentFormat::Epub, 20);

        let mut ids = HashSet::new();
        fn collect(items: &[ContentManifestItem], level: usize, ids: &mut HashSet<String>) {
            for (index, item) in items.iter().enumerate() {
                assert!(!item.id.is_empty());
                assert!(ids.insert(item.id.clone()), "duplicate id {}", item.id);
                assert_eq!(item.order, index);
                assert_eq!(item.level, level);
                collect(&item.children, level + 1, ids);
            }
        }
        collect(&manifest.table_of_contents, 0, &mut ids);
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn clamps_text_layers() {
        let mut manifest = ContentManifest {
            text_layers: (0..30)
                .map(|page| TextLayer {
                    id: format!("text-{page}"),
                    page,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        normalize_manifest(&mut manifest, DocumentFormat::Pdf, 20);
        assert_eq!(manifest.text_layers.len(), 20);
        assert_eq!(manifest.text_layers.last().unwrap().page, 19);
    }
}
