//! Outline (bookmark) tree extraction
//!
//! Walks the catalog's `Outlines` First/Next chain recursively.
//! Destinations come in three shapes: a direct destination array, a
//! `GoTo` action, or a named destination that must be resolved through
//! the catalog `Dests` dictionary or the `Names`/`Dests` name tree.
//! A node whose destination cannot be resolved defaults to page 1 and
//! never discards its siblings or children.
//!
//! The walk carries a depth bound and a visited set: the chain lives in
//! untrusted files, and a malformed `Next` loop or a pathologically
//! deep tree must not take the ingestion down with it.

use std::collections::{HashMap, HashSet};

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::document::ContentManifestItem;

use super::parser::{decode_pdf_string, resolve, resolve_dict};

const MAX_OUTLINE_DEPTH: usize = 64;
const MAX_NAME_TREE_DEPTH: usize = 32;

/// Project the document outline into a navigation tree.
///
/// `page_index` maps page object ids to zero-based page indices.
pub fn extract_outline(
    doc: &Document,
    page_index: &HashMap<ObjectId, usize>,
) -> Vec<ContentManifestItem> {
    let Ok(catalog) = doc.catalog() else {
        return Vec::new();
    };
    let Some(outlines) = catalog.get(b"Outlines").ok().and_then(|o| resolve_dict(doc, o)) else {
        return Vec::new();
    };

    let mut visited = HashSet::new();
    walk_level(doc, outlines.get(b"First").ok(), page_index, 0, &mut visited)
}

fn walk_level(
    doc: &Document,
    first: Option<&Object>,
    page_index: &HashMap<ObjectId, usize>,
    level: usize,
    visited: &mut HashSet<ObjectId>,
) -> Vec<ContentManifestItem> {
    let mut items = Vec::new();
    if level >= MAX_OUTLINE_DEPTH {
        tracing::warn!(level, "outline exceeds depth bound, truncating");
        return items;
    }

    let mut next = first.cloned();
    while let Some(node_obj) = next {
        let Ok(node_id) = node_obj.as_reference() else {
            break;
        };
        if !visited.insert(node_id) {
            tracing::warn!(?node_id, "outline sibling cycle detected, truncating");
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };

        let title = node
            .get(b"Title")
            .ok()
            .and_then(|obj| match resolve(doc, obj) {
                Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
                _ => None,
            })
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        let page = match resolve_destination(doc, node, page_index) {
            Some(page) => page,
            None => {
                tracing::debug!(%title, "outline destination unresolved, defaulting to page 1");
                0
            }
        };

        let order = items.len();
        let children = walk_level(doc, node.get(b"First").ok(), page_index, level + 1, visited);

        items.push(ContentManifestItem {
            id: String::new(),
            title: Some(title),
            href: Some(format!("page:{}", page + 1)),
            order,
            level,
            children,
        });

        next = node.get(b"Next").ok().cloned();
    }

    items
}

/// Resolve an outline node's destination to a zero-based page index.
fn resolve_destination(
    doc: &Document,
    node: &Dictionary,
    page_index: &HashMap<ObjectId, usize>,
) -> Option<usize> {
    // Direct destination, else a GoTo action's /D
    let dest = node.get(b"Dest").ok().or_else(|| {
        let action = resolve_dict(doc, node.get(b"A").ok()?)?;
        match action.get(b"S").ok().map(|s| resolve(doc, s)) {
            Some(Object::Name(name)) if name.as_slice() == b"GoTo" => action.get(b"D").ok(),
            _ => None,
        }
    })?;

    dest_to_page(doc, dest, page_index, 0)
}

fn dest_to_page(
    doc: &Document,
    dest: &Object,
    page_index: &HashMap<ObjectId, usize>,
    depth: usize,
) -> Option<usize> {
    if depth > 4 {
        return None;
    }
    match resolve(doc, dest) {
        // [page /XYZ x y z] and friends
        Object::Array(parts) => {
            let page_ref = parts.first()?;
            match page_ref {
                Object::Reference(id) => page_index.get(id).copied(),
                // Some producers store a plain page number
                Object::Integer(n) if *n >= 0 => Some(*n as usize),
                _ => None,
            }
        }
        // Named destination in either string or name form
        Object::String(name, _) => {
            let value = lookup_named_dest(doc, name)?;
            dest_to_page(doc, &value, page_index, depth + 1)
        }
        Object::Name(name) => {
            let value = lookup_named_dest(doc, name)?;
            dest_to_page(doc, &value, page_index, depth + 1)
        }
        // A destination dictionary wraps the array in /D
        Object::Dictionary(dict) => {
            let inner = dict.get(b"D").ok()?.clone();
            dest_to_page(doc, &inner, page_index, depth + 1)
        }
        _ => None,
    }
}

/// Look up a named destination: the PDF 1.1 catalog `Dests` dictionary
/// first, then the `Names` name tree.
fn lookup_named_dest(doc: &Document, name: &[u8]) -> Option<Object> {
    let catalog = doc.catalog().ok()?;

    if let Some(dests) = catalog.get(b"Dests").ok().and_then(|o| resolve_dict(doc, o)) {
        if let Ok(value) = dests.get(name) {
            return Some(value.clone());
        }
    }

    let names = catalog.get(b"Names").ok().and_then(|o| resolve_dict(doc, o))?;
    let dests_tree = names.get(b"Dests").ok().and_then(|o| resolve_dict(doc, o))?;
    search_name_tree(doc, dests_tree, name, 0)
}

fn search_name_tree(
    doc: &Document,
    node: &Dictionary,
    name: &[u8],
    depth: usize,
) -> Option<Object> {
    if depth >= MAX_NAME_TREE_DEPTH {
        tracing::warn!("name tree exceeds depth bound, giving up");
        return None;
    }

    // Leaf: /Names is a flat [key1 value1 key2 value2 ...] array
    if let Some(Object::Array(pairs)) = node.get(b"Names").ok().map(|o| resolve(doc, o)) {
        for pair in pairs.chunks_exact(2) {
            if let Object::String(key, _) = &pair[0] {
                if key.as_slice() == name {
                    return Some(pair[1].clone());
                }
            }
        }
        return None;
    }

    // Interior node: recurse into kids
    if let Some(Object::Array(kids)) = node.get(b"Kids").ok().map(|o| resolve(doc, o)) {
        for kid in kids {
            if let Some(kid_dict) = resolve_dict(doc, kid) {
                if let Some(found) = search_name_tree(doc, kid_dict, name, depth + 1) {
                    return Some(found);
                }
            }
        }
    }

    None
}
