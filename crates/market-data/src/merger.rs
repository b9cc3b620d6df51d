//! Collapsing of chain-specific variants of the same token.
//!
//! A project can be tracked on several chains under the same symbol. The
//! merger groups entries by case-insensitive symbol and keeps the variant
//! with the most data points visible. The others stay in the output,
//! marked hidden, so their provenance is not lost.

use std::collections::HashMap;

use log::debug;

use crate::models::{MergedToken, VariantEntry, VariantInfo};

/// Group `items` by symbol and pick the best-covered variant of each group.
///
/// Groups appear in the order their symbol is first seen. A singleton is
/// passed through unchanged. A group of several is emitted as its primary
/// (most data points, earlier input wins ties) followed by the remaining
/// members in descending point order, each marked hidden.
pub fn merge_variants<T>(items: Vec<T>) -> Vec<MergedToken<T>>
where
    T: VariantEntry,
{
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<T>> = Vec::new();

    for item in items {
        let key = item.token().symbol.to_uppercase();
        match group_index.get(&key) {
            Some(&index) => groups[index].push(item),
            None => {
                group_index.insert(key, groups.len());
                groups.push(vec![item]);
            }
        }
    }

    let mut merged = Vec::new();

    for mut variants in groups {
        if variants.len() == 1 {
            merged.extend(variants.pop().map(MergedToken::single));
            continue;
        }

        let manifest: Vec<VariantInfo> = variants
            .iter()
            .map(|v| {
                let token = v.token();
                VariantInfo {
                    id: token.id.clone(),
                    platform: token.platform.clone(),
                    contract: token.contract.clone(),
                    data_points: v.data_points(),
                }
            })
            .collect();

        // Stable: equal counts keep input order.
        variants.sort_by_key(|v| std::cmp::Reverse(v.data_points()));

        let mut ranked = variants.into_iter();
        let Some(primary) = ranked.next() else {
            continue;
        };
        let primary_id = primary.token().id.clone();
        let others: Vec<T> = ranked.collect();

        debug!(
            "Merged {} variants of {} into '{}'",
            manifest.len(),
            primary.token().symbol,
            primary_id
        );

        merged.push(MergedToken {
            entry: primary,
            is_merged: true,
            variants: manifest,
            hidden_variant_ids: others.iter().map(|v| v.token().id.clone()).collect(),
            is_hidden_variant: false,
            primary_variant_id: None,
        });

        merged.extend(others.into_iter().map(|entry| MergedToken {
            entry,
            is_merged: false,
            variants: Vec::new(),
            hidden_variant_ids: Vec::new(),
            is_hidden_variant: true,
            primary_variant_id: Some(primary_id.clone()),
        }));
    }

    merged
}

/// Entries to show: everything except hidden variants.
pub fn display_tokens<T>(merged: &[MergedToken<T>]) -> Vec<&MergedToken<T>> {
    merged.iter().filter(|m| !m.is_hidden_variant).collect()
}

/// Whether the entry stands for more than one chain variant.
pub fn has_variants<T>(entry: &MergedToken<T>) -> bool {
    entry.is_merged && entry.variants.len() > 1
}

/// Platform shown for an entry: the primary variant's chain.
pub fn platform_label<T: VariantEntry>(entry: &MergedToken<T>) -> &str {
    entry.entry.token().platform.as_str()
}
