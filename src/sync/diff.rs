use forwardemail::aliases::Alias;
use itertools::Itertools;
use std::collections::HashMap;

/// Name keyed lookup of a domain's aliases, built fresh for every run.
pub type AliasIndex = HashMap<String, Alias>;

/// Build a name keyed index from a fetched listing. Names are unique per
/// domain on the server; should a listing ever repeat one, the later entry
/// wins.
pub fn index<I>(aliases: I) -> AliasIndex
where
    I: IntoIterator<Item = Alias>,
{
    aliases
        .into_iter()
        .map(|alias| (alias.name.clone(), alias))
        .collect()
}

/// Disjoint partition of every alias name present in either index. Each
/// bucket is sorted by name.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Classification {
    pub only_in_source: Vec<String>,
    pub only_in_target: Vec<String>,
    pub matching: Vec<String>,
    pub conflicting: Vec<String>,
}

pub fn classify(src: &AliasIndex, dst: &AliasIndex) -> Classification {
    let mut classification = Classification::default();
    for name in src.keys().chain(dst.keys()).unique().sorted() {
        match (src.get(name), dst.get(name)) {
            (Some(_), None) => classification.only_in_source.push(name.clone()),
            (None, Some(_)) => classification.only_in_target.push(name.clone()),
            (Some(src_alias), Some(dst_alias)) if alias_matches(src_alias, dst_alias) => {
                classification.matching.push(name.clone())
            }
            (Some(_), Some(_)) => classification.conflicting.push(name.clone()),
            (None, None) => unreachable!("name came from one of the indexes"),
        }
    }
    classification
}

/// True when two aliases carry the same forwarding state. The description is
/// informational and does not participate.
pub fn alias_matches(a: &Alias, b: &Alias) -> bool {
    a.is_enabled == b.is_enabled
        && set_equal(&a.recipients, &b.recipients)
        && set_equal(&a.labels, &b.labels)
}

/// Order, case and surrounding whitespace insensitive view of a recipient or
/// label list. Duplicates are kept, so a multiplicity difference between two
/// lists still reads as a difference.
pub fn normalize(values: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = values
        .iter()
        .map(|value| value.trim().to_lowercase())
        .collect();
    normalized.sort_unstable();
    normalized
}

pub fn set_equal(a: &[String], b: &[String]) -> bool {
    normalize(a) == normalize(b)
}

/// Deduplicated, sorted union of two lists, under the same normalization
/// the classifier applies.
pub fn merge_union(a: &[String], b: &[String]) -> Vec<String> {
    let mut union = normalize(a);
    union.extend(normalize(b));
    union.sort_unstable();
    union.dedup();
    union
}
