use std::cmp::Ordering;

use crate::CodePattern;

/// Descending float order with NaN sorted last.
pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

/// Catalog order: relevance descending, usage descending, id ascending.
pub fn cmp_catalog(a: &CodePattern, b: &CodePattern) -> Ordering {
	cmp_f32_desc(a.relevance_score, b.relevance_score)
		.then_with(|| b.usage_count.cmp(&a.usage_count))
		.then_with(|| a.id.cmp(&b.id))
}
