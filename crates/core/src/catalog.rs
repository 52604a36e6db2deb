use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::package::{Package, PackageQuery, Page, Pagination, SortOrder};

/// Detail-page lookup keyed by lower-cased slug.
#[derive(Clone, Debug, Default)]
pub struct SlugCatalog {
    packages: Vec<Package>,
    by_slug: HashMap<String, usize>,
}

impl SlugCatalog {
    pub fn new(packages: Vec<Package>) -> Self {
        let mut by_slug = HashMap::with_capacity(packages.len());
        for (index, package) in packages.iter().enumerate() {
            // First listing wins when two records share a slug.
            by_slug.entry(package.lookup_key().trim().to_lowercase()).or_insert(index);
        }
        Self { packages, by_slug }
    }

    pub fn find(&self, slug: &str) -> Option<&Package> {
        let index = self.by_slug.get(&slug.trim().to_lowercase())?;
        self.packages.get(*index)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }
}

/// Applies the listing filters locally and returns the requested 1-based page.
///
/// Packages whose duration can't be read never match a duration filter.
pub fn filter_packages(packages: &[Package], query: &PackageQuery) -> Page<Package> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase);
    let category = query.category.as_deref().map(str::trim).filter(|value| !value.is_empty());

    let mut matches: Vec<&Package> = packages
        .iter()
        .filter(|package| match &needle {
            Some(needle) => [&package.name, &package.description, &package.location]
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .filter(|package| {
            category.map_or(true, |wanted| package.category.eq_ignore_ascii_case(wanted))
        })
        .filter(|package| query.price_min.map_or(true, |min| package.price >= min))
        .filter(|package| query.price_max.map_or(true, |max| package.price <= max))
        .filter(|package| match query.duration {
            Some(range) => package.duration_days().is_some_and(|days| range.contains(days)),
            None => true,
        })
        .collect();

    match query.sort.unwrap_or_default() {
        SortOrder::Featured => {}
        SortOrder::PriceAsc => matches.sort_by(|a, b| a.price.cmp(&b.price)),
        SortOrder::PriceDesc => matches.sort_by(|a, b| b.price.cmp(&a.price)),
        SortOrder::Rating => matches.sort_by(|a, b| compare_rating_desc(a, b)),
        SortOrder::Duration => {
            matches.sort_by_key(|package| package.duration_days().unwrap_or(u32::MAX))
        }
    }

    let limit = query.limit() as usize;
    let total_items = matches.len();
    let total_pages = total_items.div_ceil(limit);
    let start = (query.page() as usize - 1).saturating_mul(limit);

    let data = matches.into_iter().skip(start).take(limit).cloned().collect();

    Page {
        data,
        pagination: Pagination {
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            total_items: total_items as u64,
        },
    }
}

fn compare_rating_desc(a: &Package, b: &Package) -> Ordering {
    match (a.rating, b.rating) {
        (Some(left), Some(right)) => right.cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
