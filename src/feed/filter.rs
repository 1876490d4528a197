use crate::models::FeedItem;

/// Decides whether a fetched item should be dropped before persistence.
/// A keyword excludes the item when it matches the title as a
/// case-insensitive substring, or appears verbatim in the item's category
/// set. Pure and deterministic; an empty keyword list excludes nothing.
pub fn should_skip(item: &FeedItem, keywords: &[String]) -> bool {
    let title = item.title.to_lowercase();

    keywords.iter().any(|keyword| {
        title.contains(&keyword.to_lowercase())
            || item.categories.iter().any(|category| category == keyword)
    })
}
