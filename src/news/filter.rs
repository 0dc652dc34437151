use std::fmt;
use std::str::FromStr;

use super::model::{NewsEntry, Tag};

/// Tag dimension of the feed filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagFilter {
    #[default]
    All,
    Only(Tag),
}

impl TagFilter {
    pub fn matches(self, entry: &NewsEntry) -> bool {
        match self {
            Self::All => true,
            Self::Only(tag) => entry.tag == tag,
        }
    }
}

impl FromStr for TagFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        Tag::from_str(s).map(Self::Only).map_err(|_| {
            let known: Vec<&str> = Tag::ALL.iter().map(|t| t.as_str()).collect();
            format!("unknown tag filter '{}' (expected all, {})", s, known.join(", "))
        })
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(tag) => tag.fmt(f),
        }
    }
}

/// Case-insensitive substring match against title, description and tag.
/// Blank queries match everything; any other query is matched as typed,
/// surrounding whitespace included.
pub fn matches_query(entry: &NewsEntry, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    entry.title.to_lowercase().contains(&needle)
        || entry.description.to_lowercase().contains(&needle)
        || entry.tag.as_str().contains(&needle)
}

/// Entries matching both the query and the tag filter, in feed order.
pub fn filter<'a>(entries: &'a [NewsEntry], query: &str, tag_filter: TagFilter) -> Vec<&'a NewsEntry> {
    entries
        .iter()
        .filter(|entry| tag_filter.matches(entry) && matches_query(entry, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn entry(id: i64, title: &str, description: &str, tag: Tag) -> NewsEntry {
        NewsEntry {
            id,
            title: title.to_string(),
            description: description.to_string(),
            tag,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            image_url: None,
        }
    }

    fn sample() -> Vec<NewsEntry> {
        vec![
            entry(4, "Season 3 Launch", "New maps and ranked rewards", Tag::Update),
            entry(2, "Server maintenance", "Downtime on Friday", Tag::Announcement),
            entry(7, "Community Cup", "Sign up for the weekend EVENT", Tag::Event),
            entry(5, "Patch 3.1", "Launcher fixes", Tag::Update),
        ]
    }

    fn ids(entries: &[&NewsEntry]) -> Vec<i64> {
        entries.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_empty_query_all_is_identity() {
        let entries = sample();
        assert_eq!(ids(&filter(&entries, "", TagFilter::All)), vec![4, 2, 7, 5]);
        assert_eq!(ids(&filter(&entries, "   \t", TagFilter::All)), vec![4, 2, 7, 5]);
    }

    #[test]
    fn test_query_whitespace_is_significant() {
        let entries = sample();
        assert_eq!(ids(&filter(&entries, " cup", TagFilter::All)), vec![7]);
        assert_eq!(ids(&filter(&entries, "cup ", TagFilter::All)), Vec::<i64>::new());
        assert_eq!(ids(&filter(&entries, "3 launch", TagFilter::All)), vec![4]);
    }

    #[test]
    fn test_tag_filter_exact_match() {
        let entries = sample();
        assert_eq!(ids(&filter(&entries, "", TagFilter::Only(Tag::Update))), vec![4, 5]);
        assert_eq!(ids(&filter(&entries, "", TagFilter::Only(Tag::Event))), vec![7]);
    }

    #[test]
    fn test_query_case_insensitive_across_fields() {
        let entries = sample();
        // title
        assert_eq!(ids(&filter(&entries, "SEASON", TagFilter::All)), vec![4]);
        // description
        assert_eq!(ids(&filter(&entries, "downtime", TagFilter::All)), vec![2]);
        // tag name
        assert_eq!(ids(&filter(&entries, "announce", TagFilter::All)), vec![2]);
        // description and title across entries
        assert_eq!(ids(&filter(&entries, "launch", TagFilter::All)), vec![4, 5]);
    }

    #[test]
    fn test_query_and_tag_compose() {
        let entries = sample();
        assert_eq!(ids(&filter(&entries, "launch", TagFilter::Only(Tag::Update))), vec![4, 5]);
        assert_eq!(ids(&filter(&entries, "event", TagFilter::Only(Tag::Update))), Vec::<i64>::new());
        assert_eq!(ids(&filter(&entries, "event", TagFilter::Only(Tag::Event))), vec![7]);
    }

    #[test]
    fn test_coerced_tag_filters_as_announcement() {
        let raw = crate::news::model::WireNewsEntry {
            id: 9,
            title: "Shop sale".to_string(),
            description: "Half off".to_string(),
            tag: "promo".to_string(),
            created_at: "2025-01-01T00:00:00Z".to_string(),
            image_url: None,
        };
        let entries = crate::news::model::ingest(vec![raw]);

        assert_eq!(filter(&entries, "", TagFilter::Only(Tag::Announcement)).len(), 1);
        assert_eq!(filter(&entries, "", TagFilter::All).len(), 1);
        assert!(filter(&entries, "", TagFilter::Only(Tag::Update)).is_empty());
        assert!(filter(&entries, "", TagFilter::Only(Tag::Event)).is_empty());
        assert!(filter(&entries, "promo", TagFilter::All).is_empty());
    }

    #[test]
    fn test_tag_filter_parse() {
        assert_eq!("all".parse::<TagFilter>(), Ok(TagFilter::All));
        assert_eq!("ALL".parse::<TagFilter>(), Ok(TagFilter::All));
        assert_eq!("event".parse::<TagFilter>(), Ok(TagFilter::Only(Tag::Event)));
        let err = "promo".parse::<TagFilter>().unwrap_err();
        assert_eq!(
            err,
            "unknown tag filter 'promo' (expected all, update, announcement, event)"
        );
        assert_eq!(TagFilter::Only(Tag::Update).to_string(), "update");
    }

    fn arb_tag() -> impl Strategy<Value = Tag> {
        prop_oneof![Just(Tag::Update), Just(Tag::Announcement), Just(Tag::Event)]
    }

    fn arb_tag_filter() -> impl Strategy<Value = TagFilter> {
        prop_oneof![Just(TagFilter::All), arb_tag().prop_map(TagFilter::Only)]
    }

    fn arb_entries() -> impl Strategy<Value = Vec<NewsEntry>> {
        prop::collection::vec(
            (0i64..50, "[a-zA-Z ]{0,12}", "[a-zA-Z ]{0,20}", arb_tag()),
            0..12,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .map(|(id, title, description, tag)| entry(id, &title, &description, tag))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_filter_is_ordered_subset(
            entries in arb_entries(),
            query in "[a-zA-Z ]{0,4}",
            tag in arb_tag_filter(),
        ) {
            let result = filter(&entries, &query, tag);
            let mut cursor = entries.iter();
            for hit in result {
                prop_assert!(cursor.any(|e| std::ptr::eq(e, hit)));
            }
        }

        #[test]
        fn prop_filter_dimensions_commute(
            entries in arb_entries(),
            query in "[a-zA-Z ]{0,4}",
            tag in arb_tag_filter(),
        ) {
            let both = ids(&filter(&entries, &query, tag));

            let by_tag: Vec<NewsEntry> = filter(&entries, "", tag).into_iter().cloned().collect();
            let tag_then_query = ids(&filter(&by_tag, &query, TagFilter::All));

            let by_query: Vec<NewsEntry> = filter(&entries, &query, TagFilter::All).into_iter().cloned().collect();
            let query_then_tag = ids(&filter(&by_query, "", tag));

            prop_assert_eq!(&both, &tag_then_query);
            prop_assert_eq!(&both, &query_then_tag);
        }
    }
}
