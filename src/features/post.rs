//! LinkedIn-style post records.

use super::buckets::{self, UNKNOWN};
use super::{Category, FeatureExtractor, FeatureRow, Platform, TargetDefinition};
use crate::records::RawRecord;

pub const METRIC_REACTIONS: &str = "reactions";
pub const METRIC_LIKES: &str = "likes";
pub const METRIC_SUPPORTS: &str = "supports";
pub const METRIC_FOLLOWERS: &str = "followers";
pub const METRIC_ENGAGEMENT_RATE: &str = "engagement_rate";
pub const METRIC_MEDIA: &str = "media";
pub const METRIC_DOCUMENT: &str = "document";

static POST_TARGETS: [TargetDefinition; 8] = [
    TargetDefinition::quantile("high_reactions", METRIC_REACTIONS, 0.75),
    TargetDefinition::quantile("high_likes", METRIC_LIKES, 0.75),
    TargetDefinition::quantile("high_supports", METRIC_SUPPORTS, 0.75),
    TargetDefinition::quantile("viral", METRIC_REACTIONS, 0.90),
    TargetDefinition::quantile("high_engagement_rate", METRIC_ENGAGEMENT_RATE, 0.75),
    TargetDefinition::flag("has_document", METRIC_DOCUMENT),
    TargetDefinition::flag("has_media", METRIC_MEDIA),
    TargetDefinition::both("popular_post", "high_reactions", "high_engagement_rate"),
];

/// Hashtag counts above this are "many".
const FEW_HASHTAGS_MAX: usize = 3;
const FEW_MENTIONS_MAX: usize = 2;

/// Feature extraction for posts shaped like
/// `{text, author: {name, follower_count}, stats: {total_reactions, like, support},
/// media, document: {url}, post_type, post_language_code, posted_at: {date}}`.
///
/// Media and document presence become both a categorical token
/// (`with_media`/`no_media`, `with_document`/`no_document`) and a target label,
/// so presence can appear as a cause in target queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostExtractor;

impl FeatureExtractor for PostExtractor {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn targets(&self) -> &'static [TargetDefinition] {
        &POST_TARGETS
    }

    fn extract(&self, record: &RawRecord) -> FeatureRow {
        let mut row = FeatureRow::default();
        let text = record.str_at("text");

        let posted_at = record
            .str_at("posted_at.date")
            .and_then(|raw| buckets::parse_timestamp(&raw));
        for token in buckets::time_tokens(posted_at) {
            row.push_categorical(token);
        }

        row.push_categorical(format!(
            "text_{}",
            buckets::text_length_class(text.as_deref())
        ));

        let post_type = record
            .str_at("post_type")
            .and_then(|t| buckets::slug(&t))
            .unwrap_or_else(|| UNKNOWN.to_string());
        row.push_categorical(format!("type_{}", post_type));

        let language = record
            .str_at("post_language_code")
            .and_then(|l| buckets::slug(&l))
            .unwrap_or_else(|| UNKNOWN.to_string());
        row.push_categorical(format!("lang_{}", language));

        let followers = record.f64_at("author.follower_count");
        row.push_categorical(format!("followers_{}", buckets::follower_class(followers)));

        let hashtags = text
            .as_deref()
            .map(buckets::extract_hashtags)
            .unwrap_or_default();
        let mentions = text
            .as_deref()
            .map(buckets::extract_mentions)
            .unwrap_or_default();
        row.push_categorical(format!(
            "{}_hashtags",
            buckets::count_class(hashtags.len(), FEW_HASHTAGS_MAX)
        ));
        row.push_categorical(format!(
            "{}_mentions",
            buckets::count_class(mentions.len(), FEW_MENTIONS_MAX)
        ));

        let has_media = record.is_present("media");
        let has_document = record.is_present("document.url");
        row.push_categorical(presence_token("media", has_media));
        row.push_categorical(presence_token("document", has_document));

        if let Some(author) = record.str_at("author.name") {
            row.push_entity(Category::Author, &author);
        }
        for tag in &hashtags {
            row.push_entity(Category::Hashtag, tag);
        }
        for mention in &mentions {
            row.push_entity(Category::Mention, mention);
        }

        let reactions = record.metric("stats.total_reactions");
        let followers_count = followers.unwrap_or(0.0).max(0.0);
        let denominator = if followers_count > 0.0 {
            followers_count
        } else {
            1.0
        };
        row.set_metric(METRIC_REACTIONS, reactions);
        row.set_metric(METRIC_LIKES, record.metric("stats.like"));
        row.set_metric(METRIC_SUPPORTS, record.metric("stats.support"));
        row.set_metric(METRIC_FOLLOWERS, followers_count);
        row.set_metric(METRIC_ENGAGEMENT_RATE, reactions / denominator);
        row.set_metric(METRIC_MEDIA, if has_media { 1.0 } else { 0.0 });
        row.set_metric(METRIC_DOCUMENT, if has_document { 1.0 } else { 0.0 });

        row
    }
}

fn presence_token(what: &str, present: bool) -> String {
    if present {
        format!("with_{}", what)
    } else {
        format!("no_{}", what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_post() -> RawRecord {
        RawRecord::new(json!({
            "text": "Big launch today #AI #Startups #ai thanks @maria",
            "author": {"name": "Jane Doe", "follower_count": 4200},
            "stats": {"total_reactions": 210, "like": 180, "support": 12},
            "media": {"type": "image", "url": "https://example.com/a.png"},
            "document": {"url": ""},
            "post_type": "regular",
            "post_language_code": "en",
            "posted_at": {"date": "2024-03-18 08:30:00"}
        }))
    }

    #[test]
    fn test_extract_categorical_tokens() {
        let row = PostExtractor.extract(&sample_post());
        assert_eq!(
            row.categorical,
            vec![
                "time_morning",
                "day_monday",
                "weekday",
                "text_short",
                "type_regular",
                "lang_en",
                "followers_medium",
                "few_hashtags",
                "few_mentions",
                "with_media",
                "no_document",
            ]
        );
    }

    #[test]
    fn test_extract_entities_and_metrics() {
        let row = PostExtractor.extract(&sample_post());

        assert_eq!(row.entity_tokens(Category::Author), ["author_jane_doe"]);
        assert_eq!(
            row.entity_tokens(Category::Hashtag),
            ["hashtag_ai", "hashtag_startups"]
        );
        assert_eq!(row.entity_tokens(Category::Mention), ["mention_maria"]);

        assert_eq!(row.metric(METRIC_REACTIONS), 210.0);
        assert_eq!(row.metric(METRIC_LIKES), 180.0);
        assert_eq!(row.metric(METRIC_SUPPORTS), 12.0);
        assert!((row.metric(METRIC_ENGAGEMENT_RATE) - 210.0 / 4200.0).abs() < 1e-12);
        assert_eq!(row.metric(METRIC_MEDIA), 1.0);
        assert_eq!(row.metric(METRIC_DOCUMENT), 0.0);
    }

    #[test]
    fn test_empty_record_maps_to_unknown_buckets() {
        let row = PostExtractor.extract(&RawRecord::new(json!({})));

        assert_eq!(
            row.categorical,
            vec![
                "time_unknown",
                "day_unknown",
                "weekpart_unknown",
                "text_unknown",
                "type_unknown",
                "lang_unknown",
                "followers_unknown",
                "no_hashtags",
                "no_mentions",
                "no_media",
                "no_document",
            ]
        );
        assert!(row.entities.is_empty());
        assert_eq!(row.metric(METRIC_REACTIONS), 0.0);
        assert_eq!(row.metric(METRIC_ENGAGEMENT_RATE), 0.0);
    }

    #[test]
    fn test_presence_tokens_always_emitted() {
        let without = PostExtractor.extract(&RawRecord::new(json!({
            "text": "Plain text post",
            "media": {}
        })));
        assert!(without.categorical.contains(&"no_media".to_string()));
        assert!(without.categorical.contains(&"no_document".to_string()));
        assert_eq!(without.metric(METRIC_MEDIA), 0.0);

        let with = PostExtractor.extract(&RawRecord::new(json!({
            "media": {"type": "image"},
            "document": {"url": "https://example.com/deck.pdf"}
        })));
        assert!(with.categorical.contains(&"with_media".to_string()));
        assert!(with.categorical.contains(&"with_document".to_string()));
        assert_eq!(with.metric(METRIC_DOCUMENT), 1.0);
    }

    #[test]
    fn test_zero_followers_uses_unit_denominator() {
        let record = RawRecord::new(json!({
            "author": {"follower_count": 0},
            "stats": {"total_reactions": 7}
        }));
        let row = PostExtractor.extract(&record);
        assert_eq!(row.metric(METRIC_ENGAGEMENT_RATE), 7.0);
        assert_eq!(row.categorical[6], "followers_small");
    }

    #[test]
    fn test_target_vocabulary() {
        assert_eq!(
            PostExtractor.target_labels(),
            vec![
                "high_reactions",
                "high_likes",
                "high_supports",
                "viral",
                "high_engagement_rate",
                "has_document",
                "has_media",
                "popular_post",
            ]
        );
    }
}
