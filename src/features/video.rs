//! TikTok-style video records.

use super::buckets::{self, UNKNOWN};
use super::{Category, FeatureExtractor, FeatureRow, Platform, TargetDefinition};
use crate::records::RawRecord;

pub const METRIC_VIEWS: &str = "views";
pub const METRIC_LIKES: &str = "likes";
pub const METRIC_SHARES: &str = "shares";
pub const METRIC_COMMENTS: &str = "comments";
pub const METRIC_FOLLOWERS: &str = "followers";
pub const METRIC_DURATION: &str = "duration";
pub const METRIC_ENGAGEMENT_RATE: &str = "engagement_rate";

static VIDEO_TARGETS: [TargetDefinition; 7] = [
    TargetDefinition::quantile("high_views", METRIC_VIEWS, 0.75),
    TargetDefinition::quantile("high_likes", METRIC_LIKES, 0.75),
    TargetDefinition::quantile("high_shares", METRIC_SHARES, 0.75),
    TargetDefinition::quantile("high_comments", METRIC_COMMENTS, 0.75),
    TargetDefinition::quantile("viral", METRIC_VIEWS, 0.90),
    TargetDefinition::quantile("high_engagement_rate", METRIC_ENGAGEMENT_RATE, 0.75),
    TargetDefinition::both("highly_shareable", "high_shares", "high_engagement_rate"),
];

const FEW_HASHTAGS_MAX: usize = 3;
const FEW_MENTIONS_MAX: usize = 2;

/// Feature extraction for videos shaped like the TikTok scraper output:
/// `{text, authorMeta: {name, fans}, diggCount, shareCount, playCount,
/// commentCount, videoMeta: {duration}, musicMeta: {musicName, musicAuthor,
/// musicOriginal}, createTimeISO}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoExtractor;

impl FeatureExtractor for VideoExtractor {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn targets(&self) -> &'static [TargetDefinition] {
        &VIDEO_TARGETS
    }

    fn extract(&self, record: &RawRecord) -> FeatureRow {
        let mut row = FeatureRow::default();
        let text = record.str_at("text");

        let posted_at = record
            .str_at("createTimeISO")
            .and_then(|raw| buckets::parse_timestamp(&raw))
            .or_else(|| record.f64_at("createTime").and_then(buckets::parse_epoch));
        for token in buckets::time_tokens(posted_at) {
            row.push_categorical(token);
        }

        row.push_categorical(format!(
            "text_{}",
            buckets::text_length_class(text.as_deref())
        ));

        let duration = record
            .f64_at("videoMeta.duration")
            .filter(|d| *d > 0.0);
        row.push_categorical(format!("duration_{}", buckets::duration_class(duration)));

        let language = record
            .str_at("textLanguage")
            .and_then(|l| buckets::slug(&l))
            .unwrap_or_else(|| UNKNOWN.to_string());
        row.push_categorical(format!("lang_{}", language));

        let followers = record.f64_at("authorMeta.fans");
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

        let sound = match record.bool_at("musicMeta.musicOriginal") {
            Some(true) => "original_sound",
            Some(false) => "licensed_sound",
            None => "sound_unknown",
        };
        row.push_categorical(sound);

        if let Some(author) = record.str_at("authorMeta.name") {
            row.push_entity(Category::Author, &author);
        }
        for tag in &hashtags {
            row.push_entity(Category::Hashtag, tag);
        }
        for mention in &mentions {
            row.push_entity(Category::Mention, mention);
        }
        if let Some(music) = record
            .str_at("musicMeta.musicName")
            .or_else(|| record.str_at("musicMeta.musicAuthor"))
        {
            row.push_entity(Category::Music, &music);
        }

        let views = record.metric("playCount");
        let likes = record.metric("diggCount");
        let shares = record.metric("shareCount");
        let comments = record.metric("commentCount");
        let denominator = if views > 0.0 { views } else { 1.0 };
        row.set_metric(METRIC_VIEWS, views);
        row.set_metric(METRIC_LIKES, likes);
        row.set_metric(METRIC_SHARES, shares);
        row.set_metric(METRIC_COMMENTS, comments);
        row.set_metric(METRIC_FOLLOWERS, followers.unwrap_or(0.0).max(0.0));
        row.set_metric(METRIC_DURATION, duration.unwrap_or(0.0));
        row.set_metric(
            METRIC_ENGAGEMENT_RATE,
            (likes + shares + comments) / denominator,
        );

        row
    }
}
