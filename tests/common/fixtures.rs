//! Record generators for end-to-end tests

use super::constants::*;
use engagement_miner::config::MiningParams;
use engagement_miner::records::RawRecord;
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

fn post_value(i: usize) -> Value {
    if i % POST_PATTERN_EVERY == 0 {
        json!({
            "text": "Launching today #rust #ai",
            "author": { "name": "Ada Lovelace", "follower_count": 5000 },
            "stats": { "total_reactions": 500 + i, "like": 400 + i, "support": 3 },
            "media": { "type": "image", "url": "https://example.com/a.png" },
            "post_type": "regular",
            "post_language_code": "en",
            "posted_at": { "date": "2024-03-05 09:30:00" }
        })
    } else {
        json!({
            "text": "Some thoughts on the weekend about careers and long-term planning in tech, \
                     written with no hashtags at all and slightly more words than usual.",
            "author": { "name": format!("Author {}", i % 5), "follower_count": 200 },
            "stats": { "total_reactions": i % 7 + 1, "like": i % 7, "support": 0 },
            "post_type": "regular",
            "post_language_code": "en",
            "posted_at": { "date": "2024-03-09 21:15:00" }
        })
    }
}

/// Posts where the Tuesday-morning group carries media and the top
/// reactions.
pub fn post_records() -> Vec<RawRecord> {
    (0..POST_COUNT).map(|i| RawRecord::new(post_value(i))).collect()
}

fn video_value(i: usize) -> Value {
    if i % VIDEO_PATTERN_EVERY == 0 {
        json!({
            "text": "Quick tip #coding",
            "authorMeta": { "name": "dev.tips", "fans": 20000 },
            "playCount": 10000 + i * 10,
            "diggCount": 900,
            "shareCount": 1000 + i,
            "commentCount": 50,
            "videoMeta": { "duration": 10 },
            "musicMeta": { "musicName": "original sound", "musicAuthor": "dev.tips", "musicOriginal": true },
            "createTimeISO": "2024-03-06T19:00:00.000Z"
        })
    } else {
        json!({
            "text": "A longer walkthrough of my desk setup",
            "authorMeta": { "name": format!("creator{}", i % 6), "fans": 800 },
            "playCount": 10000 + i * 10,
            "diggCount": 100,
            "shareCount": 5,
            "commentCount": 4,
            "videoMeta": { "duration": 90 },
            "musicMeta": { "musicName": "Popular Song", "musicAuthor": "Band", "musicOriginal": false },
            "createTimeISO": "2024-03-10T03:00:00.000Z"
        })
    }
}

/// Videos where the short original-sound group gets the most shares.
pub fn video_records() -> Vec<RawRecord> {
    (0..VIDEO_COUNT).map(|i| RawRecord::new(video_value(i))).collect()
}

/// Low thresholds with caps far above what the fixtures produce.
pub fn open_params(min_support: f64) -> MiningParams {
    MiningParams {
        min_support,
        min_confidence: 0.6,
        min_lift: 1.01,
        max_itemset_length: 3,
        max_features_per_category: 10,
        min_category_frequency: 2,
        use_sampling: false,
        sample_ratio: 1.0,
        max_itemsets: 100_000,
        max_rules: 100_000,
        ..Default::default()
    }
}

pub fn write_jsonl(records: &[RawRecord]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for record in records {
        writeln!(file, "{}", record.value()).unwrap();
    }
    file
}

pub fn write_json_array(records: &[RawRecord]) -> NamedTempFile {
    let values: Vec<&Value> = records.iter().map(|r| r.value()).collect();
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::to_string_pretty(&values).unwrap()).unwrap();
    file
}
