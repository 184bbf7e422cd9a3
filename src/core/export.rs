use crate::domain::model::{Tweet, TweetRow, TWEET_CSV_HEADER};
use crate::utils::error::{Result, SearchError};
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub fn tweets_to_csv(tweets: &[Tweet]) -> Result<String> {
    // Header written by hand so an empty harvest is still a valid table.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(TWEET_CSV_HEADER)?;
    for tweet in tweets {
        writer.serialize(TweetRow::from(tweet))?;
    }
    let bytes = writer.into_inner().map_err(|e| SearchError::ProcessingError {
        message: format!("flushing CSV: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| SearchError::ProcessingError {
        message: format!("CSV is not UTF-8: {}", e),
    })
}

/// `<id_str>.json`; ids that could escape the data directory are refused.
pub fn tweet_file_name(tweet: &Tweet) -> Result<String> {
    let id = &tweet.id_str;
    if id.is_empty()
        || !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(SearchError::InvalidResponse {
            message: format!("refusing to use tweet id {:?} as a file name", id),
        });
    }
    Ok(format!("{}.json", id))
}

pub fn tweet_json(tweet: &Tweet) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&tweet.raw)?)
}

pub fn combined_json(tweets: &[Tweet]) -> Result<Vec<u8>> {
    let raw: Vec<&serde_json::Value> = tweets.iter().map(|t| &t.raw).collect();
    Ok(serde_json::to_vec_pretty(&raw)?)
}

pub fn zip_files(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(name.as_str(), SimpleFileOptions::default())?;
        zip.write_all(data)?;
    }
    Ok(zip.finish()?.into_inner())
}
