//! `summary.json` loading.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{BookInfo, ChapterMark};

pub const SUMMARY_FILE_NAME: &str = "summary.json";

#[derive(Debug, Deserialize)]
struct RawSummary {
    #[serde(rename = "共通ファイル名")]
    file_code: String,
    #[serde(rename = "タイトル")]
    title: String,
    #[serde(rename = "作者名")]
    author: String,
    #[serde(rename = "あらすじ", default)]
    synopsis: Vec<String>,
    #[serde(rename = "キーワード", default)]
    keywords: Vec<String>,
    #[serde(rename = "ジャンル", default)]
    genre: Option<String>,
    #[serde(rename = "掲載日", default)]
    published: String,
    #[serde(rename = "更新")]
    updated: String,
    #[serde(rename = "URL")]
    url: String,
    #[serde(default)]
    chapters: Vec<RawChapter>,
}

#[derive(Debug, Deserialize)]
struct RawChapter {
    title: String,
    begin: u32,
}

/// Parsed summary: book metadata plus the chapter file prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub info: BookInfo,
    /// Common prefix of the chapter file names (`<code>-<n>.txt`).
    pub file_code: String,
}

/// Load `summary.json` from a novel folder.
pub fn load_summary(dir: &Path) -> Result<Summary> {
    let path = dir.join(SUMMARY_FILE_NAME);
    let json = match fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::MissingSummary { path });
        }
        Err(e) => return Err(e.into()),
    };
    parse_summary(&json, &path)
}

/// Parse summary JSON; `path` is only used for error messages.
pub fn parse_summary(json: &str, path: &Path) -> Result<Summary> {
    let raw: RawSummary = serde_json::from_str(json).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if raw.file_code.trim().is_empty() {
        return Err(Error::InvalidSummary("empty chapter file code".into()));
    }

    let updated = parse_timestamp(&raw.updated)?;

    let mut info_table = vec![
        ("あらすじ".to_string(), raw.synopsis),
        ("作者".to_string(), vec![raw.author.clone()]),
        ("キーワード".to_string(), vec![raw.keywords.join(" ")]),
    ];
    if let Some(genre) = raw.genre {
        info_table.push(("ジャンル".to_string(), vec![genre]));
    }
    info_table.push(("掲載日".to_string(), vec![raw.published]));
    info_table.push(("更新".to_string(), vec![raw.updated]));
    info_table.push(("URL".to_string(), vec![raw.url.clone()]));

    let mut outline: Vec<ChapterMark> = raw
        .chapters
        .into_iter()
        .map(|c| ChapterMark::new(c.title, c.begin))
        .collect();
    outline.sort_by_key(|mark| mark.begin);

    Ok(Summary {
        info: BookInfo {
            title: raw.title,
            author: raw.author,
            updated,
            package_id: raw.url,
            info_table,
            outline,
        },
        file_code: raw.file_code,
    })
}

const NAIVE_FORMATS: [&str; 7] = [
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y年%m月%d日 %H時%M分",
    "%Y年%m月%d日 %H時%M分%S秒",
];

/// Date-only ISO 8601, read as midnight UTC.
const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y年%m月%d日"];

/// Parse the summary's update time.
///
/// RFC 3339 values carry their own offset and a bare `YYYY-MM-DD` is UTC
/// midnight. Anything else without an offset is read as local time.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Some(midnight) = NaiveDate::parse_from_str(value, ISO_DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&midnight));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|fmt| {
                NaiveDate::parse_from_str(value, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
        .ok_or_else(|| Error::InvalidTimestamp(value.to_string()))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::InvalidTimestamp(value.to_string()))
}
