// 🗂️ Local Dataset Source - CSV-backed StatSource
// Per-season rows in, canonical StatRecords out

use crate::record::{Entity, NewsItem, Period, PlayerId, StatRecord, StatValue};
use crate::source::{is_searchable, SourceError, SourceResult, StatSource, SEARCH_LIMIT};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

pub const STATS_FILE: &str = "stats.csv";
pub const NEWS_FILE: &str = "news.csv";

const ID_COLUMN: &str = "player_id";
const NAME_COLUMN: &str = "player_name";
const SEASON_COLUMN: &str = "season";

// ============================================================================
// IN-MEMORY SHAPE
// ============================================================================

#[derive(Debug, Clone)]
struct PlayerSeasons {
    name: String,
    /// Season label → fields. BTreeMap keeps seasons oldest → newest.
    seasons: BTreeMap<String, BTreeMap<String, StatValue>>,
}

#[derive(Debug, Deserialize)]
struct NewsRow {
    player_name: String,
    title: String,
    link: String,
    published: DateTime<Utc>,
}

// ============================================================================
// CSV STAT SOURCE
// ============================================================================

/// CsvStatSource - serves the StatSource contract from local files
///
/// `stats.csv` columns: `player_id, player_name, season, <stat columns…>`.
/// Every column past the first three becomes a record field; blank cells
/// are left out so they read as missing.
#[derive(Debug, Clone, Default)]
pub struct CsvStatSource {
    players: BTreeMap<PlayerId, PlayerSeasons>,
    news: Vec<(String, NewsItem)>,
}

impl CsvStatSource {
    /// Load `stats.csv` (required) and `news.csv` (optional) from a directory
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let stats_path = dir.join(STATS_FILE);
        let stats = std::fs::File::open(&stats_path)
            .with_context(|| format!("Failed to open {}", stats_path.display()))?;

        let mut source = CsvStatSource::from_stats_reader(stats)
            .with_context(|| format!("Failed to load {}", stats_path.display()))?;

        let news_path = dir.join(NEWS_FILE);
        if news_path.exists() {
            let news = std::fs::File::open(&news_path)
                .with_context(|| format!("Failed to open {}", news_path.display()))?;
            source
                .load_news(news)
                .with_context(|| format!("Failed to load {}", news_path.display()))?;
        } else {
            debug!(path = %news_path.display(), "no news file, news disabled");
        }

        info!(
            players = source.player_count(),
            news = source.news.len(),
            "dataset loaded"
        );
        Ok(source)
    }

    pub fn from_stats_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().context("Failed to read CSV header")?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow!("Missing required column '{}'", name))
        };
        let id_ix = column(ID_COLUMN)?;
        let name_ix = column(NAME_COLUMN)?;
        let season_ix = column(SEASON_COLUMN)?;

        let mut players: BTreeMap<PlayerId, PlayerSeasons> = BTreeMap::new();

        for (line, result) in rdr.records().enumerate() {
            let row = result.with_context(|| format!("Failed to read row {}", line + 1))?;

            let id: u32 = row
                .get(id_ix)
                .unwrap_or("")
                .parse()
                .with_context(|| format!("Invalid player_id on row {}", line + 1))?;
            let name = row.get(name_ix).unwrap_or("").to_string();
            let season = row.get(season_ix).unwrap_or("").to_string();
            if season.is_empty() {
                warn!(row = line + 1, player = id, "row without season skipped");
                continue;
            }

            let mut fields = BTreeMap::new();
            for (ix, header) in headers.iter().enumerate() {
                if ix == id_ix || ix == name_ix || ix == season_ix {
                    continue;
                }
                if let Some(value) = row.get(ix).and_then(StatValue::from_cell) {
                    fields.insert(header.to_string(), value);
                }
            }

            players
                .entry(PlayerId(id))
                .or_insert_with(|| PlayerSeasons {
                    name,
                    seasons: BTreeMap::new(),
                })
                .seasons
                .insert(season, fields);
        }

        Ok(CsvStatSource {
            players,
            news: Vec::new(),
        })
    }

    pub fn load_news<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        for result in rdr.deserialize() {
            let row: NewsRow = result.context("Failed to deserialize news row")?;
            self.news.push((
                row.player_name,
                NewsItem {
                    title: row.title,
                    link: row.link,
                    published_at: row.published,
                },
            ));
        }
        Ok(())
    }

    pub fn entity(&self, id: PlayerId) -> Option<Entity> {
        self.players.get(&id).map(|p| Entity {
            id,
            display_name: p.name.clone(),
        })
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Resolve a requested period against what a player has.
    ///
    /// `Unspecified` and unknown seasons both fall back to the most recent
    /// season. Returns None only when the player has no seasons at all.
    fn resolve_season<'a>(player: &'a PlayerSeasons, period: &Period) -> Option<&'a str> {
        let latest = player.seasons.keys().next_back().map(String::as_str);
        match period.as_season() {
            None => latest,
            Some(season) => match player.seasons.get_key_value(season) {
                Some((key, _)) => Some(key.as_str()),
                None => {
                    warn!(
                        requested = season,
                        fallback = latest.unwrap_or("-"),
                        "season not available, using default"
                    );
                    latest
                }
            },
        }
    }

    fn lookup(&self, id: PlayerId, period: &Period) -> SourceResult<StatRecord> {
        let player = self.players.get(&id).ok_or(SourceError::NotFound(id))?;

        let mut record = StatRecord::new()
            .with_available_periods(player.seasons.keys().cloned());

        if let Some(season) = Self::resolve_season(player, period) {
            record.period = Some(season.to_string());
            if let Some(fields) = player.seasons.get(season) {
                record.fields = fields.clone();
            }
        }
        Ok(record)
    }

    fn matching(&self, query: &str) -> Vec<Entity> {
        if !is_searchable(query) {
            return Vec::new();
        }
        let needle = query.trim().to_lowercase();
        self.players
            .iter()
            .filter(|(_, p)| p.name.to_lowercase().contains(&needle))
            .take(SEARCH_LIMIT)
            .map(|(id, p)| Entity {
                id: *id,
                display_name: p.name.clone(),
            })
            .collect()
    }

    fn news_for(&self, entity_name: &str) -> Vec<NewsItem> {
        let mut items: Vec<NewsItem> = self
            .news
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(entity_name.trim()))
            .map(|(_, item)| item.clone())
            .collect();
        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        items
    }
}

impl StatSource for CsvStatSource {
    async fn search(&self, name_prefix: &str) -> SourceResult<Vec<Entity>> {
        Ok(self.matching(name_prefix))
    }

    async fn get_stats(&self, id: PlayerId, period: &Period) -> SourceResult<StatRecord> {
        self.lookup(id, period)
    }

    async fn get_news(&self, entity_name: &str) -> SourceResult<Vec<NewsItem>> {
        Ok(self.news_for(entity_name))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const STATS: &str = "\
player_id,player_name,season,GP,PPG,RPG,APG,FG_PCT,FG3_PCT,FT_PCT
2544,LeBron James,2019-20,67,25.3,7.8,10.2,0.493,0.348,0.693
2544,LeBron James,2020-21,45,25.0,7.7,7.8,0.513,0.365,0.698
201939,Stephen Curry,2020-21,63,32.0,5.5,5.8,0.482,0.421,0.916
201939,Stephen Curry,2021-22,64,25.5,5.2,6.3,0.437,0.380,
1629029,Luka Doncic,2021-22,65,28.4,9.1,8.7,0.457,DNP,0.744
";

    const NEWS: &str = "\
player_name,title,link,published
Stephen Curry,Older headline,https://example.com/a,2024-01-02T10:00:00Z
Stephen Curry,Newer headline,https://example.com/b,2024-03-05T18:30:00Z
LeBron James,Other player,https://example.com/c,2024-02-01T00:00:00Z
";

    fn source() -> CsvStatSource {
        let mut source = CsvStatSource::from_stats_reader(STATS.as_bytes()).unwrap();
        source.load_news(NEWS.as_bytes()).unwrap();
        source
    }

    #[tokio::test]
    async fn test_default_period_is_most_recent() {
        let record = source().get_stats(PlayerId(2544), &Period::Unspecified).await.unwrap();

        assert_eq!(record.period.as_deref(), Some("2020-21"));
        assert_eq!(record.available_periods, vec!["2019-20", "2020-21"]);
        assert_eq!(record.number("PPG"), Some(25.0));
    }

    #[tokio::test]
    async fn test_specific_period() {
        let record = source()
            .get_stats(PlayerId(2544), &Period::season("2019-20"))
            .await
            .unwrap();
        assert_eq!(record.period.as_deref(), Some("2019-20"));
        assert_eq!(record.number("APG"), Some(10.2));
    }

    #[tokio::test]
    async fn test_unknown_period_falls_back_to_default() {
        let record = source()
            .get_stats(PlayerId(201939), &Period::season("1999-00"))
            .await
            .unwrap();
        assert_eq!(record.period.as_deref(), Some("2021-22"));
    }

    #[tokio::test]
    async fn test_blank_and_text_cells() {
        let curry = source()
            .get_stats(PlayerId(201939), &Period::Unspecified)
            .await
            .unwrap();
        assert!(curry.get("FT_PCT").is_none(), "blank cell should be missing");

        let luka = source()
            .get_stats(PlayerId(1629029), &Period::Unspecified)
            .await
            .unwrap();
        assert_eq!(luka.get("FG3_PCT"), Some(&StatValue::from("DNP")));
    }

    #[tokio::test]
    async fn test_unknown_player() {
        let err = source()
            .get_stats(PlayerId(1), &Period::Unspecified)
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::NotFound(PlayerId(1)));
    }

    #[tokio::test]
    async fn test_search_requires_three_chars() {
        let source = source();
        assert!(source.search("st").await.unwrap().is_empty());

        let hits = source.search("CURR").await.unwrap();
        assert_eq!(hits, vec![Entity::new(201939, "Stephen Curry")]);
    }

    #[tokio::test]
    async fn test_news_newest_first() {
        let news = source().get_news("stephen curry").await.unwrap();
        assert_eq!(news.len(), 2);
        assert_eq!(news[0].title, "Newer headline");
    }

    #[test]
    fn test_missing_required_column() {
        let err = CsvStatSource::from_stats_reader("player_id,season,PPG\n1,2020-21,3\n".as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("player_name"));
    }
}
