use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::models::{BuiltBatch, BuiltItem, MediaType, Metadata, NormalizedTitle};

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

/// Date format of `BuiltItem::date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const TOP_STREAKS: usize = 3;
const SAMPLE_MOVIES_PER_GENRE: usize = 5;
const WORKS_PER_GENRE: usize = 3;
const LEADERBOARD_LIMIT: usize = 50;
const UNRESOLVED_LIMIT: usize = 30;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub views: usize,
    pub duration_minutes: u64,
}

impl Metric {
    fn record(&mut self, duration: u64) {
        self.views += 1;
        self.duration_minutes = self.duration_minutes.saturating_add(duration);
    }
}

/// A maximal run of consecutive days that each had at least one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub length_days: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A maximal run of days without views, bounded on both sides by active days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gap {
    pub length_days: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreStat {
    pub name: String,
    pub duration_minutes: u64,
    pub views: usize,
    pub share_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Spike {
    /// 1 = January.
    pub month: u32,
    pub duration_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleMovie {
    pub title: String,
    pub duration_minutes: u64,
    pub vote_average: f64,
    pub popularity: f64,
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleStat {
    pub title: String,
    pub media_type: MediaType,
    pub duration_minutes: u64,
    pub views: usize,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub poster_path: Option<String>,
}

impl TitleStat {
    /// Zero (or missing) means the catalog has no rating for the work.
    pub fn rating(&self) -> f64 {
        self.vote_average.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesStat {
    pub series_name: String,
    pub duration_minutes: u64,
    pub views: usize,
    pub span_start: NaiveDate,
    pub span_end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedItem {
    pub title: String,
    pub media_type: MediaType,
    pub views: usize,
}

/// Year-in-review statistics for one target year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub year: i32,

    // Provenance, copied from the batch
    pub generated_at: String,
    pub source: Option<String>,

    pub total_views: usize,
    pub total_duration_minutes: u64,
    pub active_days: usize,

    pub top_streaks: Vec<Streak>,
    pub max_gap: Option<Gap>,

    /// January first.
    pub monthly: [Metric; 12],
    /// Monday first.
    pub weekday: [Metric; 7],

    pub genre_stats: Vec<GenreStat>,
    pub genre_month_spike: BTreeMap<String, Spike>,
    pub genre_sample_movies: BTreeMap<String, Vec<SampleMovie>>,
    pub genre_top_works: BTreeMap<String, Vec<TitleStat>>,
    pub genre_worst_works: BTreeMap<String, Vec<TitleStat>>,

    pub top_titles_by_duration: Vec<TitleStat>,
    pub top_titles_by_views: Vec<TitleStat>,

    pub top_series_by_duration: Vec<SeriesStat>,
    pub top_series_by_views: Vec<SeriesStat>,

    pub unresolved_count: usize,
    pub unresolved_list: Vec<UnresolvedItem>,
}

impl Stats {
    pub fn resolved_views(&self) -> usize {
        self.total_views.saturating_sub(self.unresolved_count)
    }

    /// Percentage of views that carried catalog metadata.
    pub fn coverage_percent(&self) -> f64 {
        share_of(self.resolved_views() as u64, self.total_views as u64)
    }

    /// Percentage of the target year's days with at least one view.
    pub fn active_day_percent(&self) -> f64 {
        share_of(self.active_days as u64, days_in_year(self.year))
    }

    pub fn longest_streak(&self) -> Option<&Streak> {
        self.top_streaks.first()
    }
}

fn share_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn days_in_year(year: i32) -> u64 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Computes the statistics snapshot for `year`.
///
/// Items dated outside the year, or whose date does not parse, are ignored
/// entirely. Items without metadata still count as views and are tallied as
/// unresolved.
pub fn compute(batch: &BuiltBatch, year: i32) -> Stats {
    let mut acc = Accumulator::default();
    let mut out_of_year = 0usize;
    let mut unparseable = 0usize;

    for item in &batch.items {
        match parse_date(&item.date) {
            Some(date) if date.year() == year => acc.record(date, item),
            Some(_) => out_of_year += 1,
            None => unparseable += 1,
        }
    }

    if out_of_year > 0 || unparseable > 0 {
        debug!(year, out_of_year, unparseable, "skipped items");
    }

    let stats = acc.finish(year, batch);

    info!(
        year,
        views = stats.total_views,
        duration_minutes = stats.total_duration_minutes,
        active_days = stats.active_days,
        unresolved = stats.unresolved_count,
        "computed stats"
    );

    stats
}

/// Parses a strict zero-padded `YYYY-MM-DD` date. chrono alone also accepts
/// unpadded fields, signs and leading whitespace.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(s, DATE_FORMAT).ok()?;
    (date.format(DATE_FORMAT).to_string() == s).then_some(date)
}

// ---------------------------------------------------------------------------
// Accumulation (single pass)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct TitleKey {
    title: String,
    media_type: MediaType,
}

impl TitleKey {
    fn of(n: &NormalizedTitle) -> Self {
        Self {
            title: n.work_title.clone(),
            media_type: n.media_type,
        }
    }
}

#[derive(Debug, Default)]
struct TitleAcc {
    metric: Metric,
    // Last resolved viewing wins
    vote_average: Option<f64>,
    popularity: Option<f64>,
    poster_path: Option<String>,
    genres: Vec<String>,
}

impl TitleAcc {
    fn to_stat(&self, key: &TitleKey) -> TitleStat {
        TitleStat {
            title: key.title.clone(),
            media_type: key.media_type,
            duration_minutes: self.metric.duration_minutes,
            views: self.metric.views,
            vote_average: self.vote_average,
            popularity: self.popularity,
            poster_path: self.poster_path.clone(),
        }
    }
}

#[derive(Debug)]
struct SeriesAcc {
    metric: Metric,
    span_start: NaiveDate,
    span_end: NaiveDate,
}

#[derive(Debug, Default)]
struct Accumulator {
    total_views: usize,
    total_duration_minutes: u64,
    unresolved_count: usize,
    dates: Vec<NaiveDate>,
    monthly: [Metric; 12],
    weekday: [Metric; 7],
    genres: BTreeMap<String, Metric>,
    genre_months: BTreeMap<String, [u64; 12]>,
    genre_samples: BTreeMap<String, Vec<SampleMovie>>,
    sampled: HashSet<(String, String)>,
    titles: BTreeMap<TitleKey, TitleAcc>,
    series: BTreeMap<String, SeriesAcc>,
    unresolved: BTreeMap<TitleKey, usize>,
}

impl Accumulator {
    fn record(&mut self, date: NaiveDate, item: &BuiltItem) {
        let n = &item.normalized;
        let duration = item.metadata.as_ref().map_or(0, |m| m.runtime_minutes);

        self.dates.push(date);
        self.total_views += 1;
        self.total_duration_minutes = self.total_duration_minutes.saturating_add(duration);

        if item.metadata.is_none() {
            self.unresolved_count += 1;
            *self.unresolved.entry(TitleKey::of(n)).or_default() += 1;
        }

        let month = date.month0() as usize;
        self.monthly[month].record(duration);
        self.weekday[date.weekday().num_days_from_monday() as usize].record(duration);

        if let Some(meta) = &item.metadata {
            self.record_genres(month, n, meta);
        }

        let title = self.titles.entry(TitleKey::of(n)).or_default();
        title.metric.record(duration);
        if let Some(meta) = &item.metadata {
            title.vote_average = Some(meta.vote_average);
            title.popularity = Some(meta.popularity);
            title.poster_path = meta.poster_path.clone();
            title.genres = meta.genres.clone();
        }

        if n.media_type == MediaType::Tv {
            self.series
                .entry(n.work_title.clone())
                .and_modify(|s| {
                    s.metric.record(duration);
                    s.span_start = s.span_start.min(date);
                    s.span_end = s.span_end.max(date);
                })
                .or_insert_with(|| SeriesAcc {
                    metric: Metric {
                        views: 1,
                        duration_minutes: duration,
                    },
                    span_start: date,
                    span_end: date,
                });
        }
    }

    fn record_genres(&mut self, month: usize, n: &NormalizedTitle, meta: &Metadata) {
        let duration = meta.runtime_minutes;
        for genre in &meta.genres {
            self.genres.entry(genre.clone()).or_default().record(duration);
            let months = self.genre_months.entry(genre.clone()).or_default();
            months[month] = months[month].saturating_add(duration);

            if n.media_type == MediaType::Movie
                && self.sampled.insert((genre.clone(), n.work_title.clone()))
            {
                self.genre_samples
                    .entry(genre.clone())
                    .or_default()
                    .push(SampleMovie {
                        title: n.work_title.clone(),
                        duration_minutes: duration,
                        vote_average: meta.vote_average,
                        popularity: meta.popularity,
                        poster_path: meta.poster_path.clone(),
                    });
            }
        }
    }

    fn finish(self, year: i32, batch: &BuiltBatch) -> Stats {
        let continuity = continuity(&self.dates);
        let (top_streaks, max_gap) = continuity.top();
        let (genre_top_works, genre_worst_works) = self.quality_rankings();
        let (top_titles_by_duration, top_titles_by_views) = self.title_leaderboards();
        let (top_series_by_duration, top_series_by_views) = self.series_leaderboards();

        Stats {
            year,
            generated_at: batch.generated_at.clone(),
            source: batch.source.clone(),
            total_views: self.total_views,
            total_duration_minutes: self.total_duration_minutes,
            active_days: continuity.active_days,
            top_streaks,
            max_gap,
            monthly: self.monthly,
            weekday: self.weekday,
            genre_stats: self.genre_stats(),
            genre_month_spike: self.month_spikes(),
            genre_sample_movies: self.sample_movies(),
            genre_top_works,
            genre_worst_works,
            top_titles_by_duration,
            top_titles_by_views,
            top_series_by_duration,
            top_series_by_views,
            unresolved_count: self.unresolved_count,
            unresolved_list: self.unresolved_list(),
        }
    }
}

// ---------------------------------------------------------------------------
// Continuity — streaks and gaps
// ---------------------------------------------------------------------------

struct Continuity {
    active_days: usize,
    /// In date order.
    streaks: Vec<Streak>,
    /// In date order.
    gaps: Vec<Gap>,
}

impl Continuity {
    /// Longest streaks first (earlier start on ties) and the first of the
    /// longest gaps.
    fn top(&self) -> (Vec<Streak>, Option<Gap>) {
        let mut streaks = self.streaks.clone();
        streaks.sort_by(|a, b| b.length_days.cmp(&a.length_days));
        streaks.truncate(TOP_STREAKS);

        let mut max_gap: Option<&Gap> = None;
        for gap in &self.gaps {
            if max_gap.is_none_or(|best| gap.length_days > best.length_days) {
                max_gap = Some(gap);
            }
        }

        (streaks, max_gap.cloned())
    }
}

fn continuity(dates: &[NaiveDate]) -> Continuity {
    let days: Vec<NaiveDate> = dates
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut streaks = Vec::new();
    let mut gaps = Vec::new();

    let (Some(&first), Some(&last)) = (days.first(), days.last()) else {
        return Continuity {
            active_days: 0,
            streaks,
            gaps,
        };
    };

    let mut start = first;
    let mut length = 1i64;

    for pair in days.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        // Whole calendar days, never elapsed hours
        let diff = cur.signed_duration_since(prev).num_days();
        if diff == 1 {
            length += 1;
            continue;
        }

        streaks.push(Streak {
            length_days: length,
            start_date: start,
            end_date: prev,
        });
        if diff > 1 {
            gaps.push(Gap {
                length_days: diff - 1,
                start_date: prev + Days::new(1),
                end_date: cur - Days::new(1),
            });
        }
        start = cur;
        length = 1;
    }

    streaks.push(Streak {
        length_days: length,
        start_date: start,
        end_date: last,
    });

    Continuity {
        active_days: days.len(),
        streaks,
        gaps,
    }
}

// ---------------------------------------------------------------------------
// Genres
// ---------------------------------------------------------------------------

impl Accumulator {
    fn genre_stats(&self) -> Vec<GenreStat> {
        let mut stats: Vec<GenreStat> = self
            .genres
            .iter()
            .map(|(name, m)| GenreStat {
                name: name.clone(),
                duration_minutes: m.duration_minutes,
                views: m.views,
                share_percent: 0.0,
            })
            .collect();

        stats.sort_by(|a, b| {
            b.duration_minutes
                .cmp(&a.duration_minutes)
                .then_with(|| a.name.cmp(&b.name))
        });

        for g in &mut stats {
            g.share_percent = share_of(g.duration_minutes, self.total_duration_minutes);
        }

        stats
    }

    fn month_spikes(&self) -> BTreeMap<String, Spike> {
        self.genre_months
            .iter()
            .filter_map(|(name, months)| peak_month(months).map(|spike| (name.clone(), spike)))
            .collect()
    }

    /// Best and worst rated works per genre. Unrated works are left out of
    /// both lists; with fewer than six works the two lists overlap.
    fn quality_rankings(
        &self,
    ) -> (
        BTreeMap<String, Vec<TitleStat>>,
        BTreeMap<String, Vec<TitleStat>>,
    ) {
        let mut by_genre: BTreeMap<String, Vec<TitleStat>> = BTreeMap::new();
        for (key, acc) in &self.titles {
            let stat = acc.to_stat(key);
            if stat.rating() <= 0.0 {
                continue;
            }
            for genre in &acc.genres {
                by_genre.entry(genre.clone()).or_default().push(stat.clone());
            }
        }

        let mut top = BTreeMap::new();
        let mut worst = BTreeMap::new();
        for (genre, mut works) in by_genre {
            works.sort_by(|a, b| b.rating().total_cmp(&a.rating()));

            // Lowest first, read off the same ordering as the top list
            let lowest: Vec<TitleStat> = works
                .iter()
                .rev()
                .take(WORKS_PER_GENRE)
                .cloned()
                .collect();
            works.truncate(WORKS_PER_GENRE);

            worst.insert(genre.clone(), lowest);
            top.insert(genre, works);
        }

        (top, worst)
    }

    fn sample_movies(&self) -> BTreeMap<String, Vec<SampleMovie>> {
        self.genre_samples
            .iter()
            .map(|(genre, samples)| {
                let mut samples = samples.clone();
                samples.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
                samples.truncate(SAMPLE_MOVIES_PER_GENRE);
                (genre.clone(), samples)
            })
            .collect()
    }
}

/// Month with the strictly greatest duration; the earliest month wins ties.
fn peak_month(months: &[u64; 12]) -> Option<Spike> {
    let mut peak: Option<Spike> = None;
    for (idx, &duration) in months.iter().enumerate() {
        if duration > peak.map_or(0, |p| p.duration_minutes) {
            peak = Some(Spike {
                month: idx as u32 + 1,
                duration_minutes: duration,
            });
        }
    }
    peak
}

// ---------------------------------------------------------------------------
// Titles, series and unresolved items
// ---------------------------------------------------------------------------

impl Accumulator {
    fn title_leaderboards(&self) -> (Vec<TitleStat>, Vec<TitleStat>) {
        let all: Vec<TitleStat> = self
            .titles
            .iter()
            .map(|(key, acc)| acc.to_stat(key))
            .collect();

        let mut by_duration = all.clone();
        by_duration.sort_by(|a, b| {
            b.duration_minutes
                .cmp(&a.duration_minutes)
                .then(b.views.cmp(&a.views))
        });
        by_duration.truncate(LEADERBOARD_LIMIT);

        let mut by_views = all;
        by_views.sort_by(|a, b| {
            b.views
                .cmp(&a.views)
                .then(b.duration_minutes.cmp(&a.duration_minutes))
        });
        by_views.truncate(LEADERBOARD_LIMIT);

        (by_duration, by_views)
    }

    fn series_leaderboards(&self) -> (Vec<SeriesStat>, Vec<SeriesStat>) {
        let all: Vec<SeriesStat> = self
            .series
            .iter()
            .map(|(name, s)| SeriesStat {
                series_name: name.clone(),
                duration_minutes: s.metric.duration_minutes,
                views: s.metric.views,
                span_start: s.span_start,
                span_end: s.span_end,
            })
            .collect();

        let mut by_duration = all.clone();
        by_duration.sort_by(|a, b| {
            b.duration_minutes
                .cmp(&a.duration_minutes)
                .then(b.views.cmp(&a.views))
        });
        by_duration.truncate(LEADERBOARD_LIMIT);

        let mut by_views = all;
        by_views.sort_by(|a, b| {
            b.views
                .cmp(&a.views)
                .then(b.duration_minutes.cmp(&a.duration_minutes))
        });
        by_views.truncate(LEADERBOARD_LIMIT);

        (by_duration, by_views)
    }

    fn unresolved_list(&self) -> Vec<UnresolvedItem> {
        let mut items: Vec<UnresolvedItem> = self
            .unresolved
            .iter()
            .map(|(key, &views)| UnresolvedItem {
                title: key.title.clone(),
                media_type: key.media_type,
                views,
            })
            .collect();
        // Stable: equal counts stay in title order
        items.sort_by(|a, b| b.views.cmp(&a.views));
        items.truncate(UNRESOLVED_LIMIT);
        items
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
