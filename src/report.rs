use std::fmt::Write;

use crate::stats::{GenreStat, Metric, SeriesStat, Stats, TitleStat};

use colored::Colorize;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Renders the terminal report. `rows` bounds every leaderboard.
pub fn render_text(stats: &Stats, rows: usize) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_report(&mut out, stats, rows);
    out
}

fn write_report(out: &mut String, stats: &Stats, rows: usize) -> std::fmt::Result {
    writeln!(out, "{}", format!("Recap {}", stats.year).bold())?;
    writeln!(out, "------------------------------")?;
    if !stats.generated_at.is_empty() {
        writeln!(out, "Generated: {}", stats.generated_at)?;
    }
    if let Some(source) = &stats.source {
        writeln!(out, "Source:    {source}")?;
    }
    writeln!(out)?;

    if stats.total_views == 0 {
        writeln!(out, "{}", "No views recorded for this year.".yellow())?;
        return Ok(());
    }

    // --- Totals ---
    writeln!(out, "Views:        {}", stats.total_views)?;
    writeln!(
        out,
        "Watch Time:   {}",
        format_minutes(stats.total_duration_minutes)
    )?;
    writeln!(
        out,
        "Active Days:  {} ({})",
        stats.active_days,
        format_percent(stats.active_day_percent())
    )?;
    if let Some(best) = stats.longest_streak() {
        writeln!(
            out,
            "Best Streak:  {} {}",
            best.length_days,
            days_label(best.length_days)
        )?;
    }
    writeln!(
        out,
        "Coverage:     {} / {} ({})",
        stats.resolved_views(),
        stats.total_views,
        format_percent(stats.coverage_percent())
    )?;

    // --- Continuity ---
    writeln!(out)?;
    writeln!(out, "{}", "Streaks".bold())?;
    for (i, streak) in stats.top_streaks.iter().enumerate() {
        writeln!(
            out,
            "  {}. {} {}  ({} to {})",
            i + 1,
            streak.length_days,
            days_label(streak.length_days),
            streak.start_date.format("%Y-%m-%d"),
            streak.end_date.format("%Y-%m-%d")
        )?;
    }
    if let Some(gap) = &stats.max_gap {
        writeln!(
            out,
            "Longest Break: {} {}  ({} to {})",
            gap.length_days,
            days_label(gap.length_days),
            gap.start_date.format("%Y-%m-%d"),
            gap.end_date.format("%Y-%m-%d")
        )?;
    }

    // --- Calendar ---
    writeln!(out)?;
    writeln!(out, "{}", "By Month".bold())?;
    write_metric_chart(out, &MONTH_LABELS, &stats.monthly)?;

    writeln!(out)?;
    writeln!(out, "{}", "By Weekday".bold())?;
    write_metric_chart(out, &WEEKDAY_LABELS, &stats.weekday)?;

    // --- Genres ---
    if !stats.genre_stats.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "Genres".bold())?;
        write_genre_table(out, stats, rows)?;
        write_genre_highlights(out, stats, rows)?;
    }

    // --- Titles ---
    if !stats.top_titles_by_duration.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "Top Titles (Watch Time)".bold())?;
        write_title_board(out, &stats.top_titles_by_duration, rows, |t| {
            format_minutes(t.duration_minutes)
        })?;

        writeln!(out)?;
        writeln!(out, "{}", "Top Titles (Views)".bold())?;
        write_title_board(out, &stats.top_titles_by_views, rows, |t| {
            format!("{} {}", t.views, views_label(t.views))
        })?;
    }

    if !stats.top_series_by_duration.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "Top Series".bold())?;
        write_series_board(out, &stats.top_series_by_duration, rows)?;
    }

    // --- Data quality ---
    if stats.unresolved_count > 0 {
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            format!("Unresolved ({} views)", stats.unresolved_count).bold()
        )?;
        for item in stats.unresolved_list.iter().take(rows) {
            writeln!(
                out,
                "  {:>4}  {} ({})",
                item.views,
                truncate(&item.title, 40),
                item.media_type.label()
            )?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "{}",
            "Tip: unresolved titles count as views but add no watch time or genres.".dimmed()
        )?;
    }

    Ok(())
}

fn write_metric_chart(out: &mut String, labels: &[&str], buckets: &[Metric]) -> std::fmt::Result {
    let max = buckets.iter().map(|m| m.views).max().unwrap_or(0);
    for (label, metric) in labels.iter().zip(buckets) {
        writeln!(
            out,
            "  {label}  {} {:>4}  {}",
            make_bar(metric.views, max, 20),
            metric.views,
            format_minutes(metric.duration_minutes)
        )?;
    }
    Ok(())
}

fn write_genre_table(out: &mut String, stats: &Stats, rows: usize) -> std::fmt::Result {
    let shown: Vec<&GenreStat> = stats.genre_stats.iter().take(rows).collect();
    let name_width = shown
        .iter()
        .map(|g| g.name.chars().count())
        .max()
        .unwrap_or(5)
        .min(25);

    for genre in shown {
        let peak = stats
            .genre_month_spike
            .get(&genre.name)
            .map(|s| format!("peak {}", month_label(s.month)))
            .unwrap_or_default();
        writeln!(
            out,
            "  {:<width$}  {:>9}  {:>4}  {:>4} {}  {}",
            truncate(&genre.name, name_width),
            format_minutes(genre.duration_minutes),
            format_percent(genre.share_percent),
            genre.views,
            views_label(genre.views),
            peak,
            width = name_width
        )?;
    }

    let rest = stats.genre_stats.len().saturating_sub(rows);
    if rest > 0 {
        writeln!(out, "  {}", format!("... and {rest} more").dimmed())?;
    }
    Ok(())
}

fn write_genre_highlights(out: &mut String, stats: &Stats, rows: usize) -> std::fmt::Result {
    for genre in stats.genre_stats.iter().take(rows) {
        let best = stats.genre_top_works.get(&genre.name);
        let worst = stats.genre_worst_works.get(&genre.name);
        let samples = stats.genre_sample_movies.get(&genre.name);
        if best.is_none() && samples.is_none() {
            continue;
        }

        writeln!(out)?;
        writeln!(out, "  {}", genre.name.bold())?;
        if let Some(samples) = samples {
            let names: Vec<&str> = samples.iter().map(|s| s.title.as_str()).collect();
            writeln!(out, "    Watched: {}", names.join(", "))?;
        }
        if let Some(best) = best {
            writeln!(out, "    Best:    {}", rated_list(best))?;
        }
        if let Some(worst) = worst {
            writeln!(out, "    Worst:   {}", rated_list(worst))?;
        }
    }
    Ok(())
}

fn rated_list(works: &[TitleStat]) -> String {
    works
        .iter()
        .map(|w| format!("{} ({:.1})", w.title, w.rating()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_title_board<F>(
    out: &mut String,
    titles: &[TitleStat],
    rows: usize,
    value: F,
) -> std::fmt::Result
where
    F: Fn(&TitleStat) -> String,
{
    let shown: Vec<&TitleStat> = titles.iter().take(rows).collect();
    let name_width = shown
        .iter()
        .map(|t| t.title.chars().count())
        .max()
        .unwrap_or(10)
        .min(30);

    for (i, title) in shown.iter().enumerate() {
        writeln!(
            out,
            "  {:>2}. {:<width$}  {:<7}  {}",
            i + 1,
            truncate(&title.title, name_width),
            title.media_type.label(),
            value(title),
            width = name_width
        )?;
    }
    Ok(())
}

fn write_series_board(out: &mut String, series: &[SeriesStat], rows: usize) -> std::fmt::Result {
    let shown: Vec<&SeriesStat> = series.iter().take(rows).collect();
    let name_width = shown
        .iter()
        .map(|s| s.series_name.chars().count())
        .max()
        .unwrap_or(10)
        .min(30);

    for (i, s) in shown.iter().enumerate() {
        writeln!(
            out,
            "  {:>2}. {:<width$}  {:>4} {}  {:>9}  {} to {}",
            i + 1,
            truncate(&s.series_name, name_width),
            s.views,
            views_label(s.views),
            format_minutes(s.duration_minutes),
            s.span_start.format("%m-%d"),
            s.span_end.format("%m-%d"),
            width = name_width
        )?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn format_percent(percent: f64) -> String {
    format!("{percent:.0}%")
}

/// Formats minutes like "3d 4h 12m", "18h 32m" or "45m".
fn format_minutes(total_mins: u64) -> String {
    let days = total_mins / 1440;
    let hours = (total_mins % 1440) / 60;
    let mins = total_mins % 60;

    if days > 0 {
        format!("{days}d {hours}h {mins}m")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

fn month_label(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_LABELS.get(idx as usize))
        .copied()
        .unwrap_or("?")
}

fn days_label(days: i64) -> &'static str {
    if days == 1 { "day" } else { "days" }
}

fn views_label(views: usize) -> &'static str {
    if views == 1 { "view" } else { "views" }
}

fn make_bar(value: usize, max: usize, width: usize) -> String {
    if max == 0 {
        return " ".repeat(width);
    }
    let filled = (value as f64 / max as f64 * width as f64).round() as usize;
    let filled = filled.min(width);
    let empty = width - filled;
    format!("{}{}", "\u{2588}".repeat(filled), " ".repeat(empty))
}

/// Truncates a string to a maximum character width, appending "..." if truncated.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
