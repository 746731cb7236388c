//! Per-player aggregation over cumulative year ranges

use crate::dataset::{
    f64_values, i64_values, string_values, Dataset, DEATHS, PLAYER, POINTS, RANK, WINS, YEAR,
};
use crate::error::Result;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

const TOTAL_DEATHS: &str = "TotalDeaths";
const TOTAL_POINTS: &str = "TotalPoints";
const TOTAL_WINS: &str = "TotalWins";
const AVERAGE_RANK: &str = "AverageRank";
const YEARS_COUNTED: &str = "YearsCounted";

/// A non-empty, sorted set of years
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearRange {
    years: Vec<i64>,
}

impl YearRange {
    /// Build from any set of years; `None` when empty
    pub fn new(years: impl IntoIterator<Item = i64>) -> Option<Self> {
        let years: Vec<i64> = years
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if years.is_empty() {
            None
        } else {
            Some(Self { years })
        }
    }

    pub fn years(&self) -> &[i64] {
        &self.years
    }

    pub fn first(&self) -> i64 {
        self.years[0]
    }

    /// Final year; used in chart titles and frame names
    pub fn last(&self) -> i64 {
        self.years[self.years.len() - 1]
    }

    pub fn contains(&self, year: i64) -> bool {
        self.years.binary_search(&year).is_ok()
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first() == self.last() {
            write!(f, "{}", self.last())
        } else {
            write!(f, "{}-{}", self.first(), self.last())
        }
    }
}

/// One range per observed year Y: every observed year from the minimum through Y
///
/// Ranges are returned in ascending order of Y, each strictly containing the previous.
pub fn cumulative_ranges(years: &[i64]) -> Vec<YearRange> {
    let sorted: Vec<i64> = years
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    (1..=sorted.len())
        .filter_map(|end| YearRange::new(sorted[..end].iter().copied()))
        .collect()
}

/// Aggregated statistics for one player over one year range
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSummary {
    pub player: String,
    pub total_deaths: f64,
    pub total_points: f64,
    pub total_wins: i64,
    pub average_rank: f64,
    pub years_counted: u32,
}

/// Summaries for every player with at least one record in `range`, sorted by player
pub fn summarize(dataset: &Dataset, range: &YearRange) -> Result<Vec<PlayerSummary>> {
    let in_range = range
        .years()
        .iter()
        .map(|year| col(YEAR).eq(lit(*year)))
        .reduce(|acc, expr| acc.or(expr));

    let in_range = match in_range {
        Some(expr) => expr,
        None => return Ok(Vec::new()),
    };

    let grouped = dataset
        .frame()
        .clone()
        .lazy()
        .filter(in_range)
        .group_by([col(PLAYER)])
        .agg([
            col(DEATHS).sum().alias(TOTAL_DEATHS),
            col(POINTS).sum().alias(TOTAL_POINTS),
            col(WINS).sum().alias(TOTAL_WINS),
            col(RANK).mean().alias(AVERAGE_RANK),
            col(YEAR)
                .n_unique()
                .cast(DataType::Int64)
                .alias(YEARS_COUNTED),
        ])
        .sort([PLAYER], SortMultipleOptions::default())
        .collect()?;

    let players = string_values(&grouped, PLAYER)?;
    let deaths = f64_values(&grouped, TOTAL_DEATHS)?;
    let points = f64_values(&grouped, TOTAL_POINTS)?;
    let wins = i64_values(&grouped, TOTAL_WINS)?;
    let ranks = f64_values(&grouped, AVERAGE_RANK)?;
    let counted = i64_values(&grouped, YEARS_COUNTED)?;

    let summaries: Vec<PlayerSummary> = players
        .into_iter()
        .enumerate()
        .map(|(i, player)| PlayerSummary {
            player,
            total_deaths: deaths[i],
            total_points: points[i],
            total_wins: wins[i],
            average_rank: ranks[i],
            years_counted: counted[i].max(0) as u32,
        })
        // A NaN mean only arises from an empty group
        .filter(|s| !s.average_rank.is_nan())
        .collect();

    debug!("Range {}: {} player(s)", range, summaries.len());
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::record;

    fn fixture() -> Dataset {
        Dataset::from_records(&[
            record("PlayerA", 2020, 1.0, 10.0, 0, 2.0),
            record("PlayerB", 2020, 3.0, 5.0, 1, 1.0),
            record("PlayerA", 2021, 2.0, 4.0, 0, 3.0),
        ])
        .unwrap()
    }

    fn multi_year() -> Dataset {
        Dataset::from_records(&[
            record("Alice", 2017, 2.0, 20.0, 1, 1.0),
            record("Bob", 2017, 1.0, 8.0, 0, 3.0),
            record("Carol", 2017, 0.0, 12.0, 0, 2.0),
            record("Alice", 2019, 4.0, 31.0, 0, 2.0),
            record("Bob", 2019, 5.0, 40.0, 1, 1.0),
            record("Alice", 2020, 3.5, 9.0, 1, 3.0),
            record("Bob", 2020, 0.0, 0.0, 0, 4.0),
            record("Dave", 2020, 6.0, 50.0, 0, 1.0),
            record("Carol", 2020, 1.0, 15.0, 0, 2.0),
        ])
        .unwrap()
    }

    fn find<'a>(summaries: &'a [PlayerSummary], player: &str) -> &'a PlayerSummary {
        summaries.iter().find(|s| s.player == player).unwrap()
    }

    #[test]
    fn test_cumulative_ranges_skip_unobserved_years() {
        let ranges = cumulative_ranges(&[2017, 2019, 2020]);
        let years: Vec<Vec<i64>> = ranges.iter().map(|r| r.years().to_vec()).collect();
        assert_eq!(
            years,
            vec![vec![2017], vec![2017, 2019], vec![2017, 2019, 2020]]
        );
    }

    #[test]
    fn test_cumulative_ranges_tolerate_unsorted_duplicates() {
        let ranges = cumulative_ranges(&[2020, 2017, 2020, 2019]);
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[2].last(), 2020);
        assert!(cumulative_ranges(&[]).is_empty());
    }

    #[test]
    fn test_year_range_display_and_contains() {
        let single = YearRange::new([2017]).unwrap();
        let span = YearRange::new([2019, 2017, 2020]).unwrap();
        assert_eq!(single.to_string(), "2017");
        assert_eq!(span.to_string(), "2017-2020");
        assert!(span.contains(2019));
        assert!(!span.contains(2018));
        assert!(YearRange::new(Vec::new()).is_none());
    }

    #[test]
    fn test_end_to_end_fixture() {
        let range = YearRange::new([2020, 2021]).unwrap();
        let summaries = summarize(&fixture(), &range).unwrap();

        assert_eq!(summaries.len(), 2);
        let a = find(&summaries, "PlayerA");
        assert_eq!(a.total_deaths, 3.0);
        assert_eq!(a.total_points, 14.0);
        assert_eq!(a.total_wins, 0);
        assert_eq!(a.average_rank, 2.5);
        assert_eq!(a.years_counted, 2);
    }

    #[test]
    fn test_single_record_rank_is_exact() {
        let range = YearRange::new([2020]).unwrap();
        let summaries = summarize(&fixture(), &range).unwrap();
        assert_eq!(find(&summaries, "PlayerA").average_rank, 2.0);
        assert_eq!(find(&summaries, "PlayerB").average_rank, 1.0);
    }

    #[test]
    fn test_one_row_per_player_in_range() {
        let dataset = multi_year();
        let ranges = cumulative_ranges(&dataset.years().unwrap());

        let first = summarize(&dataset, &ranges[0]).unwrap();
        let names: Vec<&str> = first.iter().map(|s| s.player.as_str()).collect();
        // Dave has no 2017 record
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);

        let all = summarize(&dataset, &ranges[2]).unwrap();
        let names: Vec<&str> = all.iter().map(|s| s.player.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol", "Dave"]);
    }

    #[test]
    fn test_sums_match_records() {
        let dataset = multi_year();
        let records = dataset.records().unwrap();

        for range in cumulative_ranges(&dataset.years().unwrap()) {
            for summary in summarize(&dataset, &range).unwrap() {
                let mine: Vec<_> = records
                    .iter()
                    .filter(|r| r.player == summary.player && range.contains(r.year))
                    .collect();
                let deaths: f64 = mine.iter().map(|r| r.deaths).sum();
                let points: f64 = mine.iter().map(|r| r.points).sum();
                let wins: i64 = mine.iter().map(|r| r.wins).sum();
                let rank = mine.iter().map(|r| r.rank).sum::<f64>() / mine.len() as f64;

                assert_eq!(summary.total_deaths, deaths, "{} {}", summary.player, range);
                assert_eq!(summary.total_points, points);
                assert_eq!(summary.total_wins, wins);
                assert!((summary.average_rank - rank).abs() < 1e-12);
                assert_eq!(summary.years_counted as usize, mine.len());
            }
        }
    }

    #[test]
    fn test_explicit_range_excludes_gaps() {
        let range = YearRange::new([2017, 2020]).unwrap();
        let summaries = summarize(&multi_year(), &range).unwrap();
        let bob = find(&summaries, "Bob");
        assert_eq!(bob.total_deaths, 1.0);
        assert_eq!(bob.total_points, 8.0);
        assert_eq!(bob.years_counted, 2);
    }

    #[test]
    fn test_grouping_is_case_sensitive() {
        let dataset = Dataset::from_records(&[
            record("alice", 2020, 1.0, 1.0, 0, 1.0),
            record("Alice", 2020, 2.0, 2.0, 0, 2.0),
        ])
        .unwrap();
        let range = YearRange::new([2020]).unwrap();
        assert_eq!(summarize(&dataset, &range).unwrap().len(), 2);
    }

    #[test]
    fn test_years_counted_bounded_by_dataset() {
        let dataset = multi_year();
        let years = dataset.years().unwrap();
        for range in cumulative_ranges(&years) {
            let summaries = summarize(&dataset, &range).unwrap();
            assert!(summaries
                .iter()
                .all(|s| s.years_counted as usize <= years.len()));
        }
    }
}
