use std::collections::{BTreeMap, BTreeSet};

use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;

use super::error::{CalcError, CalcResult};
use super::types::{
    CommonHolding, Fund, FundHolding, OverlapReport, PairwiseOverlap, SectorOverlap,
};

pub const MIN_FUNDS: usize = 2;
pub const MAX_FUNDS: usize = 5;
pub const DEFAULT_SECTOR: &str = "Other";

/// `symbol, name, weight[, sector]` per line, comma or tab separated. Each line
/// is read on its own; malformed lines are skipped.
pub fn parse_holdings(text: &str) -> Vec<FundHolding> {
    let mut holdings = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match read_line(line).as_ref().and_then(holding_from_record) {
            Some(holding) => holdings.push(holding),
            None => debug!("skipping malformed holdings line {}", idx + 1),
        }
    }
    holdings
}

fn read_line(line: &str) -> Option<StringRecord> {
    if line.contains('\t') {
        if let Some(record) = read_delimited(line, b'\t').filter(|r| r.len() >= 3) {
            return Some(record);
        }
    }
    read_delimited(line, b',')
}

fn read_delimited(line: &str, delimiter: u8) -> Option<StringRecord> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(line.as_bytes())
        .records()
        .next()?
        .ok()
}

fn holding_from_record(record: &StringRecord) -> Option<FundHolding> {
    if record.len() < 3 {
        return None;
    }
    let symbol = record.get(0)?.to_ascii_uppercase();
    if symbol.is_empty() {
        return None;
    }
    let weight = record
        .get(2)?
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|w| w.is_finite() && *w >= 0.0)?;
    let sector = record
        .get(3)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SECTOR)
        .to_string();
    Some(FundHolding {
        symbol,
        name: record.get(1).unwrap_or_default().to_string(),
        weight_percent: weight,
        sector,
    })
}

impl Fund {
    pub fn parse(name: impl Into<String>, holdings_text: &str) -> Self {
        Self {
            name: name.into(),
            holdings: parse_holdings(holdings_text),
        }
    }
}

struct FundWeights {
    by_symbol: BTreeMap<String, f64>,
    by_sector: BTreeMap<String, f64>,
    total: f64,
}

impl FundWeights {
    fn from_fund(fund: &Fund) -> Self {
        let mut by_symbol = BTreeMap::new();
        let mut by_sector = BTreeMap::new();
        for holding in &fund.holdings {
            *by_symbol.entry(holding.symbol.clone()).or_insert(0.0) += holding.weight_percent;
            *by_sector.entry(holding.sector.clone()).or_insert(0.0) += holding.weight_percent;
        }
        Self {
            by_symbol,
            by_sector,
            total: fund.total_weight(),
        }
    }
}

fn min_weight(weights: &[f64]) -> f64 {
    weights.iter().copied().fold(f64::INFINITY, f64::min)
}

fn weights_for<'a>(
    funds: &'a [FundWeights],
    key: &str,
    pick: impl Fn(&'a FundWeights) -> &'a BTreeMap<String, f64>,
) -> Vec<f64> {
    funds
        .iter()
        .map(|f| pick(f).get(key).copied().unwrap_or(0.0))
        .collect()
}

/// Pairwise overlap normalised by the smaller fund's total weight, in percent.
fn pair_overlap(a: &FundWeights, b: &FundWeights) -> f64 {
    let denominator = a.total.min(b.total);
    if denominator <= 0.0 {
        return 0.0;
    }
    let shared: f64 = a
        .by_symbol
        .iter()
        .filter_map(|(symbol, wa)| b.by_symbol.get(symbol).map(|wb| wa.min(*wb)))
        .sum();
    shared / denominator * 100.0
}

pub fn compute_overlap(funds: &[Fund]) -> CalcResult<OverlapReport> {
    if !(MIN_FUNDS..=MAX_FUNDS).contains(&funds.len()) {
        return Err(CalcError::invalid(
            "funds",
            format!("between {MIN_FUNDS} and {MAX_FUNDS} funds are required"),
        ));
    }
    let weights: Vec<FundWeights> = funds.iter().map(FundWeights::from_fund).collect();

    let mut names: BTreeMap<&str, &str> = BTreeMap::new();
    for holding in funds.iter().flat_map(|f| &f.holdings) {
        names
            .entry(holding.symbol.as_str())
            .or_insert(holding.name.as_str());
    }

    let mut common_holdings = Vec::new();
    let mut weighted_overlap = 0.0;
    for (symbol, name) in &names {
        let per_fund = weights_for(&weights, symbol, |f| &f.by_symbol);
        let min = min_weight(&per_fund);
        weighted_overlap += min;
        if min > 0.0 {
            common_holdings.push(CommonHolding {
                symbol: symbol.to_string(),
                name: name.to_string(),
                min_weight: min,
                weights: per_fund,
            });
        }
    }
    common_holdings.sort_by(|a, b| {
        b.min_weight
            .total_cmp(&a.min_weight)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let all_sectors: BTreeSet<&String> = weights.iter().flat_map(|f| f.by_sector.keys()).collect();
    let mut sectors: Vec<SectorOverlap> = all_sectors
        .into_iter()
        .map(|sector| {
            let per_fund = weights_for(&weights, sector, |f| &f.by_sector);
            SectorOverlap {
                sector: sector.clone(),
                min_weight: min_weight(&per_fund),
                weights: per_fund,
            }
        })
        .collect();
    let sector_overlap = sectors.iter().map(|s| s.min_weight).sum();
    sectors.sort_by(|a, b| {
        b.min_weight
            .total_cmp(&a.min_weight)
            .then_with(|| a.sector.cmp(&b.sector))
    });

    let mut pairwise = Vec::new();
    for i in 0..funds.len() {
        for j in (i + 1)..funds.len() {
            pairwise.push(PairwiseOverlap {
                first: funds[i].name.clone(),
                second: funds[j].name.clone(),
                overlap_percent: pair_overlap(&weights[i], &weights[j]),
            });
        }
    }

    Ok(OverlapReport {
        fund_names: funds.iter().map(|f| f.name.clone()).collect(),
        weighted_overlap,
        pairwise,
        sectors,
        sector_overlap,
        common_holdings,
    })
}
