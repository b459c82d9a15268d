use std::cmp::Ordering;

use crate::models::{DistributionSlice, Holding, PortfolioMetrics, PositionMetrics, Quote};

/// How many positions the gainer/loser rankings keep.
const RANKING_SIZE: usize = 3;

/// Compute portfolio metrics from a holdings snapshot and a quote resolver.
///
/// Pure transform: no I/O, no shared state, each call recomputes from
/// scratch. The resolver is typically backed by the quote cache; here it is
/// just a capability so the engine stays trivially testable. A holding
/// whose symbol does not resolve is excluded from every aggregate and
/// reported in `unresolved` instead of failing the whole computation.
pub fn compute_metrics<F>(holdings: &[Holding], resolve: F) -> PortfolioMetrics
where
    F: Fn(&str) -> Option<Quote>,
{
    let mut positions: Vec<PositionMetrics> = Vec::with_capacity(holdings.len());
    let mut unresolved = Vec::new();

    for holding in holdings {
        match resolve(&holding.symbol) {
            Some(quote) => positions.push(position_metrics(holding, quote.price)),
            None => unresolved.push(holding.symbol.clone()),
        }
    }

    let total_investment: f64 = positions.iter().map(|p| p.invested_amount).sum();
    let current_value: f64 = positions.iter().map(|p| p.current_amount).sum();
    let total_profit_loss = current_value - total_investment;
    let profit_loss_percentage = if total_investment > 0.0 {
        total_profit_loss / total_investment * 100.0
    } else {
        0.0
    };

    // First occurrence wins ties, matching the ranking order below.
    let top_performer = positions
        .iter()
        .filter(|p| p.profit_loss_percentage > 0.0)
        .fold(None::<&PositionMetrics>, |best, p| match best {
            Some(b) if b.profit_loss_percentage >= p.profit_loss_percentage => Some(b),
            _ => Some(p),
        })
        .cloned();

    let top_gainers = ranked(&positions, |a, b| {
        b.profit_loss_percentage
            .partial_cmp(&a.profit_loss_percentage)
            .unwrap_or(Ordering::Equal)
    })
    .into_iter()
    .filter(|p| p.profit_loss_percentage > 0.0)
    .take(RANKING_SIZE)
    .collect();

    let top_losers = ranked(&positions, |a, b| {
        a.profit_loss_percentage
            .partial_cmp(&b.profit_loss_percentage)
            .unwrap_or(Ordering::Equal)
    })
    .into_iter()
    .filter(|p| p.profit_loss_percentage < 0.0)
    .take(RANKING_SIZE)
    .collect();

    let distribution = positions
        .iter()
        .map(|p| DistributionSlice {
            symbol: p.symbol.clone(),
            percentage: if current_value > 0.0 {
                p.current_amount / current_value * 100.0
            } else {
                0.0
            },
        })
        .collect();

    PortfolioMetrics {
        total_investment,
        current_value,
        total_profit_loss,
        profit_loss_percentage,
        top_performer,
        top_gainers,
        top_losers,
        distribution,
        unresolved,
    }
}

/// Stable sort of a copy, so equal percentages keep input order.
fn ranked<F>(positions: &[PositionMetrics], compare: F) -> Vec<PositionMetrics>
where
    F: FnMut(&PositionMetrics, &PositionMetrics) -> Ordering,
{
    let mut sorted = positions.to_vec();
    sorted.sort_by(compare);
    sorted
}

fn position_metrics(holding: &Holding, price: f64) -> PositionMetrics {
    let invested_amount = holding.quantity * holding.purchase_price;
    let current_amount = holding.quantity * price;
    // A non-positive purchase price cannot produce a meaningful return;
    // substitute 0% instead of propagating NaN or infinity.
    let profit_loss_percentage = if holding.purchase_price > 0.0 {
        (price - holding.purchase_price) / holding.purchase_price * 100.0
    } else {
        0.0
    };
    PositionMetrics {
        id: holding.id.clone(),
        symbol: holding.symbol.clone(),
        company_name: holding.company_name.clone(),
        quantity: holding.quantity,
        purchase_price: holding.purchase_price,
        current_price: price,
        invested_amount,
        current_amount,
        profit_loss: current_amount - invested_amount,
        profit_loss_percentage,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;

    fn holding(id: &str, symbol: &str, quantity: f64, purchase_price: f64) -> Holding {
        Holding {
            id: id.to_string(),
            symbol: symbol.to_string(),
            company_name: format!("{} Ltd", symbol),
            quantity,
            purchase_price,
            current_price: 0.0,
            last_updated: Utc::now(),
        }
    }

    fn quotes(prices: &[(&str, f64)]) -> HashMap<String, Quote> {
        prices
            .iter()
            .map(|(symbol, price)| {
                (symbol.to_string(), Quote::new(*symbol, *price, *price))
            })
            .collect()
    }

    #[test]
    fn empty_holdings_yield_zeroed_metrics() {
        let metrics = compute_metrics(&[], |_| None);

        assert_eq!(metrics.total_investment, 0.0);
        assert_eq!(metrics.current_value, 0.0);
        assert_eq!(metrics.total_profit_loss, 0.0);
        assert_eq!(metrics.profit_loss_percentage, 0.0);
        assert!(metrics.top_performer.is_none());
        assert!(metrics.top_gainers.is_empty());
        assert!(metrics.top_losers.is_empty());
        assert!(metrics.unresolved.is_empty());
    }

    #[test]
    fn single_profitable_holding() {
        let holdings = vec![holding("1", "A", 10.0, 100.0)];
        let quotes = quotes(&[("A", 120.0)]);

        let metrics = compute_metrics(&holdings, |s| quotes.get(s).cloned());

        assert_eq!(metrics.total_investment, 1000.0);
        assert_eq!(metrics.current_value, 1200.0);
        assert_eq!(metrics.total_profit_loss, 200.0);
        assert_eq!(metrics.profit_loss_percentage, 20.0);
        assert_eq!(metrics.top_performer.unwrap().symbol, "A");
    }

    #[test]
    fn gainers_ordered_by_descending_return() {
        let holdings = vec![
            holding("1", "A", 1.0, 100.0),
            holding("2", "B", 1.0, 100.0),
        ];
        let quotes = quotes(&[("A", 110.0), ("B", 130.0)]);

        let metrics = compute_metrics(&holdings, |s| quotes.get(s).cloned());

        let symbols: Vec<_> = metrics.top_gainers.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, ["B", "A"]);
        assert_eq!(metrics.top_performer.unwrap().symbol, "B");
    }

    #[test]
    fn equal_returns_keep_input_order() {
        let holdings = vec![
            holding("1", "A", 1.0, 100.0),
            holding("2", "B", 2.0, 100.0),
            holding("3", "C", 3.0, 100.0),
        ];
        let quotes = quotes(&[("A", 110.0), ("B", 110.0), ("C", 110.0)]);

        let metrics = compute_metrics(&holdings, |s| quotes.get(s).cloned());

        let symbols: Vec<_> = metrics.top_gainers.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, ["A", "B", "C"]);
        assert_eq!(metrics.top_performer.unwrap().symbol, "A");
    }

    #[test]
    fn losers_ranked_worst_first_and_capped() {
        let holdings = vec![
            holding("1", "A", 1.0, 100.0),
            holding("2", "B", 1.0, 100.0),
            holding("3", "C", 1.0, 100.0),
            holding("4", "D", 1.0, 100.0),
            holding("5", "E", 1.0, 100.0),
        ];
        let quotes = quotes(&[
            ("A", 95.0),
            ("B", 70.0),
            ("C", 105.0),
            ("D", 80.0),
            ("E", 90.0),
        ]);

        let metrics = compute_metrics(&holdings, |s| quotes.get(s).cloned());

        let symbols: Vec<_> = metrics.top_losers.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, ["B", "D", "E"]);
        assert_eq!(metrics.top_gainers.len(), 1);
    }

    #[test]
    fn no_performer_when_nothing_is_profitable() {
        let holdings = vec![holding("1", "A", 1.0, 100.0)];
        let quotes = quotes(&[("A", 90.0)]);

        let metrics = compute_metrics(&holdings, |s| quotes.get(s).cloned());

        assert!(metrics.top_performer.is_none());
        assert!(metrics.top_gainers.is_empty());
        assert_eq!(metrics.top_losers.len(), 1);
    }

    #[test]
    fn zero_purchase_price_reports_zero_percent() {
        let holdings = vec![holding("1", "FREEBIE", 5.0, 0.0)];
        let quotes = quotes(&[("FREEBIE", 10.0)]);

        let metrics = compute_metrics(&holdings, |s| quotes.get(s).cloned());

        assert_eq!(metrics.total_investment, 0.0);
        assert_eq!(metrics.current_value, 50.0);
        // Portfolio-level percentage is guarded the same way.
        assert_eq!(metrics.profit_loss_percentage, 0.0);
        assert!(metrics.top_performer.is_none());
        assert_eq!(metrics.top_losers.len(), 0);
    }

    #[test]
    fn zero_quantity_contributes_nothing() {
        let holdings = vec![
            holding("1", "A", 0.0, 100.0),
            holding("2", "B", 1.0, 100.0),
        ];
        let quotes = quotes(&[("A", 200.0), ("B", 110.0)]);

        let metrics = compute_metrics(&holdings, |s| quotes.get(s).cloned());

        assert_eq!(metrics.total_investment, 100.0);
        assert_eq!(metrics.current_value, 110.0);
        // The empty position still carries a return for ranking purposes.
        assert_eq!(metrics.top_performer.unwrap().symbol, "A");
    }

    #[test]
    fn unresolved_symbols_are_excluded_not_fatal() {
        let holdings = vec![
            holding("1", "A", 10.0, 100.0),
            holding("2", "DELISTED", 10.0, 100.0),
        ];
        let quotes = quotes(&[("A", 120.0)]);

        let metrics = compute_metrics(&holdings, |s| quotes.get(s).cloned());

        assert_eq!(metrics.unresolved, ["DELISTED"]);
        assert_eq!(metrics.total_investment, 1000.0);
        assert_eq!(metrics.current_value, 1200.0);
        assert_eq!(metrics.top_performer.unwrap().symbol, "A");
    }

    #[test]
    fn distribution_shares_current_value() {
        let holdings = vec![
            holding("1", "A", 1.0, 100.0),
            holding("2", "B", 3.0, 100.0),
        ];
        let quotes = quotes(&[("A", 100.0), ("B", 100.0)]);

        let metrics = compute_metrics(&holdings, |s| quotes.get(s).cloned());

        assert_eq!(metrics.distribution[0].percentage, 25.0);
        assert_eq!(metrics.distribution[1].percentage, 75.0);
        let total: f64 = metrics.distribution.iter().map(|d| d.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn recomputation_is_deterministic() {
        let holdings = vec![
            holding("1", "A", 2.0, 50.0),
            holding("2", "B", 4.0, 25.0),
            holding("3", "C", 1.0, 200.0),
        ];
        let quotes = quotes(&[("A", 55.0), ("B", 20.0), ("C", 260.0)]);

        let first = compute_metrics(&holdings, |s| quotes.get(s).cloned());
        let second = compute_metrics(&holdings, |s| quotes.get(s).cloned());

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}
