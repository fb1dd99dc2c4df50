//! # Report Aggregation
//!
//! Pure functions that turn fetched rows into chart-ready series.
//! `bistro-db` runs the queries; everything below is deterministic and
//! works without a database.
//!
//! ## Report Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Report Pipeline                                 │
//! │                                                                         │
//! │  orders ──► SaleRecord ─────► sales_by_period() ──► SalesSeries ──┐    │
//! │                                                                    │    │
//! │  menus ⋈ orders ──► MenuPopularity ──► rank_menus() ──────────────┤    │
//! │                                                                    │    │
//! │  ingredients ⋈ pairs ⋈ orders ──► IngredientUseRow                │    │
//! │                         │                                          │    │
//! │                         ▼                                          ▼    │
//! │                  ingredient_usage() ──► IngredientUsage ──► Chart       │
//! │                                                             (kind,      │
//! │                                                              title,     │
//! │                                                              points,    │
//! │                                                              placeholder)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Period Labels
//! | Period  | Label        | Example      |
//! |---------|--------------|--------------|
//! | daily   | `YYYY-MM-DD` | `2024-03-05` |
//! | weekly  | `YYYY-Www`   | `2024-W10`   |
//! | monthly | `YYYY-MM`    | `2024-03`    |
//! | yearly  | `YYYY`       | `2024`       |
//!
//! Weeks follow ISO 8601, so the year of a weekly label is the ISO
//! week-numbering year: 2024-12-30 belongs to `2025-W01`. All labels are
//! zero-padded and sort chronologically as plain strings.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

/// Shown instead of a sales series when no order exists.
pub const NO_ORDER_DATA: &str = "No order data";

/// Shown instead of the popularity chart when no menu exists.
pub const NO_MENUS: &str = "No menus registered";

/// Shown instead of the usage chart when no ingredient exists.
pub const NO_INGREDIENTS: &str = "No ingredients registered";

// =============================================================================
// Sales Period
// =============================================================================

/// Bucket size of the sales report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SalesPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl SalesPeriod {
    pub const ALL: [SalesPeriod; 4] = [
        SalesPeriod::Daily,
        SalesPeriod::Weekly,
        SalesPeriod::Monthly,
        SalesPeriod::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SalesPeriod::Daily => "daily",
            SalesPeriod::Weekly => "weekly",
            SalesPeriod::Monthly => "monthly",
            SalesPeriod::Yearly => "yearly",
        }
    }

    /// The bucket an order placed at `at` falls into (UTC calendar).
    pub fn label_for(&self, at: DateTime<Utc>) -> String {
        match self {
            SalesPeriod::Daily => at.format("%Y-%m-%d").to_string(),
            SalesPeriod::Weekly => {
                let week = at.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            SalesPeriod::Monthly => at.format("%Y-%m").to_string(),
            SalesPeriod::Yearly => at.format("%Y").to_string(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SalesPeriod::Daily => "Daily Sales",
            SalesPeriod::Weekly => "Weekly Sales",
            SalesPeriod::Monthly => "Monthly Sales",
            SalesPeriod::Yearly => "Yearly Sales",
        }
    }

    pub fn axis_label(&self) -> &'static str {
        match self {
            SalesPeriod::Daily => "Date",
            SalesPeriod::Weekly => "Week (ISO year-week)",
            SalesPeriod::Monthly => "Month",
            SalesPeriod::Yearly => "Year",
        }
    }
}

impl fmt::Display for SalesPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SalesPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SalesPeriod::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "period".to_string(),
                allowed: SalesPeriod::ALL
                    .iter()
                    .map(|p| p.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Sales by Period
// =============================================================================

/// The two order columns the sales report needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleRecord {
    pub created_at: DateTime<Utc>,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesPoint {
    pub label: String,
    pub total_cents: i64,
}

impl SalesPoint {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Summed order totals per bucket, ascending by label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSeries {
    pub period: SalesPeriod,
    pub points: Vec<SalesPoint>,
    /// Set when there are no orders at all.
    pub placeholder: Option<String>,
}

impl SalesSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn grand_total(&self) -> Money {
        self.points.iter().map(SalesPoint::total).sum()
    }
}

/// Groups sales into period buckets.
///
/// ```rust
/// use bistro_core::report::{sales_by_period, SaleRecord, SalesPeriod};
/// use chrono::{TimeZone, Utc};
///
/// let sales = vec![
///     SaleRecord { created_at: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(), total_cents: 1500 },
///     SaleRecord { created_at: Utc.with_ymd_and_hms(2024, 3, 9, 19, 0, 0).unwrap(), total_cents: 500 },
/// ];
/// let series = sales_by_period(&sales, SalesPeriod::Monthly);
/// assert_eq!(series.points[0].label, "2024-03");
/// assert_eq!(series.points[0].total_cents, 2000);
/// ```
pub fn sales_by_period(sales: &[SaleRecord], period: SalesPeriod) -> SalesSeries {
    if sales.is_empty() {
        return SalesSeries {
            period,
            points: Vec::new(),
            placeholder: Some(NO_ORDER_DATA.to_string()),
        };
    }

    let mut buckets: BTreeMap<String, i64> = BTreeMap::new();
    for sale in sales {
        let bucket = buckets.entry(period.label_for(sale.created_at)).or_insert(0);
        *bucket = bucket.saturating_add(sale.total_cents);
    }

    SalesSeries {
        period,
        points: buckets
            .into_iter()
            .map(|(label, total_cents)| SalesPoint { label, total_cents })
            .collect(),
        placeholder: None,
    }
}

// =============================================================================
// Popular Menus
// =============================================================================

/// Number of orders recorded for one menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MenuPopularity {
    pub menu_id: String,
    pub name: String,
    pub order_count: i64,
}

/// Orders most-ordered first; ties by name.
pub fn rank_menus(mut menus: Vec<MenuPopularity>) -> Vec<MenuPopularity> {
    menus.sort_by(|a, b| {
        b.order_count
            .cmp(&a.order_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    menus
}

// =============================================================================
// Ingredient Usage
// =============================================================================

/// One (ingredient, menu) pair with the menu's order count.
///
/// Ingredients used by no menu come through once with
/// `pair_quantity = None`, so they still appear in the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct IngredientUseRow {
    pub ingredient_id: String,
    pub name: String,
    pub unit: String,
    pub pair_quantity: Option<f64>,
    pub order_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IngredientUsage {
    pub ingredient_id: String,
    pub name: String,
    pub unit: String,
    /// Σ pair quantity × orders of that menu.
    pub used: f64,
    /// `used` / grand total, in 0.0..=1.0. Zero when nothing was used.
    pub share: f64,
}

/// Computes total use per ingredient and its share of the grand total,
/// largest first; ties by name.
pub fn ingredient_usage(rows: &[IngredientUseRow]) -> Vec<IngredientUsage> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_id: HashMap<&str, IngredientUsage> = HashMap::new();

    for row in rows {
        let entry = by_id.entry(row.ingredient_id.as_str()).or_insert_with(|| {
            order.push(row.ingredient_id.as_str());
            IngredientUsage {
                ingredient_id: row.ingredient_id.clone(),
                name: row.name.clone(),
                unit: row.unit.clone(),
                used: 0.0,
                share: 0.0,
            }
        });
        if let Some(qty) = row.pair_quantity {
            entry.used += qty * row.order_count as f64;
        }
    }

    let mut usage: Vec<IngredientUsage> = order
        .into_iter()
        .filter_map(|id| by_id.remove(id))
        .collect();

    let grand_total: f64 = usage.iter().map(|u| u.used).sum();
    if grand_total > 0.0 {
        for u in &mut usage {
            u.share = u.used / grand_total;
        }
    }

    usage.sort_by(|a, b| {
        b.used
            .total_cmp(&a.used)
            .then_with(|| a.name.cmp(&b.name))
    });
    usage
}

// =============================================================================
// Charts
// =============================================================================

/// The three reports the back office can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum ReportKind {
    SalesByPeriod,
    PopularMenus,
    IngredientUsage,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::SalesByPeriod,
        ReportKind::PopularMenus,
        ReportKind::IngredientUsage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::SalesByPeriod => "sales-by-period",
            ReportKind::PopularMenus => "popular-menus",
            ReportKind::IngredientUsage => "ingredient-usage",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ReportKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "report".to_string(),
                allowed: ReportKind::ALL
                    .iter()
                    .map(|k| k.as_str().to_string())
                    .collect(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Everything a plotting widget needs, and nothing about how to draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub points: Vec<ChartPoint>,
    /// Message to show instead of an empty plot.
    pub placeholder: Option<String>,
}

impl Chart {
    /// Bar chart of sales; values in major currency units.
    pub fn sales(series: &SalesSeries) -> Self {
        Chart {
            kind: ChartKind::Bar,
            title: series.period.title().to_string(),
            x_label: Some(series.period.axis_label().to_string()),
            y_label: Some("Total Sales ($)".to_string()),
            points: series
                .points
                .iter()
                .map(|p| ChartPoint {
                    label: p.label.clone(),
                    value: p.total().as_major_f64(),
                })
                .collect(),
            placeholder: series.placeholder.clone(),
        }
    }

    /// Horizontal bars, one per menu.
    pub fn popular_menus(menus: &[MenuPopularity]) -> Self {
        Chart {
            kind: ChartKind::HorizontalBar,
            title: "Most Ordered Menus".to_string(),
            x_label: Some("Number of Orders".to_string()),
            y_label: Some("Menu".to_string()),
            points: menus
                .iter()
                .map(|m| ChartPoint {
                    label: m.name.clone(),
                    value: m.order_count as f64,
                })
                .collect(),
            placeholder: menus.is_empty().then(|| NO_MENUS.to_string()),
        }
    }

    /// Pie of total ingredient use.
    pub fn ingredient_usage(usage: &[IngredientUsage]) -> Self {
        Chart {
            kind: ChartKind::Pie,
            title: "Ingredient Usage Distribution".to_string(),
            x_label: None,
            y_label: None,
            points: usage
                .iter()
                .map(|u| ChartPoint {
                    label: u.name.clone(),
                    value: u.used,
                })
                .collect(),
            placeholder: usage.is_empty().then(|| NO_INGREDIENTS.to_string()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn sale(y: i32, m: u32, d: u32, cents: i64) -> SaleRecord {
        SaleRecord {
            created_at: at(y, m, d),
            total_cents: cents,
        }
    }

    #[test]
    fn test_period_labels() {
        let t = at(2024, 3, 5);
        assert_eq!(SalesPeriod::Daily.label_for(t), "2024-03-05");
        assert_eq!(SalesPeriod::Weekly.label_for(t), "2024-W10");
        assert_eq!(SalesPeriod::Monthly.label_for(t), "2024-03");
        assert_eq!(SalesPeriod::Yearly.label_for(t), "2024");
    }

    #[test]
    fn test_iso_week_crosses_calendar_year() {
        assert_eq!(SalesPeriod::Weekly.label_for(at(2024, 12, 30)), "2025-W01");
        assert_eq!(SalesPeriod::Weekly.label_for(at(2021, 1, 1)), "2020-W53");
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!("weekly".parse::<SalesPeriod>().unwrap(), SalesPeriod::Weekly);
        assert_eq!(" Daily ".parse::<SalesPeriod>().unwrap(), SalesPeriod::Daily);
        assert!(matches!(
            "hourly".parse::<SalesPeriod>(),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_sales_by_period_sums_and_sorts() {
        let sales = vec![
            sale(2024, 3, 9, 500),
            sale(2024, 1, 2, 1000),
            sale(2024, 3, 5, 1500),
        ];

        let monthly = sales_by_period(&sales, SalesPeriod::Monthly);
        let labels: Vec<_> = monthly.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-03"]);
        assert_eq!(monthly.points[1].total_cents, 2000);
        assert_eq!(monthly.grand_total(), Money::from_cents(3000));
        assert!(monthly.placeholder.is_none());

        let daily = sales_by_period(&sales, SalesPeriod::Daily);
        assert_eq!(daily.points.len(), 3);
        assert_eq!(daily.points[0].label, "2024-01-02");
    }

    #[test]
    fn test_sales_by_period_saturates_huge_totals() {
        let huge = i64::MAX / 2 + 1;
        let sales = vec![sale(2024, 5, 1, huge), sale(2024, 5, 2, huge)];

        let yearly = sales_by_period(&sales, SalesPeriod::Yearly);
        assert_eq!(yearly.points.len(), 1);
        assert_eq!(yearly.points[0].total_cents, i64::MAX);
        assert_eq!(yearly.grand_total().cents(), i64::MAX);
    }

    #[test]
    fn test_sales_by_period_empty_has_placeholder() {
        let series = sales_by_period(&[], SalesPeriod::Yearly);
        assert!(series.is_empty());
        assert_eq!(series.placeholder.as_deref(), Some(NO_ORDER_DATA));

        let chart = Chart::sales(&series);
        assert!(chart.is_placeholder());
        assert!(chart.points.is_empty());
    }

    #[test]
    fn test_rank_menus() {
        let menus = vec![
            MenuPopularity { menu_id: "1".into(), name: "Soup".into(), order_count: 2 },
            MenuPopularity { menu_id: "2".into(), name: "Bread".into(), order_count: 5 },
            MenuPopularity { menu_id: "3".into(), name: "Cake".into(), order_count: 2 },
            MenuPopularity { menu_id: "4".into(), name: "Salad".into(), order_count: 0 },
        ];
        let names: Vec<_> = rank_menus(menus).into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Bread", "Cake", "Soup", "Salad"]);
    }

    #[test]
    fn test_ingredient_usage() {
        let row = |id: &str, name: &str, qty: Option<f64>, count: i64| IngredientUseRow {
            ingredient_id: id.to_string(),
            name: name.to_string(),
            unit: "kg".to_string(),
            pair_quantity: qty,
            order_count: count,
        };
        // Flour in Bread (0.2, 3 orders) and Cake (0.5, 2 orders); Salt in Bread; Basil unused
        let rows = vec![
            row("f", "Flour", Some(0.2), 3),
            row("f", "Flour", Some(0.5), 2),
            row("s", "Salt", Some(0.4), 3),
            row("b", "Basil", None, 0),
        ];

        let usage = ingredient_usage(&rows);
        let names: Vec<_> = usage.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Flour", "Salt", "Basil"]);

        assert!((usage[0].used - 1.6).abs() < 1e-9);
        assert!((usage[1].used - 1.2).abs() < 1e-9);
        assert_eq!(usage[2].used, 0.0);

        let share_sum: f64 = usage.iter().map(|u| u.share).sum();
        assert!((share_sum - 1.0).abs() < 1e-9);
        assert!((usage[0].share - 1.6 / 2.8).abs() < 1e-9);
    }

    #[test]
    fn test_ingredient_usage_without_orders_has_zero_shares() {
        let rows = vec![IngredientUseRow {
            ingredient_id: "f".to_string(),
            name: "Flour".to_string(),
            unit: "kg".to_string(),
            pair_quantity: Some(0.2),
            order_count: 0,
        }];
        let usage = ingredient_usage(&rows);
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].share, 0.0);
    }

    #[test]
    fn test_charts() {
        let series = sales_by_period(&[sale(2024, 3, 5, 1500)], SalesPeriod::Daily);
        let chart = Chart::sales(&series);
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.title, "Daily Sales");
        assert_eq!(chart.points[0].value, 15.0);

        let empty_menus = Chart::popular_menus(&[]);
        assert_eq!(empty_menus.kind, ChartKind::HorizontalBar);
        assert_eq!(empty_menus.placeholder.as_deref(), Some(NO_MENUS));

        let empty_usage = Chart::ingredient_usage(&[]);
        assert_eq!(empty_usage.kind, ChartKind::Pie);
        assert_eq!(empty_usage.placeholder.as_deref(), Some(NO_INGREDIENTS));
    }

    #[test]
    fn test_report_kind_round_trips_through_text() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.to_string().parse::<ReportKind>().unwrap(), kind);
        }
        assert!("pie".parse::<ReportKind>().is_err());

        let json = serde_json::to_string(&ReportKind::PopularMenus).unwrap();
        assert_eq!(json, "\"popular-menus\"");
    }
}
