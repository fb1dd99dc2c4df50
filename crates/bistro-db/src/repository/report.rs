//! # Report Repository
//!
//! Read-only queries behind the sales charts. Rows are fetched here and
//! handed to the pure aggregation in `bistro_core::report`.
//!
//! ## Queries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales_by_period   SELECT created_at, total_cents FROM orders          │
//! │                    → report::sales_by_period (buckets in Rust, so ISO   │
//! │                      weeks follow chrono rather than strftime)          │
//! │                                                                         │
//! │  popular_menus     menus LEFT JOIN orders, COUNT per menu              │
//! │                    → report::rank_menus                                 │
//! │                                                                         │
//! │  ingredient_usage  ingredients LEFT JOIN menu_ingredients              │
//! │                    LEFT JOIN (orders per menu)                          │
//! │                    → report::ingredient_usage                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders whose menu was deleted still count in sales, but no longer in
//! popularity or ingredient usage.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use bistro_core::report::{
    self, IngredientUsage, IngredientUseRow, MenuPopularity, SaleRecord, SalesSeries,
};
use bistro_core::{Chart, ReportKind, SalesPeriod};

/// Repository for report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Order totals summed per day, ISO week, month or year, ascending.
    ///
    /// With no orders the series is empty and carries a placeholder.
    pub async fn sales_by_period(&self, period: SalesPeriod) -> DbResult<SalesSeries> {
        let sales = sqlx::query_as::<_, SaleRecord>(
            "SELECT created_at, total_cents FROM orders ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        let series = report::sales_by_period(&sales, period);

        debug!(
            period = %period,
            orders = sales.len(),
            buckets = series.points.len(),
            "Computed sales by period"
        );
        Ok(series)
    }

    /// Order count per menu, most ordered first. Menus never ordered are
    /// included with a count of zero.
    pub async fn popular_menus(&self) -> DbResult<Vec<MenuPopularity>> {
        let rows = sqlx::query_as::<_, MenuPopularity>(
            "SELECT m.id AS menu_id, m.name, COUNT(o.id) AS order_count \
             FROM menus m \
             LEFT JOIN orders o ON o.menu_id = m.id \
             GROUP BY m.id, m.name",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(menus = rows.len(), "Computed menu popularity");
        Ok(report::rank_menus(rows))
    }

    /// Total use of every ingredient across all orders, with its share of
    /// the grand total, largest first.
    pub async fn ingredient_usage(&self) -> DbResult<Vec<IngredientUsage>> {
        let rows = sqlx::query_as::<_, IngredientUseRow>(
            "SELECT i.id AS ingredient_id, i.name, i.unit, \
                    mi.quantity AS pair_quantity, \
                    COALESCE(oc.order_count, 0) AS order_count \
             FROM ingredients i \
             LEFT JOIN menu_ingredients mi ON mi.ingredient_id = i.id \
             LEFT JOIN ( \
                 SELECT menu_id, COUNT(*) AS order_count \
                 FROM orders WHERE menu_id IS NOT NULL GROUP BY menu_id \
             ) oc ON oc.menu_id = mi.menu_id \
             ORDER BY i.name, i.id",
        )
        .fetch_all(&self.pool)
        .await?;

        let usage = report::ingredient_usage(&rows);

        debug!(ingredients = usage.len(), "Computed ingredient usage");
        Ok(usage)
    }

    /// Chart data for one report. `period` only matters for sales.
    pub async fn chart(&self, kind: ReportKind, period: SalesPeriod) -> DbResult<Chart> {
        let chart = match kind {
            ReportKind::SalesByPeriod => Chart::sales(&self.sales_by_period(period).await?),
            ReportKind::PopularMenus => Chart::popular_menus(&self.popular_menus().await?),
            ReportKind::IngredientUsage => {
                Chart::ingredient_usage(&self.ingredient_usage().await?)
            }
        };

        Ok(chart)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use bistro_core::report::{NO_INGREDIENTS, NO_MENUS, NO_ORDER_DATA};
    use bistro_core::{ChartKind, Client, Ingredient, Menu, NewClient, NewIngredient, NewMenu, NewOrder};
    use chrono::{DateTime, TimeZone, Utc};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn ingredient(db: &Database, name: &str) -> Ingredient {
        db.ingredients()
            .create(&NewIngredient::new(name, "Other", 50.0, "kg"))
            .await
            .unwrap()
    }

    async fn menu(db: &Database, name: &str, price_cents: i64, pairs: &[(&Ingredient, f64)]) -> Menu {
        db.menus()
            .create(&NewMenu {
                name: name.to_string(),
                description: None,
                price_cents,
                ingredients: pairs.iter().map(|(i, q)| (i.id.clone(), *q)).collect(),
            })
            .await
            .unwrap()
    }

    async fn client(db: &Database) -> Client {
        db.clients()
            .create(&NewClient::new("A", "a@x.com"))
            .await
            .unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 30, 0).unwrap()
    }

    async fn order_at(db: &Database, client: &Client, menu: &Menu, qty: i64, when: DateTime<Utc>) {
        db.orders()
            .create_at(&NewOrder::new(&client.id, &menu.id, qty), when)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_database_placeholders() {
        let db = setup().await;
        let reports = db.reports();

        for period in SalesPeriod::ALL {
            let series = reports.sales_by_period(period).await.unwrap();
            assert!(series.points.is_empty());
            assert_eq!(series.placeholder.as_deref(), Some(NO_ORDER_DATA));
        }

        let menus = reports
            .chart(ReportKind::PopularMenus, SalesPeriod::Daily)
            .await
            .unwrap();
        assert_eq!(menus.placeholder.as_deref(), Some(NO_MENUS));

        let usage = reports
            .chart(ReportKind::IngredientUsage, SalesPeriod::Daily)
            .await
            .unwrap();
        assert_eq!(usage.placeholder.as_deref(), Some(NO_INGREDIENTS));
    }

    #[tokio::test]
    async fn test_sales_by_period() {
        let db = setup().await;
        let flour = ingredient(&db, "Flour").await;
        let bread = menu(&db, "Bread", 500, &[(&flour, 0.2)]).await;
        let a = client(&db).await;

        order_at(&db, &a, &bread, 3, at(2024, 3, 5)).await; // 15.00
        order_at(&db, &a, &bread, 1, at(2024, 3, 5)).await; //  5.00
        order_at(&db, &a, &bread, 2, at(2024, 3, 12)).await; // 10.00
        order_at(&db, &a, &bread, 1, at(2023, 12, 31)).await; // 5.00

        let reports = db.reports();

        let daily = reports.sales_by_period(SalesPeriod::Daily).await.unwrap();
        let points: Vec<_> = daily
            .points
            .iter()
            .map(|p| (p.label.as_str(), p.total_cents))
            .collect();
        assert_eq!(
            points,
            vec![("2023-12-31", 500), ("2024-03-05", 2000), ("2024-03-12", 1000)]
        );

        let weekly = reports.sales_by_period(SalesPeriod::Weekly).await.unwrap();
        let labels: Vec<_> = weekly.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2023-W52", "2024-W10", "2024-W11"]);

        let monthly = reports.sales_by_period(SalesPeriod::Monthly).await.unwrap();
        assert_eq!(monthly.points.len(), 2);
        assert_eq!(monthly.points[1].label, "2024-03");
        assert_eq!(monthly.points[1].total_cents, 3000);

        let yearly = reports.sales_by_period(SalesPeriod::Yearly).await.unwrap();
        assert_eq!(yearly.points.len(), 2);
        assert_eq!(yearly.grand_total().cents(), 3500);
        assert!(yearly.placeholder.is_none());
    }

    #[tokio::test]
    async fn test_popular_menus() {
        let db = setup().await;
        let flour = ingredient(&db, "Flour").await;
        let bread = menu(&db, "Bread", 500, &[(&flour, 0.2)]).await;
        let cake = menu(&db, "Cake", 800, &[(&flour, 0.5)]).await;
        menu(&db, "Anchovies", 300, &[(&flour, 0.1)]).await;
        let a = client(&db).await;

        order_at(&db, &a, &cake, 10, at(2024, 1, 1)).await;
        order_at(&db, &a, &bread, 1, at(2024, 1, 1)).await;
        order_at(&db, &a, &bread, 1, at(2024, 1, 2)).await;

        let ranking = db.reports().popular_menus().await.unwrap();
        let rows: Vec<_> = ranking
            .iter()
            .map(|m| (m.name.as_str(), m.order_count))
            .collect();
        // Counts orders, not quantities
        assert_eq!(rows, vec![("Bread", 2), ("Cake", 1), ("Anchovies", 0)]);

        let chart = db
            .reports()
            .chart(ReportKind::PopularMenus, SalesPeriod::Daily)
            .await
            .unwrap();
        assert_eq!(chart.kind, ChartKind::HorizontalBar);
        assert_eq!(chart.points[0].label, "Bread");
        assert_eq!(chart.points[0].value, 2.0);
    }

    #[tokio::test]
    async fn test_ingredient_usage() {
        let db = setup().await;
        let flour = ingredient(&db, "Flour").await;
        let salt = ingredient(&db, "Salt").await;
        let basil = ingredient(&db, "Basil").await;
        let bread = menu(&db, "Bread", 500, &[(&flour, 0.2), (&salt, 0.4)]).await;
        let cake = menu(&db, "Cake", 800, &[(&flour, 0.5)]).await;
        let a = client(&db).await;

        for _ in 0..3 {
            order_at(&db, &a, &bread, 1, at(2024, 1, 1)).await;
        }
        for _ in 0..2 {
            order_at(&db, &a, &cake, 4, at(2024, 1, 1)).await;
        }

        let usage = db.reports().ingredient_usage().await.unwrap();
        let names: Vec<_> = usage.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Flour", "Salt", "Basil"]);

        // Flour: 0.2 × 3 + 0.5 × 2
        assert!((usage[0].used - 1.6).abs() < 1e-9);
        assert!((usage[1].used - 1.2).abs() < 1e-9);
        assert_eq!(usage[2].ingredient_id, basil.id);
        assert_eq!(usage[2].used, 0.0);
        assert!((usage[0].share - 1.6 / 2.8).abs() < 1e-9);

        let chart = db
            .reports()
            .chart(ReportKind::IngredientUsage, SalesPeriod::Daily)
            .await
            .unwrap();
        assert_eq!(chart.kind, ChartKind::Pie);
        assert_eq!(chart.points.len(), 3);
        assert!(chart.placeholder.is_none());
    }

    #[tokio::test]
    async fn test_sales_chart() {
        let db = setup().await;
        let flour = ingredient(&db, "Flour").await;
        let bread = menu(&db, "Bread", 500, &[(&flour, 0.2)]).await;
        let a = client(&db).await;
        order_at(&db, &a, &bread, 3, at(2024, 3, 5)).await;

        let chart = db
            .reports()
            .chart(ReportKind::SalesByPeriod, SalesPeriod::Monthly)
            .await
            .unwrap();

        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.title, "Monthly Sales");
        assert_eq!(chart.points.len(), 1);
        assert_eq!(chart.points[0].label, "2024-03");
        assert_eq!(chart.points[0].value, 15.0);
    }
}
