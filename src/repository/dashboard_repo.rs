// ==========================================
// BC 2.0 报关单查询系统 - 驾驶舱统计仓储
// ==========================================
// 职责: 报关单总量 / CIF 合计 / 通道分布 / 月度趋势 / 进口商排行
// 约束: 全部在 SQL 中聚合，不把明细行读入内存
// ==========================================

use crate::engine::predicate_compiler::SqlValue;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_builder::SqlQueryBuilder;
use chrono::NaiveDate;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// 进口商排行条数
pub const TOP_IMPORTER_LIMIT: usize = 10;

/// 登记日期范围（闭区间，均可缺省）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// 分组计数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountBucket {
    pub key: String,
    pub count: i64,
}

/// 总量
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub declarations: i64,
    pub total_cif: f64,
}

pub struct DashboardRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DashboardRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn with_range(builder: SqlQueryBuilder, range: &DateRange) -> SqlQueryBuilder {
        let fmt = |d: NaiveDate| SqlValue::Text(d.format("%Y-%m-%d").to_string());
        builder
            .and_param_if("substr(h.tanggal_daftar, 1, 10) >= ?", range.from.map(fmt))
            .and_param_if("substr(h.tanggal_daftar, 1, 10) <= ?", range.to.map(fmt))
    }

    pub fn totals(&self, range: &DateRange) -> RepositoryResult<Totals> {
        let conn = self.get_conn()?;
        let (sql, params) = Self::with_range(
            SqlQueryBuilder::new(
                "SELECT COUNT(*), COALESCE(SUM(d.cif), 0) FROM bc20_header h \
                 LEFT JOIN bc20_data d ON d.header_id = h.id",
            ),
            range,
        )
        .into_parts();

        let totals = conn.query_row(&sql, params_from_iter(params.iter()), |row| {
            Ok(Totals {
                declarations: row.get(0)?,
                total_cif: row.get(1)?,
            })
        })?;
        Ok(totals)
    }

    /// 按查验通道计数（通道为空记为 "-"）
    pub fn count_by_jalur(&self, range: &DateRange) -> RepositoryResult<Vec<CountBucket>> {
        self.buckets(
            Self::with_range(
                SqlQueryBuilder::new(
                    "SELECT COALESCE(h.kode_jalur, '-') AS k, COUNT(*) FROM bc20_header h",
                ),
                range,
            )
            .group_by("k")
            .order_by("k"),
        )
    }

    /// 按月计数 (YYYY-MM)
    pub fn count_by_month(&self, range: &DateRange) -> RepositoryResult<Vec<CountBucket>> {
        self.buckets(
            Self::with_range(
                SqlQueryBuilder::new(
                    "SELECT substr(h.tanggal_daftar, 1, 7) AS k, COUNT(*) FROM bc20_header h",
                )
                .where_clause("h.tanggal_daftar IS NOT NULL"),
                range,
            )
            .group_by("k")
            .order_by("k"),
        )
    }

    /// 按报关单数量排序的进口商
    pub fn top_importers(&self, range: &DateRange) -> RepositoryResult<Vec<CountBucket>> {
        self.buckets(
            Self::with_range(
                SqlQueryBuilder::new(
                    "SELECT e.nama AS k, COUNT(DISTINCT h.id) AS n FROM bc20_header h \
                     JOIN bc20_entitas e ON e.header_id = h.id",
                )
                .where_clause("e.kode_entitas = '1'")
                .where_clause("e.nama IS NOT NULL"),
                range,
            )
            .group_by("k")
            .order_by("n DESC, k")
            .limit(TOP_IMPORTER_LIMIT),
        )
    }

    fn buckets(&self, builder: SqlQueryBuilder) -> RepositoryResult<Vec<CountBucket>> {
        let conn = self.get_conn()?;
        let (sql, params) = builder.into_parts();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok(CountBucket {
                    key: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_customs_schema;

    fn setup() -> DashboardRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_customs_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO bc20_header (id, nomor_aju, tanggal_daftar, kode_jalur) VALUES
              (1, 'A1', '2024-01-10', 'H'),
              (2, 'A2', '2024-01-20', 'M'),
              (3, 'A3', '2024-02-01', 'H'),
              (4, 'A4', NULL, NULL);
            INSERT INTO bc20_data (header_id, cif) VALUES (1, 100), (2, 50.5), (3, 10);
            INSERT INTO bc20_entitas (id, header_id, kode_entitas, nama) VALUES
              (1, 1, '1', 'PT SATU'), (2, 2, '1', 'PT SATU'), (3, 3, '1', 'PT DUA'),
              (4, 3, '9', 'SHIPPER LTD');
            "#,
        )
        .unwrap();
        DashboardRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_totals_and_buckets() {
        let repo = setup();
        let all = DateRange::default();

        let totals = repo.totals(&all).unwrap();
        assert_eq!(totals.declarations, 4);
        assert!((totals.total_cif - 160.5).abs() < 1e-9);

        let jalur = repo.count_by_jalur(&all).unwrap();
        assert_eq!(
            jalur,
            vec![
                CountBucket { key: "-".into(), count: 1 },
                CountBucket { key: "H".into(), count: 2 },
                CountBucket { key: "M".into(), count: 1 },
            ]
        );

        let months = repo.count_by_month(&all).unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0], CountBucket { key: "2024-01".into(), count: 2 });

        let top = repo.top_importers(&all).unwrap();
        assert_eq!(top[0], CountBucket { key: "PT SATU".into(), count: 2 });
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_date_range_filter() {
        let repo = setup();
        let range = DateRange {
            from: NaiveDate::from_ymd_opt(2024, 1, 15),
            to: NaiveDate::from_ymd_opt(2024, 1, 31),
        };
        assert_eq!(repo.totals(&range).unwrap().declarations, 1);
        assert_eq!(repo.top_importers(&range).unwrap().len(), 1);
    }
}
