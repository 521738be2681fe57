// ==========================================
// BC 2.0 报关单查询系统 - 看板 API
// ==========================================
// 职责: 报关单汇总统计（总量 / 通道分布 / 月度趋势 / 进口商排行）
// 约定: 计数全部在 SQL 中聚合
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::repository::dashboard_repo::{CountBucket, DashboardRepository, DateRange};

/// 看板过滤条件（登记日期，YYYY-MM-DD）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardFilter {
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
}

impl DashboardFilter {
    fn to_range(&self) -> ApiResult<DateRange> {
        let range = DateRange {
            from: parse_date("date_from", self.date_from.as_deref())?,
            to: parse_date("date_to", self.date_to.as_deref())?,
        };
        if let (Some(from), Some(to)) = (range.from, range.to) {
            if from > to {
                return Err(ApiError::InvalidInput(format!(
                    "date_from ({}) 晚于 date_to ({})",
                    from, to
                )));
            }
        }
        Ok(range)
    }
}

fn parse_date(name: &str, raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::InvalidInput(format!("{} 不是有效日期: {}", name, s))),
    }
}

/// 看板汇总
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_declarations: i64,
    pub total_cif: f64,
    pub by_jalur: Vec<CountBucket>,
    pub by_month: Vec<CountBucket>,
    pub top_importers: Vec<CountBucket>,
}

// ==========================================
// DashboardApi - 看板 API
// ==========================================
pub struct DashboardApi {
    repo: Arc<DashboardRepository>,
}

impl DashboardApi {
    pub fn new(repo: Arc<DashboardRepository>) -> Self {
        Self { repo }
    }

    /// 看板汇总统计
    ///
    /// # 参数
    /// - filter: 登记日期范围（闭区间，均可缺省）
    pub fn summary(&self, filter: &DashboardFilter) -> ApiResult<DashboardSummary> {
        let range = filter.to_range()?;
        let totals = self.repo.totals(&range)?;
        Ok(DashboardSummary {
            total_declarations: totals.declarations,
            total_cif: totals.total_cif,
            by_jalur: self.repo.count_by_jalur(&range)?,
            by_month: self.repo.count_by_month(&range)?,
            top_importers: self.repo.top_importers(&range)?,
        })
    }
}
