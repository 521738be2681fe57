// ==========================================
// BC 2.0 报关单查询系统 - 规则集仓储
// ==========================================
// 表: rule_sets（首次使用时创建）
// 红线: 仓储不做权限判断，可见性/所有权由 RuleSetApi 负责
// ==========================================

use crate::domain::rule::RuleGroup;
use crate::domain::rule_set::RuleSet;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = "SELECT rule_set_id, name, description, rules_json, owner_id, \
                              is_public, created_at, updated_at FROM rule_sets";

pub struct RuleSetRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RuleSetRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        // 建表失败不阻断启动；使用时会再次暴露错误
        if let Err(e) = repo.ensure_table() {
            tracing::warn!("rule_sets ensure failed: {}", e);
        }
        repo
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rule_sets (
              rule_set_id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              description TEXT,
              rules_json TEXT NOT NULL,
              owner_id TEXT NOT NULL,
              is_public INTEGER NOT NULL DEFAULT 0,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_rule_sets_owner ON rule_sets(owner_id);
            CREATE INDEX IF NOT EXISTS idx_rule_sets_public ON rule_sets(is_public);
            "#,
        )?;
        Ok(())
    }

    pub fn insert(&self, rule_set: &RuleSet) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO rule_sets (
              rule_set_id, name, description, rules_json, owner_id,
              is_public, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                rule_set.id,
                rule_set.name,
                rule_set.description,
                rule_set.rules.to_json().to_string(),
                rule_set.owner,
                if rule_set.is_public { 1 } else { 0 },
                rule_set.created_at.format(DATETIME_FORMAT).to_string(),
                rule_set.updated_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<RuleSet>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE rule_set_id = ?1", SELECT_COLUMNS);
        let found = conn.query_row(&sql, params![id], map_row).optional()?;
        Ok(found)
    }

    /// 列出规则集
    ///
    /// # 参数
    /// - owner: None 返回全部（管理员）；Some(user) 返回该用户的与公开的
    pub fn list_visible_to(&self, owner: Option<&str>) -> RepositoryResult<Vec<RuleSet>> {
        let conn = self.get_conn()?;
        let rows = match owner {
            None => {
                let sql = format!("{} ORDER BY name COLLATE NOCASE, rule_set_id", SELECT_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], map_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            Some(user) => {
                let sql = format!(
                    "{} WHERE owner_id = ?1 OR is_public = 1 ORDER BY name COLLATE NOCASE, rule_set_id",
                    SELECT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![user], map_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(rows)
    }

    /// 更新名称/描述/规则/公开标记（所有者与创建时间不变）
    pub fn update(&self, rule_set: &RuleSet) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE rule_sets
            SET name = ?1,
                description = ?2,
                rules_json = ?3,
                is_public = ?4,
                updated_at = ?5
            WHERE rule_set_id = ?6
            "#,
            params![
                rule_set.name,
                rule_set.description,
                rule_set.rules.to_json().to_string(),
                if rule_set.is_public { 1 } else { 0 },
                rule_set.updated_at.format(DATETIME_FORMAT).to_string(),
                rule_set.id,
            ],
        )?;
        Ok(rows)
    }

    pub fn delete(&self, id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM rule_sets WHERE rule_set_id = ?1", params![id])?;
        Ok(rows)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<RuleSet> {
    let rules_json: String = row.get(3)?;
    let is_public: i64 = row.get(5)?;
    let created_at_str: String = row.get(6)?;
    let updated_at_str: String = row.get(7)?;

    let rules = RuleGroup::from_json_str(&rules_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(RuleSet {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        rules,
        owner: row.get(4)?,
        is_public: is_public != 0,
        created_at,
        updated_at,
    })
}
