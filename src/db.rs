// ==========================================
// BC 2.0 报关单查询系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少外部导入进程写入时的偶发 busy 错误
// - 提供开发/测试用的报关数据建表语句（生产库由外部导入流程维护）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的报关库 schema_version
///
/// 说明：只用于启动时提示/告警，不做自动迁移。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 启动时校验 schema_version，只告警不阻断
pub fn warn_on_schema_mismatch(conn: &Connection) {
    match read_schema_version(conn) {
        Ok(Some(v)) if v == CURRENT_SCHEMA_VERSION => {
            tracing::debug!("schema_version={}", v);
        }
        Ok(Some(v)) => {
            tracing::warn!(
                "schema_version 不匹配: 数据库={}, 期望={}",
                v,
                CURRENT_SCHEMA_VERSION
            );
        }
        Ok(None) => {
            tracing::warn!("数据库缺少 schema_version 表，可能不是报关数据库");
        }
        Err(e) => {
            tracing::warn!("读取 schema_version 失败: {}", e);
        }
    }
}

/// 报关数据表结构（开发/测试用）
///
/// 表名与列名需与外部导入流程保持一致；查询层只读。
pub const CUSTOMS_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS bc20_header (
    id INTEGER PRIMARY KEY,
    nomor_aju TEXT NOT NULL,
    nomor_daftar TEXT,
    tanggal_daftar TEXT,
    kode_jalur TEXT,
    nama_perusahaan TEXT,
    kode_kantor TEXT,
    nama_kantor TEXT,
    status_respon TEXT,
    kode_dokumen TEXT,
    kode_proses TEXT
);
CREATE INDEX IF NOT EXISTS idx_bc20_header_nomor_daftar ON bc20_header(nomor_daftar);
CREATE INDEX IF NOT EXISTS idx_bc20_header_tanggal_daftar ON bc20_header(tanggal_daftar);

CREATE TABLE IF NOT EXISTS bc20_data (
    header_id INTEGER PRIMARY KEY REFERENCES bc20_header(id) ON DELETE CASCADE,
    netto REAL,
    bruto REAL,
    cif REAL,
    kode_valuta TEXT,
    ndpbm REAL,
    tanggal_tiba TEXT,
    pelabuhan_muat TEXT,
    pelabuhan_tujuan TEXT,
    nomor_bc11 TEXT,
    tanggal_bc11 TEXT,
    pos_bc11 TEXT,
    kode_tps TEXT,
    nama_tps TEXT
);

CREATE TABLE IF NOT EXISTS bc20_barang (
    id INTEGER PRIMARY KEY,
    header_id INTEGER NOT NULL REFERENCES bc20_header(id) ON DELETE CASCADE,
    seri_barang INTEGER NOT NULL,
    kode_hs TEXT,
    uraian TEXT,
    jumlah_satuan REAL,
    kode_satuan TEXT,
    cif REAL,
    jumlah_kemasan REAL,
    kode_kemasan TEXT,
    netto REAL,
    kode_negara_asal TEXT
);
CREATE INDEX IF NOT EXISTS idx_bc20_barang_header ON bc20_barang(header_id);

CREATE TABLE IF NOT EXISTS bc20_dokumen (
    id INTEGER PRIMARY KEY,
    header_id INTEGER NOT NULL REFERENCES bc20_header(id) ON DELETE CASCADE,
    seri INTEGER NOT NULL,
    kode_dokumen TEXT,
    nomor_dokumen TEXT,
    tanggal_dokumen TEXT
);
CREATE INDEX IF NOT EXISTS idx_bc20_dokumen_header ON bc20_dokumen(header_id);

CREATE TABLE IF NOT EXISTS bc20_kontainer (
    id INTEGER PRIMARY KEY,
    header_id INTEGER NOT NULL REFERENCES bc20_header(id) ON DELETE CASCADE,
    seri INTEGER NOT NULL,
    nomor_kontainer TEXT,
    kode_ukuran TEXT,
    kode_tipe TEXT
);
CREATE INDEX IF NOT EXISTS idx_bc20_kontainer_header ON bc20_kontainer(header_id);

CREATE TABLE IF NOT EXISTS bc20_entitas (
    id INTEGER PRIMARY KEY,
    header_id INTEGER NOT NULL REFERENCES bc20_header(id) ON DELETE CASCADE,
    kode_entitas TEXT NOT NULL,
    nama TEXT,
    alamat TEXT,
    nomor_identitas TEXT,
    kode_negara TEXT
);
CREATE INDEX IF NOT EXISTS idx_bc20_entitas_header ON bc20_entitas(header_id, kode_entitas);

CREATE TABLE IF NOT EXISTS bc20_pengangkut (
    id INTEGER PRIMARY KEY,
    header_id INTEGER NOT NULL REFERENCES bc20_header(id) ON DELETE CASCADE,
    seri INTEGER NOT NULL,
    kode_cara_angkut TEXT,
    nama_pengangkut TEXT,
    nomor_pengangkut TEXT,
    kode_bendera TEXT
);
CREATE INDEX IF NOT EXISTS idx_bc20_pengangkut_header ON bc20_pengangkut(header_id);

CREATE TABLE IF NOT EXISTS bc20_pungutan (
    id INTEGER PRIMARY KEY,
    header_id INTEGER NOT NULL REFERENCES bc20_header(id) ON DELETE CASCADE,
    kode_jenis_pungutan TEXT NOT NULL,
    nilai_pungutan REAL,
    kode_fasilitas TEXT
);
CREATE INDEX IF NOT EXISTS idx_bc20_pungutan_header ON bc20_pungutan(header_id, kode_jenis_pungutan);
"#;

/// 创建报关数据表并写入 schema_version（幂等）
pub fn init_customs_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CUSTOMS_SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}
