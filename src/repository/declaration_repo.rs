// ==========================================
// BC 2.0 报关单查询系统 - 报关单仓储
// ==========================================
// 职责: 执行编译后的谓词（计数 / 分页取 id）并按页批量加载子表
// 约束:
// - 子表只按当前页 id 以 `header_id IN (...)` 加载，不扫描整张子表
// - 子表按 header_id, 序号, id 排序，结果稳定
// ==========================================

use crate::domain::customs::{
    parse_lenient_date, Carrier, Container, Declaration, DeclarationHeader, Document, Duty,
    Goods, HeaderData, PartyEntity,
};
use crate::domain::types::SortOrder;
use crate::engine::predicate_compiler::{CompiledPredicate, SqlValue};
use crate::repository::declaration_reader::{DeclarationReader, HydrationNeeds};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_builder::{placeholders, SqlQueryBuilder};
use rusqlite::{params_from_iter, Connection, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct DeclarationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DeclarationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 `header_id IN (...)` 加载一张子表
    fn load_children<T, F>(
        conn: &Connection,
        select: &str,
        order_by: &str,
        ids: &[i64],
        map: F,
    ) -> RepositoryResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let sql = format!(
            "{} WHERE header_id IN ({}) ORDER BY {}",
            select,
            placeholders(ids.len()),
            order_by
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), map)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl DeclarationReader for DeclarationRepository {
    fn count_matching(&self, predicate: &CompiledPredicate) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let (sql, params) = SqlQueryBuilder::new("SELECT COUNT(*) FROM bc20_header h")
            .where_predicate(predicate)
            .into_parts();
        let total: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(total)
    }

    fn find_matching_ids(
        &self,
        predicate: &CompiledPredicate,
        order: &SortOrder,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let (sql, params) = SqlQueryBuilder::new("SELECT h.id FROM bc20_header h")
            .where_predicate(predicate)
            .order_by(&order.to_sql())
            .limit(limit)
            .offset(offset)
            .into_parts();

        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn load_declarations(
        &self,
        ids: &[i64],
        needs: &HydrationNeeds,
    ) -> RepositoryResult<Vec<Declaration>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;

        // ===== 表头 =====
        let sql = format!(
            "SELECT id, nomor_aju, nomor_daftar, tanggal_daftar, kode_jalur, nama_perusahaan, \
             kode_kantor, nama_kantor, status_respon, kode_dokumen, kode_proses \
             FROM bc20_header WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let headers = stmt
            .query_map(params_from_iter(ids.iter()), map_header)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut by_id: HashMap<i64, Declaration> = headers
            .into_iter()
            .map(|h| (h.id, Declaration::new(h)))
            .collect();

        // ===== 子表（按需）=====
        if needs.data {
            let rows = Self::load_children(
                &conn,
                "SELECT header_id, netto, bruto, cif, kode_valuta, ndpbm, tanggal_tiba, \
                 pelabuhan_muat, pelabuhan_tujuan, nomor_bc11, tanggal_bc11, pos_bc11, \
                 kode_tps, nama_tps FROM bc20_data",
                "header_id",
                ids,
                map_data,
            )?;
            for row in rows {
                if let Some(decl) = by_id.get_mut(&row.header_id) {
                    decl.data = Some(row);
                }
            }
        }

        if needs.goods {
            let rows = Self::load_children(
                &conn,
                "SELECT id, header_id, seri_barang, kode_hs, uraian, jumlah_satuan, kode_satuan, \
                 cif, jumlah_kemasan, kode_kemasan, netto, kode_negara_asal FROM bc20_barang",
                "header_id, seri_barang, id",
                ids,
                map_goods,
            )?;
            for row in rows {
                if let Some(decl) = by_id.get_mut(&row.header_id) {
                    decl.goods.push(row);
                }
            }
        }

        if needs.documents {
            let rows = Self::load_children(
                &conn,
                "SELECT id, header_id, seri, kode_dokumen, nomor_dokumen, tanggal_dokumen \
                 FROM bc20_dokumen",
                "header_id, seri, id",
                ids,
                map_document,
            )?;
            for row in rows {
                if let Some(decl) = by_id.get_mut(&row.header_id) {
                    decl.documents.push(row);
                }
            }
        }

        if needs.containers {
            let rows = Self::load_children(
                &conn,
                "SELECT id, header_id, seri, nomor_kontainer, kode_ukuran, kode_tipe \
                 FROM bc20_kontainer",
                "header_id, seri, id",
                ids,
                map_container,
            )?;
            for row in rows {
                if let Some(decl) = by_id.get_mut(&row.header_id) {
                    decl.containers.push(row);
                }
            }
        }

        if needs.entities {
            let rows = Self::load_children(
                &conn,
                "SELECT id, header_id, kode_entitas, nama, alamat, nomor_identitas, kode_negara \
                 FROM bc20_entitas",
                "header_id, id",
                ids,
                map_entity,
            )?;
            for row in rows {
                if let Some(decl) = by_id.get_mut(&row.header_id) {
                    decl.entities.push(row);
                }
            }
        }

        if needs.carriers {
            let rows = Self::load_children(
                &conn,
                "SELECT id, header_id, seri, kode_cara_angkut, nama_pengangkut, \
                 nomor_pengangkut, kode_bendera FROM bc20_pengangkut",
                "header_id, seri, id",
                ids,
                map_carrier,
            )?;
            for row in rows {
                if let Some(decl) = by_id.get_mut(&row.header_id) {
                    decl.carriers.push(row);
                }
            }
        }

        if needs.duties {
            let rows = Self::load_children(
                &conn,
                "SELECT id, header_id, kode_jenis_pungutan, nilai_pungutan, kode_fasilitas \
                 FROM bc20_pungutan",
                "header_id, id",
                ids,
                map_duty,
            )?;
            for row in rows {
                if let Some(decl) = by_id.get_mut(&row.header_id) {
                    decl.duties.push(row);
                }
            }
        }

        // 保持调用方给定的 id 顺序
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

// ==========================================
// 行映射
// ==========================================

fn map_header(row: &Row<'_>) -> rusqlite::Result<DeclarationHeader> {
    Ok(DeclarationHeader {
        id: row.get(0)?,
        nomor_aju: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        nomor_daftar: row.get(2)?,
        tanggal_daftar: parse_lenient_date(row.get(3)?),
        kode_jalur: row.get(4)?,
        nama_perusahaan: row.get(5)?,
        kode_kantor: row.get(6)?,
        nama_kantor: row.get(7)?,
        status_respon: row.get(8)?,
        kode_dokumen: row.get(9)?,
        kode_proses: row.get(10)?,
    })
}

fn map_data(row: &Row<'_>) -> rusqlite::Result<HeaderData> {
    Ok(HeaderData {
        header_id: row.get(0)?,
        netto: row.get(1)?,
        bruto: row.get(2)?,
        cif: row.get(3)?,
        kode_valuta: row.get(4)?,
        ndpbm: row.get(5)?,
        tanggal_tiba: parse_lenient_date(row.get(6)?),
        pelabuhan_muat: row.get(7)?,
        pelabuhan_tujuan: row.get(8)?,
        nomor_bc11: row.get(9)?,
        tanggal_bc11: parse_lenient_date(row.get(10)?),
        pos_bc11: row.get(11)?,
        kode_tps: row.get(12)?,
        nama_tps: row.get(13)?,
    })
}

fn map_goods(row: &Row<'_>) -> rusqlite::Result<Goods> {
    Ok(Goods {
        id: row.get(0)?,
        header_id: row.get(1)?,
        seri_barang: row.get(2)?,
        kode_hs: row.get(3)?,
        uraian: row.get(4)?,
        jumlah_satuan: row.get(5)?,
        kode_satuan: row.get(6)?,
        cif: row.get(7)?,
        jumlah_kemasan: row.get(8)?,
        kode_kemasan: row.get(9)?,
        netto: row.get(10)?,
        kode_negara_asal: row.get(11)?,
    })
}

fn map_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        header_id: row.get(1)?,
        seri: row.get(2)?,
        kode_dokumen: row.get(3)?,
        nomor_dokumen: row.get(4)?,
        tanggal_dokumen: parse_lenient_date(row.get(5)?),
    })
}

fn map_container(row: &Row<'_>) -> rusqlite::Result<Container> {
    Ok(Container {
        id: row.get(0)?,
        header_id: row.get(1)?,
        seri: row.get(2)?,
        nomor_kontainer: row.get(3)?,
        kode_ukuran: row.get(4)?,
        kode_tipe: row.get(5)?,
    })
}

fn map_entity(row: &Row<'_>) -> rusqlite::Result<PartyEntity> {
    Ok(PartyEntity {
        id: row.get(0)?,
        header_id: row.get(1)?,
        kode_entitas: row.get(2)?,
        nama: row.get(3)?,
        alamat: row.get(4)?,
        nomor_identitas: row.get(5)?,
        kode_negara: row.get(6)?,
    })
}

fn map_carrier(row: &Row<'_>) -> rusqlite::Result<Carrier> {
    Ok(Carrier {
        id: row.get(0)?,
        header_id: row.get(1)?,
        seri: row.get(2)?,
        kode_cara_angkut: row.get(3)?,
        nama_pengangkut: row.get(4)?,
        nomor_pengangkut: row.get(5)?,
        kode_bendera: row.get(6)?,
    })
}

fn map_duty(row: &Row<'_>) -> rusqlite::Result<Duty> {
    Ok(Duty {
        id: row.get(0)?,
        header_id: row.get(1)?,
        kode_jenis_pungutan: row.get(2)?,
        nilai_pungutan: row.get(3)?,
        kode_fasilitas: row.get(4)?,
    })
}

/// 参数列表转为调试文本（慢查询排查用）
pub fn describe_params(params: &[SqlValue]) -> String {
    params
        .iter()
        .map(|p| match p {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Text(s) => format!("'{}'", s),
            SqlValue::Blob(b) => format!("<blob {} bytes>", b.len()),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
