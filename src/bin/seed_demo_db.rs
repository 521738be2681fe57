// ==========================================
// BC 2.0 报关单查询系统 - 演示库生成工具
// ==========================================
// 用法: seed_demo_db [db_path] [declaration_count]
// 说明: 已存在的库先备份再重建；数据按序号确定性生成
// ==========================================

use chrono::{Duration, Local, NaiveDate};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fs;
use std::path::Path;

use bc20_query::app::get_default_db_path;
use bc20_query::db::{init_customs_schema, open_sqlite_connection};

const DEFAULT_DECLARATION_COUNT: i64 = 500;

const JALUR: [&str; 4] = ["H", "K", "M", "P"];
const VALUTA: [&str; 3] = ["USD", "EUR", "JPY"];
const PELABUHAN: [&str; 4] = ["IDTPP", "IDJKT", "IDSUB", "IDBLW"];
const NEGARA: [&str; 5] = ["CN", "JP", "KR", "DE", "US"];
const IMPORTIR: [&str; 6] = [
    "PT SINAR JAYA ABADI",
    "PT MAJU BERSAMA",
    "CV KARYA MANDIRI",
    "PT NUSANTARA LOGISTIK",
    "PT INDO TEKSTIL",
    "PT BUMI ELEKTRIKA",
];
const KODE_HS: [&str; 6] = [
    "84713010", "85176299", "39269099", "73181510", "52083900", "90189090",
];
const URAIAN: [&str; 6] = [
    "LAPTOP", "ROUTER", "PLASTIC PARTS", "BOLTS", "COTTON FABRIC", "MEDICAL DEVICE",
];

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);

    let count = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_DECLARATION_COUNT)
        .max(1);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_customs_schema(&conn)?;
    seed_declarations(&conn, count)?;
    print_quick_counts(&conn)?;

    eprintln!("Seeded {} declarations into {}", count, db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_declarations(conn: &Connection, count: i64) -> Result<(), Box<dyn Error>> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).ok_or("invalid base date")?;
    let tx = conn.unchecked_transaction()?;

    for id in 1..=count {
        let i = id as usize;
        let tanggal = base_date + Duration::days(id % 180);
        let tanggal_str = tanggal.format("%Y-%m-%d").to_string();
        let jalur = JALUR[i % JALUR.len()];
        let importir = IMPORTIR[i % IMPORTIR.len()];
        let valuta = VALUTA[i % VALUTA.len()];

        // 每 7 张留一张未登记（无 nomor_daftar）
        let nomor_daftar = if id % 7 == 0 {
            None
        } else {
            Some(format!("{:06}", 100_000 + id))
        };

        tx.execute(
            "INSERT INTO bc20_header (id, nomor_aju, nomor_daftar, tanggal_daftar, kode_jalur,
                nama_perusahaan, kode_kantor, nama_kantor, status_respon, kode_dokumen, kode_proses)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, '20', '1')",
            params![
                id,
                format!("0000201234562024{:010}", id),
                nomor_daftar,
                nomor_daftar.as_ref().map(|_| tanggal_str.clone()),
                jalur,
                importir,
                "040300",
                "KPU BC TIPE A TANJUNG PRIOK",
                if nomor_daftar.is_some() { "SPPB" } else { "DRAFT" },
            ],
        )?;

        // 货物 0..=3 项；每 11 张无货物
        let goods_count = if id % 11 == 0 { 0 } else { (i % 3) + 1 };
        let mut total_cif = 0.0;
        for seri in 1..=goods_count {
            let k = (i + seri) % KODE_HS.len();
            let jumlah = (10 * seri + i % 50) as f64;
            let cif = jumlah * (25.0 + (k as f64) * 12.5);
            total_cif += cif;
            tx.execute(
                "INSERT INTO bc20_barang (header_id, seri_barang, kode_hs, uraian, jumlah_satuan,
                    kode_satuan, cif, jumlah_kemasan, kode_kemasan, netto, kode_negara_asal)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'PCE', ?6, ?7, 'CT', ?8, ?9)",
                params![
                    id,
                    seri as i64,
                    KODE_HS[k],
                    URAIAN[k],
                    jumlah,
                    cif,
                    (seri * 2) as f64,
                    jumlah * 0.8,
                    NEGARA[(i + seri) % NEGARA.len()],
                ],
            )?;
        }

        tx.execute(
            "INSERT INTO bc20_data (header_id, netto, bruto, cif, kode_valuta, ndpbm, tanggal_tiba,
                pelabuhan_muat, pelabuhan_tujuan, nomor_bc11, tanggal_bc11, pos_bc11, kode_tps, nama_tps)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'IDTPP', ?9, ?10, ?11, 'KOJA', 'TPS KOJA')",
            params![
                id,
                total_cif / 10.0,
                total_cif / 9.0,
                total_cif,
                valuta,
                15_500.0 + (i % 400) as f64,
                (tanggal - Duration::days(3)).format("%Y-%m-%d").to_string(),
                PELABUHAN[i % PELABUHAN.len()],
                format!("{:06}", 5_000 + id / 10),
                (tanggal - Duration::days(5)).format("%Y-%m-%d").to_string(),
                format!("{:04}", id % 1_000),
            ],
        )?;

        seed_entities(&tx, id, importir, i)?;
        seed_documents(&tx, id, &tanggal_str, i)?;
        seed_containers(&tx, id, i)?;
        seed_carriers(&tx, id, i)?;
        seed_duties(&tx, id, total_cif, i)?;
    }

    tx.commit()?;
    Ok(())
}

fn seed_entities(conn: &Connection, id: i64, importir: &str, i: usize) -> rusqlite::Result<()> {
    let rows: [(&str, String, String); 3] = [
        ("1", importir.to_string(), format!("01.234.{:03}.5-000.000", i % 1_000)),
        ("4", "PT PPJK SEJAHTERA".to_string(), "02.111.222.3-000.000".to_string()),
        (
            "9",
            format!("SUPPLIER {} LTD", NEGARA[i % NEGARA.len()]),
            String::new(),
        ),
    ];
    for (kode, nama, npwp) in rows {
        conn.execute(
            "INSERT INTO bc20_entitas (header_id, kode_entitas, nama, alamat, nomor_identitas, kode_negara)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                kode,
                nama,
                "JAKARTA",
                if npwp.is_empty() { None } else { Some(npwp) },
                if kode == "9" { NEGARA[i % NEGARA.len()] } else { "ID" },
            ],
        )?;
    }
    Ok(())
}

fn seed_documents(conn: &Connection, id: i64, tanggal: &str, i: usize) -> rusqlite::Result<()> {
    let docs = [("380", "INV"), ("705", "BL"), ("740", "AWB")];
    for (seri, (kode, prefix)) in docs.iter().take(1 + i % 2).enumerate() {
        conn.execute(
            "INSERT INTO bc20_dokumen (header_id, seri, kode_dokumen, nomor_dokumen, tanggal_dokumen)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, (seri + 1) as i64, kode, format!("{}-{:05}", prefix, id), tanggal],
        )?;
    }
    Ok(())
}

fn seed_containers(conn: &Connection, id: i64, i: usize) -> rusqlite::Result<()> {
    for seri in 1..=(i % 3) {
        conn.execute(
            "INSERT INTO bc20_kontainer (header_id, seri, nomor_kontainer, kode_ukuran, kode_tipe)
             VALUES (?1, ?2, ?3, ?4, 'F')",
            params![
                id,
                seri as i64,
                format!("MSKU{:07}", id * 10 + seri as i64),
                if seri % 2 == 0 { "40" } else { "20" },
            ],
        )?;
    }
    Ok(())
}

fn seed_carriers(conn: &Connection, id: i64, i: usize) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO bc20_pengangkut (header_id, seri, kode_cara_angkut, nama_pengangkut, nomor_pengangkut, kode_bendera)
         VALUES (?1, 1, '1', ?2, ?3, ?4)",
        params![
            id,
            format!("MV OCEAN {}", i % 20),
            format!("V{:03}", i % 97),
            NEGARA[i % NEGARA.len()],
        ],
    )?;
    Ok(())
}

fn seed_duties(conn: &Connection, id: i64, total_cif: f64, i: usize) -> rusqlite::Result<()> {
    let mut rows = vec![("BM", 0.05), ("PPN", 0.11), ("PPH", 0.025)];
    if i % 5 == 0 {
        rows.push(("PPNBM", 0.1));
    }
    for (kode, rate) in rows {
        conn.execute(
            "INSERT INTO bc20_pungutan (header_id, kode_jenis_pungutan, nilai_pungutan, kode_fasilitas)
             VALUES (?1, ?2, ?3, NULL)",
            params![id, kode, (total_cif * 15_500.0 * rate).round()],
        )?;
    }
    Ok(())
}

fn print_quick_counts(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let tables = [
        "bc20_header",
        "bc20_data",
        "bc20_barang",
        "bc20_dokumen",
        "bc20_kontainer",
        "bc20_entitas",
        "bc20_pengangkut",
        "bc20_pungutan",
    ];

    eprintln!("Row counts:");
    for t in tables {
        let sql = format!("SELECT COUNT(*) FROM {}", t);
        let c: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        eprintln!("  {:<20} {}", t, c);
    }
    Ok(())
}
