// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use rusqlite::{params, Connection};

// ==========================================
// 货物明细
// ==========================================
#[derive(Debug, Clone)]
pub struct GoodsRow {
    pub kode_hs: String,
    pub uraian: String,
    pub jumlah_satuan: Option<f64>,
    pub cif: Option<f64>,
    pub negara_asal: Option<String>,
}

// ==========================================
// 报关单构建器
// ==========================================

/// 报关单构建器
///
/// 写入 bc20_header / bc20_data 及各子表；未设置的字段保持 NULL。
pub struct DeclarationBuilder {
    id: i64,
    nomor_aju: String,
    nomor_daftar: Option<String>,
    tanggal_daftar: Option<String>,
    kode_jalur: Option<String>,
    nama_perusahaan: Option<String>,
    with_data: bool,
    cif: Option<f64>,
    kode_valuta: Option<String>,
    ndpbm: Option<f64>,
    nomor_bc11: Option<String>,
    importir: Option<(String, Option<String>)>,
    ppjk: Option<String>,
    goods: Vec<GoodsRow>,
    documents: Vec<(String, String)>,
    containers: Vec<(String, String)>,
    carriers: Vec<String>,
    duties: Vec<(String, f64)>,
}

impl DeclarationBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            nomor_aju: format!("AJU{:08}", id),
            nomor_daftar: Some(format!("{:06}", id)),
            tanggal_daftar: None,
            kode_jalur: None,
            nama_perusahaan: None,
            with_data: false,
            cif: None,
            kode_valuta: None,
            ndpbm: None,
            nomor_bc11: None,
            importir: None,
            ppjk: None,
            goods: Vec::new(),
            documents: Vec::new(),
            containers: Vec::new(),
            carriers: Vec::new(),
            duties: Vec::new(),
        }
    }

    pub fn nomor_daftar(mut self, nomor: &str) -> Self {
        self.nomor_daftar = Some(nomor.to_string());
        self
    }

    pub fn tanggal(mut self, date: &str) -> Self {
        self.tanggal_daftar = Some(date.to_string());
        self
    }

    pub fn jalur(mut self, jalur: &str) -> Self {
        self.kode_jalur = Some(jalur.to_string());
        self
    }

    pub fn perusahaan(mut self, nama: &str) -> Self {
        self.nama_perusahaan = Some(nama.to_string());
        self
    }

    pub fn cif(mut self, cif: f64, valuta: &str) -> Self {
        self.with_data = true;
        self.cif = Some(cif);
        self.kode_valuta = Some(valuta.to_string());
        self
    }

    pub fn ndpbm(mut self, ndpbm: f64) -> Self {
        self.with_data = true;
        self.ndpbm = Some(ndpbm);
        self
    }

    pub fn bc11(mut self, nomor: &str) -> Self {
        self.with_data = true;
        self.nomor_bc11 = Some(nomor.to_string());
        self
    }

    pub fn importir(mut self, nama: &str, npwp: Option<&str>) -> Self {
        self.importir = Some((nama.to_string(), npwp.map(str::to_string)));
        self
    }

    pub fn ppjk(mut self, nama: &str) -> Self {
        self.ppjk = Some(nama.to_string());
        self
    }

    pub fn goods(mut self, kode_hs: &str, jumlah: f64, cif: f64) -> Self {
        self.goods.push(GoodsRow {
            kode_hs: kode_hs.to_string(),
            uraian: format!("BARANG {}", kode_hs),
            jumlah_satuan: Some(jumlah),
            cif: Some(cif),
            negara_asal: Some("CN".to_string()),
        });
        self
    }

    pub fn goods_row(mut self, row: GoodsRow) -> Self {
        self.goods.push(row);
        self
    }

    pub fn document(mut self, kode: &str, nomor: &str) -> Self {
        self.documents.push((kode.to_string(), nomor.to_string()));
        self
    }

    pub fn container(mut self, nomor: &str, ukuran: &str) -> Self {
        self.containers.push((nomor.to_string(), ukuran.to_string()));
        self
    }

    pub fn carrier(mut self, nama: &str) -> Self {
        self.carriers.push(nama.to_string());
        self
    }

    pub fn duty(mut self, kode: &str, nilai: f64) -> Self {
        self.duties.push((kode.to_string(), nilai));
        self
    }

    /// 写入数据库
    pub fn insert(self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO bc20_header (id, nomor_aju, nomor_daftar, tanggal_daftar, kode_jalur,
                nama_perusahaan, kode_dokumen)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, '20')",
            params![
                self.id,
                self.nomor_aju,
                self.nomor_daftar,
                self.tanggal_daftar,
                self.kode_jalur,
                self.nama_perusahaan,
            ],
        )?;

        if self.with_data {
            conn.execute(
                "INSERT INTO bc20_data (header_id, cif, kode_valuta, ndpbm, nomor_bc11)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![self.id, self.cif, self.kode_valuta, self.ndpbm, self.nomor_bc11],
            )?;
        }

        if let Some((nama, npwp)) = &self.importir {
            conn.execute(
                "INSERT INTO bc20_entitas (header_id, kode_entitas, nama, nomor_identitas)
                 VALUES (?1, '1', ?2, ?3)",
                params![self.id, nama, npwp],
            )?;
        }
        if let Some(nama) = &self.ppjk {
            conn.execute(
                "INSERT INTO bc20_entitas (header_id, kode_entitas, nama) VALUES (?1, '4', ?2)",
                params![self.id, nama],
            )?;
        }

        for (i, g) in self.goods.iter().enumerate() {
            conn.execute(
                "INSERT INTO bc20_barang (header_id, seri_barang, kode_hs, uraian, jumlah_satuan,
                    kode_satuan, cif, kode_negara_asal)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'PCE', ?6, ?7)",
                params![
                    self.id,
                    (i + 1) as i64,
                    g.kode_hs,
                    g.uraian,
                    g.jumlah_satuan,
                    g.cif,
                    g.negara_asal,
                ],
            )?;
        }

        for (i, (kode, nomor)) in self.documents.iter().enumerate() {
            conn.execute(
                "INSERT INTO bc20_dokumen (header_id, seri, kode_dokumen, nomor_dokumen)
                 VALUES (?1, ?2, ?3, ?4)",
                params![self.id, (i + 1) as i64, kode, nomor],
            )?;
        }

        for (i, (nomor, ukuran)) in self.containers.iter().enumerate() {
            conn.execute(
                "INSERT INTO bc20_kontainer (header_id, seri, nomor_kontainer, kode_ukuran)
                 VALUES (?1, ?2, ?3, ?4)",
                params![self.id, (i + 1) as i64, nomor, ukuran],
            )?;
        }

        for (i, nama) in self.carriers.iter().enumerate() {
            conn.execute(
                "INSERT INTO bc20_pengangkut (header_id, seri, nama_pengangkut) VALUES (?1, ?2, ?3)",
                params![self.id, (i + 1) as i64, nama],
            )?;
        }

        for (kode, nilai) in &self.duties {
            conn.execute(
                "INSERT INTO bc20_pungutan (header_id, kode_jenis_pungutan, nilai_pungutan)
                 VALUES (?1, ?2, ?3)",
                params![self.id, kode, nilai],
            )?;
        }

        Ok(self.id)
    }
}

/// 四张报关单的标准夹具
///
/// | id | jalur | 进口商          | 货物数 | 登记日期   |
/// |----|-------|-----------------|--------|------------|
/// | 1  | M     | PT SINAR JAYA   | 3      | 2024-01-10 |
/// | 2  | H     | PT SINAR JAYA   | 1      | 2024-01-20 |
/// | 3  | M     | CV KARYA        | 0      | 2024-02-05 |
/// | 4  | K     | PT MAJU         | 2      | 2024-02-15 |
pub fn seed_four_declarations(conn: &Connection) -> rusqlite::Result<()> {
    DeclarationBuilder::new(1)
        .tanggal("2024-01-10")
        .jalur("M")
        .cif(1000.0, "USD")
        .ndpbm(15000.0)
        .importir("PT SINAR JAYA", Some("01.111.111.1-000.000"))
        .ppjk("PT PPJK SEJAHTERA")
        .goods("84713010", 4.0, 100.0)
        .goods("85176299", 10.0, 300.0)
        .goods("39269099", 2.0, 50.0)
        .document("380", "INV-1")
        .container("MSKU0000001", "20")
        .carrier("MV OCEAN 1")
        .duty("BM", 500.0)
        .duty("PPN", 1100.0)
        .insert(conn)?;

    DeclarationBuilder::new(2)
        .tanggal("2024-01-20")
        .jalur("H")
        .cif(200.0, "USD")
        .importir("PT SINAR JAYA", None)
        .goods("84713010", 1.0, 200.0)
        .carrier("MV OCEAN 2")
        .duty("PPN", 220.0)
        .insert(conn)?;

    DeclarationBuilder::new(3)
        .tanggal("2024-02-05")
        .jalur("M")
        .cif(50.0, "EUR")
        .importir("CV KARYA", None)
        .insert(conn)?;

    DeclarationBuilder::new(4)
        .tanggal("2024-02-15")
        .jalur("K")
        .cif(700.0, "USD")
        .importir("PT MAJU", None)
        .goods("73181510", 5.0, 500.0)
        .goods("52083900", 0.0, 200.0)
        .container("MSKU0000004", "40")
        .container("MSKU0000005", "20")
        .insert(conn)?;

    Ok(())
}
