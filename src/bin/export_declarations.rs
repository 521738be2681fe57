// ==========================================
// BC 2.0 报关单查询系统 - 命令行导出工具
// ==========================================
// 用法:
//   export_declarations <rules.json|规则JSON> <output.xlsx|output.csv|目录> [sections] [layout]
// 数据库路径取 BC20_DB_PATH（或默认路径）
// ==========================================

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use bc20_query::api::ExportRequest;
use bc20_query::app::{get_default_db_path, AppState};
use bc20_query::exporter::ExportArtifact;
use bc20_query::logging;

fn usage() -> &'static str {
    "usage: export_declarations <rules.json|rules-json> <output> [sections] [multi_sheet|flat]"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let rules_arg = args.next().ok_or(usage())?;
    let output = PathBuf::from(args.next().ok_or(usage())?);
    let sections = args.next();
    let layout = args.next();

    let rules = load_rules(&rules_arg)?;
    let request = ExportRequest {
        rules,
        sort_by: None,
        sort_direction: None,
        sections,
        layout,
    };

    let db_path = get_default_db_path();
    let state = AppState::new(db_path).await?;

    let export_api = state.export_api.clone();
    let (artifact, summary) = tokio::task::spawn_blocking(move || {
        export_api.export_to_path(&request, &output)
    })
    .await??;

    eprintln!(
        "Exported {} declarations in {} batch(es)",
        summary.headers, summary.batches
    );
    for (sheet, rows) in &summary.rows_per_sheet {
        eprintln!("  {:<24} {}", sheet, rows);
    }
    match artifact {
        ExportArtifact::Files(paths) => {
            for p in paths {
                eprintln!("  -> {}", p.display());
            }
        }
        ExportArtifact::File(p) => eprintln!("  -> {}", p.display()),
    }
    Ok(())
}

// 参数为已存在的文件时读取文件内容，否则按 JSON 文本解析
fn load_rules(arg: &str) -> Result<serde_json::Value, Box<dyn Error>> {
    let text = if Path::new(arg).is_file() {
        fs::read_to_string(arg)?
    } else {
        arg.to_string()
    };
    Ok(serde_json::from_str(&text)?)
}
