//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `scenario-check`: 检查场景文件（格式、ID 重复、token 引用）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use tabletop_model::Scenario;
use walkdir::WalkDir;
use xshell::{Shell, cmd};

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => check_all()?,
        "scenario-check" => {
            let path = args.next();
            scenario_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn check_all() -> anyhow::Result<()> {
    let sh = Shell::new()?;

    eprintln!("\n==> cargo fmt --all -- --check");
    cmd!(sh, "cargo fmt --all -- --check").run()?;

    eprintln!("\n==> cargo clippy --workspace --all-targets");
    cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

    eprintln!("\n==> cargo test --workspace");
    cmd!(sh, "cargo test --workspace").run()?;

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all        运行 fmt、clippy、test 门禁检查
  scenario-check   检查场景文件

SCENARIO-CHECK:
  cargo xtask scenario-check [path]

  不带参数：检查 scenarios/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - JSON 格式错误
    - 对象/事件/行动 ID 重复
    - 行动或跟随目标引用了不存在的 token
"#
    );
}

//=============================================================================
// scenario-check 命令实现
//=============================================================================

/// 默认场景目录（相对于 workspace root）
const DEFAULT_SCENARIO_DIR: &str = "scenarios";

/// 场景检查结果
#[derive(Debug, Default)]
struct ScenarioCheckResult {
    /// 检查的文件数量
    files_checked: usize,
    /// 解析错误数量
    parse_errors: usize,
    /// 一致性警告数量
    warnings: usize,
}

fn scenario_check(path: Option<&str>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_scenario_files(&path)?
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_SCENARIO_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认场景目录不存在: {}\n请在 workspace 根目录运行，或指定场景路径",
                    dir.display()
                );
            }
            collect_scenario_files(dir)?
        }
    };

    if files.is_empty() {
        eprintln!("未找到场景文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个场景文件...\n", files.len());

    let mut result = ScenarioCheckResult::default();
    for file in &files {
        check_scenario_file(file, &mut result);
    }

    print_check_result(&result);

    if result.parse_errors > 0 {
        anyhow::bail!("场景检查发现错误");
    }
    Ok(())
}

/// 收集目录下的所有场景文件
fn collect_scenario_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("无法遍历目录: {}", dir.display()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn check_scenario_file(file: &Path, result: &mut ScenarioCheckResult) {
    let name = file.display().to_string();
    result.files_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", name, e);
            result.parse_errors += 1;
            return;
        }
    };

    let scenario = match Scenario::from_json(&content) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", name, e);
            result.parse_errors += 1;
            return;
        }
    };

    for warning in scenario.check() {
        eprintln!("[WARN] {}: {}", name, warning);
        result.warnings += 1;
    }
}

fn print_check_result(result: &ScenarioCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个场景", result.files_checked);
    eprintln!();

    if result.parse_errors > 0 {
        eprintln!(
            "❌ {} 个错误, {} 个警告",
            result.parse_errors, result.warnings
        );
    } else if result.warnings > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", result.warnings);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
