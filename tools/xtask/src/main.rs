//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 anim-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `config-check`: 检查动画配置文件（JSON 格式与取值）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anim_runtime::AnimationConfig;
use clap::{Parser, Subcommand};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "开发辅助工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,

    /// 运行 anim-runtime 覆盖率报告
    CovRuntime,

    /// 运行 workspace 覆盖率报告
    CovWorkspace,

    /// 检查动画配置文件
    ///
    /// 不带参数时检查 config/ 下所有 .json 文件。
    ConfigCheck {
        /// 要检查的文件或目录
        path: Option<PathBuf>,

        /// 打印补全默认值后的配置
        #[arg(long)]
        show: bool,
    },
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    match cli.command {
        Commands::CheckAll => {
            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;

            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        Commands::CovRuntime => {
            ensure_cargo_llvm_cov_available(&sh)?;

            eprintln!("\n==> cargo llvm-cov -p anim-runtime --all-features --html");
            cmd!(sh, "cargo llvm-cov -p anim-runtime --all-features --html").run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Commands::CovWorkspace => {
            ensure_cargo_llvm_cov_available(&sh)?;

            // 排除 xtask，避免稀释运行时的覆盖率信号
            eprintln!("\n==> cargo llvm-cov --workspace --exclude xtask --all-features --html");
            cmd!(
                sh,
                "cargo llvm-cov --workspace --exclude xtask --all-features --html"
            )
            .run()?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Commands::ConfigCheck { path, show } => {
            config_check(path.as_deref(), show)?;
        }
    }

    Ok(())
}

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    match cmd!(sh, "cargo llvm-cov --version").quiet().run() {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

//=============================================================================
// config-check 命令实现
//=============================================================================

/// 默认配置目录（相对于 workspace root）
const DEFAULT_CONFIG_DIR: &str = "config";

/// 执行配置检查
fn config_check(path: Option<&Path>, show: bool) -> anyhow::Result<()> {
    let files = match path {
        Some(path) if path.is_file() => vec![path.to_path_buf()],
        Some(path) if path.is_dir() => collect_config_files(path),
        Some(path) => anyhow::bail!("路径不存在: {}", path.display()),
        None => {
            let dir = Path::new(DEFAULT_CONFIG_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认配置目录不存在: {}\n请在 workspace 根目录运行，或指定配置路径",
                    dir.display()
                );
            }
            collect_config_files(dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到配置文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个配置文件...\n", files.len());

    let mut errors = 0;
    for file in &files {
        match AnimationConfig::load(file) {
            Ok(config) => {
                eprintln!("[OK] {}", file.display());
                if show {
                    eprintln!("{}", serde_json::to_string_pretty(&config)?);
                }
            }
            Err(e) => {
                eprintln!("[ERROR] {}: {}", file.display(), e);
                errors += 1;
            }
        }
    }

    eprintln!("─────────────────────────────────────────────────────");
    if errors > 0 {
        eprintln!("❌ {} 个错误", errors);
        anyhow::bail!("配置检查发现错误");
    }
    eprintln!("✅ 检查通过，无错误");
    Ok(())
}

/// 收集目录下的所有 JSON 配置文件
fn collect_config_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}
