//! コマンドラインのエントリーポイント: API ペイロードを 1 件翻訳する

use std::io::{
    Read,
    Write,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use kct_localizer::config::ConfigManager;
use kct_localizer::report::{
    Blacklist,
    HttpReportSink,
    ReportError,
    ReportWorker,
};
use kct_localizer::table::LoadError;
use kct_localizer::{
    TranslateError,
    Translator,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Translate a JSON API payload with a translation table.
#[derive(Parser, Debug)]
#[command(name = "kct-localizer", version, about)]
struct Cli {
    /// Translation table (JSON object, possibly nested).
    #[arg(long, value_name = "FILE")]
    table: PathBuf,

    /// Report blacklist (JSON object of path -> [keys]).
    #[arg(long, value_name = "FILE")]
    blacklist: Option<PathBuf>,

    /// Directory holding `.kct-localizer.json`.
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Path the payload is rooted at, e.g. `api_start2`.
    #[arg(long, default_value = "")]
    path: String,

    /// Payload file, or `-` for stdin.
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,
}

/// 実行を中断するエラー
#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] kct_localizer::config::ConfigError),

    #[error("Failed to load '{path}': {source}")]
    Load { path: PathBuf, source: LoadError },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(writer).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// 設定とデータを読み込み、入力を翻訳し、レポートを送り切る
async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config_manager = ConfigManager::new();
    config_manager.load_settings(cli.config_dir)?;
    let settings = config_manager.get_settings();

    let translator = Translator::from_settings(settings);
    translator
        .tables()
        .load_file(&cli.table)
        .map_err(|source| CliError::Load { path: cli.table.clone(), source })?;
    if let Some(path) = cli.blacklist {
        let blacklist = Blacklist::from_file(&path)
            .map_err(|source| CliError::Load { path: path.clone(), source })?;
        translator.gate().set_blacklist(blacklist);
    }

    let worker = match settings.report.endpoint.as_deref() {
        Some(endpoint) if settings.report.is_active() => {
            let sink = HttpReportSink::new(endpoint, HttpReportSink::DEFAULT_TIMEOUT)?;
            let gate = Arc::clone(translator.gate());
            Some(ReportWorker::spawn(gate, Arc::new(sink), &settings.report))
        }
        _ => None,
    };

    let input = read_input(&cli.input)?;
    let result = translator.translate_json_at(&input, &cli.path);

    if let Some(worker) = worker {
        worker.shutdown().await;
    }

    let output = result?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&output)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

/// ファイルまたは標準入力からペイロード全体を読む
fn read_input(input: &str) -> std::io::Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(input)
    }
}
