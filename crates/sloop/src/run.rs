//! デプロイ1回分の実行フロー
//!
//! 設定解決 → 検証 → プロジェクション → 接続確立 → 転送 の順に
//! 逐次実行する。どの段階の失敗も即座に実行を打ち切り、オペレーター
//! へ報告する（リトライ・ロールバックなし）。

use anyhow::Context;
use colored::Colorize;
use sloop_config::{CONFIG_FILE_NAME, Options, ProcessEnv};
use sloop_core::{ScpTransport, deploy, project_env_vars};

pub fn run(command_line: Options) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    println!("{}", "デプロイを開始します...".blue().bold());

    // 残り2ソースを読む。未設定の値は空のまま（エラーにしない）
    let environment = Options::from_env(&ProcessEnv)?;
    let config = Options::from_json_file(&cwd.join(CONFIG_FILE_NAME))?;

    // 優先順位マージ（コマンドライン > 環境変数 > 設定ファイル）
    let mut opts = Options::resolve(command_line, environment, config);
    opts.merge_defaults();

    init_tracing(opts.effective_debug());

    opts.verify().context("オプションが不正です")?;

    println!("  サーバー: {}", opts.server.cyan());
    println!("  チャネル: {}", opts.channel.cyan());

    // 参照されたローカル環境変数を解決する（最初のミスで失敗）
    let projected = project_env_vars(&opts.env_vars, &ProcessEnv)?;
    if !projected.is_empty() {
        println!("  環境変数: {} 個を注入します", projected.len());
    }

    println!();
    println!("{}", "サーバーへファイルを送信中...".blue());

    let summary = deploy(&ScpTransport, &cwd, &opts, &projected)?;

    for remote in &summary.uploaded {
        println!("  ✓ {}", remote.cyan());
    }

    println!();
    println!(
        "{}",
        format!("✓ デプロイが完了しました: {}", summary.remote_dir)
            .green()
            .bold()
    );

    Ok(())
}

/// デバッグモードならDEBUGレベルまでログを出す
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into()),
            )
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }
}
