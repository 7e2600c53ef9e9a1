mod run;

use clap::Parser;
use sloop_config::{Options, parse_env_var_list};

#[derive(Parser)]
#[command(name = "sloop")]
#[command(version)]
#[command(
    about = "composeマニフェストを単一サーバーへ押し出すデプロイツール",
    long_about = None
)]
struct Cli {
    /// コンテナレジストリのホスト名 (例: ghcr.io)
    #[arg(long)]
    registry: Option<String>,

    /// デプロイするイメージ識別子 (例: user/app)
    #[arg(long)]
    image: Option<String>,

    /// デプロイするイメージのダイジェスト
    #[arg(long)]
    digest: Option<String>,

    /// デプロイ先サーバーのアドレス
    #[arg(long)]
    server: Option<String>,

    /// サーバーのログインユーザー
    #[arg(long)]
    username: Option<String>,

    /// サーバー上のデプロイ先ベースディレクトリ
    #[arg(long = "root-dir")]
    root_dir: Option<String>,

    /// Base64エンコードされたSSH秘密鍵
    #[arg(long = "private-key")]
    private_key: Option<String>,

    /// デプロイチャネル (例: beta)
    #[arg(long)]
    channel: Option<String>,

    /// デプロイ対象のローカルディレクトリ（カレントディレクトリ相対）
    #[arg(long)]
    path: Option<String>,

    /// デプロイに注入するローカル環境変数名（カンマ区切り）
    #[arg(long = "env-vars")]
    env_vars: Option<String>,

    /// デバッグモード (true / false)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    debug: Option<bool>,
}

impl Cli {
    /// コマンドラインソースのオプションを構築する
    ///
    /// 未指定のフラグはフィールドを空のまま残す
    fn into_options(self) -> Options {
        Options {
            registry: self.registry.unwrap_or_default(),
            image: self.image.unwrap_or_default(),
            digest: self.digest.unwrap_or_default(),
            server: self.server.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            root_dir: self.root_dir.unwrap_or_default(),
            private_key: self.private_key.unwrap_or_default(),
            channel: self.channel.unwrap_or_default(),
            path: self.path.unwrap_or_default(),
            env_vars: parse_env_var_list(&self.env_vars.unwrap_or_default()),
            debug: self.debug,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            use clap::error::ErrorKind;

            // ヘルプ/バージョン要求は 2、パースエラーは 1 で終了する
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 2,
                _ => 1,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    if let Err(err) = run::run(cli.into_options()) {
        use colored::Colorize;
        eprintln!("{}", format!("✗ デプロイに失敗しました: {err:#}").red());
        std::process::exit(1);
    }
}
