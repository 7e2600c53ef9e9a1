//! デプロイオプションの収集・マージ・検証
//!
//! `Options` はデプロイ1回分のパラメータレコードです。ソースごとに
//! 1インスタンスを構築し、優先順位マージで単一インスタンスに畳み込み、
//! デフォルト補完 → 検証を経て以降は変更しません。

use crate::env::EnvLookup;
use crate::error::{ConfigError, Result};
use crate::fields::{
    ENV_CHANNEL, ENV_DEBUG, ENV_DIGEST, ENV_ENV_VARS, ENV_IMAGE, ENV_PATH, ENV_PRIVATE_KEY,
    ENV_REGISTRY, ENV_ROOT_DIR, ENV_SERVER, ENV_USERNAME, FIELDS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `channel` のデフォルト値
pub const DEFAULT_CHANNEL: &str = "beta";

/// `rootDir` のデフォルト値
pub const DEFAULT_ROOT_DIR: &str = "/";

/// デプロイオプション一式
///
/// 各フィールドはゼロ値（空文字列・空リスト・`None`）が「未設定」を
/// 意味します。`debug` のみ tri-state で、未設定と明示的な `false` を
/// 区別します（優先順位マージで下位ソースの `true` が失われないように）。
///
/// JSON 形式：
/// ```json
/// {
///     "server": "1.2.3.4",
///     "username": "deploy",
///     "rootDir": "/srv",
///     "envVars": ["API_KEY"],
///     "debug": true
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// コンテナレジストリのホスト名（例: ghcr.io）
    pub registry: String,
    /// イメージ識別子（例: user/app）
    pub image: String,
    /// デプロイするイメージのダイジェスト
    pub digest: String,
    /// デプロイ先サーバーのアドレス
    pub server: String,
    /// サーバーのログインユーザー
    pub username: String,
    /// サーバー上のデプロイ先ベースディレクトリ
    pub root_dir: String,
    /// Base64エンコードされた秘密鍵
    pub private_key: String,
    /// デプロイチャネル（例: beta）
    pub channel: String,
    /// デプロイ対象のローカルディレクトリ（cwd相対）
    pub path: String,
    /// デプロイに注入するローカル環境変数の名前リスト（値は持たない）
    pub env_vars: Vec<String>,
    /// デバッグモード（None = 未設定）
    pub debug: Option<bool>,
}

/// bool リテラルをパースする
///
/// `true` / `false` 以外は `ParseBool` エラー
pub fn parse_bool_literal(text: &str) -> Result<bool> {
    text.parse::<bool>()
        .map_err(|_| ConfigError::ParseBool(text.to_string()))
}

/// カンマ区切りの環境変数名リストをパースする
///
/// 空文字列は空リスト。各要素は前後の空白を除去し、空要素は捨てる
pub fn parse_env_var_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Options {
    /// 環境変数ソースからオプションを構築する
    ///
    /// 静的対応表の `SLOOP_*` スロットを1フィールドずつ読む。
    /// 未設定のスロットは空のまま（エラーにしない）。
    /// `SLOOP_DEBUG` の不正な bool リテラルのみエラー
    pub fn from_env(env: &impl EnvLookup) -> Result<Self> {
        let slot = |key: &str| env.get(key).unwrap_or_default();

        let debug = match env.get(ENV_DEBUG) {
            Some(text) if !text.is_empty() => Some(parse_bool_literal(&text)?),
            _ => None,
        };

        Ok(Self {
            registry: slot(ENV_REGISTRY),
            image: slot(ENV_IMAGE),
            digest: slot(ENV_DIGEST),
            server: slot(ENV_SERVER),
            username: slot(ENV_USERNAME),
            root_dir: slot(ENV_ROOT_DIR),
            private_key: slot(ENV_PRIVATE_KEY),
            channel: slot(ENV_CHANNEL),
            path: slot(ENV_PATH),
            env_vars: parse_env_var_list(&slot(ENV_ENV_VARS)),
            debug,
        })
    }

    /// JSON 設定ファイルからオプションを構築する
    ///
    /// ファイルが存在しない場合は全フィールド空のオプションを返す
    /// （設定ファイルは任意）。読めるが不正な JSON は `Decode` エラー。
    /// 一部のキーだけを持つオブジェクトは有効で、残りは空のまま
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("設定ファイルなし: {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 優先順位の低いオプションをマージする
    ///
    /// フィールドごとに、自身が空の場合のみ `lower` の値を取り込む。
    /// 常に成功する純粋なフィールド単位の操作
    pub fn merge(&mut self, lower: &Options) {
        fn take(dst: &mut String, src: &str) {
            if dst.is_empty() && !src.is_empty() {
                *dst = src.to_string();
            }
        }

        take(&mut self.registry, &lower.registry);
        take(&mut self.image, &lower.image);
        take(&mut self.digest, &lower.digest);
        take(&mut self.server, &lower.server);
        take(&mut self.username, &lower.username);
        take(&mut self.root_dir, &lower.root_dir);
        take(&mut self.private_key, &lower.private_key);
        take(&mut self.channel, &lower.channel);
        take(&mut self.path, &lower.path);

        if self.env_vars.is_empty() && !lower.env_vars.is_empty() {
            self.env_vars = lower.env_vars.clone();
        }
        if self.debug.is_none() {
            self.debug = lower.debug;
        }
    }

    /// 3ソースを優先順位（コマンドライン > 環境変数 > 設定ファイル）で
    /// 単一のオプションに解決する
    pub fn resolve(command_line: Options, mut environment: Options, config: Options) -> Options {
        environment.merge(&config);
        let mut merged = command_line;
        merged.merge(&environment);
        merged
    }

    /// デフォルト値を補完する（マージ後・検証前にのみ適用）
    ///
    /// 冪等: 2回適用しても結果は変わらない
    pub fn merge_defaults(&mut self) {
        if self.channel.is_empty() {
            self.channel = DEFAULT_CHANNEL.to_string();
        }
        if self.root_dir.is_empty() {
            self.root_dir = DEFAULT_ROOT_DIR.to_string();
        }
    }

    /// 必須フィールドを検証する
    ///
    /// 最初の違反で止まらず、全違反を対応表の宣言順に列挙して
    /// 1つの `Validation` エラーにまとめる
    pub fn verify(&self) -> Result<()> {
        let mut violations = Vec::new();

        for field in FIELDS.iter().filter(|f| f.mandatory) {
            let empty = match field.name {
                "server" => self.server.is_empty(),
                "username" => self.username.is_empty(),
                "rootDir" => self.root_dir.is_empty(),
                _ => false,
            };
            if empty {
                violations.push(format!("{} is <empty>", field.name));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(violations.join(", ")))
        }
    }

    /// デバッグモードの実効値（未設定は false）
    pub fn effective_debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }
}
