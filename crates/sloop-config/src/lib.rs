//! sloop のデプロイオプション解決
//!
//! 3つのソース（コマンドライン、環境変数、設定ファイル）から
//! オプションを収集し、優先順位マージ → デフォルト補完 → 検証の
//! 順で単一の `Options` に解決します。
//!
//! 優先順位（高い順）: コマンドライン > 環境変数 > 設定ファイル

pub mod env;
pub mod error;
pub mod fields;
pub mod options;

pub use env::*;
pub use error::*;
pub use fields::*;
pub use options::*;

/// 設定ファイル名（カレントディレクトリ相対）
pub const CONFIG_FILE_NAME: &str = ".sloop.json";
