use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("bool値としてパースできません: '{0}' (true / false のみ有効)")]
    ParseBool(String),

    #[error("設定ファイルのデコードに失敗しました: {path}\n理由: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("オプション検証エラー: {0}")]
    Validation(String),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
