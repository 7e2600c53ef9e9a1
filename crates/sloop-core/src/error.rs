use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("デプロイ識別子の導出に必要なオプションが空です: {0}")]
    MissingIdentityField(&'static str),

    #[error("環境変数が見つかりません: {name} (スロット: {slot})")]
    EnvVarNotFound { name: String, slot: String },

    #[error("デプロイ成果物を開けません: {path}\n理由: {source}")]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("秘密鍵のBase64デコードに失敗しました: {0}")]
    InvalidKey(#[from] base64::DecodeError),

    #[error("サーバーへの接続に失敗しました: {0}")]
    Connection(String),

    #[error("ファイル転送に失敗しました: {path}\n理由: {message}")]
    Transfer { path: PathBuf, message: String },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
