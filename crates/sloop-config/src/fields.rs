//! オプションフィールドの静的対応表
//!
//! 各フィールドの CLI フラグ名・環境変数名・JSON キー・必須フラグを
//! 一箇所で宣言します。リフレクションによる動的発見の代わりに、
//! この表が唯一の正とし、整合性はユニットテストで検査します。
//! 検証エラーの列挙順もこの宣言順に従います。

/// オプション用環境変数のプレフィックス
pub const ENV_PREFIX: &str = "SLOOP_";

/// 各フィールドの環境変数スロット名
///
/// 対応表とソースリーダーの両方がここを参照する（宣言は一箇所のみ）
pub const ENV_REGISTRY: &str = "SLOOP_REGISTRY";
pub const ENV_IMAGE: &str = "SLOOP_IMAGE";
pub const ENV_DIGEST: &str = "SLOOP_DIGEST";
pub const ENV_SERVER: &str = "SLOOP_SERVER";
pub const ENV_USERNAME: &str = "SLOOP_USERNAME";
pub const ENV_ROOT_DIR: &str = "SLOOP_ROOT_DIR";
pub const ENV_PRIVATE_KEY: &str = "SLOOP_PRIVATE_KEY";
pub const ENV_CHANNEL: &str = "SLOOP_CHANNEL";
pub const ENV_PATH: &str = "SLOOP_PATH";
pub const ENV_ENV_VARS: &str = "SLOOP_ENV_VARS";
pub const ENV_DEBUG: &str = "SLOOP_DEBUG";

/// 1フィールド分の外部名対応
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// 正準フィールド名（検証メッセージに使用）
    pub name: &'static str,
    /// CLI フラグ名
    pub flag: &'static str,
    /// 環境変数名
    pub env: &'static str,
    /// JSON キー
    pub json: &'static str,
    /// デフォルト補完後に空であってはならないか
    pub mandatory: bool,
}

/// 全フィールドの対応表（宣言順 = 列挙順）
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "registry",
        flag: "registry",
        env: ENV_REGISTRY,
        json: "registry",
        mandatory: false,
    },
    FieldSpec {
        name: "image",
        flag: "image",
        env: ENV_IMAGE,
        json: "image",
        mandatory: false,
    },
    FieldSpec {
        name: "digest",
        flag: "digest",
        env: ENV_DIGEST,
        json: "digest",
        mandatory: false,
    },
    FieldSpec {
        name: "server",
        flag: "server",
        env: ENV_SERVER,
        json: "server",
        mandatory: true,
    },
    FieldSpec {
        name: "username",
        flag: "username",
        env: ENV_USERNAME,
        json: "username",
        mandatory: true,
    },
    FieldSpec {
        name: "rootDir",
        flag: "root-dir",
        env: ENV_ROOT_DIR,
        json: "rootDir",
        mandatory: true,
    },
    FieldSpec {
        name: "privateKey",
        flag: "private-key",
        env: ENV_PRIVATE_KEY,
        json: "privateKey",
        mandatory: false,
    },
    FieldSpec {
        name: "channel",
        flag: "channel",
        env: ENV_CHANNEL,
        json: "channel",
        mandatory: false,
    },
    FieldSpec {
        name: "path",
        flag: "path",
        env: ENV_PATH,
        json: "path",
        mandatory: false,
    },
    FieldSpec {
        name: "envVars",
        flag: "env-vars",
        env: ENV_ENV_VARS,
        json: "envVars",
        mandatory: false,
    },
    FieldSpec {
        name: "debug",
        flag: "debug",
        env: ENV_DEBUG,
        json: "debug",
        mandatory: false,
    },
];

/// 正準フィールド名から対応表の行を引く
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}
