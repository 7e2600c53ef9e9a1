//! 環境変数ルックアップの注入
//!
//! プロセスのグローバル環境を直接読む代わりに、呼び出し側が
//! ルックアップ能力を渡します。テストでは `HashMap` 実装を使うことで
//! プロセス環境を変更せずに決定的なテストが書けます。

use std::collections::HashMap;

/// 環境変数ルックアップ能力
pub trait EnvLookup {
    /// キーに対応する値を返す。未設定なら `None`
    fn get(&self, key: &str) -> Option<String>;
}

/// 本番用: プロセス環境から読み取る
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// テスト用: 固定のマップから読み取る
impl EnvLookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}
