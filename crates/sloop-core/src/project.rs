//! ローカル環境変数のプロジェクション
//!
//! オプションの `envVars` に列挙された名前を、プレフィックス付きの
//! ローカルスロット（`SLOOP_<名前>`）から解決します。検証と違い、
//! 最初のミスで即座に失敗します。名前の打ち間違いをその場で報告する
//! ほうが、後続の接続エラーに紛れるより診断しやすいためです。

use crate::error::{CoreError, Result};
use crate::identity;
use sloop_config::{EnvLookup, Options};
use std::collections::HashMap;

/// プロジェクション対象スロットのプレフィックス（プロセス全体で固定）
pub const ENV_VAR_PREFIX: &str = "SLOOP_";

/// 名前リストをローカルスロットから解決する
///
/// 各名前 `name` についてスロット `SLOOP_<name>` を引く。
/// 1つでも見つからなければ、その名前を示して即座に失敗する。
/// 成功時は入力の名前集合と正確に一致するマップを返す
/// （キーはプレフィックスなしの元の名前）
pub fn project_env_vars(
    names: &[String],
    env: &impl EnvLookup,
) -> Result<HashMap<String, String>> {
    let mut resolved = HashMap::with_capacity(names.len());

    for name in names {
        let slot = format!("{ENV_VAR_PREFIX}{name}");
        match env.get(&slot) {
            Some(value) => {
                tracing::debug!("環境変数を解決: {name}");
                resolved.insert(name.clone(), value);
            }
            None => {
                return Err(CoreError::EnvVarNotFound {
                    name: name.clone(),
                    slot,
                });
            }
        }
    }

    Ok(resolved)
}

/// プロジェクション結果を .env 形式にレンダリングする
///
/// `KEY=value` 行をキーのソート順で並べる（決定的な出力）
pub fn render_env_file(vars: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = vars.keys().collect();
    keys.sort();

    let mut out = String::new();
    for key in keys {
        out.push_str(key);
        out.push('=');
        out.push_str(&vars[key]);
        out.push('\n');
    }
    out
}

/// デプロイに同梱する .env 成果物の内容を組み立てる
///
/// プロジェクション済み変数に加え、イメージとダイジェストが揃っていれば
/// `SLOOP_IMAGE=<完全修飾イメージ参照>` を注入する（compose マニフェスト
/// 側はこの変数でイメージを参照する）。書き出すものが無ければ `None`
pub fn render_deployment_env(
    opts: &Options,
    projected: &HashMap<String, String>,
) -> Result<Option<String>> {
    let mut vars = projected.clone();

    if !opts.image.is_empty() && !opts.digest.is_empty() {
        let specifier = identity::image_specifier(&opts.registry, &opts.image, &opts.digest)?;
        vars.insert("SLOOP_IMAGE".to_string(), specifier);
    }

    if vars.is_empty() {
        Ok(None)
    } else {
        Ok(Some(render_env_file(&vars)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_project_env_vars() {
        let env = env_with(&[("SLOOP_foo", "test"), ("SLOOP_bar", "test")]);
        let names = vec!["foo".to_string(), "bar".to_string()];

        let resolved = project_env_vars(&names, &env).unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["foo"], "test");
        assert_eq!(resolved["bar"], "test");
    }

    #[test]
    fn test_project_env_vars_missing_slot() {
        // foo のスロットだけ無い
        let env = env_with(&[("SLOOP_bar", "test")]);
        let names = vec!["foo".to_string(), "bar".to_string()];

        let err = project_env_vars(&names, &env).unwrap_err();
        assert!(err.to_string().contains("foo"));
    }

    #[test]
    fn test_project_env_vars_empty_names() {
        let env = env_with(&[]);
        let resolved = project_env_vars(&[], &env).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_render_env_file_sorted() {
        let vars = env_with(&[("ZEBRA", "z"), ("ALPHA", "a"), ("MIKE", "m")]);

        assert_eq!(render_env_file(&vars), "ALPHA=a\nMIKE=m\nZEBRA=z\n");
    }

    #[test]
    fn test_render_deployment_env_injects_image() {
        let opts = Options {
            registry: "registry.io".to_string(),
            image: "user/foo".to_string(),
            digest: "sha256:abc123".to_string(),
            ..Default::default()
        };
        let projected = env_with(&[("API_KEY", "secret")]);

        let content = render_deployment_env(&opts, &projected).unwrap().unwrap();
        assert_eq!(
            content,
            "API_KEY=secret\nSLOOP_IMAGE=registry.io/user/foo@sha256:abc123\n"
        );
    }

    #[test]
    fn test_render_deployment_env_nothing_to_write() {
        let opts = Options::default();
        let projected = HashMap::new();

        assert!(render_deployment_env(&opts, &projected).unwrap().is_none());
    }
}
