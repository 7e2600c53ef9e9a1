//! デプロイ識別子の導出
//!
//! 検証済みオプションからデプロイ名と完全修飾イメージ参照を導出する
//! 純粋関数群。空の入力は `-foo` や `@sha256:...` のような不完全な
//! 識別子を作らないよう明示的に拒否します。

use crate::error::{CoreError, Result};

/// イメージ名とチャネルからデプロイ名を導出する
///
/// 両者の `/` を `-` に置換し、`-` で連結する。
/// 例: image `user/foo`, channel `beta/123` → `user-foo-beta-123`
pub fn deployment_name(image: &str, channel: &str) -> Result<String> {
    if image.is_empty() {
        return Err(CoreError::MissingIdentityField("image"));
    }
    if channel.is_empty() {
        return Err(CoreError::MissingIdentityField("channel"));
    }

    Ok(format!(
        "{}-{}",
        image.replace('/', "-"),
        channel.replace('/', "-")
    ))
}

/// 完全修飾イメージ参照を導出する
///
/// registry が非空なら `registry/image@digest`、空なら `image@digest`。
/// 値の妥当性検証はここでは行わない（上流で検証済みの前提）
pub fn image_specifier(registry: &str, image: &str, digest: &str) -> Result<String> {
    if image.is_empty() {
        return Err(CoreError::MissingIdentityField("image"));
    }
    if digest.is_empty() {
        return Err(CoreError::MissingIdentityField("digest"));
    }

    if registry.is_empty() {
        Ok(format!("{image}@{digest}"))
    } else {
        Ok(format!("{registry}/{image}@{digest}"))
    }
}
