//! scp/ssh サブプロセスによるトランスポート実装
//!
//! Wraps the system ssh/scp commands as the secure transfer collaborator.

use crate::error::{CoreError, Result};
use crate::transfer::{KeyMaterial, Transport};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// システムの ssh/scp を使うトランスポート
#[derive(Debug, Clone, Copy, Default)]
pub struct ScpTransport;

/// 確立済みの scp セッション
///
/// 鍵ファイルは drop で削除される（tempfile はunixでは 0600 で作成される）
pub struct ScpSession {
    target: String,
    key_file: Option<NamedTempFile>,
}

impl ScpSession {
    /// ssh / scp 共通の接続引数
    fn connect_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
        ];
        if let Some(key_file) = &self.key_file {
            args.push("-i".to_string());
            args.push(key_file.path().display().to_string());
        }
        args
    }
}

impl Transport for ScpTransport {
    type Session = ScpSession;

    /// 鍵素材を一時ファイルに書き出し、ssh で接続を確認する
    fn establish(&self, host: &str, user: &str, key: &KeyMaterial) -> Result<ScpSession> {
        let key_file = if key.is_empty() {
            // 鍵が無ければ ssh-agent 等に委ねる
            None
        } else {
            let mut file = NamedTempFile::new()?;
            file.write_all(key.as_bytes())?;
            file.flush()?;
            Some(file)
        };

        let session = ScpSession {
            target: format!("{user}@{host}"),
            key_file,
        };

        let output = run_command(
            Command::new("ssh")
                .args(session.connect_args())
                .arg(&session.target)
                .arg("true"),
        )?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Connection(stderr.trim().to_string()));
        }

        Ok(session)
    }

    /// リモートディレクトリを作成してから scp でコピーする
    fn copy_file(&self, session: &ScpSession, local: &Path, remote: &str) -> Result<()> {
        if let Some((dir, _)) = remote.rsplit_once('/') {
            let mkdir_cmd = format!("mkdir -p {}", shell_escape(dir));
            let output = run_command(
                Command::new("ssh")
                    .args(session.connect_args())
                    .arg(&session.target)
                    .arg(&mkdir_cmd),
            )?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(CoreError::Transfer {
                    path: local.to_path_buf(),
                    message: format!("リモートディレクトリを作成できません: {}", stderr.trim()),
                });
            }
        }

        let output = run_command(
            Command::new("scp")
                .args(session.connect_args())
                .arg(local)
                .arg(format!("{}:{}", session.target, remote)),
        )?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Transfer {
                path: local.to_path_buf(),
                message: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}

/// コマンドを実行して出力を回収する
fn run_command(cmd: &mut Command) -> Result<std::process::Output> {
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!("実行: {:?}", cmd);

    Ok(cmd.output()?)
}

/// シェル用にエスケープ
fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_args_without_key() {
        let session = ScpSession {
            target: "deploy@1.2.3.4".to_string(),
            key_file: None,
        };

        let args = session.connect_args();
        assert!(!args.contains(&"-i".to_string()));
        assert!(args.contains(&"BatchMode=yes".to_string()));
    }

    #[test]
    fn test_connect_args_with_key() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"test-key").unwrap();

        let session = ScpSession {
            target: "deploy@1.2.3.4".to_string(),
            key_file: Some(file),
        };

        let args = session.connect_args();
        let i_pos = args.iter().position(|a| a == "-i").unwrap();
        assert!(args.len() > i_pos + 1);
    }

    #[test]
    fn test_shell_escape() {
        assert_eq!(shell_escape("hello"), "'hello'");
        assert_eq!(shell_escape("it's"), "'it'\\''s'");
        assert_eq!(shell_escape(""), "''");
    }
}
