//! デプロイ成果物の転送オーケストレーション
//!
//! 検証・デフォルト補完済みのオプションを受け取り、成果物ファイルを
//! cwd 相対で解決して開き、接続パラメータとともに `Transport` に
//! 引き渡します。1回の実行は
//! 設定解決 → 検証 → 接続確立 → 転送 → 完了
//! の順で進み、どの段階の失敗も即座に実行を打ち切ります
//! （リトライ・ロールバックなし）。

use crate::error::{CoreError, Result};
use crate::identity;
use crate::project;
use base64::Engine;
use sloop_config::Options;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// デプロイする compose マニフェストのファイル名
pub const COMPOSE_FILE_NAME: &str = "docker-compose.sloop.yml";

/// プロジェクション済み変数を書き出す .env 成果物のファイル名
pub const ENV_FILE_NAME: &str = ".sloop.env";

/// デコード済みの秘密鍵素材
#[derive(Clone, Default)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    /// Base64エンコードされた鍵をデコードする
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// 鍵が指定されていない場合 true（認証はssh-agent等に委ねる）
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for KeyMaterial {
    // 鍵素材をログに残さない
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial({} bytes)", self.0.len())
    }
}

/// 転送対象として開かれた成果物
///
/// `file` ハンドルを保持することで、後続の失敗時もスコープ離脱で
/// 確実に解放される（開いたN番目で失敗しても 1..N-1 は drop で閉じる）
#[derive(Debug)]
pub struct Artifact {
    /// リモート側でのファイル名
    pub name: &'static str,
    /// 解決済みローカルパス
    pub path: PathBuf,
    /// 読み取り用に開いたハンドル
    pub file: File,
}

/// 成果物のローカルパスを解決する
///
/// 常に `cwd/path/file_name`
pub fn artifact_path(cwd: &Path, path_opt: &str, file_name: &str) -> PathBuf {
    cwd.join(path_opt).join(file_name)
}

/// デプロイに必要な成果物を解決して開く
///
/// 開けないファイルがあれば、そのパスを示す `FileAccess` で失敗する
pub fn open_artifacts(cwd: &Path, opts: &Options) -> Result<Vec<Artifact>> {
    let file_names = [COMPOSE_FILE_NAME];

    let mut artifacts = Vec::with_capacity(file_names.len());
    for name in file_names {
        let path = artifact_path(cwd, &opts.path, name);
        let file = File::open(&path).map_err(|source| CoreError::FileAccess {
            path: path.clone(),
            source,
        })?;
        artifacts.push(Artifact { name, path, file });
    }

    Ok(artifacts)
}

/// セキュア転送のコラボレータ契約
///
/// 実装はセッション確立とファイルコピーのみを提供する。
/// リトライは契約に含まれない（呼び出し側も行わない）
pub trait Transport {
    type Session;

    /// 認証情報つきでセッションを確立する
    fn establish(&self, host: &str, user: &str, key: &KeyMaterial) -> Result<Self::Session>;

    /// ローカルファイルをリモートパスへコピーする
    fn copy_file(&self, session: &Self::Session, local: &Path, remote: &str) -> Result<()>;
}

/// 1回のデプロイ転送の結果
#[derive(Debug)]
pub struct DeploySummary {
    /// リモートのデプロイ先ディレクトリ
    pub remote_dir: String,
    /// アップロードしたリモートパス（転送順）
    pub uploaded: Vec<String>,
}

/// 成果物一式をリモートへ転送する
///
/// リモート先は `<rootDir>/<デプロイ名>/`。compose マニフェストに加え、
/// 書き出す内容があれば .env 成果物も同じディレクトリへ送る。
/// いずれの転送エラーも致命的でリトライしない
pub fn deploy<T: Transport>(
    transport: &T,
    cwd: &Path,
    opts: &Options,
    projected: &HashMap<String, String>,
) -> Result<DeploySummary> {
    let name = identity::deployment_name(&opts.image, &opts.channel)?;
    let remote_dir = join_remote(&opts.root_dir, &name);

    // 接続前に成果物を開く。ここで失敗すればネットワークに触れない
    let artifacts = open_artifacts(cwd, opts)?;
    let env_content = project::render_deployment_env(opts, projected)?;

    let key = KeyMaterial::from_base64(&opts.private_key)?;
    let session = transport.establish(&opts.server, &opts.username, &key)?;

    let mut uploaded = Vec::new();
    for artifact in &artifacts {
        let remote = format!("{remote_dir}/{}", artifact.name);
        transport.copy_file(&session, &artifact.path, &remote)?;
        uploaded.push(remote);
    }

    if let Some(content) = env_content {
        let mut env_file = tempfile::NamedTempFile::new()?;
        env_file.write_all(content.as_bytes())?;
        env_file.flush()?;

        let remote = format!("{remote_dir}/{ENV_FILE_NAME}");
        transport.copy_file(&session, env_file.path(), &remote)?;
        uploaded.push(remote);
    }

    Ok(DeploySummary {
        remote_dir,
        uploaded,
    })
}

fn join_remote(root_dir: &str, name: &str) -> String {
    format!("{}/{}", root_dir.trim_end_matches('/'), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn test_opts(path: &str) -> Options {
        Options {
            image: "user/foo".to_string(),
            digest: "sha256:abc123".to_string(),
            server: "1.2.3.4".to_string(),
            username: "deploy".to_string(),
            root_dir: "/srv".to_string(),
            private_key: "dGVzdC1rZXk=".to_string(),
            channel: "beta".to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    /// 呼び出しを記録するフェイクトランスポート
    #[derive(Default)]
    struct FakeTransport {
        fail_establish: bool,
        fail_copy: bool,
        established: RefCell<Vec<(String, String, Vec<u8>)>>,
        copied: RefCell<Vec<(PathBuf, String)>>,
    }

    impl Transport for FakeTransport {
        type Session = ();

        fn establish(&self, host: &str, user: &str, key: &KeyMaterial) -> Result<()> {
            if self.fail_establish {
                return Err(CoreError::Connection("connection refused".to_string()));
            }
            self.established.borrow_mut().push((
                host.to_string(),
                user.to_string(),
                key.as_bytes().to_vec(),
            ));
            Ok(())
        }

        fn copy_file(&self, _session: &(), local: &Path, remote: &str) -> Result<()> {
            if self.fail_copy {
                return Err(CoreError::Transfer {
                    path: local.to_path_buf(),
                    message: "broken pipe".to_string(),
                });
            }
            self.copied
                .borrow_mut()
                .push((local.to_path_buf(), remote.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_artifact_path() {
        let path = artifact_path(Path::new("/work"), "app", COMPOSE_FILE_NAME);
        assert_eq!(
            path,
            Path::new("/work/app/docker-compose.sloop.yml")
        );
    }

    #[test]
    fn test_open_artifacts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let app_dir = temp_dir.path().join("app");
        std::fs::create_dir(&app_dir).unwrap();
        std::fs::write(app_dir.join(COMPOSE_FILE_NAME), "services: {}\n").unwrap();

        let opts = test_opts("app");
        let artifacts = open_artifacts(temp_dir.path(), &opts).unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, COMPOSE_FILE_NAME);
        assert_eq!(artifacts[0].path, app_dir.join(COMPOSE_FILE_NAME));
    }

    #[test]
    fn test_open_artifacts_missing_file_names_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp_dir.path().join("app")).unwrap();

        let opts = test_opts("app");
        let err = open_artifacts(temp_dir.path(), &opts).unwrap_err();

        let expected = temp_dir.path().join("app").join(COMPOSE_FILE_NAME);
        match &err {
            CoreError::FileAccess { path, .. } => assert_eq!(path, &expected),
            other => panic!("FileAccess を期待したが {other:?} が返った"),
        }
        assert!(err.to_string().contains(COMPOSE_FILE_NAME));
    }

    #[test]
    fn test_deploy_uploads_artifacts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let app_dir = temp_dir.path().join("app");
        std::fs::create_dir(&app_dir).unwrap();
        std::fs::write(app_dir.join(COMPOSE_FILE_NAME), "services: {}\n").unwrap();

        let transport = FakeTransport::default();
        let opts = test_opts("app");
        let projected = HashMap::from([("API_KEY".to_string(), "secret".to_string())]);

        let summary = deploy(&transport, temp_dir.path(), &opts, &projected).unwrap();

        assert_eq!(summary.remote_dir, "/srv/user-foo-beta");

        let established = transport.established.borrow();
        assert_eq!(established.len(), 1);
        assert_eq!(established[0].0, "1.2.3.4");
        assert_eq!(established[0].1, "deploy");
        assert_eq!(established[0].2, b"test-key");

        let copied = transport.copied.borrow();
        assert_eq!(copied.len(), 2);
        assert_eq!(copied[0].1, "/srv/user-foo-beta/docker-compose.sloop.yml");
        assert_eq!(copied[1].1, "/srv/user-foo-beta/.sloop.env");
        assert_eq!(summary.uploaded, vec![
            "/srv/user-foo-beta/docker-compose.sloop.yml".to_string(),
            "/srv/user-foo-beta/.sloop.env".to_string(),
        ]);
    }

    #[test]
    fn test_deploy_root_dir_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join(COMPOSE_FILE_NAME), "services: {}\n").unwrap();

        let transport = FakeTransport::default();
        let mut opts = test_opts("");
        opts.root_dir = "/".to_string();
        opts.digest = String::new();

        let summary = deploy(&transport, temp_dir.path(), &opts, &HashMap::new()).unwrap();

        // rootDir "/" で二重スラッシュにならない
        assert_eq!(summary.remote_dir, "/user-foo-beta");
        // プロジェクションもイメージ情報も無ければ .env は送らない
        assert_eq!(transport.copied.borrow().len(), 1);
    }

    #[test]
    fn test_deploy_open_failure_stays_offline() {
        let temp_dir = tempfile::tempdir().unwrap();

        let transport = FakeTransport::default();
        let opts = test_opts("missing");

        let err = deploy(&transport, temp_dir.path(), &opts, &HashMap::new()).unwrap_err();

        assert!(matches!(err, CoreError::FileAccess { .. }));
        // 成果物を開けなければネットワークには一切触れない
        assert!(transport.established.borrow().is_empty());
        assert!(transport.copied.borrow().is_empty());
    }

    #[test]
    fn test_deploy_connection_failure_stops_transfer() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join(COMPOSE_FILE_NAME), "services: {}\n").unwrap();

        let transport = FakeTransport {
            fail_establish: true,
            ..Default::default()
        };
        let opts = test_opts("");

        let err = deploy(&transport, temp_dir.path(), &opts, &HashMap::new()).unwrap_err();

        assert!(matches!(err, CoreError::Connection(_)));
        assert!(transport.copied.borrow().is_empty());
    }

    #[test]
    fn test_deploy_transfer_failure_is_fatal() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join(COMPOSE_FILE_NAME), "services: {}\n").unwrap();

        let transport = FakeTransport {
            fail_copy: true,
            ..Default::default()
        };
        let opts = test_opts("");

        let err = deploy(&transport, temp_dir.path(), &opts, &HashMap::new()).unwrap_err();
        assert!(matches!(err, CoreError::Transfer { .. }));
    }

    #[test]
    fn test_deploy_requires_image_for_name() {
        let temp_dir = tempfile::tempdir().unwrap();

        let transport = FakeTransport::default();
        let mut opts = test_opts("");
        opts.image = String::new();

        let err = deploy(&transport, temp_dir.path(), &opts, &HashMap::new()).unwrap_err();
        assert!(matches!(err, CoreError::MissingIdentityField("image")));
    }

    #[test]
    fn test_key_material() {
        let key = KeyMaterial::from_base64("dGVzdC1rZXk=").unwrap();
        assert_eq!(key.as_bytes(), b"test-key");
        assert!(!key.is_empty());

        let empty = KeyMaterial::from_base64("").unwrap();
        assert!(empty.is_empty());

        assert!(KeyMaterial::from_base64("###").is_err());

        // Debug表示に鍵素材を含めない
        assert_eq!(format!("{key:?}"), "KeyMaterial(8 bytes)");
    }
}
