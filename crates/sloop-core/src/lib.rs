//! sloop のデプロイ実行コア
//!
//! 検証済みオプションから導出するデプロイ識別子、ローカル環境変数の
//! プロジェクション、デプロイ成果物のセキュア転送を担います。
//! 転送そのものは `Transport` トレイトの実装（scp/ssh サブプロセス）に
//! 委譲します。

pub mod error;
pub mod identity;
pub mod project;
pub mod transfer;
pub mod transport;

pub use error::*;
pub use identity::*;
pub use project::*;
pub use transfer::*;
pub use transport::*;
