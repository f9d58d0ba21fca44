//! Task trait - 型付き Task の定義
//!
//! # 学習ポイント
//! - Associated Constants (`const KIND`)
//! - Trait bounds の組み合わせ (Serialize + DeserializeOwned + Send + Sync + 'static)

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::TaskKind;

/// Task は kind 文字列と payload 型を対応付ける
///
/// # 使用例
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Resize {
///     path: String,
/// }
///
/// impl Task for Resize {
///     const KIND: &'static str = "media.image.resize.v1";
/// }
/// ```
///
/// The serialized form of `Self` is the stored payload, so it must be a pure
/// function of the fields: re-executing a decoded task after a restart has to
/// behave exactly like the first run.
pub trait Task: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// kind の定義（`{namespace}.{domain}.{action}.v{major}`）
    const KIND: &'static str;

    fn kind() -> TaskKind {
        TaskKind::new(Self::KIND)
    }
}
