//! オフライン再生用に記録した HTTP のやり取り
/// リクエストとレスポンスのメタデータ
mod descriptor;
/// エントリのボディバッファと永続化形式
mod entry;

pub use descriptor::{
    Headers,
    RequestDescriptor,
    ResponseDescriptor,
};
pub use entry::{
    CacheEntry,
    DecodeError,
    FORMAT_VERSION,
};
