//! キャッシュエントリとその永続化

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use super::{
    RequestDescriptor,
    ResponseDescriptor,
};

/// [`CacheEntry::encode`] が書き、[`CacheEntry::decode`] が受け付ける唯一の形式バージョン
pub const FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum DecodeError {
    /// 途中で切れた入力、不正な JSON、フィールド欠落
    #[error("Malformed cache entry: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported cache entry version {0} (expected {FORMAT_VERSION})")]
    UnsupportedVersion(u32),

    #[error("Cache entry body is not valid base64: {0}")]
    Body(#[from] base64::DecodeError),
}

/// 記録したリクエスト/レスポンス 1 組
///
/// ネットワーク層がリクエスト開始時に作成し、レスポンスヘッダーが届いたら付け、
/// ボディのチャンクを届いた順に追記する。完了したエントリは [`CacheEntry::encode`] で
/// 永続化し、[`CacheEntry::decode`] で復元する。
///
/// ```
/// use kct_localizer::cache::{CacheEntry, RequestDescriptor, ResponseDescriptor};
///
/// let mut entry = CacheEntry::new(RequestDescriptor::new("GET", "http://example.com/a.json"));
/// entry.set_response(ResponseDescriptor::new("http://example.com/a.json", 200));
/// entry.append_data(b"{\"a\":");
/// entry.append_data(b"1}");
///
/// let restored = CacheEntry::decode(&entry.encode().unwrap()).unwrap();
/// assert_eq!(restored.data(), b"{\"a\":1}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// 送ったリクエスト
    request: RequestDescriptor,
    /// レスポンスヘッダー。サーバーが応答するまで `None`
    response: Option<ResponseDescriptor>,
    /// これまでに受信したボディ
    data: Vec<u8>,
}

/// エンコード用の永続化形式（借用）
#[derive(Serialize)]
struct EnvelopeRef<'a> {
    /// 常に [`FORMAT_VERSION`]
    version: u32,
    /// リクエストヘッダーとボディ
    request: &'a RequestDescriptor,
    /// 届いていればレスポンスヘッダー
    response: Option<&'a ResponseDescriptor>,
    /// ボディバッファ（base64）
    data: String,
}

/// デコード用の永続化形式（所有）
#[derive(Deserialize)]
struct Envelope {
    /// リクエストヘッダーとボディ
    request: RequestDescriptor,
    /// 届いていればレスポンスヘッダー
    response: Option<ResponseDescriptor>,
    /// ボディバッファ（base64）
    data: String,
}

/// 新しいレイアウトでもバージョンを報告できるよう、本体より先に読む
#[derive(Deserialize)]
struct VersionHeader {
    /// 形式バージョン
    version: u32,
}

impl CacheEntry {
    /// `request` に紐づく、レスポンスなし・ボディ空のエントリ
    #[must_use]
    pub const fn new(request: RequestDescriptor) -> Self {
        Self { request, response: None, data: Vec::new() }
    }

    /// レスポンスヘッダーを付ける
    pub fn set_response(&mut self, response: ResponseDescriptor) {
        self.response = Some(response);
    }

    /// ボディのチャンクを追記。単一の生産者から順に呼ばれる前提
    pub fn append_data(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    #[must_use]
    pub const fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    #[must_use]
    pub const fn response(&self) -> Option<&ResponseDescriptor> {
        self.response.as_ref()
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// ボディのバイト数
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// レスポンスヘッダーが付いているか
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.response.is_some()
    }

    /// リクエスト、レスポンス、ボディ全体をシリアライズ
    ///
    /// # Errors
    /// シリアライズ失敗。この API で作ったエントリでは起きない
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&EnvelopeRef {
            version: FORMAT_VERSION,
            request: &self.request,
            response: self.response.as_ref(),
            data: Base64.encode(&self.data),
        })
    }

    /// [`CacheEntry::encode`] で書いたエントリを復元
    ///
    /// # Errors
    /// - [`DecodeError::Malformed`]: 途中で切れている、またはキャッシュエントリでない
    /// - [`DecodeError::UnsupportedVersion`]: 別の形式バージョンで書かれた
    /// - [`DecodeError::Body`]: ボディバッファが base64 でない
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let VersionHeader { version } = serde_json::from_slice(bytes)?;
        if version != FORMAT_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let envelope: Envelope = serde_json::from_slice(bytes)?;
        let data = Base64.decode(envelope.data)?;

        Ok(Self { request: envelope.request, response: envelope.response, data })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    /// UTF-8 でないボディを分割受信した母港リクエストのエントリ
    fn complete_entry() -> CacheEntry {
        let request = RequestDescriptor::new("POST", "http://203.104.209.71/kcsapi/api_port/port")
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_body(b"api_token=abc&api_verno=1".to_vec());
        let mut entry = CacheEntry::new(request);
        entry.set_response(
            ResponseDescriptor::new("http://203.104.209.71/kcsapi/api_port/port", 200)
                .with_header("content-type", "text/plain"),
        );
        entry.append_data(b"svdata=");
        entry.append_data(&[0x7b, 0x7d, 0x00, 0xff]);
        entry
    }

    #[googletest::test]
    fn new_entry_is_empty_and_incomplete() {
        let entry = CacheEntry::new(RequestDescriptor::new("GET", "http://example.com/"));

        expect_that!(entry.is_empty(), eq(true));
        expect_that!(entry.is_complete(), eq(false));
        expect_that!(entry.response(), none());
    }

    #[googletest::test]
    fn append_data_accumulates_in_order() {
        let mut entry = CacheEntry::new(RequestDescriptor::new("GET", "http://example.com/"));

        entry.append_data(b"ab");
        entry.append_data(b"");
        entry.append_data(b"cd");

        expect_that!(entry.data(), eq(b"abcd".as_slice()));
        expect_that!(entry.len(), eq(4));
    }

    #[test]
    fn decode_restores_encoded_entry() {
        let entry = complete_entry();

        let restored = CacheEntry::decode(&entry.encode().unwrap()).unwrap();

        assert_eq!(restored, entry);
    }

    #[test]
    fn decode_restores_entry_without_response() {
        let mut entry = CacheEntry::new(RequestDescriptor::new("GET", "http://example.com/"));
        entry.append_data(b"partial");

        let restored = CacheEntry::decode(&entry.encode().unwrap()).unwrap();

        assert_eq!(restored, entry);
        assert!(!restored.is_complete());
    }

    #[rstest]
    #[case::empty(|_| 0)]
    #[case::half(|len| len / 2)]
    #[case::missing_last_byte(|len| len - 1)]
    fn decode_rejects_truncated_input(#[case] cut: fn(usize) -> usize) {
        let encoded = complete_entry().encode().unwrap();

        let result = CacheEntry::decode(&encoded[..cut(encoded.len())]);

        assert!(matches!(result, Err(DecodeError::Malformed(_))), "{result:?}");
    }

    #[test]
    fn decode_rejects_other_versions() {
        let encoded = br#"{"version":2,"entry":{}}"#;

        let result = CacheEntry::decode(encoded);

        assert!(matches!(result, Err(DecodeError::UnsupportedVersion(2))), "{result:?}");
    }

    #[test]
    fn decode_rejects_invalid_body_encoding() {
        let encoded = serde_json::to_vec(&serde_json::json!({
            "version": 1,
            "request": { "method": "GET", "url": "http://example.com/", "headers": [] },
            "response": null,
            "data": "not base64!"
        }))
        .unwrap();

        let result = CacheEntry::decode(&encoded);

        assert!(matches!(result, Err(DecodeError::Body(_))), "{result:?}");
    }

    #[googletest::test]
    fn decode_error_messages() {
        expect_that!(
            DecodeError::UnsupportedVersion(3).to_string(),
            eq("Unsupported cache entry version 3 (expected 1)")
        );
    }
}
