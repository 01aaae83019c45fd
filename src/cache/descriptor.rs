//! リクエスト・レスポンスのディスクリプタ

use serde::{
    Deserialize,
    Serialize,
};

/// 送受信順のヘッダー一覧（名前は重複しうる）
pub type Headers = Vec<(String, String)>;

/// 送ったリクエスト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    /// メモリ上にあった場合のリクエストボディ。base64 で永続化する
    #[serde(default, with = "optional_base64")]
    pub body: Option<Vec<u8>>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into(), url: url.into(), headers: Vec::new(), body: None }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// 受け取ったレスポンス（ボディを除く）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    /// リダイレクト後の最終 URL
    pub url: String,
    pub status: u16,
    pub headers: Headers,
}

impl ResponseDescriptor {
    #[must_use]
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self { url: url.into(), status, headers: Vec::new() }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// `Option<Vec<u8>>` を省略可能な base64 文字列として扱う
mod optional_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as Base64;
    use serde::{
        Deserialize,
        Deserializer,
        Serializer,
    };

    #[allow(clippy::ref_option)]
    pub(super) fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&Base64.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| Base64.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// UTF-8 でないヘッダー値は損失ありで保持
fn collect_headers(headers: &reqwest::header::HeaderMap) -> Headers {
    headers
        .iter()
        .map(|(name, value)| {
            (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned())
        })
        .collect()
}

impl From<&reqwest::Request> for RequestDescriptor {
    fn from(request: &reqwest::Request) -> Self {
        Self {
            method: request.method().as_str().to_string(),
            url: request.url().to_string(),
            headers: collect_headers(request.headers()),
            body: request.body().and_then(reqwest::Body::as_bytes).map(<[u8]>::to_vec),
        }
    }
}

impl From<&reqwest::Response> for ResponseDescriptor {
    fn from(response: &reqwest::Response) -> Self {
        Self {
            url: response.url().to_string(),
            status: response.status().as_u16(),
            headers: collect_headers(response.headers()),
        }
    }
}
