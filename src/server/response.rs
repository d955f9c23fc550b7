//! # 响应写入器
//!
//! 处理器通过 [`ResponseWriter`] 写回状态、头和正文。状态一旦提交（显式设置或首次
//! 成功写入正文）即不可更改，之后的状态设置会被忽略并记录。

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use std::io;

use crate::logging::{LogComponent, LogStage};
use crate::lwarn;

/// 非 GET 请求的正文
pub const NOT_FOUND_BODY: &str = "404 page not found\n";

/// 响应写入接口
pub trait ResponseWriter: Send {
    /// 可修改的响应头；状态提交后的修改不生效
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// 设置状态码
    fn write_header(&mut self, status: StatusCode);

    /// 写入正文，未提交状态时隐式提交 200
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// 写出标准的纯文本 404
pub fn not_found(writer: &mut dyn ResponseWriter) -> io::Result<usize> {
    let headers = writer.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    writer.write_header(StatusCode::NOT_FOUND);
    writer.write(NOT_FOUND_BODY.as_bytes())
}

/// 内存缓冲的写入器，正文超过上限的写入失败且不提交状态
#[derive(Debug)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
    limit: usize,
    request_id: String,
}

impl BufferedResponse {
    #[must_use]
    pub fn new(limit: usize, request_id: impl Into<String>) -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            limit,
            request_id: request_id.into(),
        }
    }

    /// 当前状态，未提交时为 200
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 取出已写入的正文
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }
}

impl ResponseWriter for BufferedResponse {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if let Some(committed) = self.status {
            lwarn!(
                self.request_id,
                LogStage::Response,
                LogComponent::FormulasHandler,
                "superfluous_write_header",
                "Status already committed, ignoring",
                committed = committed.as_u16(),
                attempted = status.as_u16()
            );
            return;
        }
        self.status = Some(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.body.len().saturating_add(buf.len()) > self.limit {
            return Err(io::Error::other(format!(
                "response body exceeds limit of {} bytes",
                self.limit
            )));
        }
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl IntoResponse for BufferedResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = Response::new(Body::from(self.body.freeze()));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_write_commits_ok() {
        let mut writer = BufferedResponse::new(16, "test");
        assert!(!writer.is_committed());

        writer.write(b"abc").unwrap();
        writer.write_header(StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(writer.status(), StatusCode::OK);
        assert_eq!(writer.body(), b"abc");
    }

    #[test]
    fn test_explicit_status_is_final() {
        let mut writer = BufferedResponse::new(16, "test");
        writer.write_header(StatusCode::NOT_FOUND);
        writer.write_header(StatusCode::OK);

        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_over_limit_write_fails_uncommitted() {
        let mut writer = BufferedResponse::new(4, "test");
        assert!(writer.write(b"too long").is_err());
        assert!(!writer.is_committed());

        writer.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(writer.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_not_found_writes_plain_text() {
        let mut writer = BufferedResponse::new(1024, "test");
        not_found(&mut writer).unwrap();

        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
        assert_eq!(writer.body(), NOT_FOUND_BODY.as_bytes());
        assert_eq!(
            writer.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(writer.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    #[tokio::test]
    async fn test_into_response() {
        let mut writer = BufferedResponse::new(1024, "test");
        writer.write(b"payload").unwrap();

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"payload");
    }
}
